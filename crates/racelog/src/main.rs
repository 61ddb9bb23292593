use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use racelog_core::{outputs, DistanceBand, PipelineConfig, SeriesOrder, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(author, version, about = "Race history normalization and query tool", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Directory holding the CSV snapshot (falls back to RACELOG_DATA_DIR, then ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// SQLite database URL; takes precedence over the CSV directory
    #[arg(long, global = true)]
    database_url: Option<String>,
    /// Pipeline configuration TOML (falls back to RACELOG_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List groups with their race counts and shares
    Groups(GroupsArgs),
    /// Time-or-laps series for one group
    Series(SeriesArgs),
    /// Listing for one group, most recent race first
    Table(TableArgs),
    /// The most recent races across all groups
    Top(TopArgs),
    /// Finishing positions over time
    Ranks(JsonArgs),
    /// Write the derived race table to a parquet file
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct JsonArgs {
    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct GroupsArgs {
    /// Distance band to narrow the listing to
    #[arg(long, default_value_t = DistanceBand::All)]
    band: DistanceBand,
    #[command(flatten)]
    output: JsonArgs,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OrderArg {
    #[default]
    Asc,
    Desc,
}

impl From<OrderArg> for SeriesOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Asc => SeriesOrder::Ascending,
            OrderArg::Desc => SeriesOrder::Descending,
        }
    }
}

#[derive(Args, Debug)]
struct SeriesArgs {
    /// Group label, e.g. 10KM
    #[arg(long)]
    group: String,
    #[arg(long, value_enum, default_value_t = OrderArg::Asc)]
    order: OrderArg,
    /// Keep only the most recent N races
    #[arg(long)]
    limit: Option<NonZeroUsize>,
    #[command(flatten)]
    output: JsonArgs,
}

#[derive(Args, Debug)]
struct TableArgs {
    /// Group label, e.g. 10KM
    #[arg(long)]
    group: String,
    #[command(flatten)]
    output: JsonArgs,
}

#[derive(Args, Debug)]
struct TopArgs {
    /// Number of races
    #[arg(short, long, default_value_t = 5)]
    n: usize,
    #[command(flatten)]
    output: JsonArgs,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Destination parquet file
    #[arg(long)]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let session = load_session(&cli.source).await?;

    match cli.command {
        Command::Groups(args) => handle_groups(&session, args),
        Command::Series(args) => handle_series(&session, args),
        Command::Table(args) => handle_table(&session, args),
        Command::Top(args) => handle_top(&session, args),
        Command::Ranks(args) => handle_ranks(&session, args),
        Command::Export(args) => handle_export(&session, args),
    }
}

async fn load_session(args: &SourceArgs) -> Result<Session> {
    let config_path = args
        .config
        .clone()
        .or_else(|| env::var("RACELOG_CONFIG").ok().map(PathBuf::from));
    let config = match config_path {
        Some(path) => PipelineConfig::from_path(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let database_url = args
        .database_url
        .clone()
        .or_else(|| env::var("RACELOG_DATABASE_URL").ok())
        .or_else(|| env::var("DATABASE_URL").ok());
    if let Some(url) = database_url {
        info!("Loading snapshot from SQLite");
        return Session::load_sqlite(&url, &config)
            .await
            .context("failed to load SQLite snapshot");
    }

    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| env::var("RACELOG_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"));
    Session::load_csv_dir(&data_dir, &config)
        .with_context(|| format!("failed to load CSV snapshot from {}", data_dir.display()))
}

fn handle_groups(session: &Session, args: GroupsArgs) -> Result<()> {
    let labels = session.groups_in_band(args.band);
    let shares: Vec<_> = session
        .group_shares()
        .into_iter()
        .filter(|share| labels.contains(&share.label))
        .collect();

    if args.output.json {
        return render::print_json(&shares);
    }
    println!("{}", render::shares_table(&shares));
    Ok(())
}

fn handle_series(session: &Session, args: SeriesArgs) -> Result<()> {
    let points = session
        .series_for_group(
            &args.group,
            args.order.into(),
            args.limit.map(NonZeroUsize::get),
        )
        .with_context(|| format!("failed to resolve group '{}'", args.group))?;

    if args.output.json {
        return render::print_json(&points);
    }
    println!("{}", render::series_table(&points));
    Ok(())
}

fn handle_table(session: &Session, args: TableArgs) -> Result<()> {
    let rows = session
        .table_for_group(&args.group)
        .with_context(|| format!("failed to resolve group '{}'", args.group))?;

    if args.output.json {
        return render::print_json(&rows);
    }
    println!("{}", render::listing_table(&rows));
    Ok(())
}

fn handle_top(session: &Session, args: TopArgs) -> Result<()> {
    let points = session.top_n_by_id(args.n);
    if args.output.json {
        return render::print_json(&points);
    }
    println!("{}", render::rank_table(&points));
    Ok(())
}

fn handle_ranks(session: &Session, args: JsonArgs) -> Result<()> {
    let points = session.rank_history();
    if args.json {
        return render::print_json(&points);
    }
    println!("{}", render::rank_table(&points));
    Ok(())
}

fn handle_export(session: &Session, args: ExportArgs) -> Result<()> {
    let rows = outputs::write_parquet(session.derived(), &args.out)
        .with_context(|| format!("failed to export to {}", args.out.display()))?;
    println!("Wrote {rows} races to {}", args.out.display());
    Ok(())
}
