use std::collections::HashSet;

use csv::ReaderBuilder;
use polars::prelude::*;

use crate::errors::ParserError;
use crate::model::{Cell, Relation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ColumnKind {
    Null,
    Int,
    Float,
    Text,
}

impl ColumnKind {
    fn widen(self, cell: &Cell) -> Self {
        let kind = match cell {
            Cell::Null => ColumnKind::Null,
            Cell::Int(_) => ColumnKind::Int,
            Cell::Float(_) => ColumnKind::Float,
            Cell::Text(_) => ColumnKind::Text,
        };
        self.max(kind)
    }
}

/// Reads one relation from CSV text into a raw DataFrame. Column types are
/// inferred per column: all-integer, all-numeric, otherwise string.
pub fn parse_csv_relation(relation: Relation, content: &str) -> Result<DataFrame, ParserError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|source| ParserError::Csv { relation, source })?,
        None => return Err(ParserError::MissingHeader { relation }),
    };

    let names: Vec<String> = header.iter().map(|name| name.trim().to_string()).collect();
    if names.iter().all(|name| name.is_empty()) {
        return Err(ParserError::MissingHeader { relation });
    }

    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); names.len()];
    for (offset, record) in records.enumerate() {
        let record = record.map_err(|source| ParserError::Csv { relation, source })?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() != names.len() {
            return Err(ParserError::RaggedRow {
                relation,
                line_index: offset + 1,
                expected: names.len(),
                found: record.len(),
            });
        }
        for (column, field) in columns.iter_mut().zip(record.iter()) {
            column.push(Cell::infer(field));
        }
    }

    frame_from_cells(relation, &names, columns)
}

/// Assembles a DataFrame from column-major cells, widening each column to the
/// narrowest type that holds all of its values.
pub fn frame_from_cells(
    relation: Relation,
    names: &[String],
    columns: Vec<Vec<Cell>>,
) -> Result<DataFrame, ParserError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ParserError::DuplicateColumn {
                relation,
                column: name.clone(),
            });
        }
    }

    let built: Vec<Column> = names
        .iter()
        .zip(columns.iter())
        .map(|(name, cells)| cells_to_column(name, cells))
        .collect();

    DataFrame::new(built).map_err(|source| ParserError::Frame { relation, source })
}

fn cells_to_column(name: &str, cells: &[Cell]) -> Column {
    let kind = cells
        .iter()
        .fold(ColumnKind::Null, |kind, cell| kind.widen(cell));

    match kind {
        ColumnKind::Null => Series::new(name.into(), vec![None::<&str>; cells.len()]).into(),
        ColumnKind::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Int(value) => Some(*value),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values).into()
        }
        ColumnKind::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Int(value) => Some(*value as f64),
                    Cell::Float(value) => Some(*value),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values).into()
        }
        ColumnKind::Text => {
            let values: Vec<Option<String>> = cells.iter().map(Cell::to_text).collect();
            Series::new(name.into(), values).into()
        }
    }
}

/// Reads a DataFrame column back into loosely-typed cells. Integer and float
/// columns of any width are widened to 64 bits; other types go through their
/// string representation.
pub fn cells_from_column(column: &Column) -> Result<Vec<Cell>, PolarsError> {
    let dtype = column.dtype().clone();
    let cells = match dtype {
        DataType::Null => vec![Cell::Null; column.len()],
        DataType::String => column
            .str()?
            .into_iter()
            .map(|value| value.map_or(Cell::Null, |text| Cell::Text(text.to_string())))
            .collect(),
        dtype if dtype.is_integer() => {
            let widened = column.cast(&DataType::Int64)?;
            let cells: Vec<Cell> = widened
                .i64()?
                .into_iter()
                .map(|value| value.map_or(Cell::Null, Cell::Int))
                .collect();
            cells
        }
        dtype if dtype.is_float() => {
            let widened = column.cast(&DataType::Float64)?;
            let cells: Vec<Cell> = widened
                .f64()?
                .into_iter()
                .map(|value| match value {
                    Some(value) if value.is_finite() => Cell::Float(value),
                    _ => Cell::Null,
                })
                .collect();
            cells
        }
        _ => {
            let text = column.cast(&DataType::String)?;
            let cells: Vec<Cell> = text
                .str()?
                .into_iter()
                .map(|value| value.map_or(Cell::Null, |text| Cell::Text(text.to_string())))
                .collect();
            cells
        }
    };
    Ok(cells)
}
