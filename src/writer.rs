//! CSV output through polars DataFrames.

use crate::constants::STATION_HEADER;
use crate::error::{BulletinError, Result};
use crate::models::StationTable;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

fn create_output_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

fn write_frame(mut df: DataFrame, path: &Path) -> Result<()> {
    let mut file = create_output_file(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Write string cells under the given headers.
///
/// Every row must have one cell per header.
pub fn write_rows_csv(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    if let Some(row) = rows.iter().find(|row| row.len() != headers.len()) {
        return Err(BulletinError::invalid_table(
            path,
            format!("row has {} cells for {} headers", row.len(), headers.len()),
        ));
    }

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let cells: Vec<&str> = rows.iter().map(|row| row[i].as_str()).collect();
            Column::new((*header).into(), cells)
        })
        .collect();

    write_frame(DataFrame::new(columns)?, path)
}

/// Write a bulletin table: `Station` followed by the table columns, whole
/// numbers for present values and `/` for missing ones
pub fn write_table_csv(table: &StationTable, path: &Path) -> Result<()> {
    let mut headers = vec![STATION_HEADER];
    headers.extend(table.columns().iter().map(String::as_str));

    write_rows_csv(path, &headers, &table.display_rows())?;
    info!("Bulletin table written: {} ({} stations)", path.display(), table.len());
    Ok(())
}

/// Write an intermediate table at full precision, leaving missing cells
/// empty
pub fn write_numeric_csv(table: &StationTable, path: &Path, station_header: &str) -> Result<()> {
    let mut columns = Vec::with_capacity(table.columns().len() + 1);
    columns.push(Column::new(
        station_header.into(),
        table.stations().collect::<Vec<&str>>(),
    ));

    for (i, name) in table.columns().iter().enumerate() {
        let values: Vec<Option<f64>> = table.rows().iter().map(|row| row.values[i].value()).collect();
        columns.push(Column::new(name.as_str().into(), values));
    }

    write_frame(DataFrame::new(columns)?, path)?;
    info!("Table written: {} ({} rows)", path.display(), table.len());
    Ok(())
}

/// Write one entry per line
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}
