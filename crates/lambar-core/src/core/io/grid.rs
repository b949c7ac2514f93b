use crate::core::models::grid::{GridError, LambdaGrid};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid numeric value on line {line}: '{content}'")]
    BadValue { line: usize, content: String },
    #[error("Malformed λ grid: {0}")]
    Grid(#[from] GridError),
}

/// Reads a whitespace-separated numeric matrix, one grid row per line.
/// Blank lines and lines starting with `#` are skipped.
pub fn read_lambda_grid(reader: &mut impl BufRead) -> Result<LambdaGrid, GridFileError> {
    let mut rows = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let row: Vec<f64> = trimmed
            .split_whitespace()
            .map(|token| token.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| GridFileError::BadValue {
                line: line_num + 1,
                content: trimmed.to_string(),
            })?;
        rows.push(row);
    }
    Ok(LambdaGrid::new(rows)?)
}

pub fn read_lambda_grid_file(path: impl AsRef<Path>) -> Result<LambdaGrid, GridFileError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_lambda_grid(&mut reader)
}

/// Reads a whitespace-separated vector of per-interval error values,
/// one or more values per line.
pub fn read_error_values(reader: &mut impl BufRead) -> Result<Vec<f64>, GridFileError> {
    let mut values = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        for token in trimmed.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| GridFileError::BadValue {
                line: line_num + 1,
                content: trimmed.to_string(),
            })?;
            values.push(value);
        }
    }
    Ok(values)
}

pub fn read_error_values_file(path: impl AsRef<Path>) -> Result<Vec<f64>, GridFileError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_error_values(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_a_two_axis_grid() {
        let content = "# vdw ele\n0.0 0.0\n0.5 0.0\n\n0.5 0.5\n";
        let grid = read_lambda_grid(&mut Cursor::new(content)).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.dims(), 2);
        assert_eq!(grid.row(2), &[0.5, 0.5]);
    }

    #[test]
    fn reads_error_values_across_lines() {
        let values = read_error_values(&mut Cursor::new("1.0 2.0\n3.0\n")).unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn reports_bad_values_with_line_numbers() {
        let result = read_lambda_grid(&mut Cursor::new("0.0\nnope\n"));
        assert!(matches!(
            result,
            Err(GridFileError::BadValue { line: 2, .. })
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = read_lambda_grid(&mut Cursor::new("0.0 0.0\n0.5\n"));
        assert!(matches!(result, Err(GridFileError::Grid(_))));
    }
}
