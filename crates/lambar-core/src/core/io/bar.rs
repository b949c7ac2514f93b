use crate::core::models::trace::{EnergyTrace, PairedEnsemble};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Gas constant in J/(mol·K).
const GAS_CONSTANT: f64 = 8.314;
/// Joules per kcal.
const JOULES_PER_KCAL: f64 = 4184.0;
/// bar·Å³ → kcal/mol.
const PV_UNIT_CONVERSION: f64 = 1e5 * 1e-30 / 4184.0 * 6.02e23;

#[derive(Debug, Error)]
pub enum BarFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid sample-count header on line {line}: '{content}'")]
    BadHeader { line: usize, content: String },
    #[error("Line count mismatch: file has {actual} lines, expected {n1} + {n2} + 2")]
    LineCount { actual: usize, n1: usize, n2: usize },
    #[error("Invalid numeric record on line {line}: expected 4 columns, got '{content}'")]
    BadRecord { line: usize, content: String },
    #[error("File contains no samples for one or both legs")]
    NoData,
}

/// Thermodynamic context used to reduce raw energies, matching the
/// simulation conditions of the trajectory pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarReadOptions {
    /// Temperature in Kelvin.
    pub temperature: f64,
    /// Pressure in bar.
    pub pressure: f64,
}

impl Default for BarReadOptions {
    fn default() -> Self {
        Self {
            temperature: 298.0,
            pressure: 1.0,
        }
    }
}

impl BarReadOptions {
    /// Inverse temperature in (kcal/mol)⁻¹.
    pub fn beta(&self) -> f64 {
        1.0 / (GAS_CONSTANT * self.temperature / JOULES_PER_KCAL)
    }
}

/// Reads a Tinker BAR paired-trajectory file.
///
/// Format: line 1 is the leg-A frame count n1, followed by n1 records of four
/// whitespace-separated columns (frame index, energy at state A, energy at
/// state B, volume); then the leg-B count n2 and its n2 records. The total
/// line count must equal n1 + n2 + 2, otherwise the file is rejected with a
/// line-count diagnostic. Energies are reduced on the fly:
/// u = β·(E + P·V·c) with the pressure–volume term converted from bar·Å³.
pub fn read_paired_trajectory(
    reader: &mut impl BufRead,
    options: &BarReadOptions,
) -> Result<PairedEnsemble, BarFileError> {
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
    if lines.is_empty() {
        return Err(BarFileError::NoData);
    }

    let n1 = parse_count_header(&lines[0], 1)?;
    let second_header = n1 + 1;
    if lines.len() <= second_header {
        return Err(BarFileError::LineCount {
            actual: lines.len(),
            n1,
            n2: 0,
        });
    }
    let n2 = parse_count_header(&lines[second_header], second_header + 1)?;

    if lines.len() != n1 + n2 + 2 {
        return Err(BarFileError::LineCount {
            actual: lines.len(),
            n1,
            n2,
        });
    }

    let leg_a = parse_records(&lines[1..=n1], 2, options)?;
    let leg_b = parse_records(&lines[second_header + 1..], second_header + 2, options)?;

    PairedEnsemble::new(leg_a, leg_b).ok_or(BarFileError::NoData)
}

pub fn read_paired_trajectory_file(
    path: impl AsRef<Path>,
    options: &BarReadOptions,
) -> Result<PairedEnsemble, BarFileError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_paired_trajectory(&mut reader, options)
}

fn parse_count_header(line: &str, line_num: usize) -> Result<usize, BarFileError> {
    line.split_whitespace()
        .next()
        .and_then(|token| token.parse::<usize>().ok())
        .ok_or_else(|| BarFileError::BadHeader {
            line: line_num,
            content: line.trim().to_string(),
        })
}

fn parse_records(
    lines: &[String],
    first_line_num: usize,
    options: &BarReadOptions,
) -> Result<EnergyTrace, BarFileError> {
    let beta = options.beta();
    let pv_factor = options.pressure * PV_UNIT_CONVERSION;

    let mut samples = Vec::with_capacity(lines.len());
    for (offset, line) in lines.iter().enumerate() {
        let columns: Vec<f64> = line
            .split_whitespace()
            .map(|token| token.parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| BarFileError::BadRecord {
                line: first_line_num + offset,
                content: line.trim().to_string(),
            })?;
        if columns.len() != 4 {
            return Err(BarFileError::BadRecord {
                line: first_line_num + offset,
                content: line.trim().to_string(),
            });
        }
        let pv = columns[3] * pv_factor;
        samples.push([beta * (columns[1] + pv), beta * (columns[2] + pv)]);
    }
    Ok(EnergyTrace::new(samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_file() -> String {
        let mut content = String::from("3 ignored comment\n");
        for i in 0..3 {
            content.push_str(&format!("{} -10.0 -9.0 1000.0\n", i + 1));
        }
        content.push_str("2\n");
        for i in 0..2 {
            content.push_str(&format!("{} -8.5 -9.5 1000.0\n", i + 1));
        }
        content
    }

    #[test]
    fn reads_both_legs_with_reduced_energies() {
        let options = BarReadOptions::default();
        let mut reader = Cursor::new(sample_file());
        let pair = read_paired_trajectory(&mut reader, &options).unwrap();
        assert_eq!(pair.leg_a().len(), 3);
        assert_eq!(pair.leg_b().len(), 2);

        let beta = options.beta();
        let pv = 1000.0 * PV_UNIT_CONVERSION;
        let expected = beta * (-10.0 + pv);
        assert!((pair.leg_a().samples()[0][0] - expected).abs() < 1e-12);
    }

    #[test]
    fn beta_matches_the_physical_constants() {
        let options = BarReadOptions::default();
        // 1/(8.314 * 298 / 4184) kcal/mol at 298 K.
        assert!((options.beta() - 1.6886).abs() < 1e-3);
    }

    #[test]
    fn rejects_wrong_line_count() {
        let mut content = sample_file();
        content.push_str("extra line\n");
        let result = read_paired_trajectory(
            &mut Cursor::new(content),
            &BarReadOptions::default(),
        );
        assert!(matches!(
            result,
            Err(BarFileError::LineCount {
                actual: 8,
                n1: 3,
                n2: 2
            })
        ));
    }

    #[test]
    fn rejects_non_numeric_header() {
        let result = read_paired_trajectory(
            &mut Cursor::new("not-a-count\n"),
            &BarReadOptions::default(),
        );
        assert!(matches!(result, Err(BarFileError::BadHeader { line: 1, .. })));
    }

    #[test]
    fn rejects_malformed_record() {
        let content = "1\nfoo bar\n1\n1 0.0 0.0 0.0\n";
        let result = read_paired_trajectory(
            &mut Cursor::new(content),
            &BarReadOptions::default(),
        );
        assert!(matches!(result, Err(BarFileError::BadRecord { line: 2, .. })));
    }

    #[test]
    fn zero_sample_header_yields_no_data() {
        let content = "0\n1\n1 0.0 0.0 0.0\n";
        let result = read_paired_trajectory(
            &mut Cursor::new(content),
            &BarReadOptions::default(),
        );
        assert!(matches!(result, Err(BarFileError::NoData)));
    }
}
