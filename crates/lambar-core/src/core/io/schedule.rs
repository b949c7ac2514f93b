use crate::core::models::grid::LambdaGrid;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleWriteError {
    #[error("I/O error writing '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Grid has {dims} coupling axes but {names} variable names were given")]
    NameCount { dims: usize, names: usize },
}

/// Writes one keyword file per grid row, named `<prefix>.<row_index>`, each
/// line `"<variable> <value>"` with values formatted to the precision the
/// grid requires.
pub fn write_schedule(
    grid: &LambdaGrid,
    variable_names: &[&str],
    prefix: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, ScheduleWriteError> {
    if variable_names.len() != grid.dims() {
        return Err(ScheduleWriteError::NameCount {
            dims: grid.dims(),
            names: variable_names.len(),
        });
    }

    let digits = grid.decimal_digits();
    let prefix = prefix.as_ref();
    let mut written = Vec::with_capacity(grid.len());
    for (index, row) in grid.rows().iter().enumerate() {
        let path = keyword_path(prefix, index);
        write_row(&path, row, variable_names, digits)
            .map_err(|source| ScheduleWriteError::Io {
                path: path.clone(),
                source,
            })?;
        written.push(path);
    }
    Ok(written)
}

fn keyword_path(prefix: &Path, index: usize) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

fn write_row(
    path: &Path,
    row: &[f64],
    variable_names: &[&str],
    digits: usize,
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for (name, value) in variable_names.iter().zip(row) {
        writeln!(writer, "{} {:.*}", name, digits, value)?;
    }
    writer.flush()
}
