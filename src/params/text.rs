use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use log::warn;
use serde::Deserialize;

use super::{
    error::{ParamErr, Result},
    store::Unit,
};

/// Locations of the four text files holding the network parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParamPaths {
    pub hidden_weights: PathBuf,
    pub hidden_biases: PathBuf,
    pub output_weights: PathBuf,
    pub output_biases: PathBuf,
}

impl Default for ParamPaths {
    fn default() -> Self {
        Self {
            hidden_weights: PathBuf::from("net_params/hidden_weights.txt"),
            hidden_biases: PathBuf::from("net_params/hidden_biases.txt"),
            output_weights: PathBuf::from("net_params/out_weights.txt"),
            output_biases: PathBuf::from("net_params/out_biases.txt"),
        }
    }
}

/// Reads a whole layer, one unit per weight row paired with one bias per line.
///
/// # Arguments
/// * `weights` - The weights file, whitespace separated floats, one row per unit.
/// * `biases` - The biases file, one float per line.
/// * `layer` - Layer name used in diagnostics.
///
/// # Returns
/// The layer's units or a `ParamErr` if the files are unreadable or their unit counts differ.
pub fn read_layer(weights: &Path, biases: &Path, layer: &'static str) -> Result<Vec<Unit>> {
    let rows = parse_rows(open(weights)?, weights)?;
    let biases = parse_rows(open(biases)?, biases)?
        .into_iter()
        .map(|row| {
            if row.len() > 1 {
                warn!("{layer} bias line holds {} values, using the first", row.len());
            }
            row[0]
        })
        .collect::<Vec<_>>();

    if rows.len() != biases.len() {
        return Err(ParamErr::Shape {
            what: "bias count",
            expected: rows.len(),
            got: biases.len(),
        });
    }

    Ok(rows
        .into_iter()
        .zip(biases)
        .map(|(weights, bias)| Unit::new(weights, bias))
        .collect())
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| ParamErr::Unavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Parses every non blank line of `reader` into a row of floats.
///
/// # Arguments
/// * `reader` - The text source.
/// * `path` - The source's path, only used for error reporting.
pub fn parse_rows<R: BufRead>(reader: R, path: &Path) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| ParamErr::Unavailable {
            path: path.to_path_buf(),
            source,
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let row = line
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| ParamErr::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_rows_skip_blank_lines() {
        let text = "1 2 3\n\n  -0.5\t4e-1  6\n";
        let rows = parse_rows(Cursor::new(text), Path::new("mem")).unwrap();
        assert_eq!(rows, vec![vec![1., 2., 3.], vec![-0.5, 0.4, 6.]]);
    }

    #[test]
    fn test_bad_token_reports_its_line() {
        let text = "1 2\n3 x\n";
        let err = parse_rows(Cursor::new(text), Path::new("weights.txt")).unwrap_err();

        let ParamErr::Parse { line, token, .. } = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(line, 2);
        assert_eq!(token, "x");
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let missing = Path::new("definitely/not/here.txt");
        let err = read_layer(missing, missing, "hidden").unwrap_err();
        assert!(matches!(err, ParamErr::Unavailable { .. }));
    }
}
