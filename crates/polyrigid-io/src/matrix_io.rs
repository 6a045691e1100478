//! Plain-text 4x4 matrices.
//!
//! One row per line, whitespace-separated values. Blank lines and lines
//! starting with `#` are ignored.

use anyhow::{bail, Context, Result};
use nalgebra::Matrix4;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Read a 4x4 matrix from a text file.
pub fn read_matrix<P: AsRef<Path>>(path: P) -> Result<Matrix4<f64>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read matrix file {}", path.display()))?;
    parse_matrix(&text).with_context(|| format!("Invalid matrix file {}", path.display()))
}

/// Parse a 4x4 matrix from text.
pub fn parse_matrix(text: &str) -> Result<Matrix4<f64>> {
    let rows: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();

    if rows.len() != 4 {
        bail!("Expected 4 rows, found {}", rows.len());
    }

    let mut matrix = Matrix4::zeros();
    for (r, line) in rows.iter().enumerate() {
        let values = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .with_context(|| format!("Row {}: cannot parse '{}'", r, token))
            })
            .collect::<Result<Vec<_>>>()?;
        if values.len() != 4 {
            bail!("Row {}: expected 4 values, found {}", r, values.len());
        }
        for (c, value) in values.into_iter().enumerate() {
            matrix[(r, c)] = value;
        }
    }

    Ok(matrix)
}

/// Write a 4x4 matrix as text, one row per line.
pub fn write_matrix<P: AsRef<Path>>(path: P, matrix: &Matrix4<f64>) -> Result<()> {
    let path = path.as_ref();
    let mut text = String::new();
    for r in 0..4 {
        let row: Vec<String> = (0..4).map(|c| format!("{:.18e}", matrix[(r, c)])).collect();
        writeln!(text, "{}", row.join("  "))?;
    }
    fs::write(path, text).with_context(|| format!("Failed to write matrix file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_matrix() {
        let text = "# rigid\n1 0 0 2.5\n0 1 0 -1\n\n0 0 1 0\n0 0 0 1\n";
        let m = parse_matrix(text).unwrap();
        assert_eq!(m[(0, 3)], 2.5);
        assert_eq!(m[(1, 3)], -1.0);
        assert_eq!(m[(3, 3)], 1.0);
    }

    #[test]
    fn test_parse_matrix_rejects_bad_shape() {
        assert!(parse_matrix("1 0 0\n0 1 0\n0 0 1\n").is_err());
        assert!(parse_matrix("1 0 0 0\n0 1 0 0\n0 0 1 0\n0 0 0\n").is_err());
        assert!(parse_matrix("1 0 0 0\n0 1 0 0\n0 0 1 x\n0 0 0 1\n").is_err());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("matrix.txt");
        let m = Matrix4::new(
            0.0, -1.0, 0.0, 12.25, //
            1.0, 0.0, 0.0, -3.0, //
            0.0, 0.0, 1.0, 1.0 / 3.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        write_matrix(&path, &m).unwrap();
        assert_eq!(read_matrix(&path).unwrap(), m);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_matrix(dir.path().join("absent.txt")).unwrap_err();
        assert!(err.to_string().contains("absent.txt"));
    }
}
