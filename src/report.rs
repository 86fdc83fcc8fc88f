//! Report persistence
//!
//! Writes the final test result as timestamped pretty-printed JSON into
//! the configured output directory.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use tracing::info;

use crate::error::{Error, Result};
use crate::types::AbTestResult;

/// Save a test result to `output_dir`, returning the written path.
///
/// Filenames carry a local timestamp (`ab_test_20260830_141503.json`) so
/// repeated runs never overwrite each other.
pub fn save_result(result: &AbTestResult, output_dir: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(output_dir)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(output_dir))
        .into_owned();
    let dir = PathBuf::from(expanded);

    fs::create_dir_all(&dir).map_err(|e| Error::IoWrite {
        path: dir.clone(),
        source: e,
    })?;

    let filename = format!("ab_test_{}.json", Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(filename);

    let json = serde_json::to_string_pretty(result)
        .map_err(|e| Error::Internal(format!("Failed to serialize result: {}", e)))?;

    fs::write(&path, json).map_err(|e| Error::IoWrite {
        path: path.clone(),
        source: e,
    })?;

    info!(path = %path.display(), "Test result saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VariantAggregate, VariantReports, Winner};
    use tempfile::TempDir;

    fn sample_result() -> AbTestResult {
        AbTestResult {
            winner: Winner::B,
            confidence_score: 25.7,
            statistically_significant: true,
            variants: VariantReports {
                a: VariantAggregate::from_verdicts(&[]),
                b: VariantAggregate::from_verdicts(&[]),
            },
            recommendations: vec!["Variant B performs better".to_string()],
            failures: vec![],
        }
    }

    #[test]
    fn test_save_creates_directory_and_file() {
        let temp = TempDir::new().unwrap();
        let out_dir = temp.path().join("nested").join("results");

        let path = save_result(&sample_result(), out_dir.to_str().unwrap()).unwrap();

        assert!(path.exists());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("ab_test_"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn test_saved_json_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = save_result(&sample_result(), temp.path().to_str().unwrap()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: AbTestResult = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.winner, Winner::B);
        assert!(parsed.statistically_significant);
    }

    #[test]
    fn test_unwritable_directory_errors() {
        let result = save_result(&sample_result(), "/proc/absim-cannot-write-here");
        assert!(result.is_err());
    }
}
