use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::grid::ClusterOptions;
use crate::stem::LinkOptions;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where to write the JSON report; printed to stdout when absent.
    pub json_out: Option<PathBuf>,
    /// Appends the final interpretation graphs to the report.
    pub include_graphs: bool,
    /// Skips the text summary.
    pub quiet: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    /// Page description, see [`PageInput`](crate::input::PageInput).
    pub input: PathBuf,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub clusters: ClusterOptions,
    #[serde(default)]
    pub stems: LinkOptions,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_default_when_missing() {
        let config: RuntimeConfig = serde_json::from_str(
            r#"{ "input": "page.json", "stems": { "stem": { "maxYGap": 0.7 } } }"#,
        )
        .unwrap();
        assert_eq!(config.input, PathBuf::from("page.json"));
        assert!(config.output.json_out.is_none());
        assert_eq!(config.clusters.pop_size, 5);
        assert!((config.stems.stem.max_y_gap - 0.7).abs() < 1e-12);
        assert!((config.stems.stem.min_stem_extension - 0.8).abs() < 1e-12);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_config(Path::new("/nonexistent/omr.json")).unwrap_err();
        assert!(err.starts_with("Failed to read config"));
    }
}
