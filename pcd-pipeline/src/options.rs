use std::path::Path;

use pcd_core::{pointcloud::decimation::sampler::SamplingStrategy, PcdError, Result};
use serde::{Deserialize, Serialize};

/// Controls how a filtered point set is reduced before JSON encoding.
///
/// Missing fields in a deserialized options file keep their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Filtered sets larger than this are sampled or paginated.
    pub max_points_for_json: usize,
    pub enable_sampling: bool,
    pub enable_pagination: bool,
    pub page_size: usize,
    /// Reserved. Output is never compressed.
    pub enable_compression: bool,
    pub sampling_strategy: SamplingStrategy,
    /// Seed for [`SamplingStrategy::Random`]; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            max_points_for_json: 50_000,
            enable_sampling: true,
            enable_pagination: true,
            page_size: 10_000,
            enable_compression: false,
            sampling_strategy: SamplingStrategy::Uniform,
            seed: None,
        }
    }
}

impl ProcessingOptions {
    pub fn for_large_dataset() -> Self {
        Self {
            max_points_for_json: 20_000,
            enable_sampling: true,
            sampling_strategy: SamplingStrategy::Grid,
            ..Default::default()
        }
    }

    pub fn for_web_display() -> Self {
        Self {
            max_points_for_json: 10_000,
            enable_sampling: true,
            enable_pagination: true,
            page_size: 5_000,
            ..Default::default()
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PcdError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            PcdError::invalid_argument(format!("invalid options file {}: {}", path.display(), e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_points_for_json == 0 {
            return Err(PcdError::invalid_argument(
                "max_points_for_json must be positive",
            ));
        }
        if self.page_size == 0 {
            return Err(PcdError::invalid_argument("page_size must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preset {
    #[default]
    Default,
    LargeDataset,
    WebDisplay,
}

impl Preset {
    pub fn options(self) -> ProcessingOptions {
        match self {
            Self::Default => ProcessingOptions::default(),
            Self::LargeDataset => ProcessingOptions::for_large_dataset(),
            Self::WebDisplay => ProcessingOptions::for_web_display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcd_core::ErrorKind;

    #[test]
    fn test_presets() {
        let default = Preset::Default.options();
        assert_eq!(default.max_points_for_json, 50_000);
        assert_eq!(default.page_size, 10_000);
        assert_eq!(default.sampling_strategy, SamplingStrategy::Uniform);
        assert!(!default.enable_compression);

        let large = Preset::LargeDataset.options();
        assert_eq!(large.max_points_for_json, 20_000);
        assert_eq!(large.sampling_strategy, SamplingStrategy::Grid);

        let web = Preset::WebDisplay.options();
        assert_eq!(web.max_points_for_json, 10_000);
        assert!(web.enable_pagination);
        assert_eq!(web.page_size, 5_000);
    }

    #[test]
    fn test_partial_options_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(
            &path,
            r#"{"max_points_for_json": 1234, "sampling_strategy": "intensity", "seed": 9}"#,
        )
        .unwrap();

        let options = ProcessingOptions::from_json_file(&path).unwrap();
        assert_eq!(options.max_points_for_json, 1234);
        assert_eq!(options.sampling_strategy, SamplingStrategy::Intensity);
        assert_eq!(options.seed, Some(9));
        assert_eq!(options.page_size, 10_000);
        assert!(options.enable_sampling);
    }

    #[test]
    fn test_invalid_options_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"page_size": "big"}"#).unwrap();
        let err = ProcessingOptions::from_json_file(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_validate() {
        let options = ProcessingOptions {
            page_size: 0,
            ..Default::default()
        };
        assert_eq!(
            options.validate().unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert!(ProcessingOptions::default().validate().is_ok());
    }
}
