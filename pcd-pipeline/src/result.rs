use std::{fmt, path::PathBuf, time::Duration};

use pcd_core::{pointcloud::filter::ClassificationHistogram, ErrorKind, PcdError};

/// Outcome of one non-streaming analysis. Failures are reported here rather
/// than as errors.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub success: bool,
    /// First written artifact, if any.
    pub output_path: Option<PathBuf>,
    pub error_message: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub processing_time: Duration,
    pub total_points: usize,
    pub filtered_points: usize,
    /// Points included in `json_data`.
    pub json_points: usize,
    pub classification_stats: ClassificationHistogram,
    pub json_data: Option<String>,
    pub is_sampled: bool,
    pub is_paginated: bool,
    pub total_pages: usize,
    pub page_files: Vec<PathBuf>,
}

impl AnalysisResult {
    pub fn failure(err: &PcdError, processing_time: Duration) -> Self {
        Self {
            success: false,
            error_message: Some(err.to_string()),
            error_kind: Some(err.kind()),
            processing_time,
            ..Default::default()
        }
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.success {
            return write!(
                f,
                "LAS analysis failed: {}",
                self.error_message.as_deref().unwrap_or("unknown error")
            );
        }
        write!(
            f,
            "LAS analysis succeeded: {} total, {} filtered, {} in JSON",
            self.total_points, self.filtered_points, self.json_points
        )?;
        if self.is_sampled {
            write!(f, " (sampled)")?;
        }
        if self.is_paginated {
            write!(f, " ({} pages)", self.total_pages)?;
        }
        write!(f, ", took {:?}", self.processing_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_result() {
        let err = PcdError::FileNotFound(PathBuf::from("/data/missing.las"));
        let result = AnalysisResult::failure(&err, Duration::from_millis(3));

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::FileNotFound));
        assert!(result.to_string().contains("missing.las"));
        assert!(result.page_files.is_empty());
        assert!(result.json_data.is_none());
    }

    #[test]
    fn test_success_summary() {
        let result = AnalysisResult {
            success: true,
            total_points: 100,
            filtered_points: 40,
            json_points: 10,
            is_paginated: true,
            total_pages: 4,
            ..Default::default()
        };
        let summary = result.to_string();
        assert!(summary.contains("100 total"));
        assert!(summary.contains("4 pages"));
        assert!(!summary.contains("sampled"));
    }
}
