use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use pcd_core::{
    pointcloud::{bounds::BoundingBox, filter::ClassificationFilter},
    PcdError, Result,
};
use pcd_exporter::{
    json,
    output::{resolve_output_path, save_json, write_json_file},
    pagination,
};
use pcd_parser::parsers::{las::LasParserProvider, ParserProvider as _};

use crate::{options::ProcessingOptions, result::AnalysisResult};

/// Input and output of a single analysis.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub input: PathBuf,
    /// Where to write JSON. Nothing is written when `None`.
    pub output: Option<PathBuf>,
    /// Classes to keep. `None` or an empty list keeps classes 16 and 0.
    pub classifications: Option<Vec<u8>>,
    pub normalize: bool,
}

impl AnalysisRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            classifications: None,
            normalize: true,
        }
    }

    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn classifications(mut self, classifications: &[u8]) -> Self {
        self.classifications = Some(classifications.to_vec());
        self
    }

    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    fn original_file(&self) -> String {
        self.input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.to_string_lossy().into_owned())
    }
}

/// How a filtered point set is turned into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Full,
    Sampled,
    Paginated,
}

impl Reduction {
    /// Sampling wins over pagination when both are enabled.
    pub fn plan(filtered_points: usize, options: &ProcessingOptions) -> Self {
        if filtered_points <= options.max_points_for_json {
            Self::Full
        } else if options.enable_sampling {
            Self::Sampled
        } else if options.enable_pagination {
            Self::Paginated
        } else {
            Self::Full
        }
    }
}

pub trait Analyzer {
    fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult;
}

pub struct LasAnalyzer {
    options: ProcessingOptions,
}

impl Default for LasAnalyzer {
    fn default() -> Self {
        Self::new(ProcessingOptions::default())
    }
}

impl LasAnalyzer {
    pub fn new(options: ProcessingOptions) -> Self {
        Self { options }
    }

    fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.options.validate()?;

        let parser = LasParserProvider {
            filename: request.input.clone(),
        }
        .get_parser();
        let point_cloud = parser.parse()?;
        let total_points = point_cloud.len();

        let filter = ClassificationFilter::from_option(request.classifications.as_deref());
        let filtered = filter.apply(point_cloud.points);
        log::info!(
            "{}: kept {} of {} points (classes {:?})",
            request.input.display(),
            filtered.len(),
            total_points,
            filter.classifications()
        );
        for (class, count) in &filtered.histogram {
            log::debug!("class {}: {} points", class, count);
        }
        if filtered.is_empty() {
            return Err(PcdError::EmptyResult {
                classifications: filter.classifications(),
            });
        }

        let original_file = request.original_file();
        let bounds = BoundingBox::from_points(&filtered.points);
        log::debug!("bounds: {}", bounds);

        let mut result = AnalysisResult {
            success: true,
            total_points,
            filtered_points: filtered.len(),
            classification_stats: filtered.histogram.clone(),
            total_pages: 1,
            ..Default::default()
        };

        let points = &filtered.points;
        match Reduction::plan(points.len(), &self.options) {
            Reduction::Sampled => {
                let sampler = self
                    .options
                    .sampling_strategy
                    .sampler(self.options.max_points_for_json, self.options.seed);
                let sampled = sampler.sample(points);
                log::info!(
                    "sampled {} of {} points ({})",
                    sampled.len(),
                    points.len(),
                    self.options.sampling_strategy
                );
                // normalized against the whole filtered set, not the sample
                result.json_data = Some(json::encode_full(
                    &sampled,
                    &bounds,
                    request.normalize,
                    &original_file,
                )?);
                result.json_points = sampled.len();
                result.is_sampled = true;

                if let Some(output) = &request.output {
                    let path = resolve_output_path(output, &original_file)?;
                    write_json_file(&path, |writer| {
                        json::write_full(writer, points, &bounds, request.normalize, &original_file)
                    })?;
                    result.page_files.push(path);
                }
            }
            Reduction::Paginated => {
                let page_size = self.options.page_size;
                let pages = pagination::paginate(points, page_size)?;
                result.is_paginated = true;
                result.total_pages = pages.len();
                if let Some(first) = pages.first() {
                    result.json_data = Some(first.encode(request.normalize, &original_file)?);
                    result.json_points = first.points.len();
                }
                log::info!(
                    "paginated {} points into {} pages of {}",
                    points.len(),
                    pages.len(),
                    page_size
                );

                if let Some(output) = &request.output {
                    let base = resolve_output_path(output, &original_file)?;
                    result.page_files = pagination::write_pages(
                        points,
                        page_size,
                        &base,
                        request.normalize,
                        &original_file,
                    )?;
                }
            }
            Reduction::Full => {
                let json = json::encode_full(points, &bounds, request.normalize, &original_file)?;
                if let Some(output) = &request.output {
                    let path = resolve_output_path(output, &original_file)?;
                    save_json(&json, &path)?;
                    result.page_files.push(path);
                }
                result.json_data = Some(json);
                result.json_points = points.len();
            }
        }

        result.output_path = result.page_files.first().cloned();
        Ok(result)
    }
}

impl Analyzer for LasAnalyzer {
    fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult {
        let start = Instant::now();
        match self.run(request) {
            Ok(mut result) => {
                result.processing_time = start.elapsed();
                log::info!("{}", result);
                result
            }
            Err(err) => {
                log::error!("{}: {}", request.input.display(), err);
                AnalysisResult::failure(&err, start.elapsed())
            }
        }
    }
}

/// Default options, normalized, written to `output`.
pub fn analyze(input: &Path, output: &Path) -> AnalysisResult {
    LasAnalyzer::default().analyze(&AnalysisRequest::new(input).output(output))
}

pub fn analyze_for_web(input: &Path, output: &Path, classifications: &[u8]) -> AnalysisResult {
    LasAnalyzer::new(ProcessingOptions::for_web_display()).analyze(
        &AnalysisRequest::new(input)
            .output(output)
            .classifications(classifications),
    )
}

pub fn analyze_for_large_dataset(
    input: &Path,
    output: &Path,
    classifications: &[u8],
) -> AnalysisResult {
    LasAnalyzer::new(ProcessingOptions::for_large_dataset()).analyze(
        &AnalysisRequest::new(input)
            .output(output)
            .classifications(classifications),
    )
}

/// In-memory JSON only; nothing is written.
pub fn analyze_to_json(input: &Path, classifications: &[u8], normalize: bool) -> AnalysisResult {
    LasAnalyzer::default().analyze(
        &AnalysisRequest::new(input)
            .classifications(classifications)
            .normalize(normalize),
    )
}

/// In-memory JSON sampled down to `max_points`, with default classes.
pub fn analyze_json_sampled(input: &Path, max_points: usize) -> AnalysisResult {
    let options = ProcessingOptions {
        max_points_for_json: max_points,
        enable_sampling: true,
        ..Default::default()
    };
    LasAnalyzer::new(options).analyze(&AnalysisRequest::new(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction_plan() {
        let options = ProcessingOptions::default();
        assert_eq!(Reduction::plan(50_000, &options), Reduction::Full);
        assert_eq!(Reduction::plan(50_001, &options), Reduction::Sampled);

        let paginate_only = ProcessingOptions {
            enable_sampling: false,
            ..Default::default()
        };
        assert_eq!(
            Reduction::plan(50_001, &paginate_only),
            Reduction::Paginated
        );

        let neither = ProcessingOptions {
            enable_sampling: false,
            enable_pagination: false,
            ..Default::default()
        };
        assert_eq!(Reduction::plan(1_000_000, &neither), Reduction::Full);
    }

    #[test]
    fn test_web_preset_samples_before_paginating() {
        let options = ProcessingOptions::for_web_display();
        assert_eq!(Reduction::plan(10_001, &options), Reduction::Sampled);
    }

    #[test]
    fn test_request_original_file() {
        let request = AnalysisRequest::new("/data/survey/line_01.las");
        assert_eq!(request.original_file(), "line_01.las");
        assert!(request.normalize);
        assert!(request.output.is_none());
    }

    #[test]
    fn test_invalid_options_fail_the_result() {
        let analyzer = LasAnalyzer::new(ProcessingOptions {
            max_points_for_json: 0,
            ..Default::default()
        });
        let result = analyzer.analyze(&AnalysisRequest::new("missing.las"));
        assert!(!result.success);
        assert_eq!(
            result.error_kind,
            Some(pcd_core::ErrorKind::InvalidArgument)
        );
    }
}
