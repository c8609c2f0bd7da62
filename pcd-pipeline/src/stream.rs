use std::{
    io,
    path::{Path, PathBuf},
};

use pcd_core::{
    pointcloud::{
        bounds::{BoundingBox, BoundsAccumulator},
        filter::ClassificationFilter,
    },
    PcdError, Result,
};
use pcd_exporter::{json, output::save_json};
use pcd_parser::reader::{las::LasFileReader, PointIterator, PointReader};

/// How the normalization bounds are gathered before batches are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoundsPass {
    /// Keeps every filtered point in memory while computing bounds.
    #[default]
    Retain,
    /// Running min/max only.
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOptions {
    pub batch_size: usize,
    /// Positions relative to the center of all filtered points.
    pub normalize: bool,
    /// `None` or an empty list keeps every point.
    pub classifications: Option<Vec<u8>>,
    pub bounds_pass: BoundsPass,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            normalize: true,
            classifications: None,
            bounds_pass: BoundsPass::default(),
        }
    }
}

impl StreamOptions {
    fn filter(&self) -> ClassificationFilter {
        match self.classifications.as_deref() {
            Some(classes) if !classes.is_empty() => ClassificationFilter::new(classes),
            _ => ClassificationFilter::accept_all(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSummary {
    pub batches: usize,
    pub points: usize,
    /// Bounds used for normalization, absent when positions are left as is.
    pub bounds: Option<BoundingBox>,
}

/// Scans the reader once and returns the bounds of the accepted points,
/// or `None` when nothing is accepted.
pub fn global_bounds<R: PointReader>(
    reader: &mut R,
    filter: &ClassificationFilter,
    pass: BoundsPass,
) -> io::Result<Option<BoundingBox>> {
    match pass {
        BoundsPass::Retain => {
            let mut retained = Vec::new();
            while let Some(point) = reader.next_point()? {
                if filter.accepts(&point) {
                    retained.push(point);
                }
            }
            log::debug!("bounds pass retained {} points", retained.len());
            Ok((!retained.is_empty()).then(|| BoundingBox::from_points(&retained)))
        }
        BoundsPass::Running => {
            let mut accumulator = BoundsAccumulator::new();
            while let Some(point) = reader.next_point()? {
                if filter.accepts(&point) {
                    accumulator.add(&point);
                }
            }
            Ok(accumulator.finish())
        }
    }
}

/// Emits a LAS file as a sequence of batch documents.
///
/// Records are read from disk one at a time. With normalization on, the file
/// is read twice: once for the global bounds, then again to emit batches
/// relative to their center.
pub struct StreamingPipeline {
    options: StreamOptions,
}

impl StreamingPipeline {
    pub fn new(options: StreamOptions) -> Result<Self> {
        if options.batch_size == 0 {
            return Err(PcdError::invalid_argument("batch size must be positive"));
        }
        Ok(Self { options })
    }

    fn empty_result(filter: &ClassificationFilter) -> PcdError {
        PcdError::EmptyResult {
            classifications: filter.classifications(),
        }
    }

    /// Hands each batch document to `consumer` in file order. A consumer
    /// error stops the stream and is returned as is.
    pub fn run<F>(&self, input: &Path, mut consumer: F) -> Result<StreamSummary>
    where
        F: FnMut(String) -> Result<()>,
    {
        let mut reader = LasFileReader::open(input)?;
        let filter = self.options.filter();

        let bounds = if self.options.normalize {
            let bounds = global_bounds(&mut reader, &filter, self.options.bounds_pass)?
                .ok_or_else(|| Self::empty_result(&filter))?;
            log::info!("{}: global bounds {}", input.display(), bounds);
            reader.reset()?;
            Some(bounds)
        } else {
            None
        };
        let center = bounds.as_ref().map(|b| b.center);

        let mut summary = StreamSummary {
            bounds,
            ..Default::default()
        };
        for batch in PointIterator::new(reader, self.options.batch_size, filter.clone()) {
            let batch = batch?;
            consumer(json::encode_batch(&batch, center)?)?;
            summary.batches += 1;
            summary.points += batch.len();
            log::debug!("batch {}: {} points", summary.batches, batch.len());
        }

        if summary.points == 0 {
            return Err(Self::empty_result(&filter));
        }
        log::info!(
            "{}: streamed {} points in {} batches",
            input.display(),
            summary.points,
            summary.batches
        );
        Ok(summary)
    }

    /// Writes batches to `<output_dir>/batch_<i>.json`, starting at 0.
    pub fn run_to_files(&self, input: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)?;
        let mut paths = Vec::new();
        self.run(input, |batch| {
            let path = output_dir.join(format!("batch_{}.json", paths.len()));
            save_json(&batch, &path)?;
            paths.push(path);
            Ok(())
        })?;
        Ok(paths)
    }

    /// Metadata document for the filtered points, produced in one pass.
    pub fn metadata_json(&self, input: &Path) -> Result<String> {
        let mut reader = LasFileReader::open(input)?;
        let filter = self.options.filter();

        let mut accumulator = BoundsAccumulator::new();
        while let Some(point) = reader.next_point()? {
            if filter.accepts(&point) {
                accumulator.add(&point);
            }
        }
        let bounds = accumulator
            .finish()
            .ok_or_else(|| Self::empty_result(&filter))?;

        let original_file = input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        json::encode_metadata(accumulator.count(), &bounds, &original_file)
    }
}
