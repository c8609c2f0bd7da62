use std::{
    collections::HashMap,
    ffi::OsStr,
    io::Write as _,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Builder;
use glob::glob;
use log::LevelFilter;
use rayon::iter::{IntoParallelRefIterator as _, ParallelIterator as _};
use thiserror::Error;

use pcd_core::{pointcloud::decimation::sampler::SamplingStrategy, PcdError};
use pcd_parser::parsers::get_extension;
use pcd_pipeline::{
    AnalysisRequest, AnalysisResult, Analyzer as _, BoundsPass, LasAnalyzer, Preset,
    ProcessingOptions, StreamOptions, StreamingPipeline,
};

#[derive(Parser, Debug)]
#[command(
    name = "las2json",
    about = "Extract classified points from LAS files into JSON for web viewers",
    author = "MIERUNE Inc.",
    version = "0.0.1"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log debug messages
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter, reduce and write one JSON document (or page set) per input
    Analyze(AnalyzeArgs),
    /// Emit points as batch documents in a directory
    Stream(StreamArgs),
    /// Print the metadata document of the filtered points
    Metadata(MetadataArgs),
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Classification codes to keep, comma separated
    #[arg(short, long, value_delimiter = ',', value_name = "CODES")]
    classifications: Vec<u8>,

    /// Keep absolute coordinates instead of centering them
    #[arg(long)]
    no_normalize: bool,
}

impl FilterArgs {
    fn classifications(&self) -> Option<Vec<u8>> {
        (!self.classifications.is_empty()).then(|| self.classifications.clone())
    }
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[arg(short, long, required = true, num_args = 1.., value_name = "FILE")]
    input: Vec<String>,

    /// Output file or directory. Without it only a summary is logged.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    #[arg(long, value_enum, default_value_t = PresetArg::Default, conflicts_with = "config")]
    preset: PresetArg,

    /// JSON file with processing options; missing fields keep their defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "N")]
    max_points: Option<usize>,

    #[arg(long, value_enum)]
    sampling_strategy: Option<StrategyArg>,

    #[arg(long)]
    no_sampling: bool,

    #[arg(long)]
    no_pagination: bool,

    #[arg(long, value_name = "N")]
    page_size: Option<usize>,

    /// Seed for the random sampling strategy
    #[arg(long)]
    seed: Option<u64>,

    /// Write the in-memory JSON of a single input to stdout
    #[arg(long)]
    print_json: bool,

    /// Files processed in parallel (defaults to the number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[derive(Args, Debug)]
struct StreamArgs {
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Directory receiving batch_<n>.json
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    #[arg(short, long, default_value_t = 10_000)]
    batch_size: usize,

    #[command(flatten)]
    filter: FilterArgs,

    /// Compute normalization bounds without holding the filtered points
    #[arg(long)]
    running_bounds: bool,
}

#[derive(Args, Debug)]
struct MetadataArgs {
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Classification codes to count, comma separated. Defaults to all.
    #[arg(short, long, value_delimiter = ',', value_name = "CODES")]
    classifications: Vec<u8>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PresetArg {
    Default,
    LargeDataset,
    WebDisplay,
}

impl From<PresetArg> for Preset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Default => Preset::Default,
            PresetArg::LargeDataset => Preset::LargeDataset,
            PresetArg::WebDisplay => Preset::WebDisplay,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StrategyArg {
    Uniform,
    Random,
    Grid,
    Intensity,
}

impl From<StrategyArg> for SamplingStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Uniform => SamplingStrategy::Uniform,
            StrategyArg::Random => SamplingStrategy::Random,
            StrategyArg::Grid => SamplingStrategy::Grid,
            StrategyArg::Intensity => SamplingStrategy::Intensity,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Pcd(#[from] PcdError),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("no input files matched")]
    NoInput,

    #[error("{0} is a file path but {1} inputs were given")]
    OutputIsFile(PathBuf, usize),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(
        "{} and {} would both write {}_analysis.json",
        .0.display(),
        .1.display(),
        .2
    )]
    OutputCollision(PathBuf, PathBuf, String),

    #[error("{0} of {1} files failed")]
    Failed(usize, usize),
}

fn expand_globs(input_patterns: &[String]) -> Result<Vec<PathBuf>, CliError> {
    let mut paths = Vec::new();
    for pattern in input_patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            for entry in glob(pattern)? {
                match entry {
                    Ok(path) => paths.push(path),
                    Err(e) => log::warn!("skipping unreadable path: {}", e),
                }
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }
    if paths.is_empty() {
        return Err(CliError::NoInput);
    }
    Ok(paths)
}

fn warn_unknown_extensions(paths: &[PathBuf]) {
    for path in paths {
        let known = path
            .extension()
            .and_then(OsStr::to_str)
            .and_then(get_extension)
            .is_some();
        if !known {
            log::warn!("{} does not have a .las extension", path.display());
        }
    }
}

/// Inputs written into one output directory are named after their file stem,
/// so two inputs with the same stem would overwrite each other.
fn check_distinct_stems(paths: &[PathBuf]) -> Result<(), CliError> {
    let mut seen: HashMap<String, &PathBuf> = HashMap::new();
    for path in paths {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(previous) = seen.insert(stem.clone(), path) {
            return Err(CliError::OutputCollision(
                previous.clone(),
                path.clone(),
                stem,
            ));
        }
    }
    Ok(())
}

fn processing_options(args: &AnalyzeArgs) -> Result<ProcessingOptions, CliError> {
    let mut options = match &args.config {
        Some(path) => ProcessingOptions::from_json_file(path)?,
        None => Preset::from(args.preset).options(),
    };
    if let Some(max_points) = args.max_points {
        options.max_points_for_json = max_points;
    }
    if let Some(strategy) = args.sampling_strategy {
        options.sampling_strategy = strategy.into();
    }
    if args.no_sampling {
        options.enable_sampling = false;
    }
    if args.no_pagination {
        options.enable_pagination = false;
    }
    if let Some(page_size) = args.page_size {
        options.page_size = page_size;
    }
    if args.seed.is_some() {
        options.seed = args.seed;
    }
    options.validate()?;
    Ok(options)
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn run_analyze(args: AnalyzeArgs) -> Result<(), CliError> {
    let options = processing_options(&args)?;
    log::info!("options: {:?}", options);

    let input_files = expand_globs(&args.input)?;
    log::info!("input files: {:?}", input_files);
    warn_unknown_extensions(&input_files);

    if let Some(output) = &args.output {
        if input_files.len() > 1 {
            if is_json_path(output) {
                return Err(CliError::OutputIsFile(output.clone(), input_files.len()));
            }
            check_distinct_stems(&input_files)?;
            std::fs::create_dir_all(output).map_err(PcdError::from)?;
        }
    }

    let requests: Vec<AnalysisRequest> = input_files
        .iter()
        .map(|input| AnalysisRequest {
            input: input.clone(),
            output: args.output.clone(),
            classifications: args.filter.classifications(),
            normalize: !args.filter.no_normalize,
        })
        .collect();

    let jobs = args.jobs.unwrap_or_else(num_cpus::get).max(1);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    log::info!("processing {} files with {} jobs", requests.len(), jobs);

    let analyzer = LasAnalyzer::new(options);
    let results: Vec<AnalysisResult> = pool.install(|| {
        requests
            .par_iter()
            .map(|request| analyzer.analyze(request))
            .collect()
    });

    for (request, result) in requests.iter().zip(&results) {
        log::info!("{}: {}", request.input.display(), result);
        for path in &result.page_files {
            log::info!("  wrote {}", path.display());
        }
    }

    if args.print_json {
        match results.as_slice() {
            [result] => {
                if let Some(json) = &result.json_data {
                    let mut stdout = std::io::stdout().lock();
                    writeln!(stdout, "{}", json).map_err(PcdError::from)?;
                }
            }
            _ => log::warn!("--print-json is ignored with multiple inputs"),
        }
    }

    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        return Err(CliError::Failed(failed, results.len()));
    }
    Ok(())
}

fn run_stream(args: StreamArgs) -> Result<(), CliError> {
    let pipeline = StreamingPipeline::new(StreamOptions {
        batch_size: args.batch_size,
        normalize: !args.filter.no_normalize,
        classifications: args.filter.classifications(),
        bounds_pass: if args.running_bounds {
            BoundsPass::Running
        } else {
            BoundsPass::Retain
        },
    })?;
    let paths = pipeline.run_to_files(&args.input, &args.output)?;
    log::info!(
        "wrote {} batch files to {}",
        paths.len(),
        args.output.display()
    );
    Ok(())
}

fn run_metadata(args: MetadataArgs) -> Result<(), CliError> {
    let pipeline = StreamingPipeline::new(StreamOptions {
        classifications: (!args.classifications.is_empty()).then_some(args.classifications),
        ..Default::default()
    })?;
    let json = pipeline.metadata_json(&args.input)?;
    writeln!(std::io::stdout().lock(), "{}", json).map_err(PcdError::from)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Cli::parse();

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(
            None,
            if args.verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            },
        )
        .init();

    let start = Instant::now();
    let result = match args.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Stream(args) => run_stream(args),
        Command::Metadata(args) => run_metadata(args),
    };
    log::info!("Elapsed: {:?}", start.elapsed());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    fn analyze_args(argv: &[&str]) -> AnalyzeArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Analyze(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_preset_with_overrides() {
        let args = analyze_args(&[
            "las2json",
            "analyze",
            "-i",
            "a.las",
            "--preset",
            "large-dataset",
            "--page-size",
            "250",
            "--sampling-strategy",
            "intensity",
            "-c",
            "2,6",
        ]);
        let options = processing_options(&args).unwrap();
        assert_eq!(options.max_points_for_json, 20_000);
        assert_eq!(options.page_size, 250);
        assert_eq!(options.sampling_strategy, SamplingStrategy::Intensity);
        assert_eq!(args.filter.classifications(), Some(vec![2, 6]));
    }

    #[test]
    fn test_defaults() {
        let args = analyze_args(&["las2json", "analyze", "-i", "a.las", "b.las"]);
        assert_eq!(args.input.len(), 2);
        assert_eq!(args.filter.classifications(), None);
        assert!(!args.filter.no_normalize);
        assert_eq!(
            processing_options(&args).unwrap(),
            ProcessingOptions::default()
        );
    }

    #[test]
    fn test_invalid_override() {
        let args = analyze_args(&["las2json", "analyze", "-i", "a.las", "--max-points", "0"]);
        assert!(processing_options(&args).is_err());
    }

    #[test]
    fn test_preset_conflicts_with_config() {
        let parsed = Cli::try_parse_from([
            "las2json",
            "analyze",
            "-i",
            "a.las",
            "--preset",
            "web-display",
            "--config",
            "options.json",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_literal_inputs_are_kept() {
        let paths = expand_globs(&["missing.las".to_string()]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("missing.las")]);
    }

    #[test]
    fn test_same_stem_in_different_directories() {
        let paths = vec![
            PathBuf::from("a/line_01.las"),
            PathBuf::from("a/line_02.las"),
            PathBuf::from("b/line_01.las"),
        ];
        let err = check_distinct_stems(&paths).unwrap_err();
        assert!(matches!(err, CliError::OutputCollision(_, _, ref stem) if stem == "line_01"));
        assert!(err.to_string().contains("b/line_01.las"));

        assert!(check_distinct_stems(&paths[..2]).is_ok());
    }
}
