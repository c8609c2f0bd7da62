use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use pcd_core::Result;

const ANALYSIS_SUFFIX: &str = "_analysis.json";

fn analysis_file_name(original_file: &str) -> String {
    let stem = Path::new(original_file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| original_file.to_string());
    format!("{}{}", stem, ANALYSIS_SUFFIX)
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn ends_with_separator(path: &Path) -> bool {
    path.as_os_str()
        .to_string_lossy()
        .ends_with(&['/', '\\'][..])
}

/// Decides where the JSON for `original_file` goes.
///
/// - an existing directory, or a path ending in a separator, receives
///   `<stem>_analysis.json` (the directory is created if needed)
/// - a path without a `.json` extension whose parent does not exist is
///   created as a directory and treated the same way
/// - any other path without a `.json` extension gets one appended
/// - a `.json` path is used as is, creating its parent directory
pub fn resolve_output_path(output: &Path, original_file: &str) -> Result<PathBuf> {
    if output.is_dir() {
        return Ok(output.join(analysis_file_name(original_file)));
    }
    if ends_with_separator(output) {
        fs::create_dir_all(output)?;
        return Ok(output.join(analysis_file_name(original_file)));
    }
    if !has_json_extension(output) {
        let parent_missing = output
            .parent()
            .is_some_and(|p| !p.as_os_str().is_empty() && !p.exists());
        if parent_missing {
            fs::create_dir_all(output)?;
            return Ok(output.join(analysis_file_name(original_file)));
        }
        let mut with_extension = output.as_os_str().to_owned();
        with_extension.push(".json");
        return Ok(PathBuf::from(with_extension));
    }
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(output.to_path_buf())
}

/// Path of page `number` out of `total`, derived from the resolved output path.
pub fn page_file_path(base: &Path, number: usize, total: usize) -> PathBuf {
    let mut name = base.with_extension("").into_os_string();
    name.push(format!("_page_{}_of_{}.json", number, total));
    PathBuf::from(name)
}

/// Creates `path` (and its parent directory) and hands a buffered writer to `write`.
pub fn write_json_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    write(&mut writer)?;
    writer.flush()?;

    let size = fs::metadata(path)?.len();
    log::info!(
        "wrote {} ({:.2} MB)",
        path.display(),
        size as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}

pub fn save_json(json: &str, path: &Path) -> Result<()> {
    write_json_file(path, |writer| Ok(writer.write_all(json.as_bytes())?))
}
