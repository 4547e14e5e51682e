//! Batch screening of image files found under a directory tree.
//!
//! Every file whose name ends with the configured suffix (`_rois.tif` by
//! default) is loaded through a [`VolumeLoader`], screened, and recorded as a
//! tab-separated `filename\tTrue|False` row in `results.csv` next to it
//! (fields containing a tab are quoted).
//! Rows are written in processing order, which is sorted path order. A file
//! that fails to load or screen is logged and reported, and the batch moves
//! on.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{ConfigError, Result, VolumeError};
use crate::integration::{Detector, ScreeningPipeline};
use crate::volume::{ImageVolume, Region};

pub const DEFAULT_SUFFIX: &str = "_rois.tif";
pub const RESULTS_FILE: &str = "results.csv";

/// A decoded image and the regions drawn on it.
pub struct LoadedImage {
    pub volume: Box<dyn ImageVolume + Send>,
    pub overlay: Vec<Region>,
}

/// Decodes image files. Every call returns an independent copy.
pub trait VolumeLoader: Sync {
    fn load(&self, path: &Path) -> std::result::Result<LoadedImage, VolumeError>;
}

impl<F> VolumeLoader for F
where
    F: Fn(&Path) -> std::result::Result<LoadedImage, VolumeError> + Sync,
{
    fn load(&self, path: &Path) -> std::result::Result<LoadedImage, VolumeError> {
        self(path)
    }
}

/// What to do with `results.csv` files left over from an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputMode {
    /// Append rows, keeping earlier ones
    #[default]
    Append,
    /// Truncate each results file before the run
    Fresh,
    /// Leave files already listed in their results file alone
    SkipExisting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Verdict(bool),
    Failed(String),
    /// Already listed in the results file (`OutputMode::SkipExisting`)
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn exceeded(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Verdict(true)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|f| pred(&f.outcome)).count()
    }
}

pub struct BatchDriver<L: VolumeLoader> {
    config: PipelineConfig,
    loader: L,
    suffix: String,
    output_mode: OutputMode,
    workers: usize,
}

impl<L: VolumeLoader> BatchDriver<L> {
    /// Create a driver; the configuration is validated before any file is read.
    pub fn new(config: PipelineConfig, loader: L) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            loader,
            suffix: DEFAULT_SUFFIX.to_string(),
            output_mode: OutputMode::default(),
            workers: 1,
        })
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    /// Number of files screened concurrently. Values below 2 run sequentially.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Matching files under `root`, recursively, sorted by path.
    ///
    /// An unreadable `root` is an error; unreadable subdirectories are logged
    /// and skipped.
    pub fn find_inputs(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        let mut dirs = Vec::new();
        self.scan_dir(root, fs::read_dir(root)?, &mut dirs, &mut found);
        while let Some(dir) = dirs.pop() {
            match fs::read_dir(&dir) {
                Ok(entries) => self.scan_dir(&dir, entries, &mut dirs, &mut found),
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), "cannot read directory, skipping: {}", e)
                }
            }
        }
        found.sort();
        Ok(found)
    }

    fn scan_dir(
        &self,
        dir: &Path,
        entries: fs::ReadDir,
        dirs: &mut Vec<PathBuf>,
        found: &mut Vec<PathBuf>,
    ) {
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), "cannot read directory entry: {}", e);
                    continue;
                }
            };
            if path.is_dir() {
                dirs.push(path);
            } else if file_name(&path).ends_with(&self.suffix) {
                found.push(path);
            }
        }
    }

    pub fn run(&self, root: &Path) -> Result<BatchReport> {
        let inputs = self.find_inputs(root)?;
        tracing::info!(files = inputs.len(), root = %root.display(), "starting batch");

        let result_files: Vec<PathBuf> = {
            let mut seen = HashSet::new();
            inputs
                .iter()
                .map(|p| results_path(p))
                .filter(|p| seen.insert(p.clone()))
                .collect()
        };

        let mut already_done = HashSet::new();
        match self.output_mode {
            OutputMode::Append => {}
            OutputMode::Fresh => {
                for path in &result_files {
                    fs::File::create(path)?;
                }
            }
            OutputMode::SkipExisting => {
                for path in &result_files {
                    already_done.extend(recorded_files(path)?);
                }
            }
        }

        let (todo, skipped): (Vec<&PathBuf>, Vec<&PathBuf>) =
            inputs.iter().partition(|p| !already_done.contains(*p));

        let processed = self.process_all(&todo);

        let mut outcomes = Vec::with_capacity(inputs.len());
        for (path, outcome) in todo.into_iter().zip(processed) {
            if let Outcome::Verdict(exceeded) = outcome {
                append_row(&results_path(path), &file_name(path), exceeded)?;
            }
            outcomes.push(FileOutcome {
                path: path.clone(),
                outcome,
            });
        }
        for path in skipped {
            tracing::debug!(file = %path.display(), "already recorded, skipping");
            outcomes.push(FileOutcome {
                path: path.clone(),
                outcome: Outcome::Skipped,
            });
        }
        outcomes.sort_by(|a, b| a.path.cmp(&b.path));

        let report = BatchReport { outcomes };
        tracing::info!(
            files = report.outcomes.len(),
            exceeded = report.exceeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            "batch done"
        );
        Ok(report)
    }

    fn process_all(&self, paths: &[&PathBuf]) -> Vec<Outcome> {
        if self.workers > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
            {
                Ok(pool) => {
                    return pool.install(|| paths.par_iter().map(|p| self.process_file(p)).collect());
                }
                Err(e) => tracing::warn!("cannot start worker pool, running sequentially: {}", e),
            }
        }
        paths.iter().map(|p| self.process_file(p)).collect()
    }

    /// Screen one file. Failures become [`Outcome::Failed`].
    pub fn process_file(&self, path: &Path) -> Outcome {
        let name = file_name(path);
        let image = match self.loader.load(path) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(file = %path.display(), "cannot load image: {}", e);
                return Outcome::Failed(e.to_string());
            }
        };

        let detector = Detector::from_kind(
            self.config.detector,
            self.config.min_spot_radius,
            &image.overlay,
        );
        let verdict = ScreeningPipeline::new(detector, &self.config)
            .map_err(|e| e.to_string())
            .and_then(|p| p.screen(&*image.volume, name.clone()).map_err(|e| e.to_string()));

        match verdict {
            Ok(verdict) => {
                tracing::info!(file = %name, exceeded = verdict.threshold_exceeded, "screened");
                Outcome::Verdict(verdict.threshold_exceeded)
            }
            Err(message) => {
                tracing::warn!(file = %path.display(), "screening failed: {}", message);
                Outcome::Failed(message)
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn results_path(input: &Path) -> PathBuf {
    input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(RESULTS_FILE)
}

/// Paths of the files listed in a results file.
fn recorded_files(results: &Path) -> Result<Vec<PathBuf>> {
    if !results.exists() {
        return Ok(Vec::new());
    }
    let dir = results.parent().unwrap_or_else(|| Path::new("."));
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_path(results)?;

    let mut recorded = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(name) = record.get(0).filter(|name| !name.is_empty()) {
            recorded.push(dir.join(name));
        }
    }
    Ok(recorded)
}

fn append_row(results: &Path, name: &str, exceeded: bool) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(results)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(file);
    writer.write_record([name, if exceeded { "True" } else { "False" }])?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{Shape, StackVolume, VolumeDims};
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    /// Bright images have "bright" in their name; "broken" ones fail to load.
    fn loader(path: &Path) -> std::result::Result<LoadedImage, VolumeError> {
        let name = file_name(path);
        if name.contains("broken") {
            return Err(VolumeError::Decode {
                path: path.to_path_buf(),
                message: "truncated file".into(),
            });
        }
        let level = if name.contains("bright") { 900.0 } else { 100.0 };
        let volume = Box::new(StackVolume::from_fn(
            VolumeDims::new(2, 1, 2, 32, 32),
            |_, _, _, _, _| level,
        ));
        let overlay = (0..2)
            .map(|t| Region::at(Shape::disk(10.0 + t as f64, 10.0, 3.0), 0, t))
            .collect();
        Ok(LoadedImage { volume, overlay })
    }

    fn setup() -> tempfile::TempDir {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("a_rois.tif"));
        touch(&tmp.path().join("b_bright_rois.tif"));
        touch(&tmp.path().join("notes.txt"));
        touch(&tmp.path().join("sub/c_broken_rois.tif"));
        touch(&tmp.path().join("sub/d_bright_rois.tif"));
        tmp
    }

    fn rows(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_find_inputs_filters_suffix() {
        let tmp = setup();
        let driver = BatchDriver::new(PipelineConfig::default(), loader).unwrap();
        let inputs = driver.find_inputs(tmp.path()).unwrap();
        let names: Vec<String> = inputs.iter().map(|p| file_name(p)).collect();
        assert_eq!(
            names,
            vec!["a_rois.tif", "b_bright_rois.tif", "c_broken_rois.tif", "d_bright_rois.tif"]
        );
    }

    #[test]
    fn test_run_writes_rows_and_continues_after_failure() {
        let tmp = setup();
        let driver = BatchDriver::new(PipelineConfig::default(), loader).unwrap();
        let report = driver.run(tmp.path()).unwrap();

        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.exceeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            rows(&tmp.path().join(RESULTS_FILE)),
            vec!["a_rois.tif\tFalse", "b_bright_rois.tif\tTrue"]
        );
        assert_eq!(
            rows(&tmp.path().join("sub").join(RESULTS_FILE)),
            vec!["d_bright_rois.tif\tTrue"]
        );
    }

    #[test]
    fn test_output_modes() {
        let tmp = setup();
        let results = tmp.path().join(RESULTS_FILE);

        let driver = BatchDriver::new(PipelineConfig::default(), loader).unwrap();
        driver.run(tmp.path()).unwrap();
        driver.run(tmp.path()).unwrap();
        assert_eq!(rows(&results).len(), 4);

        let driver = driver.with_output_mode(OutputMode::Fresh);
        driver.run(tmp.path()).unwrap();
        assert_eq!(rows(&results).len(), 2);

        let driver = driver.with_output_mode(OutputMode::SkipExisting);
        let report = driver.run(tmp.path()).unwrap();
        assert_eq!(rows(&results).len(), 2);
        assert_eq!(report.skipped(), 3);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_workers_keep_order() {
        let tmp = setup();
        let sequential = BatchDriver::new(PipelineConfig::default(), loader)
            .unwrap()
            .with_output_mode(OutputMode::Fresh);
        let a = sequential.run(tmp.path()).unwrap();
        let first = rows(&tmp.path().join(RESULTS_FILE));

        let parallel = sequential.with_workers(4);
        let b = parallel.run(tmp.path()).unwrap();
        assert_eq!(a.outcomes, b.outcomes);
        assert_eq!(rows(&tmp.path().join(RESULTS_FILE)), first);
    }

    #[test]
    fn test_tab_in_file_name_is_quoted() {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("we\tird_rois.tif"));
        let results = tmp.path().join(RESULTS_FILE);

        let driver = BatchDriver::new(PipelineConfig::default(), loader).unwrap();
        driver.run(tmp.path()).unwrap();
        assert_eq!(rows(&results), vec!["\"we\tird_rois.tif\"\tFalse"]);

        let report = driver
            .with_output_mode(OutputMode::SkipExisting)
            .run(tmp.path())
            .unwrap();
        assert_eq!(report.skipped(), 1);
        assert_eq!(rows(&results).len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = setup();
        let locked = tmp.path().join("locked");
        touch(&locked.join("e_rois.tif"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let driver = BatchDriver::new(PipelineConfig::default(), loader).unwrap();
        let report = driver.run(tmp.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users can still read the locked directory
        let report = report.unwrap();
        let names: Vec<String> = report.outcomes.iter().map(|o| file_name(&o.path)).collect();
        for expected in ["a_rois.tif", "b_bright_rois.tif", "c_broken_rois.tif", "d_bright_rois.tif"] {
            assert!(names.iter().any(|n| n == expected));
        }
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_missing_root_is_error() {
        let tmp = tempdir().unwrap();
        let driver = BatchDriver::new(PipelineConfig::default(), loader).unwrap();
        assert!(driver.run(&tmp.path().join("missing")).is_err());
    }

    #[test]
    fn test_invalid_config_rejected_before_run() {
        let config = PipelineConfig {
            max_linking_distance: -1.0,
            ..PipelineConfig::default()
        };
        assert!(BatchDriver::new(config, loader).is_err());
    }
}
