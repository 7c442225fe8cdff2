//! File-system store implementation.

use seeker_core::{ArtifactStore, PageKind, RefinedSeries, Result, SeekerError, StockCode};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Suffix of refined artifacts.
const REFINED_SUFFIX: &str = "refined";

/// A directory of CSV artifacts.
///
/// Raw pages live in `{code}.{page}.csv` and refined series in
/// `{code}.refined.csv`. Files are named deterministically so that presence of
/// a file is the cache-hit signal.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| SeekerError::Store(e.to_string()))?;
        debug!(root = %root.display(), "File-system store opened");
        Ok(Self { root })
    }

    /// The directory holding the artifacts.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a raw page file.
    #[must_use]
    pub fn page_path(&self, code: &StockCode, page: PageKind) -> PathBuf {
        self.root.join(format!("{code}.{page}.csv"))
    }

    /// Path of a refined artifact file.
    #[must_use]
    pub fn refined_path(&self, code: &StockCode) -> PathBuf {
        self.root.join(format!("{code}.{REFINED_SUFFIX}.csv"))
    }

    /// Writes through a sibling temporary file so readers never see a partial artifact.
    fn write_atomic(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> Result<()>) -> Result<()> {
        let tmp = path.with_extension("csv.tmp");
        {
            let file = File::create(&tmp).map_err(|e| SeekerError::Store(e.to_string()))?;
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
        }
        fs::rename(&tmp, path).map_err(|e| SeekerError::Store(e.to_string()))
    }
}

impl ArtifactStore for FsStore {
    fn has_page(&self, code: &StockCode, page: PageKind) -> Result<bool> {
        Ok(self.page_path(code, page).is_file())
    }

    #[instrument(skip(self), fields(stock = %code, page = %page))]
    fn get_page(&self, code: &StockCode, page: PageKind) -> Result<Option<String>> {
        match fs::read_to_string(self.page_path(code, page)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Raw page not found");
                Ok(None)
            }
            Err(e) => Err(SeekerError::Store(e.to_string())),
        }
    }

    #[instrument(skip(self, text), fields(stock = %code, page = %page, bytes = text.len()))]
    fn put_page(&self, code: &StockCode, page: PageKind, text: &str) -> Result<()> {
        Self::write_atomic(&self.page_path(code, page), |w| {
            use std::io::Write;
            w.write_all(text.as_bytes())
                .and_then(|()| w.flush())
                .map_err(|e| SeekerError::Store(e.to_string()))
        })?;
        debug!("Saved raw page");
        Ok(())
    }

    fn has_refined(&self, code: &StockCode) -> Result<bool> {
        Ok(self.refined_path(code).is_file())
    }

    #[instrument(skip(self), fields(stock = %code))]
    fn get_refined(&self, code: &StockCode) -> Result<Option<RefinedSeries>> {
        let file = match File::open(self.refined_path(code)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SeekerError::Store(e.to_string())),
        };
        RefinedSeries::read_csv(BufReader::new(file)).map(Some)
    }

    #[instrument(skip(self, series), fields(stock = %code, rows = series.len()))]
    fn put_refined(&self, code: &StockCode, series: &RefinedSeries) -> Result<()> {
        Self::write_atomic(&self.refined_path(code), |w| series.write_csv(w))?;
        debug!("Saved refined series");
        Ok(())
    }

    #[instrument(skip(self))]
    fn clear(&self) -> Result<()> {
        let entries = fs::read_dir(&self.root).map_err(|e| SeekerError::Store(e.to_string()))?;
        let mut removed = 0usize;
        for entry in entries {
            let path = entry.map_err(|e| SeekerError::Store(e.to_string()))?.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                fs::remove_file(&path).map_err(|e| SeekerError::Store(e.to_string()))?;
                removed += 1;
            }
        }
        debug!("Removed {} artifacts", removed);
        Ok(())
    }
}
