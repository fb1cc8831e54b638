use std::fs;
use std::path::{Path, PathBuf};

use crate::{CoreError, Portfolio};

const PORTFOLIO_FILE: &str = "portfolio.json";

/// Resolve the data directory: `$PORTFOLIO_HOME`, else `~/.portfolio/`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("PORTFOLIO_HOME") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".portfolio")
}

/// Read access to the inventory plus a single mutation entry point, so
/// persistence happens once per completed change.
pub trait PortfolioStore {
    fn portfolio(&self) -> &Portfolio;

    fn modify<T, F>(&mut self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Portfolio) -> Result<T, CoreError>;
}

/// Plain in-memory store. Used by tests and by callers that persist elsewhere.
impl PortfolioStore for Portfolio {
    fn portfolio(&self) -> &Portfolio {
        self
    }

    fn modify<T, F>(&mut self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Portfolio) -> Result<T, CoreError>,
    {
        f(self)
    }
}

/// Inventory backed by a JSON file, rewritten after every successful change.
/// A change whose write fails is discarded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    portfolio: Portfolio,
}

impl FileStore {
    /// Open the inventory at `path`. A missing file is an empty portfolio.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let portfolio = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            Portfolio::default()
        };
        Ok(Self { path, portfolio })
    }

    /// Open `portfolio.json` inside `dir`.
    pub fn open_in(dir: &Path) -> Result<Self, CoreError> {
        Self::open(dir.join(PORTFOLIO_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomic write (temp file + rename) so readers never see a half-written file.
    fn write(&self, portfolio: &Portfolio) -> Result<(), CoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| PORTFOLIO_FILE.to_string());
        let tmp = self.path.with_file_name(format!(".{file_name}.tmp"));
        let json = serde_json::to_string_pretty(portfolio)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PortfolioStore for FileStore {
    fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    fn modify<T, F>(&mut self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Portfolio) -> Result<T, CoreError>,
    {
        // in-memory state only changes once the file holds the new version
        let mut next = self.portfolio.clone();
        let out = f(&mut next)?;
        self.write(&next)?;
        self.portfolio = next;
        Ok(out)
    }
}
