use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::{
    ledger::{Ingestion, Ledger},
    prelude::*,
    reading::DailyReading,
};

/// Durable home of a [`Ledger`].
///
/// Both directions degrade instead of failing: a missing or corrupt file reads as an empty
/// ledger, and a failed write is logged while the caller keeps its in-memory state.
/// A corrupt file is moved to [`LedgerFile::corrupt_path`] first, so that it can be recovered.
#[must_use]
#[derive(Clone, Debug)]
pub struct LedgerFile {
    path: PathBuf,
}

impl LedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn load(&self) -> Ledger {
        self.load_fallibly().unwrap_or_else(|error| {
            error!("failed to load the ledger, starting empty: {error:#}");
            Ledger::default()
        })
    }

    fn load_fallibly(&self) -> Result<Ledger> {
        if !self.path.exists() {
            debug!("the ledger does not exist yet, it will be created on the first save");
            return Ok(Ledger::default());
        }
        let contents = fs::read_to_string(&self.path).context("failed to read the ledger")?;
        serde_json::from_str::<Ledger>(&contents).or_else(|error| {
            self.set_aside();
            Err(error).context("failed to deserialize the ledger")
        })
    }

    /// Path where a corrupt ledger is moved to, out of the way of the next save.
    pub fn corrupt_path(&self) -> PathBuf {
        self.path.with_extension("json.corrupt")
    }

    fn set_aside(&self) {
        let corrupt_path = self.corrupt_path();
        match fs::rename(&self.path, &corrupt_path) {
            Ok(()) => {
                warn!(corrupt_path = %corrupt_path.display(), "moved the corrupt ledger aside");
            }
            Err(error) => error!("failed to move the corrupt ledger aside: {error:#}"),
        }
    }

    #[instrument(skip_all, fields(path = %self.path.display(), n_entries = ledger.len()))]
    pub fn save(&self, ledger: &Ledger) {
        if let Err(error) = self.save_fallibly(ledger) {
            error!("failed to save the ledger: {error:#}");
        }
    }

    /// Load, fold the reading in, and save only if a new entry is appended.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn ingest(&self, reading: DailyReading) -> Ingestion {
        let mut ledger = self.load();
        let ingestion = ledger.ingest(reading.date, reading.value);
        if matches!(ingestion, Ingestion::Appended(_)) {
            self.save(&ledger);
        }
        ingestion
    }

    /// Write the ledger next to the target and rename it over, so that a crash mid-write
    /// leaves the previous version intact.
    fn save_fallibly(&self, ledger: &Ledger) -> Result {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create `{}`", parent.display()))?;
        }

        let mut buffer = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        ledger.serialize(&mut serializer).context("failed to serialize the ledger")?;

        let temporary_path = self.path.with_extension("json.tmp");
        fs::write(&temporary_path, buffer)
            .with_context(|| format!("failed to write `{}`", temporary_path.display()))?;
        fs::rename(&temporary_path, &self.path).context("failed to replace the ledger")?;
        debug!("saved");
        Ok(())
    }
}
