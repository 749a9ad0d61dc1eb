use anyhow::Result;
use bincode::{deserialize, serialize};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use flicklist_models::{MediaKind, ProgressRow, WatchedRow};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Local watched and progress tables, one table per media kind.
///
/// Every write replaces a whole table. Readers never observe a half-written
/// table.
pub trait IndexStore: Send + Sync {
    fn replace_watched(&self, kind: MediaKind, rows: Vec<WatchedRow>) -> Result<()>;

    fn replace_progress(&self, kind: MediaKind, rows: Vec<ProgressRow>) -> Result<()>;

    fn watched(&self, kind: MediaKind) -> Result<Vec<WatchedRow>>;

    fn progress(&self, kind: MediaKind) -> Result<Vec<ProgressRow>>;

    /// Drop every table
    fn clear(&self) -> Result<()>;
}

/// Gzipped bincode files, one per table, under the index directory
pub struct FileIndexStore {
    dir: PathBuf,
}

impl FileIndexStore {
    pub fn new(index_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(index_dir)?;
        Ok(Self {
            dir: index_dir.to_path_buf(),
        })
    }

    fn table_path(&self, table: &str, kind: MediaKind) -> PathBuf {
        self.dir.join(format!("{}_{}.bin", table, kind.as_str()))
    }

    fn load_table<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            debug!("Index table {:?} does not exist yet", path);
            return Ok(Vec::new());
        }

        let data = std::fs::read(path)?;
        let mut decoder = GzDecoder::new(&data[..]);
        let mut decompressed = Vec::new();
        if let Err(e) = decoder.read_to_end(&mut decompressed) {
            warn!("Index table {:?} is not valid gzip ({}), treating as empty", path, e);
            return Ok(Vec::new());
        }

        match deserialize(&decompressed) {
            Ok(rows) => Ok(rows),
            Err(e) => {
                // Format changed between versions; the next refresh rebuilds it
                warn!("Index table {:?} could not be decoded ({}), treating as empty", path, e);
                Ok(Vec::new())
            }
        }
    }

    fn save_table<T: Serialize>(&self, path: &Path, rows: &[T]) -> Result<()> {
        let serialized = serialize(rows)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&serialized)?;
        let encoded = encoder.finish()?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, encoded)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

impl IndexStore for FileIndexStore {
    fn replace_watched(&self, kind: MediaKind, rows: Vec<WatchedRow>) -> Result<()> {
        self.save_table(&self.table_path("watched", kind), &rows)?;
        info!("Replaced watched {} index: {} rows", kind, rows.len());
        Ok(())
    }

    fn replace_progress(&self, kind: MediaKind, rows: Vec<ProgressRow>) -> Result<()> {
        self.save_table(&self.table_path("progress", kind), &rows)?;
        info!("Replaced {} progress index: {} rows", kind, rows.len());
        Ok(())
    }

    fn watched(&self, kind: MediaKind) -> Result<Vec<WatchedRow>> {
        self.load_table(&self.table_path("watched", kind))
    }

    fn progress(&self, kind: MediaKind) -> Result<Vec<ProgressRow>> {
        self.load_table(&self.table_path("progress", kind))
    }

    fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("bin") {
                std::fs::remove_file(&path)?;
            }
        }
        info!("Cleared watched and progress indexes");
        Ok(())
    }
}
