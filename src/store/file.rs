// File-backed document store.
// Each collection is a JSON-lines log; documents are appended and never rewritten.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{EnergyQuery, EnergyStore, MemoryStore};
use crate::error::{StoreError, StoreResult};
use crate::model::{Building, DocumentId, EnergyData};

const BUILDINGS_FILE: &str = "buildings.jsonl";
const ENERGY_DATA_FILE: &str = "energy_data.jsonl";

/// State of the last line of a collection file when it was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    /// Empty file or last line ends with a newline.
    Clean,
    /// Last line decoded but is missing its newline.
    Unterminated,
    /// Last line was an incomplete write starting at this byte offset.
    Torn(u64),
}

/// Documents read from one collection file.
#[derive(Debug)]
struct Loaded<T> {
    docs: Vec<T>,
    tail: Tail,
}

/// Append-only collection log with a serialized writer.
#[derive(Debug)]
struct CollectionLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl CollectionLog {
    async fn open(path: PathBuf, tail: Tail) -> StoreResult<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        match tail {
            Tail::Clean => {}
            Tail::Unterminated => {
                write_line(&mut file, b"\n")
                    .await
                    .map_err(|e| StoreError::io(&path, e))?;
            }
            Tail::Torn(len) => {
                warn!(path = %path.display(), len, "Truncating incomplete trailing line");
                file.set_len(len)
                    .await
                    .map_err(|e| StoreError::io(&path, e))?;
            }
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Writes `doc` as one line, then runs `publish` before releasing the
    /// writer so readers observe documents in file order.
    ///
    /// A failed write is truncated back to the previous length.
    async fn append<T: Serialize>(&self, doc: &T, publish: impl FnOnce()) -> StoreResult<()> {
        let mut line = serde_json::to_vec(doc)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        let len = file
            .metadata()
            .await
            .map_err(|e| StoreError::io(&self.path, e))?
            .len();

        if let Err(e) = write_line(&mut file, &line).await {
            if let Err(rollback) = file.set_len(len).await {
                warn!(
                    path = %self.path.display(),
                    error = %rollback,
                    "Failed to roll back partial append"
                );
            }
            return Err(StoreError::io(&self.path, e));
        }

        publish();
        Ok(())
    }
}

async fn write_line(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.flush().await
}

/// Document store persisted under a data directory.
///
/// Reads are served from an in-memory copy loaded at [`FileStore::open`];
/// a document becomes visible only after its line is written.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    cache: MemoryStore,
    buildings_log: CollectionLog,
    energy_log: CollectionLog,
}

impl FileStore {
    /// Opens (creating if needed) the collections under `dir`.
    ///
    /// An incomplete final line left by an interrupted write is dropped and
    /// truncated away.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the directory cannot be created or a
    /// persisted line before the last fails to decode.
    pub async fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(&dir, e))?;

        let buildings_path = dir.join(BUILDINGS_FILE);
        let energy_path = dir.join(ENERGY_DATA_FILE);
        let buildings: Loaded<Building> = load_collection(&buildings_path).await?;
        let energy_data: Loaded<EnergyData> = load_collection(&energy_path).await?;

        info!(
            dir = %dir.display(),
            buildings = buildings.docs.len(),
            energy_data = energy_data.docs.len(),
            "Opened file store"
        );

        Ok(Self {
            buildings_log: CollectionLog::open(buildings_path, buildings.tail).await?,
            energy_log: CollectionLog::open(energy_path, energy_data.tail).await?,
            cache: MemoryStore::with_documents(buildings.docs, energy_data.docs),
            dir,
        })
    }

    /// Directory holding the collection files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

async fn load_collection<T: DeserializeOwned>(path: &Path) -> StoreResult<Loaded<T>> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Loaded {
                docs: Vec::new(),
                tail: Tail::Clean,
            });
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    let terminated = raw.is_empty() || raw.ends_with('\n');
    let mut docs = Vec::new();
    let mut tail = Tail::Clean;
    let mut offset = 0usize;
    let mut lines = raw.split_inclusive('\n').enumerate().peekable();

    while let Some((idx, chunk)) = lines.next() {
        let start = offset;
        offset += chunk.len();
        let line = chunk.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }
        let is_last = lines.peek().is_none();
        match serde_json::from_str(line) {
            Ok(doc) => {
                docs.push(doc);
                if is_last && !terminated {
                    tail = Tail::Unterminated;
                }
            }
            Err(source) if is_last && !terminated => {
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    error = %source,
                    "Dropping incomplete trailing line"
                );
                tail = Tail::Torn(start as u64);
            }
            Err(source) => {
                return Err(StoreError::Corrupt {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    source,
                });
            }
        }
    }
    debug!(path = %path.display(), count = docs.len(), "Loaded collection");
    Ok(Loaded { docs, tail })
}

#[async_trait]
impl EnergyStore for FileStore {
    async fn insert_building(&self, building: Building) -> StoreResult<Building> {
        self.buildings_log
            .append(&building, || self.cache.push_building(building.clone()))
            .await?;
        Ok(building)
    }

    async fn list_buildings(&self) -> StoreResult<Vec<Building>> {
        Ok(self.cache.buildings())
    }

    async fn get_building(&self, id: DocumentId) -> StoreResult<Option<Building>> {
        Ok(self.cache.building(id))
    }

    async fn insert_energy_data(&self, row: EnergyData) -> StoreResult<EnergyData> {
        self.energy_log
            .append(&row, || self.cache.push_energy_data(row.clone()))
            .await?;
        Ok(row)
    }

    async fn find_energy_data(&self, query: &EnergyQuery) -> StoreResult<Vec<EnergyData>> {
        Ok(self.cache.query(query))
    }

    async fn latest_energy_data(
        &self,
        building_id: DocumentId,
    ) -> StoreResult<Option<EnergyData>> {
        Ok(self.cache.latest(building_id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::*;

    fn building() -> Building {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        Building {
            id: DocumentId::generate(),
            name: "Depot".to_string(),
            target_temperature: 19.0,
            auto_adjust_enabled: false,
            peak_threshold: 40.0,
            created_at: now,
            updated_at: now,
        }
    }

    fn reading(building_id: DocumentId) -> EnergyData {
        EnergyData {
            id: DocumentId::generate(),
            building_id,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            consumption: 31.5,
            predicted_consumption: 30.0,
            temperature: 19.5,
            optimization_enabled: true,
        }
    }

    #[tokio::test]
    async fn reopen_restores_both_collections() {
        let dir = tempdir().unwrap();

        let (b, r) = {
            let store = FileStore::open(dir.path()).await.unwrap();
            let b = store.insert_building(building()).await.unwrap();
            let r = store.insert_energy_data(reading(b.id)).await.unwrap();
            (b, r)
        };

        let reopened = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.list_buildings().await.unwrap(), vec![b.clone()]);
        assert_eq!(
            reopened.latest_energy_data(b.id).await.unwrap(),
            Some(r)
        );
    }

    #[tokio::test]
    async fn empty_directory_opens_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).await.unwrap();
        assert!(store.list_buildings().await.unwrap().is_empty());
        assert!(store.dir().ends_with("nested"));
    }

    #[tokio::test]
    async fn corrupt_line_is_reported_with_position() {
        let dir = tempdir().unwrap();
        let line = serde_json::to_string(&building()).unwrap();
        std::fs::write(
            dir.path().join(BUILDINGS_FILE),
            format!("{line}\n{{not json\n"),
        )
        .unwrap();

        let err = FileStore::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }), "{err}");
    }

    #[tokio::test]
    async fn torn_trailing_line_is_dropped_and_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(BUILDINGS_FILE);
        let kept = {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.insert_building(building()).await.unwrap()
        };
        let clean_len = std::fs::metadata(&path).unwrap().len();
        let mut raw = std::fs::read_to_string(&path).unwrap();
        raw.push_str("{\"_id\":\"0190");
        std::fs::write(&path, raw).unwrap();

        let store = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.list_buildings().await.unwrap(), vec![kept.clone()]);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), clean_len);

        let added = store.insert_building(building()).await.unwrap();
        drop(store);
        let reopened = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.list_buildings().await.unwrap(), vec![kept, added]);
    }

    #[tokio::test]
    async fn unterminated_last_document_is_kept() {
        let dir = tempdir().unwrap();
        let first = building();
        std::fs::write(
            dir.path().join(BUILDINGS_FILE),
            serde_json::to_string(&first).unwrap(),
        )
        .unwrap();

        let store = FileStore::open(dir.path()).await.unwrap();
        let second = store.insert_building(building()).await.unwrap();
        drop(store);

        let reopened = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.list_buildings().await.unwrap(), vec![first, second]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_keep_file_and_cache_order() {
        let dir = tempdir().unwrap();
        let store = std::sync::Arc::new(FileStore::open(dir.path()).await.unwrap());
        let b = store.insert_building(building()).await.unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let row = reading(b.id);
                tokio::spawn(async move { store.insert_energy_data(row).await.unwrap() })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let live = store.latest_energy_data(b.id).await.unwrap();
        drop(store);
        let reopened = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.latest_energy_data(b.id).await.unwrap(), live);
    }
}
