//! JSONL-backed document store, one file per collection.

use crate::index::RecordIndex;
use crate::memory::{check_collection, check_query, check_request};
use crate::{DocumentStore, RecordQuery, SnapshotStream, StoreError};
use async_trait::async_trait;
use jsonshelf_protocol::{NewRecord, Record, RecordId};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Document store that keeps each collection in `<root>/<collection>.jsonl`.
///
/// Inserts append a line; deletes rewrite the file through a temp file.
/// Collections are read from disk the first time they are touched.
pub struct FileDocumentStore {
    root: PathBuf,
    index: RecordIndex,
    loaded: Mutex<HashSet<String>>,
    /// Serializes file writes and first loads.
    write_lock: Mutex<()>,
}

impl FileDocumentStore {
    /// Open (or create) a store rooted at the given directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("initialized file document store (root={})", root.display());
        Ok(Self {
            root,
            index: RecordIndex::new(),
            loaded: Mutex::new(HashSet::new()),
            write_lock: Mutex::new(()),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.jsonl"))
    }

    fn temp_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.jsonl.tmp"))
    }

    fn ensure_loaded(&self, collection: &str) -> Result<(), StoreError> {
        let mut loaded = self.loaded.lock();
        if loaded.contains(collection) {
            return Ok(());
        }
        let records = self.read_records(collection)?;
        debug!(
            "loaded collection (collection={}, records={})",
            collection,
            records.len()
        );
        self.index.load(collection, records);
        loaded.insert(collection.to_string());
        Ok(())
    }

    fn read_records(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(OpenOptions::new().read(true).open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    fn append_record(&self, collection: &str, record: &Record) -> Result<(), StoreError> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.collection_path(collection))?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn write_records(&self, collection: &str, records: &[Record]) -> Result<(), StoreError> {
        let path = self.collection_path(collection);
        let temp_path = self.temp_path(collection);
        {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&temp_path)?;
            for record in records {
                writeln!(file, "{}", serde_json::to_string(record)?)?;
            }
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn insert(&self, collection: &str, record: NewRecord) -> Result<RecordId, StoreError> {
        check_request(collection, &record)?;
        let _guard = self.write_lock.lock();
        self.ensure_loaded(collection)?;
        let record = RecordIndex::materialize(record);
        self.append_record(collection, &record)?;
        let id = record.id.clone();
        self.index.insert(collection, record);
        debug!("inserted record (collection={}, id={})", collection, id);
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &RecordId) -> Result<(), StoreError> {
        check_collection(collection)?;
        let _guard = self.write_lock.lock();
        self.ensure_loaded(collection)?;
        if !self.index.contains(collection, id) {
            warn!("delete of unknown record (collection={}, id={})", collection, id);
            return Ok(());
        }
        let remaining: Vec<Record> = self
            .index
            .records(collection)
            .into_iter()
            .filter(|record| &record.id != id)
            .collect();
        self.write_records(collection, &remaining)?;
        self.index.remove(collection, id);
        debug!("deleted record (collection={}, id={})", collection, id);
        Ok(())
    }

    async fn subscribe(&self, query: RecordQuery) -> Result<SnapshotStream, StoreError> {
        check_query(&query)?;
        {
            let _guard = self.write_lock.lock();
            self.ensure_loaded(&query.collection)?;
        }
        debug!(
            "opening subscription (collection={}, owner_id={})",
            query.collection, query.owner_id
        );
        Ok(self.index.subscribe(query))
    }
}
