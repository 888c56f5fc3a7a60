use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{invoice::Invoice, proto::lnrpc::InvoiceSubscription};

#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    #[error("cursor file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cursor file {} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// How far the invoice subscription has been consumed.
///
/// `add_index` tracks the last invoice creation seen, `settle_index` the last settlement.
/// Both only ever move forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionCursor {
    pub add_index: u64,
    pub settle_index: u64,
}

impl SubscriptionCursor {
    /// Move the watermarks past `invoice`. Returns `true` if either index moved.
    pub fn advance(&mut self, invoice: &Invoice) -> bool {
        self.merge(Self {
            add_index: invoice.add_index,
            settle_index: invoice.settle_index,
        })
    }

    /// Take the element-wise maximum with `other`. Returns `true` if either index moved.
    pub fn merge(&mut self, other: Self) -> bool {
        let before = *self;
        self.add_index = self.add_index.max(other.add_index);
        self.settle_index = self.settle_index.max(other.settle_index);
        *self != before
    }
}

impl From<SubscriptionCursor> for InvoiceSubscription {
    fn from(c: SubscriptionCursor) -> Self {
        Self {
            add_index: c.add_index,
            settle_index: c.settle_index,
        }
    }
}

/// Storage for the subscription cursor, so a restarted consumer resumes where the last one
/// stopped instead of replaying the node's invoice history.
///
/// Both methods may block. The subscription consumer calls `save` on tokio's blocking pool.
pub trait CursorStore: Send + Sync {
    /// Cursor to resume from. A store that has never been written returns the zero cursor.
    fn load(&self) -> Result<SubscriptionCursor, CursorError>;

    /// Record progress. Implementations never move a stored index backwards.
    fn save(&self, cursor: SubscriptionCursor) -> Result<(), CursorError>;
}

/// Process-local cursor store. Starting from the zero cursor replays the full invoice history
/// on every start.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCursorStore {
    inner: Arc<Mutex<SubscriptionCursor>>,
}

impl InMemoryCursorStore {
    #[must_use]
    pub fn new(start: SubscriptionCursor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(start)),
        }
    }

    #[must_use]
    pub fn current(&self) -> SubscriptionCursor {
        *self.inner.lock()
    }
}

impl CursorStore for InMemoryCursorStore {
    fn load(&self) -> Result<SubscriptionCursor, CursorError> {
        Ok(self.current())
    }

    fn save(&self, cursor: SubscriptionCursor) -> Result<(), CursorError> {
        self.inner.lock().merge(cursor);
        Ok(())
    }
}

/// JSON file cursor store. Each save writes a sibling temp file, fsyncs it, and renames it over
/// the target, so readers only ever see a complete cursor: the previous one or the new one.
#[derive(Debug)]
pub struct FileCursorStore {
    path: PathBuf,
    last: Mutex<Option<SubscriptionCursor>>,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SubscriptionCursor, CursorError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(SubscriptionCursor::default())
            }
            Err(source) => return Err(self.io_err(source)),
        };
        serde_json::from_slice(&bytes).map_err(|source| CursorError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn io_err(&self, source: io::Error) -> CursorError {
        CursorError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CursorStore for FileCursorStore {
    fn load(&self) -> Result<SubscriptionCursor, CursorError> {
        let cursor = self.read()?;
        *self.last.lock() = Some(cursor);
        Ok(cursor)
    }

    fn save(&self, cursor: SubscriptionCursor) -> Result<(), CursorError> {
        let mut last = self.last.lock();
        let mut merged = match *last {
            Some(c) => c,
            None => self.read()?,
        };
        if !merged.merge(cursor) && last.is_some() {
            return Ok(());
        }

        let json = serde_json::to_vec_pretty(&merged).map_err(|source| CursorError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("tmp");
        write_synced(&tmp, &json).map_err(|e| self.io_err(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))?;
        *last = Some(merged);
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(add_index: u64, settle_index: u64) -> SubscriptionCursor {
        SubscriptionCursor {
            add_index,
            settle_index,
        }
    }

    #[test]
    fn merge_never_decreases() {
        let mut c = cursor(5, 3);
        assert!(!c.merge(cursor(4, 1)));
        assert_eq!(c, cursor(5, 3));
        assert!(c.merge(cursor(5, 4)));
        assert_eq!(c, cursor(5, 4));
    }

    #[test]
    fn in_memory_store_starts_at_zero() {
        let store = InMemoryCursorStore::default();
        assert_eq!(store.load().expect("load"), SubscriptionCursor::default());
        store.save(cursor(2, 1)).expect("save");
        store.save(cursor(1, 0)).expect("save");
        assert_eq!(store.load().expect("load"), cursor(2, 1));
    }

    #[test]
    fn file_store_survives_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cursor.json");

        let store = FileCursorStore::new(&path);
        assert_eq!(store.load().expect("load"), SubscriptionCursor::default());
        store.save(cursor(10, 4)).expect("save");
        store.save(cursor(9, 7)).expect("save");
        drop(store);

        let reopened = FileCursorStore::new(&path);
        assert_eq!(reopened.load().expect("load"), cursor(10, 7));
    }

    #[test]
    fn file_store_save_leaves_only_the_cursor_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cursor.json");
        let store = FileCursorStore::new(&path);
        store.save(cursor(3, 1)).expect("save");
        store.save(cursor(4, 1)).expect("save");

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(names, ["cursor.json"]);
        let on_disk: SubscriptionCursor =
            serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("json");
        assert_eq!(on_disk, cursor(4, 1));
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cursor.json");
        std::fs::write(&path, b"{not json").expect("write");
        assert!(matches!(
            FileCursorStore::new(&path).load(),
            Err(CursorError::Json { .. })
        ));
    }
}
