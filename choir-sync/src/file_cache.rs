//! File-backed attribute cache.
//!
//! Persists one `CacheFile` JSON document per account at
//! `<dir>/<escaped account id>.json` (normally `~/.choir/cache/`).
//! Writes use an atomic `.tmp` + rename and are serialized per cache, so the
//! file always matches the last in-memory update. The in-memory view is
//! authoritative: a failed write is logged and the process keeps serving
//! what it has.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use choir_core::{AccountDetails, AccountId, AccountModifications, KeySet};

use crate::cache::InMemoryCache;
use crate::collaborators::{AccountContext, AttributeCache};
use crate::error::{io_err, SyncError};

/// On-disk cache entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheFile {
    pub account_id: AccountId,
    pub cached_at: DateTime<Utc>,
    pub details: AccountDetails,
}

pub struct FileCache {
    dir: PathBuf,
    entries: InMemoryCache,
    /// Held across each in-memory update and its file write.
    writes: Mutex<()>,
}

impl FileCache {
    /// Open (creating if needed) the cache directory and load every entry.
    ///
    /// Unreadable or corrupt entries are skipped with a warning.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

        let entries = InMemoryCache::new();
        let mut files: Vec<_> = std::fs::read_dir(&dir)
            .map_err(|e| io_err(&dir, e))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .collect();
        files.sort();

        for path in files {
            match read_entry(&path) {
                Ok(file) => entries.insert(file.account_id, file.details),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable cache entry");
                }
            }
        }

        Ok(Self {
            dir,
            entries,
            writes: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<stem>.json`. ASCII letters, digits and `-` are kept, `_`
    /// becomes `__` and every other byte becomes `_` plus two hex digits, so
    /// distinct ids never share a file.
    pub fn entry_path(&self, account_id: &AccountId) -> PathBuf {
        let mut stem = String::with_capacity(account_id.as_str().len());
        for byte in account_id.as_str().bytes() {
            match byte {
                b'_' => stem.push_str("__"),
                b if b.is_ascii_alphanumeric() || b == b'-' => stem.push(char::from(b)),
                b => {
                    let _ = write!(stem, "_{b:02x}");
                }
            }
        }
        self.dir.join(format!("{stem}.json"))
    }

    /// The full cached bag, without projection.
    pub fn get(&self, account_id: &AccountId) -> Option<AccountDetails> {
        self.entries.get(account_id)
    }

    fn persist(&self, account_id: &AccountId) -> Result<(), SyncError> {
        let Some(details) = self.entries.get(account_id) else {
            return self.remove(account_id);
        };
        let path = self.entry_path(account_id);
        let file = CacheFile {
            account_id: account_id.clone(),
            cached_at: Utc::now(),
            details,
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        Ok(())
    }

    fn remove(&self, account_id: &AccountId) -> Result<(), SyncError> {
        let path = self.entry_path(account_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err(path, err)),
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist_or_warn(&self, account_id: &AccountId) {
        if let Err(err) = self.persist(account_id) {
            tracing::warn!(account_id = %account_id, error = %err, "failed to persist cache entry");
        }
    }
}

fn read_entry(path: &Path) -> Result<CacheFile, SyncError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

impl AttributeCache for FileCache {
    fn load_entry(&self, account_id: &AccountId, keys: &KeySet) -> Option<AccountDetails> {
        self.entries.load_entry(account_id, keys)
    }

    fn communicate_remote_changes(&self, account_id: &AccountId, details: AccountDetails) {
        let _writes = self.lock_writes();
        self.entries.communicate_remote_changes(account_id, details);
        self.persist_or_warn(account_id);
    }

    fn communicate_modifications(&self, account_id: &AccountId, modifications: &AccountModifications) {
        let _writes = self.lock_writes();
        self.entries.communicate_modifications(account_id, modifications);
        self.persist_or_warn(account_id);
    }

    fn clear_entry(&self, account_id: &AccountId) {
        let _writes = self.lock_writes();
        self.entries.clear_entry(account_id);
        if let Err(err) = self.remove(account_id) {
            tracing::warn!(account_id = %account_id, error = %err, "failed to remove cache entry");
        }
    }
}

impl AccountContext for FileCache {
    fn current_details(&self, account_id: &AccountId) -> Option<AccountDetails> {
        self.entries.get(account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn entries_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let id = AccountId::from("p-01");
        {
            let cache = FileCache::open(tmp.path()).unwrap();
            cache.communicate_remote_changes(&id, AccountDetails::new().with_email("a@x.com"));
        }

        let reopened = FileCache::open(tmp.path()).unwrap();
        assert_eq!(reopened.get(&id).and_then(|d| d.email().map(str::to_owned)), Some("a@x.com".to_string()));
    }

    #[test]
    fn tmp_file_cleaned_up_after_write() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::open(tmp.path()).unwrap();
        let id = AccountId::from("p-01");
        cache.communicate_remote_changes(&id, AccountDetails::new().with_email("a@x.com"));

        let path = cache.entry_path(&id);
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn clear_entry_removes_file() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::open(tmp.path()).unwrap();
        let id = AccountId::from("p-01");
        cache.communicate_remote_changes(&id, AccountDetails::new().with_email("a@x.com"));

        cache.clear_entry(&id);
        assert!(!cache.entry_path(&id).exists());
        assert!(cache.get(&id).is_none());
    }

    #[test]
    fn entry_path_escapes_account_id() {
        let tmp = TempDir::new().unwrap();
        let cache = FileCache::open(tmp.path()).unwrap();
        let path = cache.entry_path(&AccountId::from("../user@site_1"));
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("_2e_2e_2fuser_40site__1.json")
        );
        assert_eq!(path.parent(), Some(tmp.path()));
    }

    #[test]
    fn similar_account_ids_keep_separate_files() {
        let tmp = TempDir::new().unwrap();
        let underscore = AccountId::from("jane_doe");
        let dotted = AccountId::from("jane.doe");
        {
            let cache = FileCache::open(tmp.path()).unwrap();
            assert_ne!(cache.entry_path(&underscore), cache.entry_path(&dotted));

            cache.communicate_remote_changes(&underscore, AccountDetails::new().with_email("u@x.com"));
            cache.communicate_remote_changes(&dotted, AccountDetails::new().with_email("d@x.com"));
            cache.clear_entry(&dotted);
        }

        let reopened = FileCache::open(tmp.path()).unwrap();
        assert_eq!(
            reopened.get(&underscore).and_then(|d| d.email().map(str::to_owned)),
            Some("u@x.com".to_string())
        );
        assert!(reopened.get(&dotted).is_none());
    }

    #[test]
    fn concurrent_writers_leave_disk_matching_memory() {
        let tmp = TempDir::new().unwrap();
        let cache = std::sync::Arc::new(FileCache::open(tmp.path()).unwrap());
        let id = AccountId::from("p-01");

        for round in 0..50 {
            let writers: Vec<_> = (0..4)
                .map(|writer| {
                    let cache = cache.clone();
                    let id = id.clone();
                    std::thread::spawn(move || {
                        let email = format!("r{round}-w{writer}@x.com");
                        cache.communicate_remote_changes(&id, AccountDetails::new().with_email(email));
                    })
                })
                .collect();
            for writer in writers {
                writer.join().unwrap();
            }

            let on_disk = read_entry(&cache.entry_path(&id)).unwrap();
            assert_eq!(Some(on_disk.details), cache.get(&id), "round {round}");
        }
    }

    #[test]
    fn corrupt_entry_is_skipped_on_open() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("broken.json"), "{ not json").unwrap();
        let cache = FileCache::open(tmp.path()).unwrap();
        assert!(cache.get(&AccountId::from("broken")).is_none());
    }
}
