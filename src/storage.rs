use crate::error::StorageError;
use std::{
    fs,
    io,
    path::{
        Path,
        PathBuf,
    },
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        atomic::{
            AtomicBool,
            Ordering,
        },
    },
};

/// Name of the single entry the history lives under.
pub const HISTORY_KEY: &str = "coinFlipHistory";

/// One durable key-value entry. Writes replace the whole value.
pub trait HistoryStorage {
    /// `Ok(None)` when nothing has been saved yet.
    fn read(&self) -> Result<Option<String>, StorageError>;

    fn write(&mut self, value: &str) -> Result<(), StorageError>;

    /// Removing an entry that does not exist succeeds.
    fn remove(&mut self) -> Result<(), StorageError>;
}

impl<T: HistoryStorage + ?Sized> HistoryStorage for Box<T> {
    fn read(&self) -> Result<Option<String>, StorageError> {
        (**self).read()
    }

    fn write(&mut self, value: &str) -> Result<(), StorageError> {
        (**self).write(value)
    }

    fn remove(&mut self) -> Result<(), StorageError> {
        (**self).remove()
    }
}

#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/coinFlipHistory.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{HISTORY_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| HISTORY_KEY.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_err(&self, source: io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl HistoryStorage for FileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&mut self, value: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
            }
        }
        // stage then rename so readers never see a partial value
        let staging = self.staging_path();
        fs::write(&staging, value).map_err(|e| self.write_err(e))?;
        fs::rename(&staging, &self.path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            self.write_err(e)
        })
    }

    fn remove(&mut self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Process-local entry. Clones share the same value, so a test can keep a
/// handle and look at what the store wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entry: Arc<Mutex<Option<String>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let storage = Self::new();
        *storage.lock() = Some(value.into());
        storage
    }

    pub fn value(&self) -> Option<String> {
        self.lock().clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Simulates a full or disabled store; applies to `write` and `remove`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        Ok(())
    }
}

impl HistoryStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        Ok(self.lock().clone())
    }

    fn write(&mut self, value: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        *self.lock() = Some(value.to_string());
        Ok(())
    }

    fn remove(&mut self) -> Result<(), StorageError> {
        self.check_writable()?;
        *self.lock() = None;
        Ok(())
    }
}
