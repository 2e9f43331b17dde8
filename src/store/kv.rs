use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Durable string slots addressed by key.
pub trait KvStore {
    /// Read a slot. A slot that was never written is `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace a slot. Either the whole value lands or the previous value
    /// is left as it was.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Move an unreadable slot out of the way so its bytes survive the next
    /// write.
    fn quarantine(&mut self, _key: &str) -> Result<()> {
        Ok(())
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

/// One `<key>.json` file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            bail!("storage key {key:?} may only contain ASCII letters, digits, '_' and '-'");
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// First free `<key>.corrupt` name. Earlier quarantined copies are kept.
    fn quarantine_path(&self, key: &str) -> PathBuf {
        let plain = self.dir.join(format!("{key}.corrupt"));
        if !plain.exists() {
            return plain;
        }
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let mut candidate = self.dir.join(format!("{key}.{stamp}.corrupt"));
        let mut n = 1;
        while candidate.exists() {
            candidate = self.dir.join(format!("{key}.{stamp}-{n}.corrupt"));
            n += 1;
        }
        candidate
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read slot {}", path.display())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        atomic_write(&path, value.as_bytes())
            .with_context(|| format!("write slot {}", path.display()))
    }

    fn quarantine(&mut self, key: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        let dest = self.quarantine_path(key);
        fs::rename(&path, &dest)
            .with_context(|| format!("move {} to {}", path.display(), dest.display()))
    }
}

/// In-process slots. Writes can be made to fail to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
    quarantined: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.insert(key.into(), value.into());
        self
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }

    pub fn quarantined(&self, key: &str) -> Option<&str> {
        self.quarantined.get(key).map(String::as_str)
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            bail!("memory store is refusing writes to {key}");
        }
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn quarantine(&mut self, key: &str) -> Result<()> {
        if let Some(value) = self.slots.remove(key) {
            self.quarantined.insert(key.to_string(), value);
        }
        Ok(())
    }
}
