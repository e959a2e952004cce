//! Durable key/value storage and file exports.
//!
//! Each key holds one complete snapshot; writes replace the previous value.

use crate::model::MarkerCollection;
use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage read failed for {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage write failed for {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Named-key text storage, local to this machine.
pub trait LocalStorage {
    /// `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Default data directory: `<platform data dir>/map-markers`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("map-markers")
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Sibling of `path` unique to this process and write, so concurrent
    /// sessions never rename each other's half-written file.
    fn temp_path_for(path: &Path) -> PathBuf {
        static WRITES: AtomicU64 = AtomicU64::new(0);
        let n = WRITES.fetch_add(1, Ordering::Relaxed);
        path.with_extension(format!("json.{}.{n}.tmp", std::process::id()))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let write_err = |source: io::Error| StorageError::Write {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(write_err)?;

        // Write-then-rename so a crash never leaves a half-written snapshot.
        let tmp = Self::temp_path_for(&path);
        let mut f = fs::File::create(&tmp).map_err(write_err)?;
        f.write_all(value.as_bytes()).map_err(write_err)?;
        f.sync_all().map_err(write_err)?;
        drop(f);
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(e));
        }
        Ok(())
    }
}

/// Write the collection as pretty JSON to `path`.
pub fn export_json(path: &Path, markers: &MarkerCollection) -> Result<()> {
    let json = serde_json::to_string_pretty(markers).context("serialize markers")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the collection as CSV (`name,latitude,longitude`) to `path`.
pub fn export_csv(path: &Path, markers: &MarkerCollection) -> Result<()> {
    fs::write(path, to_csv(markers)).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn to_csv(markers: &MarkerCollection) -> String {
    let mut out = String::from("name,latitude,longitude\n");
    for m in markers {
        out.push_str(&format!(
            "{},{},{}\n",
            csv_field(&m.name),
            m.coordinates.lat,
            m.coordinates.lon
        ));
    }
    out
}


#[cfg(test)]
pub(crate) fn scratch_dir(tag: &str) -> PathBuf {
    use std::sync::atomic::AtomicUsize;
    static N: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "map-markers-{tag}-{}-{}",
        std::process::id(),
        N.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = fs::remove_dir_all(&dir);
    dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Marker;

    #[test]
    fn missing_key_reads_as_none() {
        let s = FileStorage::new(scratch_dir("missing"));
        assert!(s.get("markers").unwrap().is_none());
    }

    #[test]
    fn set_then_get_overwrites() {
        let dir = scratch_dir("set-get");
        let mut s = FileStorage::new(&dir);
        s.set("markers", "[1]").unwrap();
        s.set("markers", "[2]").unwrap();
        assert_eq!(s.get("markers").unwrap().as_deref(), Some("[2]"));
        let leftovers: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn temp_files_are_unique_per_write() {
        let path = Path::new("/data/markers.json");
        let a = FileStorage::temp_path_for(path);
        let b = FileStorage::temp_path_for(path);
        assert_ne!(a, b);
        assert_eq!(a.parent(), path.parent());
        assert!(a
            .to_string_lossy()
            .contains(&format!("markers.json.{}.", std::process::id())));
    }

    #[test]
    fn interleaved_sessions_both_succeed() {
        let dir = scratch_dir("interleaved");
        let mut first = FileStorage::new(&dir);
        let mut second = FileStorage::new(&dir);
        for i in 0..10 {
            first.set("markers", &format!("[{i}]")).unwrap();
            second.set("markers", &format!("[{i}, {i}]")).unwrap();
        }
        assert_eq!(second.get("markers").unwrap().as_deref(), Some("[9, 9]"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn csv_quotes_awkward_names() {
        let c = MarkerCollection::from_markers(vec![
            Marker::new("Аквапарк \"H2O\"", 47.262937, 39.72016),
            Marker::new("Plain", 1.5, -2.0),
        ])
        .unwrap();
        assert_eq!(
            to_csv(&c),
            "name,latitude,longitude\n\"Аквапарк \"\"H2O\"\"\",47.262937,39.72016\nPlain,1.5,-2\n"
        );
    }
}
