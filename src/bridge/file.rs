//! File-backed bridge with the game's Script Extender mod.
//!
//! The mod polls `ap_in.json` for the items it should hold and appends what
//! the player achieved to `ap_out.json`. Neither side locks, so reads parse
//! from scratch every time and writes go through a temp file and a rename.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::{
    BridgeError, DeliverySink, ProgressSource, DELIVERY_FILE_NAME, EMPTY_TOKEN_ARRAY,
    PROGRESS_FILE_NAME,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// The two bridge files inside the game's Script Extender directory.
#[derive(Debug, Clone)]
pub struct FileBridgeStore {
    dir: PathBuf,
    delivery_path: PathBuf,
    progress_path: PathBuf,
}

impl FileBridgeStore {
    /// Store rooted at `dir`. Performs no I/O.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            delivery_path: dir.join(DELIVERY_FILE_NAME),
            progress_path: dir.join(PROGRESS_FILE_NAME),
            dir,
        }
    }

    /// Open the store, creating both files as `[]` when absent.
    ///
    /// Fails if `dir` itself does not exist: that means the Script Extender
    /// is not installed or the game has not run since.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BridgeError> {
        let store = Self::new(dir);
        if !store.dir.is_dir() {
            return Err(BridgeError::MissingDirectory(store.dir));
        }
        for path in [&store.delivery_path, &store.progress_path] {
            if init_if_absent(path)? {
                info!(path = %path.display(), "initialized bridge file");
            }
        }
        Ok(store)
    }

    /// Directory holding the bridge files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the inbound delivery file.
    pub fn delivery_path(&self) -> &Path {
        &self.delivery_path
    }

    /// Path of the outbound progress file.
    pub fn progress_path(&self) -> &Path {
        &self.progress_path
    }

    /// Read back the delivery file as the game would see it.
    pub fn read_delivery(&self) -> Result<Vec<String>, BridgeError> {
        read_token_array(&self.delivery_path)
    }
}

impl ProgressSource for FileBridgeStore {
    fn read_progress(&self) -> Result<Vec<String>, BridgeError> {
        read_token_array(&self.progress_path)
    }
}

impl DeliverySink for FileBridgeStore {
    fn write_delivery(&self, tokens: &[String]) -> Result<(), BridgeError> {
        let json = serde_json::to_vec(tokens).map_err(|source| BridgeError::Malformed {
            path: self.delivery_path.clone(),
            source,
        })?;
        write_atomic(&self.delivery_path, &json)
            .map_err(|source| BridgeError::io(&self.delivery_path, source))?;
        debug!(count = tokens.len(), "wrote delivery file");
        Ok(())
    }
}

/// Parse a bridge file, initializing it when it does not exist.
///
/// An empty or whitespace-only file reads as `[]`; the game truncates before
/// it rewrites.
fn read_token_array(path: &Path) -> Result<Vec<String>, BridgeError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            init_if_absent(path)?;
            debug!(path = %path.display(), "bridge file was missing, recreated empty");
            return Ok(Vec::new());
        }
        Err(err) => return Err(BridgeError::io(path, err)),
    };

    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    serde_json::from_slice(body).map_err(|source| BridgeError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Create `path` containing `[]` unless something already exists there.
///
/// Uses `create_new` so a file the game created in the meantime is never
/// clobbered. Returns whether the file was created.
fn init_if_absent(path: &Path) -> Result<bool, BridgeError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(EMPTY_TOKEN_ARRAY)
                .and_then(|()| file.sync_all())
                .map_err(|err| BridgeError::io(path, err))?;
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(BridgeError::io(path, err)),
    }
}

/// Write `contents` to a sibling temp file, sync it, and rename it over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_open_initializes_both_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileBridgeStore::open(dir.path()).unwrap();

        assert_eq!(fs::read(store.delivery_path()).unwrap(), b"[]");
        assert_eq!(fs::read(store.progress_path()).unwrap(), b"[]");
    }

    #[test]
    fn test_open_keeps_existing_progress() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join(PROGRESS_FILE_NAME), r#"["TUT_NautiloidEscape-Start"]"#)
            .unwrap();

        let store = FileBridgeStore::open(dir.path()).unwrap();
        assert_eq!(
            store.read_progress().unwrap(),
            tokens(&["TUT_NautiloidEscape-Start"])
        );
    }

    #[test]
    fn test_open_missing_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("Script Extender");

        let result = FileBridgeStore::open(&missing);
        assert!(matches!(result, Err(BridgeError::MissingDirectory(p)) if p == missing));
    }

    #[test]
    fn test_read_progress_recreates_deleted_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileBridgeStore::open(dir.path()).unwrap();
        fs::remove_file(store.progress_path()).unwrap();

        assert!(store.read_progress().unwrap().is_empty());
        assert_eq!(fs::read(store.progress_path()).unwrap(), b"[]");
    }

    #[test]
    fn test_read_progress_empty_file_is_empty_list() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileBridgeStore::open(dir.path()).unwrap();
        fs::write(store.progress_path(), "  \n").unwrap();

        assert!(store.read_progress().unwrap().is_empty());
    }

    #[test]
    fn test_read_progress_strips_bom_and_keeps_duplicates() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileBridgeStore::open(dir.path()).unwrap();
        let mut body = UTF8_BOM.to_vec();
        body.extend_from_slice(br#"["A","B","A"]"#);
        fs::write(store.progress_path(), body).unwrap();

        assert_eq!(store.read_progress().unwrap(), tokens(&["A", "B", "A"]));
    }

    #[test]
    fn test_read_progress_truncated_json_is_malformed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileBridgeStore::open(dir.path()).unwrap();
        fs::write(store.progress_path(), r#"["TUT_Nautil"#).unwrap();

        assert!(matches!(
            store.read_progress(),
            Err(BridgeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_write_delivery_replaces_whole_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileBridgeStore::open(dir.path()).unwrap();

        store
            .write_delivery(&tokens(&["LevelUp1_0", "Gold-100"]))
            .unwrap();
        store.write_delivery(&tokens(&["LevelUp1_0"])).unwrap();

        assert_eq!(store.read_delivery().unwrap(), tokens(&["LevelUp1_0"]));
        assert!(!store.delivery_path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_write_delivery_into_removed_directory_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        let sub = dir.path().join("Script Extender");
        fs::create_dir(&sub).unwrap();
        let store = FileBridgeStore::open(&sub).unwrap();
        fs::remove_dir_all(&sub).unwrap();

        let result = store.write_delivery(&tokens(&["Gold-100"]));
        assert!(matches!(result, Err(BridgeError::Io { .. })));

        // Restoring the folder is enough; no restart needed.
        fs::create_dir(&sub).unwrap();
        store.write_delivery(&tokens(&["Gold-100"])).unwrap();
        assert_eq!(store.read_delivery().unwrap(), tokens(&["Gold-100"]));
    }
}
