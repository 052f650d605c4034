//! Loading and saving the backing file.
//!
//! Saves never write the backing file in place. The encoded document goes to
//! a sibling temporary file (`<path>~`), which is flushed to disk and then
//! renamed over the real path. A reader opening the path at any moment sees
//! either the complete old document or the complete new one.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dotstore_tree::Document;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// Appended to the backing path to name the temporary file.
pub const TEMP_SUFFIX: &str = "~";

/// Contents written when a store is created from nothing.
const EMPTY_DOCUMENT: &[u8] = b"{}";

/// The temporary path used while saving `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Read the document at `path`, creating an empty store file if none exists.
///
/// A zero-byte file is an empty document. Anything that does not parse, or
/// parses to something other than an object, is [`StoreError::CorruptStore`].
pub fn load_document(path: &Path) -> StoreResult<Document> {
    if !path.exists() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        fs::write(path, EMPTY_DOCUMENT).map_err(|e| StoreError::io(path, e))?;
        info!(path = %path.display(), "created empty store file");
    }

    let temp = temp_path(path);
    if temp.exists() {
        warn!(
            temp = %temp.display(),
            "found leftover temporary file from an interrupted save; it will be replaced"
        );
    }

    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    if bytes.is_empty() {
        debug!(path = %path.display(), "store file is empty");
        return Ok(Document::new());
    }

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::corrupt(path, format!("failed to decode JSON data: {e}")))?;
    match value {
        Value::Object(document) => {
            debug!(path = %path.display(), keys = document.len(), "loaded store");
            Ok(document)
        }
        _ => Err(StoreError::corrupt(path, "root element is not an object")),
    }
}

/// Encode a document. `None` produces compact output.
pub fn encode_document(document: &Document, indent: Option<usize>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    match indent {
        None => serde_json::to_writer(&mut buf, document)?,
        Some(width) => {
            let pad = vec![b' '; width];
            let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&pad));
            document.serialize(&mut ser)?;
        }
    }
    Ok(buf)
}

/// Atomically replace the file at `path` with `document`.
///
/// If writing the temporary file fails, the temporary file is removed
/// (best effort) and `path` is left untouched.
pub fn save_document(path: &Path, document: &Document, indent: Option<usize>) -> StoreResult<()> {
    let bytes = encode_document(document, indent).map_err(|e| StoreError::io(path, e))?;
    let temp = temp_path(path);

    if let Err(e) = write_synced(&temp, &bytes) {
        if let Err(cleanup) = fs::remove_file(&temp) {
            debug!(temp = %temp.display(), error = %cleanup, "could not remove temporary file");
        }
        return Err(StoreError::io(&temp, e));
    }

    fs::rename(&temp, path).map_err(|e| StoreError::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "saved store");
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}
