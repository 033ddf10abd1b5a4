//! JSON document store.
//!
//! Reads tolerate a missing file: callers get `None` (or an empty object when
//! they ask for the file to be created). Writes go through a `.tmp` sibling
//! and a rename so a watcher never observes a half-written document.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Value};

use crate::error::{io_err, StoreError};

/// Read the JSON document at `path`.
///
/// - missing file, `create_if_missing == false` → `Ok(None)`
/// - missing file, `create_if_missing == true` → writes `{}` and returns it
pub fn read_json(path: &Path, create_if_missing: bool) -> Result<Option<Value>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            if !create_if_missing {
                return Ok(None);
            }
            let empty = Value::Object(Map::new());
            write_json(path, &empty)?;
            return Ok(Some(empty));
        }
        Err(err) => return Err(io_err(path, err)),
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Read and deserialize the document at `path` into `T`; `Ok(None)` if absent.
pub fn read_json_as<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(path, err)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize `data` with 4-space indentation and atomically replace `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StoreError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut ser)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.json".to_string());
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));
    fs::write(&tmp_path, &buf).map_err(|e| io_err(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
    Ok(())
}
