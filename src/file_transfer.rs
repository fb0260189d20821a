// src/file_transfer.rs
//
// Files travel inside ordinary JSON messages: the sender merges the file's
// name, extension and base64 bytes into the caller's payload, the receiver
// writes the bytes to a storage directory under a fresh random name.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::seq::SliceRandom;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::rabbitmq::errors::{FacadeError, Result};

pub const FILE_NAME: &str = "fileName";
pub const FILE_EXTENSION: &str = "fileExtension";
pub const FILE_DATA: &str = "fileData";

/// Used by [`store_file_return_message`] when no directory is given.
pub const DEFAULT_STORAGE_DIR: &str = "received_files";

/// Files above this size still go out, with a warning.
pub const SOFT_SIZE_LIMIT: u64 = 20 * 1024 * 1024;

const STORED_NAME_LEN: usize = 32;
const NAME_ATTEMPTS: usize = 8;
const NAME_ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

pub fn has_file_fields(payload: &Map<String, Value>) -> bool {
    [FILE_NAME, FILE_EXTENSION, FILE_DATA]
        .iter()
        .all(|key| payload.contains_key(*key))
}

/// Reads `path` and merges its name, extension and base64 contents into `data`.
pub async fn send_file(path: impl AsRef<Path>, mut data: Map<String, Value>) -> Result<Map<String, Value>> {
    let path = path.as_ref();
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Err(FacadeError::FileNotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path).await?;
    if bytes.len() as u64 > SOFT_SIZE_LIMIT {
        warn!(
            file = %path.display(),
            size = bytes.len(),
            "File exceeds the recommended 20MB message size"
        );
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!(file = %path.display(), size = bytes.len(), "Encoding file for transfer");

    data.insert(FILE_NAME.to_string(), Value::String(file_name));
    data.insert(FILE_EXTENSION.to_string(), Value::String(extension));
    data.insert(FILE_DATA.to_string(), Value::String(STANDARD.encode(&bytes)));
    Ok(data)
}

/// Parses `message`; when it carries a file, stores the file under
/// `storage_dir` (or [`DEFAULT_STORAGE_DIR`] when empty) and returns the
/// payload with the extension and data removed and `fileName` set to the
/// stored name. Anything else is returned as parsed.
pub async fn store_file_return_message(storage_dir: impl AsRef<Path>, message: &[u8]) -> Result<Value> {
    let parsed: Value = serde_json::from_slice(message)?;
    let mut payload = match parsed {
        Value::Object(map) if has_file_fields(&map) => map,
        other => return Ok(other),
    };

    let encoded = match payload.get(FILE_DATA) {
        Some(Value::String(encoded)) => encoded.as_str(),
        _ => return Err(FacadeError::InvalidPayload(format!("{} must be a string", FILE_DATA))),
    };
    let bytes = STANDARD.decode(encoded)?;

    let extension = match payload.get(FILE_EXTENSION) {
        Some(Value::String(ext)) if is_plain_extension(ext) => ext.clone(),
        Some(Value::String(ext)) => {
            return Err(FacadeError::InvalidPayload(format!(
                "{} '{}' is not a plain extension",
                FILE_EXTENSION, ext
            )))
        }
        _ => {
            return Err(FacadeError::InvalidPayload(format!("{} must be a string", FILE_EXTENSION)))
        }
    };

    let storage_dir = storage_dir.as_ref();
    let storage_dir = if storage_dir.as_os_str().is_empty() {
        Path::new(DEFAULT_STORAGE_DIR)
    } else {
        storage_dir
    };

    let stored_path = write_new_file(storage_dir, &extension, &bytes).await?;
    let stored_name = stored_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!(file = %stored_path.display(), size = bytes.len(), "Stored received file");

    payload.remove(FILE_EXTENSION);
    payload.remove(FILE_DATA);
    payload.insert(FILE_NAME.to_string(), Value::String(stored_name));
    Ok(Value::Object(payload))
}

async fn write_new_file(dir: &Path, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).await?;

    let mut last_error = None;
    for _ in 0..NAME_ATTEMPTS {
        let path = dir.join(stored_file_name(&generate_name(), extension));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                return Ok(path);
            }
            Err(err) if err.kind() == IoErrorKind::AlreadyExists => {
                debug!(file = %path.display(), "Generated file name already taken, retrying");
                last_error = Some(err);
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(last_error
        .unwrap_or_else(|| std::io::Error::new(IoErrorKind::AlreadyExists, "no free file name"))
        .into())
}

/// No separators and no parent references, so the stored file stays directly
/// inside the storage directory.
fn is_plain_extension(extension: &str) -> bool {
    !extension.contains(['/', '\\']) && !extension.contains("..")
}

fn stored_file_name(name: &str, extension: &str) -> String {
    if extension.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", name, extension)
    }
}

/// 32 characters drawn by shuffling a time-based token together with the
/// alphanumeric alphabet.
pub(crate) fn generate_name() -> String {
    let now = chrono::Utc::now();
    let token = format!(
        "{:x}{}{}",
        now.timestamp_micros(),
        now.timestamp(),
        NAME_ALPHABET
    );

    let mut chars: Vec<char> = token.chars().collect();
    chars.shuffle(&mut rand::rng());
    chars.into_iter().take(STORED_NAME_LEN).collect()
}
