//! Upload acceptance rules and stored-filename generation.
//!
//! Stored files are named `<unix-millis>-<random 0..1e9><.ext>` and are served
//! back verbatim under `/uploads/<name>`.

use rand::Rng;

use crate::error::CoreError;

/// Extensions (lowercase, without the dot) accepted for evidence and attachments.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "pdf"];

/// Default per-file size limit: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Exclusive upper bound of the random filename salt.
const SALT_BOUND: u32 = 1_000_000_000;

/// Lowercased extension of a client filename, if it has one.
pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check a client filename against the allowed types.
///
/// Returns the normalized extension to use for the stored name.
pub fn validate_extension(filename: &str) -> Result<String, CoreError> {
    extension_of(filename)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "File '{filename}' has an unsupported type. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })
}

/// Check a file's size against the per-file limit.
pub fn validate_size(filename: &str, size: u64, max_bytes: u64) -> Result<(), CoreError> {
    if size > max_bytes {
        return Err(CoreError::Validation(format!(
            "File '{filename}' exceeds the {max_bytes} byte limit"
        )));
    }
    if size == 0 {
        return Err(CoreError::Validation(format!("File '{filename}' is empty")));
    }
    Ok(())
}

/// Build a stored filename from its parts.
pub fn stored_filename(unix_millis: i64, salt: u32, ext: &str) -> String {
    format!("{unix_millis}-{salt}.{ext}")
}

/// Generate a fresh stored filename for a validated extension.
pub fn generate_stored_filename(ext: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let salt = rand::rng().random_range(0..SALT_BOUND);
    stored_filename(millis, salt, ext)
}
