//! Multipart collection and on-disk storage of uploaded files.
//!
//! Handlers read the whole form first via [`UploadStore::read_form`], which
//! checks every file's type and size while streaming it into memory. Nothing
//! touches the disk until the handler has validated the rest of the request
//! and calls [`UploadStore::save`] / [`UploadStore::save_all`].

use std::collections::HashMap;
use std::path::PathBuf;

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use ptw_core::uploads::{generate_stored_filename, validate_extension, validate_size};

use crate::error::{AppError, AppResult};

/// Maximum number of files accepted in one request.
///
/// A full checklist has 60 items, each of which may carry one evidence file.
pub const MAX_UPLOAD_FILES: usize = 64;

/// Allowance for text fields and multipart framing on top of the file payload.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// A validated file held in memory, not yet written.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    /// Multipart field name, e.g. `attachments` or `ppe_gloves_appropriate_file`.
    pub field_name: String,
    /// Filename as sent by the client.
    pub original_name: String,
    /// Normalized extension used for the stored name.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Text fields and files of a multipart request.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<PendingUpload>,
}

impl MultipartForm {
    /// A text field, trimmed; blank values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Writes uploads under a single directory that is served at `/uploads`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: u64,
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart request: {}", err.body_text()))
}

impl UploadStore {
    pub fn new(dir: PathBuf, max_bytes: u64) -> Self {
        Self { dir, max_bytes }
    }

    /// Request body limit for multipart endpoints.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_bytes)
            .unwrap_or(usize::MAX)
            .saturating_mul(MAX_UPLOAD_FILES)
            .saturating_add(FORM_OVERHEAD_BYTES)
    }

    /// Drain a multipart request into memory.
    ///
    /// Parts with a non-empty filename are files; everything else is a text
    /// field (later duplicates win). A file with a disallowed extension is
    /// rejected before its body is read; an oversized one as soon as the
    /// running size passes the limit.
    pub async fn read_form(&self, mut multipart: Multipart) -> AppResult<MultipartForm> {
        let mut form = MultipartForm::default();

        while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
            let field_name = field.name().unwrap_or("").to_string();
            let file_name = field
                .file_name()
                .map(str::to_string)
                .filter(|name| !name.is_empty());

            let Some(original_name) = file_name else {
                let text = field.text().await.map_err(multipart_error)?;
                form.fields.insert(field_name, text);
                continue;
            };

            if form.files.len() >= MAX_UPLOAD_FILES {
                return Err(AppError::BadRequest(format!(
                    "Too many files; at most {MAX_UPLOAD_FILES} per request"
                )));
            }

            let extension = validate_extension(&original_name)?;

            let mut bytes = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                bytes.extend_from_slice(&chunk);
                let size = bytes.len() as u64;
                if size > self.max_bytes {
                    validate_size(&original_name, size, self.max_bytes)?;
                }
            }
            validate_size(&original_name, bytes.len() as u64, self.max_bytes)?;

            form.files.push(PendingUpload {
                field_name,
                original_name,
                extension,
                bytes,
            });
        }

        Ok(form)
    }

    /// Write one upload and return its generated filename.
    pub async fn save(&self, upload: &PendingUpload) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::InternalError(format!("Cannot create upload directory: {e}")))?;

        let stored = generate_stored_filename(&upload.extension);
        tokio::fs::write(self.dir.join(&stored), &upload.bytes)
            .await
            .map_err(|e| AppError::InternalError(format!("Cannot write upload: {e}")))?;

        tracing::debug!(
            field = %upload.field_name,
            original = %upload.original_name,
            stored = %stored,
            size = upload.bytes.len(),
            "Stored upload"
        );
        Ok(stored)
    }

    /// Write uploads in order, returning their generated filenames.
    pub async fn save_all<'a, I>(&self, uploads: I) -> AppResult<Vec<String>>
    where
        I: IntoIterator<Item = &'a PendingUpload>,
    {
        let mut stored = Vec::new();
        for upload in uploads {
            stored.push(self.save(upload).await?);
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use assert_matches::assert_matches;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use ptw_core::error::CoreError;

    use super::*;

    const BOUNDARY: &str = "ptw-test-boundary";

    /// Build a `Multipart` extractor from `(name, filename, content)` parts.
    async fn multipart(parts: &[(&str, Option<&str>, &[u8])]) -> Multipart {
        let mut body = Vec::new();
        for (name, filename, content) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match filename {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("PUT")
            .uri("/")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    fn store(dir: &Path, max_bytes: u64) -> UploadStore {
        UploadStore::new(dir.to_path_buf(), max_bytes)
    }

    #[tokio::test]
    async fn test_read_form_splits_text_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        let form = store(tmp.path(), 1024)
            .read_form(
                multipart(&[
                    ("action", None, b"start"),
                    ("remarks", None, b"  "),
                    ("attachments", Some("Site.JPG"), b"jpeg-bytes"),
                    ("attachments", Some(""), b""),
                ])
                .await,
            )
            .await
            .unwrap();

        assert_eq!(form.text("action"), Some("start"));
        assert_eq!(form.text("remarks"), None);
        assert_eq!(form.files.len(), 1);
        assert_eq!(form.files[0].field_name, "attachments");
        assert_eq!(form.files[0].extension, "jpg");
        assert_eq!(form.files[0].bytes, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_read_form_rejects_bad_type_and_size() {
        let tmp = tempfile::tempdir().unwrap();

        let err = store(tmp.path(), 1024)
            .read_form(multipart(&[("attachments", Some("run.exe"), b"MZ")]).await)
            .await
            .unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::Validation(_)));

        let err = store(tmp.path(), 4)
            .read_form(multipart(&[("attachments", Some("big.pdf"), b"0123456789")]).await)
            .await
            .unwrap_err();
        assert_matches!(err, AppError::Core(CoreError::Validation(msg)) if msg.contains("limit"));
    }

    #[tokio::test]
    async fn test_save_writes_under_generated_name() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested");
        let store = store(&dir, 1024);
        let upload = PendingUpload {
            field_name: "attachments".into(),
            original_name: "permit.pdf".into(),
            extension: "pdf".into(),
            bytes: b"%PDF-1.4".to_vec(),
        };

        let names = store.save_all([&upload, &upload]).await.unwrap();
        assert_eq!(names.len(), 2);
        for name in &names {
            assert!(name.ends_with(".pdf"), "{name}");
            assert_eq!(std::fs::read(dir.join(name)).unwrap(), b"%PDF-1.4");
        }
    }

    #[test]
    fn test_body_limit_covers_every_file() {
        let store = store(Path::new("uploads"), 1000);
        assert_eq!(store.body_limit(), 1000 * MAX_UPLOAD_FILES + FORM_OVERHEAD_BYTES);
    }
}
