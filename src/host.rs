//! Where padded images are put so the publisher can reach them.
//!
//! Two deployment variants:
//! - [`ImgurHost`] uploads base64 bytes to an image-hosting API and returns
//!   the hosted URL.
//! - [`LocalDirHost`] writes `<dir>/<key>.<ext>` and returns the path.

use crate::http::{FetchError, HttpClient};
use crate::types::ImageRef;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("upload request failed: {0}")]
    Request(#[from] FetchError),
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Stores image bytes and returns a reference the publisher can use.
pub trait ImageHost {
    /// `key` names the stored object (the candidate id).
    fn upload(&self, bytes: &[u8], mime_type: &str, key: &str) -> Result<ImageRef, HostError>;
}

pub struct ImgurHost {
    http: HttpClient,
    endpoint: String,
    client_id: String,
}

impl ImgurHost {
    pub fn new(http: HttpClient, endpoint: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            client_id: client_id.into(),
        }
    }
}

impl ImageHost for ImgurHost {
    fn upload(&self, bytes: &[u8], mime_type: &str, key: &str) -> Result<ImageRef, HostError> {
        let encoded = STANDARD.encode(bytes);
        let auth = format!("Client-ID {}", self.client_id.trim());
        tracing::debug!(candidate = key, mime_type, size = bytes.len(), "uploading image");
        let body = self.http.post_form(
            &self.endpoint,
            Some(&auth),
            &[("image", encoded.as_str()), ("type", "base64")],
        )?;
        let link = parse_upload_response(&body)?;
        tracing::info!(candidate = key, url = %link, "image uploaded");
        Ok(ImageRef::Url(link))
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default = "default_success")]
    success: bool,
    data: UploadData,
}

fn default_success() -> bool {
    true
}

#[derive(Deserialize)]
struct UploadData {
    link: Option<String>,
    error: Option<serde_json::Value>,
}

/// Extract `data.link` from an upload response.
pub fn parse_upload_response(body: &str) -> Result<String, HostError> {
    let resp: UploadResponse =
        serde_json::from_str(body).map_err(|e| HostError::Rejected(e.to_string()))?;
    match (resp.success, resp.data.link) {
        (true, Some(link)) => Ok(link),
        _ => Err(HostError::Rejected(
            resp.data
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "response has no link".to_string()),
        )),
    }
}

pub struct LocalDirHost {
    dir: PathBuf,
}

impl LocalDirHost {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ImageHost for LocalDirHost {
    fn upload(&self, bytes: &[u8], mime_type: &str, key: &str) -> Result<ImageRef, HostError> {
        let ext = mime_type.rsplit('/').next().unwrap_or("bin");
        let path = self.dir.join(format!("{key}.{ext}"));
        let io_err = |source: std::io::Error| HostError::Io {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        std::fs::write(&path, bytes).map_err(io_err)?;
        tracing::info!(candidate = key, path = %path.display(), "image written");
        Ok(ImageRef::Path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_upload_response_reads_link() {
        let body = r#"{"data": {"id": "aB1", "link": "https://i.imgur.com/aB1.png"}, "success": true, "status": 200}"#;
        assert_eq!(
            parse_upload_response(body).unwrap(),
            "https://i.imgur.com/aB1.png"
        );
    }

    #[test]
    fn parse_upload_response_surfaces_error() {
        let body = r#"{"data": {"error": "Invalid client_id"}, "success": false, "status": 403}"#;
        let err = parse_upload_response(body).unwrap_err();
        assert!(err.to_string().contains("Invalid client_id"));
    }

    #[test]
    fn parse_upload_response_rejects_non_json() {
        assert!(matches!(
            parse_upload_response("<html>"),
            Err(HostError::Rejected(_))
        ));
    }

    #[test]
    fn local_host_writes_file_named_by_key() {
        let tmp = TempDir::new().unwrap();
        let host = LocalDirHost::new(tmp.path().join("out"));

        let image_ref = host.upload(b"bytes", "image/png", "abc123").unwrap();

        let expected = tmp.path().join("out").join("abc123.png");
        assert_eq!(image_ref, ImageRef::Path(expected.clone()));
        assert_eq!(std::fs::read(expected).unwrap(), b"bytes");
    }
}
