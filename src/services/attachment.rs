use std::path::Path;

use crate::models::submission::Attachment;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Read an upload from disk, sniffing its MIME type from the bytes so the
/// extension check has something real to compare against.
pub async fn load_attachment(path: &Path) -> Result<Attachment, AttachmentError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AttachmentError::InvalidPath(path.display().to_string()))?
        .to_string();

    let bytes = tokio::fs::read(path).await?;
    let mime_type = sniff_mime(&bytes).to_string();

    tracing::debug!(file_name = %file_name, size = bytes.len(), mime = %mime_type, "Loaded attachment");

    Ok(Attachment {
        file_name,
        mime_type,
        bytes,
    })
}

/// Best-effort content type: PDF by magic number, UTF-8 as plain text.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(PDF_MAGIC) {
        "application/pdf"
    } else if std::str::from_utf8(bytes).is_ok() {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("Could not read attachment: {0}")]
    Io(#[from] std::io::Error),

    #[error("Attachment path has no usable file name: {0}")]
    InvalidPath(String),
}
