use garde::Validate;
use tracing::debug;

use crate::models::submission::{Attachment, EmailSubmission, InputMethod};

/// Upload size ceiling: 5 MiB.
pub const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// Extensions the backend can extract text from.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf"];

/// Validate a submission before anything leaves the process.
///
/// Checks, in order:
/// - content present for text input, file present for file input
/// - file extension, MIME type and size
/// - override flags paired with a non-blank typed value
/// - sender, subject and content length caps
pub fn validate_submission(submission: &EmailSubmission) -> Result<(), ValidationError> {
    match submission.input_method {
        InputMethod::Text => {
            if submission.content.trim().is_empty() {
                return Err(ValidationError::MissingContent);
            }
        }
        InputMethod::File => {
            let attachment = submission
                .attachment
                .as_ref()
                .ok_or(ValidationError::MissingFile)?;
            validate_attachment(attachment)?;
        }
    }

    if submission.override_subject && is_blank(submission.subject.as_deref()) {
        return Err(ValidationError::BlankOverride { field: "subject" });
    }

    if submission.override_sender && is_blank(submission.sender.as_deref()) {
        return Err(ValidationError::BlankOverride { field: "sender" });
    }

    submission.validate()?;
    Ok(())
}

/// Extension, MIME and size checks for an upload.
pub fn validate_attachment(attachment: &Attachment) -> Result<(), ValidationError> {
    let extension = attachment
        .extension()
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| ValidationError::UnsupportedExtension {
            file_name: attachment.file_name.clone(),
        })?;

    let expected = expected_mime(&extension);
    let declared = mime_essence(&attachment.mime_type);
    if !declared.eq_ignore_ascii_case(&expected) {
        debug!(
            file_name = %attachment.file_name,
            declared = %attachment.mime_type,
            expected = %expected,
            "Upload MIME does not match its extension"
        );
        return Err(ValidationError::MimeMismatch {
            file_name: attachment.file_name.clone(),
            expected,
            found: attachment.mime_type.clone(),
        });
    }

    if attachment.size() > MAX_FILE_BYTES {
        return Err(ValidationError::FileTooLarge {
            size: attachment.size(),
            limit: MAX_FILE_BYTES,
        });
    }

    Ok(())
}

/// MIME type registered for an extension (`txt` → `text/plain`).
pub fn expected_mime(extension: &str) -> String {
    mime_guess::from_ext(extension)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn mime_essence(mime: &str) -> &str {
    mime.split(';').next().unwrap_or_default().trim()
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Email content is required")]
    MissingContent,

    #[error("Select a file to upload")]
    MissingFile,

    #[error("File type not allowed: {file_name} (only .txt or .pdf)")]
    UnsupportedExtension { file_name: String },

    #[error("File {file_name} looks like {found}, expected {expected}")]
    MimeMismatch {
        file_name: String,
        expected: String,
        found: String,
    },

    #[error("File is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Fill in the {field} field or stop overriding the file's {field}")]
    BlankOverride { field: &'static str },

    #[error("Invalid fields: {0}")]
    Fields(#[from] garde::Report),
}
