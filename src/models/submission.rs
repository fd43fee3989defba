use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub const MAX_SENDER_CHARS: usize = 50;
pub const MAX_SUBJECT_CHARS: usize = 200;
pub const MAX_CONTENT_CHARS: usize = 2000;

/// How the email body reaches the backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InputMethod {
    #[default]
    Text,
    File,
}

/// A `.txt` or `.pdf` upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    /// Declared or sniffed MIME type, checked against the extension.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// Payload of `POST /api/submit-email/`.
///
/// The two override flags go over the wire as `use_file_subject` and
/// `use_file_sender`: when set, the typed value wins over the one the
/// backend extracts from the uploaded file.
#[derive(Debug, Clone, Validate)]
pub struct EmailSubmission {
    #[garde(length(chars, max = 50))]
    pub sender: Option<String>,

    #[garde(length(chars, max = 200))]
    pub subject: Option<String>,

    #[garde(length(chars, max = 2000))]
    pub content: String,

    #[garde(skip)]
    pub input_method: InputMethod,

    #[garde(skip)]
    pub override_subject: bool,

    #[garde(skip)]
    pub override_sender: bool,

    #[garde(skip)]
    pub attachment: Option<Attachment>,
}

impl EmailSubmission {
    /// Direct text submission. Nothing to override, so both flags are off.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            sender: None,
            subject: None,
            content: content.into(),
            input_method: InputMethod::Text,
            override_subject: false,
            override_sender: false,
            attachment: None,
        }
    }

    /// File upload. Typed subject and sender override the file's by default.
    pub fn file(attachment: Attachment) -> Self {
        Self {
            sender: None,
            subject: None,
            content: String::new(),
            input_method: InputMethod::File,
            override_subject: true,
            override_sender: true,
            attachment: Some(attachment),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn override_subject(mut self, enabled: bool) -> Self {
        self.override_subject = enabled;
        self
    }

    pub fn override_sender(mut self, enabled: bool) -> Self {
        self.override_sender = enabled;
        self
    }

    /// Text fields in the order the form sends them. Empty sender/subject
    /// are left out.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(6);
        if let Some(sender) = self.sender.as_deref().filter(|s| !s.is_empty()) {
            fields.push(("sender", sender.to_string()));
        }
        if let Some(subject) = self.subject.as_deref().filter(|s| !s.is_empty()) {
            fields.push(("subject", subject.to_string()));
        }
        fields.push(("content", self.content.clone()));
        fields.push(("input_method", self.input_method.to_string()));
        fields.push(("use_file_subject", self.override_subject.to_string()));
        fields.push(("use_file_sender", self.override_sender.to_string()));
        fields
    }

    /// The attachment, when this is a file submission.
    pub fn upload(&self) -> Option<&Attachment> {
        match self.input_method {
            InputMethod::File => self.attachment.as_ref(),
            InputMethod::Text => None,
        }
    }
}
