//! Import request and outcome types

use serde::Serialize;

/// One uploaded file as handed over by the HTTP layer.
///
/// Lives only for the duration of a single import request.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    /// Client-supplied file name (untrusted)
    pub name: String,
    /// Raw content, `None` when the upload stream could not be read
    pub bytes: Option<Vec<u8>>,
    pub size_bytes: u64,
    /// Error reported while receiving the upload
    pub upload_error: Option<String>,
}

impl UploadedFile {
    /// A fully received upload
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            bytes: Some(bytes),
            upload_error: None,
        }
    }
}

/// Title and body extracted from an HTML document.
///
/// Neither field is ever empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
    pub title: String,
    pub content: String,
}

/// Why an import attempt did not create a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFailure {
    Permission,
    Nonce,
    Missing,
    Upload,
    Empty,
    Type,
    Read,
    Insert,
}

impl ImportFailure {
    pub const ALL: [ImportFailure; 8] = [
        Self::Permission,
        Self::Nonce,
        Self::Missing,
        Self::Upload,
        Self::Empty,
        Self::Type,
        Self::Read,
        Self::Insert,
    ];

    /// Code carried in the redirect query string
    pub fn code(self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::Nonce => "nonce",
            Self::Missing => "missing",
            Self::Upload => "upload",
            Self::Empty => "empty",
            Self::Type => "type",
            Self::Read => "read",
            Self::Insert => "insert",
        }
    }

    /// User-facing sentence for this failure
    pub fn message(self) -> &'static str {
        match self {
            Self::Permission => "You do not have permission to perform this action.",
            Self::Nonce => "Security check failed. Please try again.",
            Self::Missing => "No file was uploaded.",
            Self::Upload => "There was an error uploading the file.",
            Self::Empty => "Uploaded file is empty.",
            Self::Type => "Invalid file type. Please upload an .html or .htm file.",
            Self::Read => "Could not read the uploaded file.",
            Self::Insert => "Failed to create the page.",
        }
    }
}

impl std::fmt::Display for ImportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for ImportFailure {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.code() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown import failure code: {}", s))
    }
}

/// Outcome of one import attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportResult {
    Success { page_id: i64 },
    Failure(ImportFailure),
}

impl ImportResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_parse_back() {
        for failure in ImportFailure::ALL {
            assert_eq!(failure.code().parse::<ImportFailure>().unwrap(), failure);
        }
        assert!("nonexistent-code".parse::<ImportFailure>().is_err());
        assert!("TYPE".parse::<ImportFailure>().is_err());
    }

    #[test]
    fn test_every_failure_has_a_message() {
        for failure in ImportFailure::ALL {
            assert!(!failure.message().is_empty());
        }
        assert_eq!(
            ImportFailure::Type.message(),
            "Invalid file type. Please upload an .html or .htm file."
        );
    }

    #[test]
    fn test_uploaded_file_new_records_size() {
        let file = UploadedFile::new("a.html", b"<p>hi</p>".to_vec());
        assert_eq!(file.size_bytes, 9);
        assert!(file.upload_error.is_none());
    }
}
