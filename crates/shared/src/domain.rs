use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Largest upload the client will submit: 16 MiB, inclusive.
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

pub const ACCEPTED_MIME_TYPES: [&str; 6] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/bmp",
    "image/tiff",
];

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Where the bytes of a picked file live until they are submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// A raw file handle coming from the file picker or a drop event, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub source: FileSource,
}

impl FileCandidate {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Bytes(bytes),
        }
    }

    /// Builds a candidate from filesystem metadata. The content is not read
    /// here; it is loaded when the file is submitted.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();

        Ok(Self {
            name,
            size_bytes: metadata.len(),
            mime_type,
            source: FileSource::Path(path.to_path_buf()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("Invalid file type. Allowed: PNG, JPG, JPEG, GIF, BMP, TIFF")]
    UnsupportedType,
    #[error("File too large. Maximum size is 16MB.")]
    TooLarge,
}

impl RejectReason {
    pub fn code(self) -> &'static str {
        match self {
            RejectReason::UnsupportedType => "unsupported-type",
            RejectReason::TooLarge => "too-large",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Accepted,
    Rejected(RejectReason),
}

impl ValidationResult {
    pub fn is_accepted(self) -> bool {
        matches!(self, ValidationResult::Accepted)
    }
}

/// Canonical form of an accepted declared type: trimmed, lowercased, with
/// any `;` parameters removed. `None` when the type is not accepted.
pub fn accepted_mime_essence(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    ACCEPTED_MIME_TYPES
        .iter()
        .copied()
        .find(|accepted| accepted.eq_ignore_ascii_case(essence))
}

pub fn is_accepted_mime_type(mime_type: &str) -> bool {
    accepted_mime_essence(mime_type).is_some()
}

/// Type is checked before size, so an oversized file of the wrong type is
/// reported as unsupported.
pub fn validate(candidate: &FileCandidate) -> ValidationResult {
    if !is_accepted_mime_type(&candidate.mime_type) {
        return ValidationResult::Rejected(RejectReason::UnsupportedType);
    }
    if candidate.size_bytes > MAX_UPLOAD_BYTES {
        return ValidationResult::Rejected(RejectReason::TooLarge);
    }
    ValidationResult::Accepted
}

/// A candidate that passed [`validate`]. The only way to build one is through
/// `TryFrom<FileCandidate>`, which also rewrites the declared type to its
/// canonical essence so it can be sent as a part content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    candidate: FileCandidate,
}

impl SelectedFile {
    pub fn name(&self) -> &str {
        &self.candidate.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.candidate.size_bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.candidate.mime_type
    }

    pub fn source(&self) -> &FileSource {
        &self.candidate.source
    }
}

impl TryFrom<FileCandidate> for SelectedFile {
    type Error = RejectReason;

    fn try_from(mut candidate: FileCandidate) -> Result<Self, Self::Error> {
        match validate(&candidate) {
            ValidationResult::Accepted => {
                if let Some(essence) = accepted_mime_essence(&candidate.mime_type) {
                    candidate.mime_type = essence.to_string();
                }
                Ok(Self { candidate })
            }
            ValidationResult::Rejected(reason) => Err(reason),
        }
    }
}

pub fn human_readable_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    if bytes < GB {
        return format_scaled_unit(bytes, MB, "MB");
    }
    format_scaled_unit(bytes, GB, "GB")
}

fn format_scaled_unit(bytes: u64, unit_size: u64, unit_label: &str) -> String {
    let value = bytes as f64 / unit_size as f64;
    let value_text = format!("{value:.1}");
    let compact_value = value_text.strip_suffix(".0").unwrap_or(&value_text);
    format!("{compact_value} {unit_label}")
}
