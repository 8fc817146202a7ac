//! crates/docchat_core/src/validation.rs
//!
//! Pure checks run on a picked file before it may be uploaded.

use crate::domain::{format_file_size, CandidateFile};

/// 5 MiB, the ceiling the main intake view uses.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_ACCEPTED_MIME_TYPE: &str = "application/pdf";

/// Why a file was turned away. The `Display` text is what the intake view shows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// `expected` names the accepted types, e.g. "PDF" for `application/pdf`.
    #[error("Please select a valid {expected} file")]
    WrongType { declared: String, expected: String },
    #[error("File size should be less than {}", size_label(.max_bytes))]
    TooLarge { byte_size: u64, max_bytes: u64 },
}

fn size_label(bytes: &u64) -> String {
    format_file_size(*bytes)
}

/// "application/pdf" becomes "PDF"; several types are joined with "or".
fn type_label(accepted: &[String]) -> String {
    accepted
        .iter()
        .map(|mime| {
            let subtype = mime.rsplit('/').next().unwrap_or(mime.as_str());
            let subtype = subtype.split('+').next().unwrap_or(subtype);
            subtype.trim_start_matches("x-").to_ascii_uppercase()
        })
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Accepted-file constraints. Views differ in their ceiling, so nothing here is hardcoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConstraints {
    pub accepted_mime_types: Vec<String>,
    pub max_bytes: u64,
}

impl Default for UploadConstraints {
    fn default() -> Self {
        Self {
            accepted_mime_types: vec![DEFAULT_ACCEPTED_MIME_TYPE.to_string()],
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    constraints: UploadConstraints,
}

impl Validator {
    pub fn new(constraints: UploadConstraints) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &UploadConstraints {
        &self.constraints
    }

    /// Checks the declared type first, then the size. Performs no I/O.
    pub fn validate<'a>(&self, file: &'a CandidateFile) -> Result<&'a CandidateFile, Rejection> {
        let declared = file.mime_type.trim();
        let type_ok = self
            .constraints
            .accepted_mime_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(declared));
        if !type_ok {
            return Err(Rejection::WrongType {
                declared: file.mime_type.clone(),
                expected: type_label(&self.constraints.accepted_mime_types),
            });
        }

        if file.byte_size() > self.constraints.max_bytes {
            return Err(Rejection::TooLarge {
                byte_size: file.byte_size(),
                max_bytes: self.constraints.max_bytes,
            });
        }

        Ok(file)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(UploadConstraints::default())
    }
}
