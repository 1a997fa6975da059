//! Input files: in-memory payloads plus the pre-submit type checks.
//!
//! Files are held as [`bytes::Bytes`] so a run ticket can snapshot the
//! FileSet without copying payloads — the in-flight run keeps reading its
//! snapshot even if the user replaces the selection mid-flight.
//!
//! Magic-byte validation happens here, before any network call, so the user
//! gets a precise error instead of a remote rejection after a full upload.

use crate::error::WorkflowError;
use crate::operation::ExpectedInput;
use bytes::Bytes;
use std::path::Path;
use tracing::debug;

/// One user-selected input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Original filename, sent as the multipart part's file name.
    pub name: String,
    /// File contents.
    pub bytes: Bytes,
}

impl InputFile {
    /// Wrap in-memory bytes as an input file.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Load a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WorkflowError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| WorkflowError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        debug!("Loaded input '{}' ({} bytes)", name, bytes.len());
        Ok(Self::new(name, bytes))
    }

    /// Payload size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Check the file's magic bytes against what the operation expects.
    pub fn check_type(&self, expected: ExpectedInput) -> Result<(), WorkflowError> {
        let mut magic = [0u8; 4];
        let head = &self.bytes[..self.bytes.len().min(4)];
        magic[..head.len()].copy_from_slice(head);

        let ok = match expected {
            ExpectedInput::Pdf => is_pdf(&magic),
            ExpectedInput::Image => is_image(&magic),
            ExpectedInput::PdfOrImage => is_pdf(&magic) || is_image(&magic),
        };
        if ok {
            Ok(())
        } else {
            Err(WorkflowError::WrongFileType {
                name: self.name.clone(),
                expected: match expected {
                    ExpectedInput::Pdf => "PDF",
                    ExpectedInput::Image => "image",
                    ExpectedInput::PdfOrImage => "PDF or image",
                },
                magic,
            })
        }
    }
}

/// Total payload size of a file set.
pub fn total_size(files: &[InputFile]) -> u64 {
    files.iter().map(InputFile::size).sum()
}

fn is_pdf(magic: &[u8; 4]) -> bool {
    magic == b"%PDF"
}

fn is_image(magic: &[u8; 4]) -> bool {
    // PNG: 0x89 'P' 'N' 'G'; JPEG: FF D8 FF
    magic[..4] == [0x89, b'P', b'N', b'G'] || magic[..3] == [0xFF, 0xD8, 0xFF]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_file() -> InputFile {
        InputFile::new("doc.pdf", Bytes::from_static(b"%PDF-1.7 rest"))
    }

    fn png_file() -> InputFile {
        InputFile::new("pic.png", Bytes::from_static(&[0x89, b'P', b'N', b'G', 0x0D]))
    }

    #[test]
    fn pdf_magic_accepted() {
        assert!(pdf_file().check_type(ExpectedInput::Pdf).is_ok());
        assert!(pdf_file().check_type(ExpectedInput::PdfOrImage).is_ok());
    }

    #[test]
    fn image_rejected_where_pdf_expected() {
        let err = png_file().check_type(ExpectedInput::Pdf).unwrap_err();
        assert!(matches!(err, WorkflowError::WrongFileType { .. }));
    }

    #[test]
    fn jpeg_magic_accepted_as_image() {
        let jpg = InputFile::new("pic.jpg", Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(jpg.check_type(ExpectedInput::Image).is_ok());
    }

    #[test]
    fn short_file_does_not_panic() {
        let tiny = InputFile::new("x", Bytes::from_static(b"%P"));
        assert!(tiny.check_type(ExpectedInput::Pdf).is_err());
    }

    #[test]
    fn total_size_sums_all_files() {
        let files = vec![pdf_file(), pdf_file()];
        assert_eq!(total_size(&files), 2 * pdf_file().size());
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = InputFile::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::FileNotFound { .. }));
    }
}
