//! Operation descriptors: what each remote transformation accepts and produces.
//!
//! Every operation the service offers is described statically — file-count
//! bounds, the wire endpoint, the artifact's download name, and its parameter
//! schema with defaults. The [`crate::controller::WorkflowController`] is
//! generic over one [`OperationKind`]; nothing else in the crate hard-codes
//! per-operation behaviour.
//!
//! # Parameter schemas
//!
//! Parameters are a tagged enum rather than a string map: the schema of each
//! operation is closed and tiny (at most one knob), so encoding it in the type
//! system gives exhaustive matches everywhere while [`OperationParams::set`]
//! still offers the name/value surface a form widget needs.

use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The remote transformations the service offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Reduce the size of a single PDF.
    Compress,
    /// Concatenate two or more PDFs into one.
    Merge,
    /// Build a PDF from one or more images.
    ImageToPdf,
    /// Rasterise a PDF's pages into a ZIP of images.
    PdfToImage,
    /// Extract text from a PDF or image, optionally via OCR.
    ExtractText,
}

impl OperationKind {
    /// Human-readable operation name, used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Compress => "Compress",
            OperationKind::Merge => "Merge",
            OperationKind::ImageToPdf => "ImageToPdf",
            OperationKind::PdfToImage => "PdfToImage",
            OperationKind::ExtractText => "ExtractText",
        }
    }

    /// Minimum number of input files a submission requires.
    pub fn min_files(self) -> usize {
        match self {
            OperationKind::Merge => 2,
            _ => 1,
        }
    }

    /// Maximum number of input files, if the operation is bounded.
    pub fn max_files(self) -> Option<usize> {
        match self {
            OperationKind::Compress | OperationKind::PdfToImage | OperationKind::ExtractText => {
                Some(1)
            }
            OperationKind::Merge | OperationKind::ImageToPdf => None,
        }
    }

    /// Route segment under the service's `/api/pdf/` prefix.
    pub fn endpoint(self) -> &'static str {
        match self {
            OperationKind::Compress => "compress",
            OperationKind::Merge => "merge",
            OperationKind::ImageToPdf => "image-to-pdf",
            OperationKind::PdfToImage => "pdf-to-image",
            OperationKind::ExtractText => "extract-text",
        }
    }

    /// Fixed download name for the operation's artifact.
    pub fn output_filename(self) -> &'static str {
        match self {
            OperationKind::Compress => "compressed.pdf",
            OperationKind::Merge => "merged.pdf",
            OperationKind::ImageToPdf => "converted.pdf",
            OperationKind::PdfToImage => "images.zip",
            OperationKind::ExtractText => "extracted-text.txt",
        }
    }

    /// The input type this operation expects, for magic-byte validation.
    pub fn expected_input(self) -> ExpectedInput {
        match self {
            OperationKind::Compress | OperationKind::Merge | OperationKind::PdfToImage => {
                ExpectedInput::Pdf
            }
            OperationKind::ImageToPdf => ExpectedInput::Image,
            OperationKind::ExtractText => ExpectedInput::PdfOrImage,
        }
    }

    /// Default parameter values for this operation.
    pub fn default_params(self) -> OperationParams {
        match self {
            OperationKind::Compress => OperationParams::Compress {
                quality: Quality::Medium,
            },
            OperationKind::Merge => OperationParams::Merge,
            OperationKind::ImageToPdf => OperationParams::ImageToPdf {
                quality: Quality::Medium,
            },
            OperationKind::PdfToImage => OperationParams::PdfToImage {
                format: ImageFormat::Png,
            },
            OperationKind::ExtractText => OperationParams::ExtractText { use_ocr: false },
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Input type an operation accepts, checked before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedInput {
    Pdf,
    Image,
    PdfOrImage,
}

/// Compression/build quality: the service's three-point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Smallest file.
    Low,
    /// Balanced. (default)
    #[default]
    Medium,
    /// Best quality.
    High,
}

impl Quality {
    /// Wire value sent as the `quality` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        }
    }

    fn parse(value: &str) -> Result<Self, WorkflowError> {
        match value {
            "low" => Ok(Quality::Low),
            "medium" => Ok(Quality::Medium),
            "high" => Ok(Quality::High),
            other => Err(WorkflowError::InvalidParameterValue {
                name: "quality",
                value: other.to_string(),
                expected: "low, medium, high",
            }),
        }
    }
}

/// Output image format for PDF-to-image conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless, larger files. (default)
    #[default]
    Png,
    /// Lossy, smaller files.
    Jpg,
}

impl ImageFormat {
    /// Wire value sent as the `format` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }

    fn parse(value: &str) -> Result<Self, WorkflowError> {
        match value {
            "png" => Ok(ImageFormat::Png),
            "jpg" => Ok(ImageFormat::Jpg),
            other => Err(WorkflowError::InvalidParameterValue {
                name: "format",
                value: other.to_string(),
                expected: "png, jpg",
            }),
        }
    }
}

/// Live parameter values for one workflow instance.
///
/// Exactly one of these exists per workflow; the variant always matches the
/// controller's [`OperationKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationParams {
    Compress { quality: Quality },
    Merge,
    ImageToPdf { quality: Quality },
    PdfToImage { format: ImageFormat },
    ExtractText { use_ocr: bool },
}

impl OperationParams {
    /// Update one named parameter from its string form-value.
    ///
    /// Unknown names and out-of-domain values are `ValidationError`s and
    /// leave the set unchanged.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), WorkflowError> {
        match (&mut *self, name) {
            (OperationParams::Compress { quality }, "quality")
            | (OperationParams::ImageToPdf { quality }, "quality") => {
                *quality = Quality::parse(value)?;
                Ok(())
            }
            (OperationParams::PdfToImage { format }, "format") => {
                *format = ImageFormat::parse(value)?;
                Ok(())
            }
            (OperationParams::ExtractText { use_ocr }, "use_ocr") => {
                *use_ocr = match value {
                    "true" => true,
                    "false" => false,
                    other => {
                        return Err(WorkflowError::InvalidParameterValue {
                            name: "use_ocr",
                            value: other.to_string(),
                            expected: "true, false",
                        })
                    }
                };
                Ok(())
            }
            _ => Err(WorkflowError::UnknownParameter {
                operation: self.kind().name(),
                name: name.to_string(),
            }),
        }
    }

    /// The operation this parameter set belongs to.
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationParams::Compress { .. } => OperationKind::Compress,
            OperationParams::Merge => OperationKind::Merge,
            OperationParams::ImageToPdf { .. } => OperationKind::ImageToPdf,
            OperationParams::PdfToImage { .. } => OperationKind::PdfToImage,
            OperationParams::ExtractText { .. } => OperationKind::ExtractText,
        }
    }

    /// `(field, value)` pairs for the multipart form, in wire names.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            OperationParams::Compress { quality } | OperationParams::ImageToPdf { quality } => {
                vec![("quality", quality.as_str().to_string())]
            }
            OperationParams::Merge => vec![],
            OperationParams::PdfToImage { format } => {
                vec![("format", format.as_str().to_string())]
            }
            OperationParams::ExtractText { use_ocr } => {
                vec![("use_ocr", use_ocr.to_string())]
            }
        }
    }
}

/// Format a byte count for display: `B`, `KB`, `MB`, `GB` with one decimal.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let b = bytes as f64;
    if b >= GB {
        format!("{:.1} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_requires_two_files() {
        assert_eq!(OperationKind::Merge.min_files(), 2);
        assert_eq!(OperationKind::Compress.min_files(), 1);
    }

    #[test]
    fn single_input_operations_are_capped() {
        assert_eq!(OperationKind::Compress.max_files(), Some(1));
        assert_eq!(OperationKind::PdfToImage.max_files(), Some(1));
        assert_eq!(OperationKind::Merge.max_files(), None);
        assert_eq!(OperationKind::ImageToPdf.max_files(), None);
    }

    #[test]
    fn download_names_follow_convention() {
        assert_eq!(OperationKind::Compress.output_filename(), "compressed.pdf");
        assert_eq!(OperationKind::Merge.output_filename(), "merged.pdf");
        assert_eq!(OperationKind::ImageToPdf.output_filename(), "converted.pdf");
        assert_eq!(OperationKind::PdfToImage.output_filename(), "images.zip");
        assert_eq!(
            OperationKind::ExtractText.output_filename(),
            "extracted-text.txt"
        );
    }

    #[test]
    fn set_known_parameter() {
        let mut p = OperationKind::Compress.default_params();
        p.set("quality", "low").unwrap();
        assert_eq!(
            p,
            OperationParams::Compress {
                quality: Quality::Low
            }
        );
    }

    #[test]
    fn set_rejects_unknown_name() {
        let mut p = OperationKind::Compress.default_params();
        let err = p.set("format", "png").unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownParameter { .. }));
        // Unchanged on error
        assert_eq!(p, OperationKind::Compress.default_params());
    }

    #[test]
    fn set_rejects_out_of_domain_value() {
        let mut p = OperationKind::PdfToImage.default_params();
        let err = p.set("format", "webp").unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidParameterValue { name: "format", .. }
        ));
    }

    #[test]
    fn merge_has_no_parameters() {
        let mut p = OperationKind::Merge.default_params();
        assert!(p.set("quality", "low").is_err());
        assert!(p.form_fields().is_empty());
    }

    #[test]
    fn ocr_flag_round_trips() {
        let mut p = OperationKind::ExtractText.default_params();
        p.set("use_ocr", "true").unwrap();
        assert_eq!(p.form_fields(), vec![("use_ocr", "true".to_string())]);
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5_000_000), "4.8 MB");
    }
}
