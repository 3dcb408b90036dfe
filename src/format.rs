//! Format policy: pure classification of filenames into supported Office
//! formats and their Drive import targets.
//!
//! Classification is a routing decision, not a failure mode — an unknown
//! extension means the file is skipped and reported as such, never failed.
//! The MIME pairs mirror what Drive expects: the source Office MIME for the
//! uploaded payload and the Google-native import MIME that makes Drive
//! convert the document on ingestion (so a later export can produce PDF).

use std::path::Path;

/// The export target for every supported format.
pub const PDF_MIME: &str = "application/pdf";

/// Result of classifying a single filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The file can be converted; carries the MIME pair for the upload.
    Supported {
        /// MIME type of the uploaded Office payload.
        source_mime: &'static str,
        /// Google-native MIME type Drive imports the payload as.
        import_mime: &'static str,
    },
    /// Extension not in the supported set; the file is skipped.
    Unsupported,
}

/// (extension, source MIME, import MIME) for every supported format.
const SUPPORTED: &[(&str, &str, &str)] = &[
    (
        "doc",
        "application/msword",
        "application/vnd.google-apps.document",
    ),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.google-apps.document",
    ),
    (
        "ppt",
        "application/vnd.ms-powerpoint",
        "application/vnd.google-apps.presentation",
    ),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "application/vnd.google-apps.presentation",
    ),
    (
        "xls",
        "application/vnd.ms-excel",
        "application/vnd.google-apps.spreadsheet",
    ),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.google-apps.spreadsheet",
    ),
];

/// Classify a filename by its extension, case-insensitively.
///
/// Pure and infallible: `Report.PPTX` and `report.pptx` classify identically,
/// and anything else (including extensionless names) is `Unsupported`.
pub fn classify(file_name: &str) -> Classification {
    let ext = match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_ascii_lowercase(),
        None => return Classification::Unsupported,
    };

    for (candidate, source_mime, import_mime) in SUPPORTED {
        if ext == *candidate {
            return Classification::Supported {
                source_mime,
                import_mime,
            };
        }
    }
    Classification::Unsupported
}

/// Output filename for a converted input: extension replaced with `.pdf`.
pub fn pdf_output_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    format!("{stem}.pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_supported_extensions_classify() {
        for ext in ["doc", "docx", "ppt", "pptx", "xls", "xlsx"] {
            let name = format!("file.{ext}");
            assert!(
                matches!(classify(&name), Classification::Supported { .. }),
                "{name} should be supported"
            );
        }
    }

    #[test]
    fn classification_is_case_insensitive() {
        let upper = classify("Report.PPTX");
        let lower = classify("report.pptx");
        assert_eq!(upper, lower);
        assert!(matches!(upper, Classification::Supported { .. }));
    }

    #[test]
    fn unknown_extensions_are_unsupported() {
        assert_eq!(classify("notes.txt"), Classification::Unsupported);
        assert_eq!(classify("archive.zip"), Classification::Unsupported);
        assert_eq!(classify("document.pdf"), Classification::Unsupported);
        assert_eq!(classify("no_extension"), Classification::Unsupported);
        assert_eq!(classify(""), Classification::Unsupported);
    }

    #[test]
    fn mime_pairs_match_format_family() {
        match classify("slides.pptx") {
            Classification::Supported {
                source_mime,
                import_mime,
            } => {
                assert!(source_mime.contains("presentationml"));
                assert_eq!(import_mime, "application/vnd.google-apps.presentation");
            }
            Classification::Unsupported => panic!("pptx must be supported"),
        }
        match classify("sheet.xls") {
            Classification::Supported { import_mime, .. } => {
                assert_eq!(import_mime, "application/vnd.google-apps.spreadsheet");
            }
            Classification::Unsupported => panic!("xls must be supported"),
        }
    }

    #[test]
    fn pdf_output_name_replaces_extension() {
        assert_eq!(pdf_output_name("a.pptx"), "a.pdf");
        assert_eq!(pdf_output_name("Quarterly Report.docx"), "Quarterly Report.pdf");
        assert_eq!(pdf_output_name("archive.tar.xlsx"), "archive.tar.pdf");
    }
}
