//! Pure-Rust document text extraction.
//!
//! PDF via pdf-extract, DOCX via docx-rs, XLSX/XLS via calamine, plain-text
//! families read directly. Everything runs without system libraries, so the
//! extractor works wherever the service does.

use calamine::{Reader, Xls, Xlsx, open_workbook};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on extracted text handed to the analysis client.
const MAX_TEXT_LENGTH: usize = 500_000;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Classified file-processing failure: a format we do not parse.
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Classified file-processing failure: the document could not be parsed.
    #[error("failed to process {format} document: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// True for the kinds the lifecycle remaps to the generic localized
    /// file-read message. `Io` failures propagate with their own text.
    pub fn is_file_processing(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_) | Self::Parse { .. })
    }
}

/// Extracts plain text from a document on disk.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Extension-dispatched extractor over the pure-Rust parsing crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

impl TextExtractor for DocumentExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase());

        let raw = match ext.as_deref() {
            Some(e) if is_plain_text_ext(e) => self.read_plain_text(path)?,
            Some("pdf") => self.extract_pdf(path)?,
            Some("docx") => self.extract_docx(path)?,
            Some("xlsx") => self.extract_xlsx(path)?,
            Some("xls") => self.extract_xls(path)?,
            other => {
                return Err(ExtractError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ));
            }
        };

        let text = truncate_text(&clean_text(&raw));
        debug!(path = %path.display(), chars = text.len(), "document text extracted");
        Ok(text)
    }
}

fn is_plain_text_ext(ext: &str) -> bool {
    matches!(
        ext,
        "txt" | "md" | "csv" | "json" | "xml" | "yaml" | "yml" | "log" | "html" | "htm"
    )
}

impl DocumentExtractor {
    fn read_plain_text(&self, path: &Path) -> Result<String, ExtractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn extract_pdf(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = std::fs::read(path)?;

        // pdf-extract (via its font handling) can panic on malformed
        // glyph data; keep the panic inside the extractor
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        }));

        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                warn!(path = %path.display(), "PDF extraction failed: {e}");
                Err(ExtractError::Parse {
                    format: "pdf",
                    message: e.to_string(),
                })
            }
            Err(_) => {
                warn!(path = %path.display(), "PDF extraction panicked");
                Err(ExtractError::Parse {
                    format: "pdf",
                    message: "extraction panicked on malformed document".to_string(),
                })
            }
        }
    }

    fn extract_docx(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = std::fs::read(path)?;
        let doc = docx_rs::read_docx(&bytes).map_err(|e| ExtractError::Parse {
            format: "docx",
            message: e.to_string(),
        })?;

        let mut text = String::new();
        for child in doc.document.children {
            collect_docx_text(&child, &mut text);
        }
        Ok(text)
    }

    fn extract_xlsx(&self, path: &Path) -> Result<String, ExtractError> {
        let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e: calamine::XlsxError| ExtractError::Parse {
            format: "xlsx",
            message: e.to_string(),
        })?;
        Ok(sheets_to_text(&mut workbook))
    }

    fn extract_xls(&self, path: &Path) -> Result<String, ExtractError> {
        let mut workbook: Xls<_> = open_workbook(path).map_err(|e: calamine::XlsError| ExtractError::Parse {
            format: "xls",
            message: e.to_string(),
        })?;
        Ok(sheets_to_text(&mut workbook))
    }
}

fn sheets_to_text<RS>(workbook: &mut impl Reader<RS>) -> String
where
    RS: std::io::Read + std::io::Seek,
{
    let mut all_text = String::new();
    let sheet_names = workbook.sheet_names().to_vec();

    for sheet_name in &sheet_names {
        if let Ok(range) = workbook.worksheet_range(sheet_name) {
            all_text.push_str(&format!("\n=== Sheet: {} ===\n", sheet_name));

            for row in range.rows() {
                let row_text: Vec<String> = row
                    .iter()
                    .map(|cell| cell.to_string())
                    .filter(|s| !s.is_empty())
                    .collect();

                if !row_text.is_empty() {
                    all_text.push_str(&row_text.join(" | "));
                    all_text.push('\n');
                }
            }
        }
    }

    all_text
}

/// Walk a DOCX element, appending any run text it contains.
fn collect_docx_text(element: &docx_rs::DocumentChild, output: &mut String) {
    match element {
        docx_rs::DocumentChild::Paragraph(para) => {
            for child in &para.children {
                match child {
                    docx_rs::ParagraphChild::Run(run) => push_run_text(run, output),
                    docx_rs::ParagraphChild::Hyperlink(link) => {
                        for nested in &link.children {
                            if let docx_rs::ParagraphChild::Run(run) = nested {
                                push_run_text(run, output);
                            }
                        }
                    }
                    _ => {}
                }
            }
            output.push('\n');
        }
        docx_rs::DocumentChild::Table(table) => {
            for row in &table.rows {
                let docx_rs::TableChild::TableRow(tr) = row;
                for cell in &tr.cells {
                    let docx_rs::TableRowChild::TableCell(tc) = cell;
                    for content in &tc.children {
                        if let docx_rs::TableCellContent::Paragraph(para) = content {
                            for child in &para.children {
                                if let docx_rs::ParagraphChild::Run(run) = child {
                                    push_run_text(run, output);
                                }
                            }
                            output.push_str(" | ");
                        }
                    }
                }
                output.push('\n');
            }
        }
        _ => {}
    }
}

fn push_run_text(run: &docx_rs::Run, output: &mut String) {
    for child in &run.children {
        if let docx_rs::RunChild::Text(text) = child {
            output.push_str(&text.text);
        }
    }
}

/// Trim each line and drop blank ones.
fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cap the payload, preferring paragraph, then sentence, then word breaks.
fn truncate_text(text: &str) -> String {
    if text.len() <= MAX_TEXT_LENGTH {
        return text.to_string();
    }

    let truncated = &text[..MAX_TEXT_LENGTH];

    if let Some(pos) = truncated.rfind("\n\n") {
        return truncated[..pos].to_string();
    }
    if let Some(pos) = truncated.rfind(". ") {
        return truncated[..=pos].to_string();
    }
    if let Some(pos) = truncated.rfind(' ') {
        return truncated[..pos].to_string();
    }

    truncated.to_string()
}
