use std::fs;
use std::path::Path;

/// Text extraction collaborator boundary.
///
/// The pipeline only needs the text a document yields; OCR and document
/// parsing for scanned formats live behind this seam and are out of scope
/// here. Returns the extracted text plus a human-readable status; empty text
/// means extraction failed and the status says why.
pub fn extract_text(path: &Path) -> (String, String) {
    if !path.exists() {
        return (String::new(), format!("file not found: {}", path.display()));
    }
    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => (
            String::new(),
            "no text could be extracted; the file is empty".to_string(),
        ),
        Ok(text) => (text, "ok".to_string()),
        Err(e) => (
            String::new(),
            format!("failed to read {}: {e}", path.display()),
        ),
    }
}
