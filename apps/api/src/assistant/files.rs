//! Uploaded documents: decide whether a file can be read locally as text or
//! has to go through model-side extraction.

use std::path::Path;

use bytes::Bytes;

const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text"];

#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    /// Declared MIME type, if the client sent one.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlainText,
    Document,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.filter(|ct| !ct.trim().is_empty()),
            bytes,
        }
    }

    /// Declared type, else a guess from the file name, else octet-stream.
    pub fn mime_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|ct| ct != "application/octet-stream")
            .or_else(|| {
                mime_guess::from_path(&self.file_name)
                    .first()
                    .map(|m| m.essence_str().to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }

    pub fn kind(&self) -> FileKind {
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        if let Some(ext) = extension.as_deref() {
            if PLAIN_TEXT_EXTENSIONS.contains(&ext) {
                return FileKind::PlainText;
            }
        }
        if self.mime_type().starts_with("text/") {
            FileKind::PlainText
        } else {
            FileKind::Document
        }
    }

    /// Decodes a plain-text upload. `None` when the bytes are not UTF-8.
    pub fn decode_text(&self) -> Option<String> {
        let text = std::str::from_utf8(&self.bytes).ok()?;
        Some(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: Option<&str>, bytes: &'static [u8]) -> FileUpload {
        FileUpload::new(name, content_type.map(String::from), Bytes::from_static(bytes))
    }

    #[test]
    fn test_text_extensions_are_plain_text() {
        for name in ["resume.txt", "resume.md", "RESUME.MD", "notes.markdown", "cv.text"] {
            assert_eq!(upload(name, None, b"hi").kind(), FileKind::PlainText, "{name}");
        }
    }

    #[test]
    fn test_pdf_and_word_are_documents() {
        assert_eq!(upload("resume.pdf", None, b"%PDF").kind(), FileKind::Document);
        assert_eq!(upload("resume.docx", None, b"PK").kind(), FileKind::Document);
    }

    #[test]
    fn test_declared_text_mime_wins_without_extension() {
        assert_eq!(
            upload("resume", Some("text/plain"), b"hi").kind(),
            FileKind::PlainText
        );
    }

    #[test]
    fn test_mime_type_is_guessed_from_name() {
        assert_eq!(upload("resume.pdf", None, b"").mime_type(), "application/pdf");
        assert_eq!(
            upload("resume.pdf", Some("application/octet-stream"), b"").mime_type(),
            "application/pdf"
        );
        assert_eq!(upload("blob", None, b"").mime_type(), "application/octet-stream");
    }

    #[test]
    fn test_decode_text_strips_bom_and_rejects_binary() {
        assert_eq!(
            upload("a.txt", None, b"\xEF\xBB\xBFHello").decode_text().as_deref(),
            Some("Hello")
        );
        assert_eq!(upload("a.txt", None, b"\xFF\xFE\x00").decode_text(), None);
    }
}
