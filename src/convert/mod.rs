//! Upload conversion subsystem.
//!
//! # Data Flow
//! ```text
//! multipart field "file"
//!     → check (size bound, MIME allow-list, octet-stream escape hatch)
//!     → DOCX: docx.rs → complete HTML document
//!     → anything else: returned unchanged with its MIME type
//! ```

pub mod docx;

use axum::body::Bytes;

use crate::config::UploadConfig;
use crate::relay::error::{RelayError, RelayResult};
use crate::relay::rewrite::escape_html;

/// MIME type of Word (OOXML) documents.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const OCTET_STREAM: &str = "application/octet-stream";

/// A file received on the upload endpoint.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Upload {
    /// Lowercased MIME type without parameters; octet-stream when absent.
    pub fn mime(&self) -> String {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| OCTET_STREAM.to_string())
    }

    fn has_docx_extension(&self) -> bool {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("docx"))
    }
}

/// Response body for an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converted {
    Html(String),
    Passthrough { content_type: String, bytes: Bytes },
}

/// Validate `upload` and convert it if it is a Word document.
pub fn convert_upload(upload: Upload, config: &UploadConfig) -> RelayResult<Converted> {
    if upload.bytes.len() > config.max_bytes {
        return Err(RelayError::InvalidUpload(format!(
            "File exceeds the {} byte limit",
            config.max_bytes
        )));
    }

    let mime = upload.mime();
    let allowed = config
        .allowed_mime_types
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&mime))
        || (config.allow_octet_stream && mime == OCTET_STREAM);
    if !allowed {
        return Err(RelayError::InvalidUpload(format!(
            "Unsupported file type: {}",
            mime
        )));
    }

    let is_docx = mime == DOCX_MIME || (mime == OCTET_STREAM && upload.has_docx_extension());
    if !is_docx {
        return Ok(Converted::Passthrough {
            content_type: mime,
            bytes: upload.bytes,
        });
    }

    let body = docx::docx_to_html(&upload.bytes, config.max_expanded_bytes)?;
    let title = upload.file_name.as_deref().unwrap_or("Document");
    Ok(Converted::Html(html_document(title, &body)))
}

fn html_document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>body{{font-family:Arial,sans-serif;line-height:1.5;max-width:860px;margin:24px auto;padding:0 16px}}\
         table{{border-collapse:collapse}}td{{border:1px solid #ccc;padding:4px 8px;vertical-align:top}}</style>\
         </head><body>{}</body></html>",
        escape_html(title),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, content_type: Option<&str>, bytes: Vec<u8>) -> Upload {
        Upload {
            file_name: Some(name.to_string()),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::from(bytes),
        }
    }

    #[test]
    fn test_docx_becomes_html_document() {
        let bytes = docx::tests::docx_with_body(r#"<w:p><w:r><w:t>Hello</w:t></w:r></w:p>"#);
        let converted =
            convert_upload(upload("memo.docx", Some(DOCX_MIME), bytes), &UploadConfig::default())
                .unwrap();
        let Converted::Html(html) = converted else {
            panic!("expected HTML");
        };
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>memo.docx</title>"));
        assert!(html.contains("<p>Hello</p>"));
    }

    #[test]
    fn test_octet_stream_docx_is_sniffed_by_extension() {
        let bytes = docx::tests::docx_with_body(r#"<w:p><w:r><w:t>x</w:t></w:r></w:p>"#);
        let converted = convert_upload(upload("a.DOCX", None, bytes), &UploadConfig::default());
        assert!(matches!(converted, Ok(Converted::Html(_))));
    }

    #[test]
    fn test_allowed_types_pass_through() {
        let converted = convert_upload(
            upload("a.pdf", Some("application/pdf; name=a.pdf"), b"%PDF-1.4".to_vec()),
            &UploadConfig::default(),
        )
        .unwrap();
        assert_eq!(
            converted,
            Converted::Passthrough {
                content_type: "application/pdf".into(),
                bytes: Bytes::from_static(b"%PDF-1.4"),
            }
        );
    }

    #[test]
    fn test_rejects_disallowed_type() {
        let err = convert_upload(
            upload("x.exe", Some("application/x-msdownload"), vec![0; 4]),
            &UploadConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::InvalidUpload(_)));
        assert!(err.to_string().contains("application/x-msdownload"));
    }

    #[test]
    fn test_octet_stream_needs_escape_hatch() {
        let config = UploadConfig {
            allow_octet_stream: false,
            ..UploadConfig::default()
        };
        assert!(convert_upload(upload("blob", None, vec![1, 2]), &config).is_err());
    }

    #[test]
    fn test_rejects_oversized() {
        let config = UploadConfig {
            max_bytes: 4,
            ..UploadConfig::default()
        };
        let err = convert_upload(upload("a.txt", Some("text/plain"), vec![b'a'; 5]), &config)
            .unwrap_err();
        assert!(err.to_string().contains("4 byte limit"));
    }

    #[test]
    fn test_broken_docx_fails_conversion() {
        let err = convert_upload(
            upload("bad.docx", Some(DOCX_MIME), b"not a zip".to_vec()),
            &UploadConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::ConversionFailed(_)));
    }
}
