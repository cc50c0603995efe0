//! Attachment parts

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BASE64_ATTACHMENT: Regex = Regex::new(r"\.xlsx$").unwrap();
}

/// MIME line length limit for encoded bodies
const LINE_LENGTH: usize = 76;

/// Transfer encoding applied before the content reached the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// The stored content is already base64
    Base64,
}

/// A file attached to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPart {
    /// The filename shown to the recipient
    pub filename: String,

    /// MIME type guessed from the filename
    pub mime_type: String,

    /// Stored content, encoded if `transfer_encoding` says so
    pub content: Vec<u8>,

    /// Set when `content` is pre-encoded
    pub transfer_encoding: Option<TransferEncoding>,

    /// `<filename@hostname>`
    pub content_id: String,

    /// Shown inline rather than as a download
    pub inline: bool,
}

impl AttachmentPart {
    /// Builds an attachment, base64 encoding spreadsheet content up front.
    pub fn new(filename: &str, content: &[u8], hostname: &str, inline: bool) -> Self {
        let (content, transfer_encoding) = if BASE64_ATTACHMENT.is_match(filename) {
            (encode_base64(content), Some(TransferEncoding::Base64))
        } else {
            (content.to_vec(), None)
        };

        Self {
            filename: filename.to_string(),
            mime_type: mime_guess::from_path(filename)
                .first_or_octet_stream()
                .to_string(),
            content,
            transfer_encoding,
            content_id: content_id(filename, hostname),
            inline,
        }
    }
}

/// The content-id given to an attachment.
pub fn content_id(filename: &str, hostname: &str) -> String {
    format!("<{}@{}>", filename, hostname)
}

fn encode_base64(content: &[u8]) -> Vec<u8> {
    let encoded = STANDARD.encode(content);

    encoded
        .as_bytes()
        .chunks(LINE_LENGTH)
        .collect::<Vec<_>>()
        .join(&b"\r\n"[..])
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_spreadsheet_is_base64_encoded() -> TestResult {
        let raw = vec![0x50, 0x4b, 0x03, 0x04, 0xff, 0x00];
        let attachment = AttachmentPart::new("report.xlsx", &raw, "mailhost", false);

        assert_eq!(attachment.transfer_encoding, Some(TransferEncoding::Base64));
        assert_eq!(attachment.content, STANDARD.encode(&raw).into_bytes());
        assert_eq!(STANDARD.decode(&attachment.content)?, raw);
        assert_eq!(
            attachment.mime_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );

        Ok(())
    }

    #[test]
    fn test_long_spreadsheet_is_wrapped() -> TestResult {
        let raw = vec![7u8; 300];
        let attachment = AttachmentPart::new("big.xlsx", &raw, "mailhost", false);

        let text = String::from_utf8(attachment.content)?;
        assert!(text.split("\r\n").all(|line| line.len() <= LINE_LENGTH));
        assert_eq!(STANDARD.decode(text.replace("\r\n", ""))?, raw);

        Ok(())
    }

    #[test]
    fn test_other_files_are_stored_raw() {
        let attachment = AttachmentPart::new("notes.txt", b"hello!", "mailhost", false);

        assert_eq!(attachment.content, b"hello!".to_vec());
        assert_eq!(attachment.transfer_encoding, None);
        assert_eq!(attachment.mime_type, "text/plain");
    }

    #[test]
    fn test_content_id_uses_filename_and_hostname() {
        let attachment = AttachmentPart::new("logo.png", b"\x89PNG", "mailhost", true);

        assert_eq!(attachment.content_id, "<logo.png@mailhost>");
        assert!(attachment.inline);
    }

    #[test]
    fn test_unknown_extension_is_octet_stream() {
        let attachment = AttachmentPart::new("blob.zzzz", b"\x00", "mailhost", false);

        assert_eq!(attachment.mime_type, "application/octet-stream");
    }
}
