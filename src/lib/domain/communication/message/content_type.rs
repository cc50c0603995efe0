//! Content-type resolution

use super::MessageBody;

/// Picks the message's content type from the explicit override or the body's shape.
///
/// `None` means a single-part message that keeps the mail library's default.
pub fn resolve(explicit: Option<&str>, body: &MessageBody) -> Option<String> {
    if let Some(content_type) = explicit {
        return Some(content_type.to_string());
    }

    match body {
        MessageBody::Multipart { attachments, .. } if !attachments.is_empty() => {
            if attachments.iter().any(|attachment| attachment.inline) {
                Some("multipart/related".to_string())
            } else {
                Some("multipart/mixed".to_string())
            }
        }
        MessageBody::Multipart { .. } => Some("multipart/alternative".to_string()),
        MessageBody::Empty | MessageBody::Single(_) => None,
    }
}

/// Sets the `charset` parameter on a resolved content type.
///
/// Must run after [`resolve`]. A message without a content type is plain text.
pub fn apply_charset(content_type: Option<String>, charset: Option<&str>) -> Option<String> {
    match (content_type, charset) {
        (content_type, None) => content_type,
        (Some(content_type), Some(charset)) => Some(with_charset(&content_type, charset)),
        (None, Some(charset)) => Some(with_charset("text/plain", charset)),
    }
}

/// Replaces or appends the `charset` parameter of `content_type`.
pub fn with_charset(content_type: &str, charset: &str) -> String {
    let mut params = content_type.split(';').map(str::trim);
    let essence = params.next().unwrap_or_default();

    let mut rendered = essence.to_string();

    for param in params.filter(|param| !param.is_empty()) {
        let is_charset = param
            .split_once('=')
            .is_some_and(|(name, _)| name.trim().eq_ignore_ascii_case("charset"));

        if !is_charset {
            rendered.push_str("; ");
            rendered.push_str(param);
        }
    }

    rendered.push_str("; charset=");
    rendered.push_str(charset);
    rendered
}

/// The `type/subtype` part of a content type, lowercased.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
