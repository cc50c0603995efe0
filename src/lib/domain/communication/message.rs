//! Structured messages and how a request becomes one

use std::collections::BTreeMap;

use chrono::Local;
use tracing::debug;

use crate::domain::communication::{request::MessageRequest, transport::TransportBinding};

mod attachments;
pub mod content_type;

pub use attachments::{content_id, AttachmentPart, TransferEncoding};

/// `From` used when neither the request nor the defaults name a sender
pub const PLACEHOLDER_FROM: &str = "dispatch@unknown";

const PLAIN_TEXT: &str = "text/plain; charset=UTF-8";
const HTML: &str = "text/html; charset=UTF-8";

/// One body part of a multipart message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    /// The part's content type
    pub content_type: String,

    /// The part's text
    pub body: String,

    /// Extra part headers, in order
    pub headers: Vec<(String, String)>,
}

impl BodyPart {
    fn new(content_type: &str, body: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    fn with_headers(mut self, headers: Option<&BTreeMap<String, String>>) -> Self {
        for (name, value) in headers.into_iter().flatten() {
            if name.eq_ignore_ascii_case("content-type") {
                self.content_type = value.clone();
            } else {
                set_header(&mut self.headers, name, value);
            }
        }

        self
    }
}

/// The body of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// No body at all
    Empty,

    /// A single plain body, no multipart wrapping
    Single(String),

    /// Separate parts
    Multipart {
        /// The plain text part
        text: Option<BodyPart>,

        /// The HTML part
        html: Option<BodyPart>,

        /// Attached files
        attachments: Vec<AttachmentPart>,
    },
}

impl MessageBody {
    /// Whether the body is split into parts.
    pub fn is_multipart(&self) -> bool {
        matches!(self, MessageBody::Multipart { .. })
    }
}

/// A message ready to be handed to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredMessage {
    headers: Vec<(String, String)>,
    body: MessageBody,
    content_type: Option<String>,
    transport: TransportBinding,
}

impl StructuredMessage {
    /// Top-level headers, in order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Looks up a top-level header, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The body
    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    /// The resolved content type, charset included; `None` leaves the library default
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The transport this message is bound to
    pub fn transport(&self) -> &TransportBinding {
        &self.transport
    }

    /// The plain text part of a multipart message
    pub fn text_part(&self) -> Option<&BodyPart> {
        match &self.body {
            MessageBody::Multipart { text, .. } => text.as_ref(),
            _ => None,
        }
    }

    /// The HTML part of a multipart message
    pub fn html_part(&self) -> Option<&BodyPart> {
        match &self.body {
            MessageBody::Multipart { html, .. } => html.as_ref(),
            _ => None,
        }
    }

    /// Attached files
    pub fn attachments(&self) -> &[AttachmentPart] {
        match &self.body {
            MessageBody::Multipart { attachments, .. } => attachments,
            _ => &[],
        }
    }
}

/// Builds the message for a merged request.
///
/// `request` must already carry its defaults; the transport must already be resolved.
pub fn compose(
    request: &MessageRequest,
    transport: TransportBinding,
    hostname: &str,
) -> StructuredMessage {
    let mut headers = Vec::new();

    let date = request
        .date
        .map(|date| date.to_rfc2822())
        .unwrap_or_else(|| Local::now().to_rfc2822());

    set_header(&mut headers, "Date", &date);
    set_header(
        &mut headers,
        "From",
        request.from.as_deref().unwrap_or(PLACEHOLDER_FROM),
    );

    let lists = [
        ("To", &request.to),
        ("Cc", &request.cc),
        ("Bcc", &request.bcc),
    ];

    for (name, addresses) in lists {
        if let Some(addresses) = addresses {
            set_header(&mut headers, name, &addresses.join(", "));
        }
    }

    if let Some(sender) = &request.sender {
        set_header(&mut headers, "Sender", sender);
    }

    if let Some(reply_to) = &request.reply_to {
        set_header(&mut headers, "Reply-To", &reply_to.join(", "));
    }

    if let Some(subject) = &request.subject {
        set_header(&mut headers, "Subject", subject);
    }

    if let Some(message_id) = &request.message_id {
        set_header(&mut headers, "Message-ID", message_id);
    }

    let mut header_content_type = None;

    for (name, value) in request.headers.iter().flatten() {
        if name.eq_ignore_ascii_case("content-type") {
            header_content_type = Some(value.clone());
        } else {
            set_header(&mut headers, name, value);
        }
    }

    let mut body = compose_body(request, hostname);

    // A Content-Type header only stands in for `content_type` on single-part bodies.
    let explicit_content_type = match (&request.content_type, &body) {
        (Some(content_type), _) => Some(content_type.clone()),
        (None, MessageBody::Multipart { .. }) => {
            if let Some(ignored) = header_content_type {
                debug!("`Content-Type: {}` header ignored for a multipart body", ignored);
            }

            None
        }
        (None, _) => header_content_type,
    };

    let content_type = content_type::resolve(explicit_content_type.as_deref(), &body);
    let content_type = content_type::apply_charset(content_type, request.charset.as_deref());

    if let (MessageBody::Multipart { text: Some(text), .. }, Some(charset)) =
        (&mut body, request.text_part_charset.as_deref())
    {
        text.content_type = content_type::with_charset(&text.content_type, charset);
    }

    StructuredMessage {
        headers,
        body,
        content_type,
        transport,
    }
}

fn compose_body(request: &MessageRequest, hostname: &str) -> MessageBody {
    let attachments: Vec<AttachmentPart> = request
        .attachments
        .iter()
        .flatten()
        .map(|(name, content)| AttachmentPart::new(name, content, hostname, false))
        .chain(
            request
                .inline_attachments
                .iter()
                .flatten()
                .map(|(name, content)| AttachmentPart::new(name, content, hostname, true)),
        )
        .collect();

    let html = request.html_body.as_deref().map(|html| {
        BodyPart::new(HTML, html).with_headers(request.html_body_part_header.as_ref())
    });

    match (&request.body, html, attachments.is_empty()) {
        (Some(body), None, true) => MessageBody::Single(body.clone()),
        (None, None, true) => MessageBody::Empty,
        (body, html, _) => MessageBody::Multipart {
            text: body.as_deref().map(|body| {
                BodyPart::new(PLAIN_TEXT, body).with_headers(request.body_part_header.as_ref())
            }),
            html,
            attachments,
        },
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers
        .iter_mut()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
    {
        Some(existing) => existing.1 = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}
