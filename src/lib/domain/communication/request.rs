//! Message requests and process defaults

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::domain::communication::transport::{Via, ViaOptions};

/// Everything a caller can say about one message.
///
/// Every field is optional; only `to` is required, and only after the request has been
/// merged with the [`ProcessDefaults`]. Headers that have no field of their own go in
/// `headers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessageRequest {
    /// Recipients
    pub to: Option<Vec<String>>,

    /// Carbon-copy recipients
    pub cc: Option<Vec<String>>,

    /// Blind carbon-copy recipients
    pub bcc: Option<Vec<String>>,

    /// The author
    pub from: Option<String>,

    /// The envelope sender
    pub sender: Option<String>,

    /// Where replies should go
    pub reply_to: Option<Vec<String>>,

    /// The subject line
    pub subject: Option<String>,

    /// The plain text body
    pub body: Option<String>,

    /// The HTML body
    pub html_body: Option<String>,

    /// Charset of the whole message
    pub charset: Option<String>,

    /// Charset of the plain text part of a multipart message
    pub text_part_charset: Option<String>,

    /// Explicit `Message-ID`
    pub message_id: Option<String>,

    /// Explicit `Date`, the current time when unset
    pub date: Option<DateTime<FixedOffset>>,

    /// Explicit content type, wins over the inferred one
    pub content_type: Option<String>,

    /// Attachments, by filename
    pub attachments: Option<BTreeMap<String, Vec<u8>>>,

    /// Attachments shown inline, by filename
    pub inline_attachments: Option<BTreeMap<String, Vec<u8>>>,

    /// Literal headers, applied after every other field
    pub headers: Option<BTreeMap<String, String>>,

    /// Delivery mechanism, picked by availability when unset
    pub via: Option<Via>,

    /// Delivery settings
    pub via_options: Option<ViaOptions>,

    /// Extra headers for the plain text part
    pub body_part_header: Option<BTreeMap<String, String>>,

    /// Extra headers for the HTML part
    pub html_body_part_header: Option<BTreeMap<String, String>>,
}

impl MessageRequest {
    /// Creates a request addressed to a single recipient.
    pub fn to(recipient: impl Into<String>) -> Self {
        Self {
            to: Some(vec![recipient.into()]),
            ..Default::default()
        }
    }

    /// Lays `self` over `defaults`, field by field. Present fields win whole, maps included.
    pub fn merged_over(self, defaults: &MessageRequest) -> MessageRequest {
        let defaults = defaults.clone();

        MessageRequest {
            to: self.to.or(defaults.to),
            cc: self.cc.or(defaults.cc),
            bcc: self.bcc.or(defaults.bcc),
            from: self.from.or(defaults.from),
            sender: self.sender.or(defaults.sender),
            reply_to: self.reply_to.or(defaults.reply_to),
            subject: self.subject.or(defaults.subject),
            body: self.body.or(defaults.body),
            html_body: self.html_body.or(defaults.html_body),
            charset: self.charset.or(defaults.charset),
            text_part_charset: self.text_part_charset.or(defaults.text_part_charset),
            message_id: self.message_id.or(defaults.message_id),
            date: self.date.or(defaults.date),
            content_type: self.content_type.or(defaults.content_type),
            attachments: self.attachments.or(defaults.attachments),
            inline_attachments: self.inline_attachments.or(defaults.inline_attachments),
            headers: self.headers.or(defaults.headers),
            via: self.via.or(defaults.via),
            via_options: self.via_options.or(defaults.via_options),
            body_part_header: self.body_part_header.or(defaults.body_part_header),
            html_body_part_header: self.html_body_part_header.or(defaults.html_body_part_header),
        }
    }

    /// Whether the request names at least one recipient.
    pub fn has_recipients(&self) -> bool {
        self.to
            .as_ref()
            .is_some_and(|to| to.iter().any(|address| !address.trim().is_empty()))
    }
}

/// Options applied under every request sent through one dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ProcessDefaults(MessageRequest);

impl ProcessDefaults {
    /// Wraps a set of default options.
    pub fn new(options: MessageRequest) -> Self {
        Self(options)
    }

    /// The default options
    pub fn options(&self) -> &MessageRequest {
        &self.0
    }

    /// Merges `request` over these defaults.
    pub fn apply(&self, request: MessageRequest) -> MessageRequest {
        request.merged_over(&self.0)
    }
}

impl From<MessageRequest> for ProcessDefaults {
    fn from(options: MessageRequest) -> Self {
        Self::new(options)
    }
}
