//! Turns a structured message into a lettre message

use std::time::SystemTime;

use anyhow::anyhow;
use chrono::DateTime;
use lettre::{
    message::{
        header::{
            self, ContentDisposition, ContentTransferEncoding, ContentType, Header, HeaderName,
            HeaderValue,
        },
        Body, Mailboxes, MessageBuilder, MultiPart, MultiPartBuilder, SinglePart,
        SinglePartBuilder,
    },
    Message,
};
use tracing::{debug, warn};

use crate::domain::communication::{
    mailer::MailerError,
    message::{
        content_type, AttachmentPart, BodyPart, MessageBody, StructuredMessage, TransferEncoding,
    },
};

enum Node {
    Single(SinglePart),
    Multi(MultiPart),
}

/// Renders `message` with lettre's builders.
///
/// # Returns
/// A [`Result`] which is [`Ok`] containing the [`Message`], or an [`Err`] if an address,
/// header name or content type cannot be represented.
pub fn render(message: &StructuredMessage) -> Result<Message, MailerError> {
    let mut builder = Message::builder();

    for (name, value) in message.headers() {
        builder = apply_header(builder, name, value)?;
    }

    match message.body() {
        MessageBody::Empty => single_body(builder, message.content_type(), String::new()),
        MessageBody::Single(text) => single_body(builder, message.content_type(), text.clone()),
        MessageBody::Multipart {
            text,
            html,
            attachments,
        } => {
            let kind = message.content_type().unwrap_or("multipart/mixed");
            let multipart = multipart_body(kind, text.as_ref(), html.as_ref(), attachments)?;

            Ok(builder.multipart(multipart)?)
        }
    }
}

fn apply_header(
    builder: MessageBuilder,
    name: &str,
    value: &str,
) -> Result<MessageBuilder, MailerError> {
    let builder = match name.to_ascii_lowercase().as_str() {
        "from" => builder.from(value.parse()?),
        "sender" => builder.sender(value.parse()?),
        "to" => mailboxes(value)?.into_iter().fold(builder, MessageBuilder::to),
        "cc" => mailboxes(value)?.into_iter().fold(builder, MessageBuilder::cc),
        "bcc" => mailboxes(value)?.into_iter().fold(builder, MessageBuilder::bcc),
        "reply-to" => mailboxes(value)?
            .into_iter()
            .fold(builder, MessageBuilder::reply_to),
        "subject" => builder.subject(value),
        "message-id" => builder.message_id(Some(value.to_string())),
        "date" => {
            let date = DateTime::parse_from_rfc2822(value)
                .map_err(|_| MailerError::InvalidHeader(format!("{}: {}", name, value)))?;

            builder.date(SystemTime::from(date))
        }
        _ => builder.raw_header(raw_header(name, value)?),
    };

    Ok(builder)
}

fn mailboxes(value: &str) -> Result<Mailboxes, MailerError> {
    Ok(value.parse::<Mailboxes>()?)
}

fn raw_header(name: &str, value: &str) -> Result<HeaderValue, MailerError> {
    let header_name = HeaderName::new_from_ascii(name.to_string())
        .map_err(|_| MailerError::InvalidHeader(name.to_string()))?;

    Ok(HeaderValue::new(header_name, value.to_string()))
}

fn single_body(
    builder: MessageBuilder,
    content_type: Option<&str>,
    text: String,
) -> Result<Message, MailerError> {
    let builder = match content_type {
        Some(content_type) => builder.header(parse_content_type(content_type)?),
        None => builder.header(ContentType::TEXT_PLAIN),
    };

    Ok(builder.body(text)?)
}

fn multipart_body(
    kind: &str,
    text: Option<&BodyPart>,
    html: Option<&BodyPart>,
    attachments: &[AttachmentPart],
) -> Result<MultiPart, MailerError> {
    let alternatives = text
        .into_iter()
        .chain(html)
        .map(body_part)
        .collect::<Result<Vec<_>, _>>()?;

    let mut nodes = Vec::new();

    if attachments.is_empty() || alternatives.len() < 2 {
        nodes.extend(alternatives.into_iter().map(Node::Single));
    } else {
        let alternative = alternatives.into_iter().map(Node::Single).collect();
        nodes.push(Node::Multi(assemble(MultiPart::alternative(), alternative)?));
    }

    for attachment in attachments {
        nodes.push(Node::Single(attachment_part(attachment)?));
    }

    assemble(multipart_builder(kind)?, nodes)
}

fn multipart_builder(kind: &str) -> Result<MultiPartBuilder, MailerError> {
    if kind.contains(';') {
        debug!("multipart parameters in `{}` are replaced by lettre", kind);
    }

    match content_type::essence(kind).as_str() {
        "multipart/mixed" => Ok(MultiPart::mixed()),
        "multipart/alternative" => Ok(MultiPart::alternative()),
        "multipart/related" => Ok(MultiPart::related()),
        _ => Err(MailerError::InvalidContentType(kind.to_string())),
    }
}

fn assemble(builder: MultiPartBuilder, nodes: Vec<Node>) -> Result<MultiPart, MailerError> {
    let mut nodes = nodes.into_iter();

    let mut multipart = match nodes.next() {
        Some(Node::Single(part)) => builder.singlepart(part),
        Some(Node::Multi(part)) => builder.multipart(part),
        None => return Err(anyhow!("multipart message without parts").into()),
    };

    for node in nodes {
        multipart = match node {
            Node::Single(part) => multipart.singlepart(part),
            Node::Multi(part) => multipart.multipart(part),
        };
    }

    Ok(multipart)
}

fn body_part(part: &BodyPart) -> Result<SinglePart, MailerError> {
    let mut builder = SinglePart::builder().header(parse_content_type(&part.content_type)?);

    for (name, value) in &part.headers {
        builder = part_header(builder, name, value)?;
    }

    Ok(builder.body(part.body.clone()))
}

fn part_header(
    builder: SinglePartBuilder,
    name: &str,
    value: &str,
) -> Result<SinglePartBuilder, MailerError> {
    let builder = match name.to_ascii_lowercase().as_str() {
        "content-transfer-encoding" => {
            builder.header(parse_header::<ContentTransferEncoding>(name, value)?)
        }
        "content-disposition" => builder.header(parse_header::<ContentDisposition>(name, value)?),
        "content-id" => builder.header(header::ContentId::from(value.to_string())),
        _ => {
            warn!(header = name, "lettre parts only carry typed headers, skipping");
            builder
        }
    };

    Ok(builder)
}

fn parse_header<H: Header>(name: &str, value: &str) -> Result<H, MailerError> {
    H::parse(value).map_err(|_| MailerError::InvalidHeader(name.to_string()))
}

fn attachment_part(attachment: &AttachmentPart) -> Result<SinglePart, MailerError> {
    let disposition = if attachment.inline {
        ContentDisposition::inline_with_name(&attachment.filename)
    } else {
        ContentDisposition::attachment(&attachment.filename)
    };

    let body = match attachment.transfer_encoding {
        Some(TransferEncoding::Base64) => {
            Body::dangerous_pre_encoded(attachment.content.clone(), ContentTransferEncoding::Base64)
        }
        None => Body::new(attachment.content.clone()),
    };

    Ok(SinglePart::builder()
        .header(parse_content_type(&attachment.mime_type)?)
        .header(disposition)
        .header(header::ContentId::from(attachment.content_id.clone()))
        .body(body))
}

fn parse_content_type(value: &str) -> Result<ContentType, MailerError> {
    ContentType::parse(value).map_err(|_| MailerError::InvalidContentType(value.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use testresult::TestResult;

    use crate::domain::communication::{
        message::compose,
        request::MessageRequest,
        transport::{TransportBinding, Via, ViaOptions},
    };

    use super::*;

    fn structured(request: MessageRequest) -> StructuredMessage {
        let binding = TransportBinding {
            via: Via::Smtp,
            options: ViaOptions::default(),
        };

        compose(&request, binding, "mailhost")
    }

    fn formatted(request: MessageRequest) -> TestResult<String> {
        let message = render(&structured(request))?;

        Ok(String::from_utf8(message.formatted())?)
    }

    #[test]
    fn test_single_part_message() -> TestResult {
        let output = formatted(MessageRequest {
            from: Some("a@x.com".to_string()),
            subject: Some("hi".to_string()),
            body: Some("hello".to_string()),
            ..MessageRequest::to("b@x.com")
        })?;

        assert!(output.contains("From: a@x.com"));
        assert!(output.contains("To: b@x.com"));
        assert!(output.contains("Subject: hi"));
        assert!(output.contains("hello"));
        assert!(!output.contains("multipart"));

        Ok(())
    }

    #[test]
    fn test_alternative_message() -> TestResult {
        let output = formatted(MessageRequest {
            body: Some("hello".to_string()),
            html_body: Some("<p>hi</p>".to_string()),
            ..MessageRequest::to("b@x.com")
        })?;

        assert!(output.contains("multipart/alternative"));
        assert!(output.contains("text/plain"));
        assert!(output.contains("text/html"));
        assert!(output.contains("hello"));
        assert!(output.contains("<p>hi</p>"));

        Ok(())
    }

    #[test]
    fn test_attachments_carry_content_id() -> TestResult {
        let spreadsheet = vec![0x50, 0x4b, 0x03, 0x04];

        let output = formatted(MessageRequest {
            body: Some("see attached".to_string()),
            html_body: Some("<p>see attached</p>".to_string()),
            attachments: Some(BTreeMap::from([
                ("notes.txt".to_string(), b"notes".to_vec()),
                ("report.xlsx".to_string(), spreadsheet.clone()),
            ])),
            ..MessageRequest::to("b@x.com")
        })?;

        assert!(output.contains("multipart/mixed"));
        assert!(output.contains("multipart/alternative"));
        assert!(output.contains("Content-ID: <notes.txt@mailhost>"));
        assert!(output.contains("Content-ID: <report.xlsx@mailhost>"));
        assert!(output.contains("Content-Transfer-Encoding: base64"));
        assert!(output.contains(&STANDARD.encode(&spreadsheet)));

        Ok(())
    }

    #[test]
    fn test_inline_attachment_is_related() -> TestResult {
        let output = formatted(MessageRequest {
            html_body: Some(r#"<img src="cid:logo.png@mailhost">"#.to_string()),
            inline_attachments: Some(BTreeMap::from([(
                "logo.png".to_string(),
                b"\x89PNG".to_vec(),
            )])),
            ..MessageRequest::to("b@x.com")
        })?;

        assert!(output.contains("multipart/related"));
        assert!(output.contains("Content-Disposition: inline"));

        Ok(())
    }

    #[test]
    fn test_custom_headers_and_hidden_bcc() -> TestResult {
        let message = render(&structured(MessageRequest {
            bcc: Some(vec!["hidden@x.com".to_string()]),
            headers: Some(BTreeMap::from([(
                "X-Campaign".to_string(),
                "spring".to_string(),
            )])),
            ..MessageRequest::to("b@x.com")
        }))?;

        let output = String::from_utf8(message.formatted())?;

        assert!(output.contains("X-Campaign: spring"));
        assert!(!output.contains("hidden@x.com"));
        assert!(message
            .envelope()
            .to()
            .iter()
            .any(|address| address.to_string() == "hidden@x.com"));

        Ok(())
    }

    #[test]
    fn test_non_multipart_override_on_multipart_body_is_rejected() {
        let result = render(&structured(MessageRequest {
            body: Some("hello".to_string()),
            html_body: Some("<p>hi</p>".to_string()),
            content_type: Some("text/plain".to_string()),
            ..MessageRequest::to("b@x.com")
        }));

        assert!(matches!(result, Err(MailerError::InvalidContentType(_))));
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        let result = render(&structured(MessageRequest::to("not an address")));

        assert!(matches!(result, Err(MailerError::InvalidAddress(_))));
    }

    #[test]
    fn test_invalid_header_name_is_rejected() {
        let result = render(&structured(MessageRequest {
            headers: Some(BTreeMap::from([(
                "Bad Header".to_string(),
                "x".to_string(),
            )])),
            ..MessageRequest::to("b@x.com")
        }));

        assert!(matches!(result, Err(MailerError::InvalidHeader(_))));
    }

    #[test]
    fn test_plain_body_without_content_type_is_declared_utf8() -> TestResult {
        let request = MessageRequest {
            body: Some("héllo wörld".to_string()),
            ..MessageRequest::to("b@x.com")
        };

        assert_eq!(structured(request.clone()).content_type(), None);

        let output = formatted(request)?;

        assert!(output.contains("Content-Type: text/plain; charset=utf-8"));

        Ok(())
    }

    #[test]
    fn test_content_type_header_keeps_multipart_deliverable() -> TestResult {
        let output = formatted(MessageRequest {
            body: Some("hello".to_string()),
            html_body: Some("<p>hi</p>".to_string()),
            headers: Some(BTreeMap::from([(
                "Content-Type".to_string(),
                "text/plain".to_string(),
            )])),
            ..MessageRequest::to("b@x.com")
        })?;

        assert!(output.contains("multipart/alternative"));

        Ok(())
    }

    #[test]
    fn test_malformed_date_header_is_rejected() {
        let result = render(&structured(MessageRequest {
            headers: Some(BTreeMap::from([(
                "Date".to_string(),
                "not a date".to_string(),
            )])),
            ..MessageRequest::to("b@x.com")
        }));

        assert!(matches!(result, Err(MailerError::InvalidHeader(_))));
    }

    #[test]
    fn test_charset_on_single_part() -> TestResult {
        let output = formatted(MessageRequest {
            body: Some("hello".to_string()),
            charset: Some("ISO-8859-1".to_string()),
            ..MessageRequest::to("b@x.com")
        })?;

        assert!(output.to_ascii_lowercase().contains("charset=iso-8859-1"));

        Ok(())
    }
}
