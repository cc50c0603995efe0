//! Command-line and environment configuration

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::debug;

use crate::{
    domain::communication::{
        request::{MessageRequest, ProcessDefaults},
        transport::Via,
    },
    infrastructure::email::smtp::SmtpConfig,
};

/// Options applied to every message
#[derive(Debug, Clone, Default, Parser)]
pub struct DefaultsConfig {
    /// JSON file holding default message options
    #[clap(long, env = "MAIL_DEFAULTS_FILE")]
    pub defaults_file: Option<PathBuf>,

    /// Default sender address
    #[clap(long = "default-from", env = "MAIL_FROM")]
    pub default_from: Option<String>,

    /// Default transport (`sendmail` or `smtp`)
    #[clap(long = "default-via", env = "MAIL_VIA")]
    pub default_via: Option<Via>,

    /// SMTP settings
    #[clap(flatten)]
    pub smtp: SmtpConfig,
}

impl DefaultsConfig {
    /// Loads the defaults file, then lays the flags and environment over it.
    pub fn load(&self) -> Result<ProcessDefaults> {
        let mut options = match &self.defaults_file {
            Some(path) => read_defaults(path)?,
            None => MessageRequest::default(),
        };

        if let Some(from) = &self.default_from {
            options.from = Some(from.clone());
        }

        if let Some(via) = self.default_via {
            options.via = Some(via);
        }

        if !self.smtp.is_empty() {
            options.via_options = Some(self.smtp.apply(options.via_options.unwrap_or_default()));
        }

        Ok(ProcessDefaults::new(options))
    }
}

fn read_defaults(path: &Path) -> Result<MessageRequest> {
    debug!("reading defaults from {}", path.display());

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// One message, as given on the command line
#[derive(Debug, Clone, Default, Parser)]
pub struct MessageArgs {
    /// Recipient, repeatable
    #[clap(long, value_delimiter = ',')]
    pub to: Vec<String>,

    /// Carbon-copy recipient, repeatable
    #[clap(long, value_delimiter = ',')]
    pub cc: Vec<String>,

    /// Blind carbon-copy recipient, repeatable
    #[clap(long, value_delimiter = ',')]
    pub bcc: Vec<String>,

    /// Sender address
    #[clap(long)]
    pub from: Option<String>,

    /// Envelope sender
    #[clap(long)]
    pub sender: Option<String>,

    /// Reply-to address, repeatable
    #[clap(long, value_delimiter = ',')]
    pub reply_to: Vec<String>,

    /// Subject line
    #[clap(short, long)]
    pub subject: Option<String>,

    /// Plain text body
    #[clap(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the plain text body from a file
    #[clap(long)]
    pub body_file: Option<PathBuf>,

    /// HTML body
    #[clap(long, conflicts_with = "html_file")]
    pub html_body: Option<String>,

    /// Read the HTML body from a file
    #[clap(long)]
    pub html_file: Option<PathBuf>,

    /// Charset of the message
    #[clap(long)]
    pub charset: Option<String>,

    /// Charset of the plain text part of a multipart message
    #[clap(long)]
    pub text_part_charset: Option<String>,

    /// Explicit Message-ID
    #[clap(long)]
    pub message_id: Option<String>,

    /// Explicit content type
    #[clap(long)]
    pub content_type: Option<String>,

    /// File to attach, repeatable
    #[clap(long = "attach")]
    pub attachments: Vec<PathBuf>,

    /// File to attach inline, repeatable
    #[clap(long = "inline")]
    pub inline_attachments: Vec<PathBuf>,

    /// Extra header as `Name: value`, repeatable
    #[clap(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Transport (`sendmail` or `smtp`)
    #[clap(long)]
    pub via: Option<Via>,
}

impl MessageArgs {
    /// Reads any referenced files and builds the request.
    pub fn into_request(self) -> Result<MessageRequest> {
        let body = match (self.body, &self.body_file) {
            (Some(body), _) => Some(body),
            (None, Some(path)) => Some(read_text(path)?),
            (None, None) => None,
        };

        let html_body = match (self.html_body, &self.html_file) {
            (Some(html), _) => Some(html),
            (None, Some(path)) => Some(read_text(path)?),
            (None, None) => None,
        };

        Ok(MessageRequest {
            to: non_empty(self.to),
            cc: non_empty(self.cc),
            bcc: non_empty(self.bcc),
            from: self.from,
            sender: self.sender,
            reply_to: non_empty(self.reply_to),
            subject: self.subject,
            body,
            html_body,
            charset: self.charset,
            text_part_charset: self.text_part_charset,
            message_id: self.message_id,
            content_type: self.content_type,
            attachments: read_files(&self.attachments)?,
            inline_attachments: read_files(&self.inline_attachments)?,
            headers: (!self.headers.is_empty()).then(|| self.headers.into_iter().collect()),
            via: self.via,
            ..Default::default()
        })
    }
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_files(paths: &[PathBuf]) -> Result<Option<BTreeMap<String, Vec<u8>>>> {
    if paths.is_empty() {
        return Ok(None);
    }

    let mut files = BTreeMap::new();

    for path in paths {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("{} has no file name", path.display()))?;

        let content =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

        files.insert(name, content);
    }

    Ok(Some(files))
}

/// Parses `Name: value`.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("expected `Name: value`, got `{}`", raw))?;

    let name = name.trim();

    if name.is_empty() {
        return Err(anyhow!("header name is empty in `{}`", raw));
    }

    Ok((name.to_string(), value.trim().to_string()))
}
