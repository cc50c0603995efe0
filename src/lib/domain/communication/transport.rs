//! Transport selection

use std::{fmt, path::PathBuf, str::FromStr};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::communication::host::HostEnvironment;

/// Where sendmail usually lives when the lookup path has nothing
pub const DEFAULT_SENDMAIL_PATH: &str = "/usr/sbin/sendmail";

/// Delivery mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Via {
    /// Pipe the message into a local sendmail binary
    Sendmail,

    /// Relay the message over SMTP
    Smtp,
}

impl fmt::Display for Via {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Via::Sendmail => write!(f, "sendmail"),
            Via::Smtp => write!(f, "smtp"),
        }
    }
}

/// A transport name that is neither `sendmail` nor `smtp`
#[derive(Debug, Error)]
#[error("unknown transport `{0}`")]
pub struct UnknownTransport(String);

impl FromStr for Via {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sendmail" => Ok(Via::Sendmail),
            "smtp" => Ok(Via::Smtp),
            _ => Err(UnknownTransport(s.to_string())),
        }
    }
}

/// SMTP authentication mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Authentication {
    /// AUTH PLAIN
    Plain,

    /// AUTH LOGIN
    Login,

    /// AUTH XOAUTH2
    Xoauth2,
}

/// Transport-specific settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViaOptions {
    /// Path of the sendmail binary
    pub location: Option<PathBuf>,

    /// SMTP server host, `localhost` when unset
    pub address: Option<String>,

    /// SMTP server port, 25 when unset
    pub port: Option<u16>,

    /// SMTP user name
    pub user_name: Option<String>,

    /// SMTP password
    pub password: Option<String>,

    /// SMTP authentication mechanism, negotiated when unset
    pub authentication: Option<Authentication>,

    /// The HELO domain presented to the server
    pub domain: Option<String>,

    /// Upgrade to TLS when the server offers STARTTLS, on when unset
    pub enable_starttls_auto: Option<bool>,

    /// Connect with implicit TLS
    pub tls: Option<bool>,

    /// Verify the server certificate, on when unset
    pub verify_tls: Option<bool>,

    /// Connection timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// The transport a message is bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportBinding {
    /// The delivery mechanism
    pub via: Via,

    /// Its settings
    pub options: ViaOptions,
}

/// Finds the sendmail binary, falling back to [`DEFAULT_SENDMAIL_PATH`].
pub fn sendmail_binary<H: HostEnvironment + ?Sized>(host: &H) -> PathBuf {
    host.which("sendmail")
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SENDMAIL_PATH))
}

/// Picks sendmail when its binary is executable on this host, SMTP otherwise.
pub fn default_delivery_method<H: HostEnvironment + ?Sized>(host: &H) -> Via {
    let sendmail = sendmail_binary(host);

    if host.is_executable(&sendmail) {
        Via::Sendmail
    } else {
        debug!("{} is not executable, falling back to smtp", sendmail.display());
        Via::Smtp
    }
}

/// Resolves the transport for a merged request.
///
/// An explicit `via` is kept as given. Sendmail bindings always leave here with a
/// `location`.
pub fn resolve<H: HostEnvironment + ?Sized>(
    via: Option<Via>,
    options: Option<ViaOptions>,
    host: &H,
) -> TransportBinding {
    let via = via.unwrap_or_else(|| default_delivery_method(host));
    let mut options = options.unwrap_or_default();

    if via == Via::Sendmail && options.location.is_none() {
        options.location = Some(sendmail_binary(host));
    }

    debug!("resolved transport {}", via);

    TransportBinding { via, options }
}
