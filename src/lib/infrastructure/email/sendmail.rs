//! Sendmail transport

use lettre::{AsyncSendmailTransport, Tokio1Executor};

use crate::domain::communication::transport::{ViaOptions, DEFAULT_SENDMAIL_PATH};

/// Builds a sendmail transport running the binary at `options.location`.
pub fn transport(options: &ViaOptions) -> AsyncSendmailTransport<Tokio1Executor> {
    match &options.location {
        Some(location) => AsyncSendmailTransport::new_with_command(location.as_os_str()),
        None => AsyncSendmailTransport::new_with_command(DEFAULT_SENDMAIL_PATH),
    }
}
