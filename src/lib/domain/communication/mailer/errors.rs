//! Mailer errors

use lettre::{
    address::AddressError,
    transport::{sendmail, smtp},
};
use thiserror::Error;

/// Mailer errors
#[derive(Debug, Error)]
pub enum MailerError {
    /// An address header could not be parsed
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    /// A header name is not valid ASCII
    #[error("invalid header name `{0}`")]
    InvalidHeader(String),

    /// A content type could not be parsed or does not fit the body
    #[error("invalid content type `{0}`")]
    InvalidContentType(String),

    /// The message could not be built
    #[error(transparent)]
    Build(#[from] lettre::error::Error),

    /// The sendmail process failed
    #[error(transparent)]
    Sendmail(#[from] sendmail::Error),

    /// The SMTP exchange failed
    #[error(transparent)]
    Smtp(#[from] smtp::Error),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}
