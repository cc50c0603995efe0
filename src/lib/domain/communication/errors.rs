//! Error types for the dispatch module

use thiserror::Error;
use tracing::debug;

use crate::domain::communication::mailer::MailerError;

/// Dispatch errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The merged request has no recipients
    #[error("`to` is required")]
    InvalidRequest,

    /// The message could not be rendered or delivered
    #[error(transparent)]
    Delivery(MailerError),
}

impl From<MailerError> for DispatchError {
    fn from(err: MailerError) -> Self {
        debug!("MailerError -> DispatchError");

        DispatchError::Delivery(err)
    }
}
