//! Delivery seam

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

use crate::domain::communication::message::StructuredMessage;

mod errors;

pub use errors::MailerError;

/// Hands a composed message to a transport
#[async_trait]
pub trait Mailer: Clone + Send + Sync + 'static {
    /// Deliver a message.
    ///
    /// # Arguments
    /// * `message` - The [`StructuredMessage`] to deliver. Its transport binding decides
    ///   whether it goes through sendmail or SMTP.
    ///
    /// # Returns
    /// A [`Result`] which is [`Ok`] once the transport accepted the message, or an [`Err`]
    /// carrying the transport's [`MailerError`] unchanged.
    async fn deliver(&self, message: &StructuredMessage) -> Result<(), MailerError>;
}

#[cfg(test)]
mock! {
    pub Mailer {}

    impl Clone for Mailer {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl Mailer for Mailer {
        async fn deliver(&self, message: &StructuredMessage) -> Result<(), MailerError>;
    }
}
