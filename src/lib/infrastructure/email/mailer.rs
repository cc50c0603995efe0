//! lettre-backed mailer

use async_trait::async_trait;
use lettre::AsyncTransport;
use tracing::debug;

use crate::{
    domain::communication::{
        mailer::{Mailer, MailerError},
        message::StructuredMessage,
        transport::Via,
    },
    infrastructure::email::{render::render, sendmail, smtp},
};

/// Delivers messages through lettre's sendmail or SMTP transport, whichever the message is
/// bound to
#[derive(Debug, Default, Clone)]
pub struct LettreMailer;

impl LettreMailer {
    /// Create a new lettre mailer
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn deliver(&self, message: &StructuredMessage) -> Result<(), MailerError> {
        let email = render(message)?;
        let binding = message.transport();

        match binding.via {
            Via::Sendmail => {
                sendmail::transport(&binding.options).send(email).await?;
            }
            Via::Smtp => {
                let response = smtp::transport(&binding.options)?.send(email).await?;

                debug!("smtp server replied {}", response.code());
            }
        }

        Ok(())
    }
}
