//! Mail dispatch facade

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::communication::{
    errors::DispatchError,
    host::HostEnvironment,
    mailer::Mailer,
    message::{compose, StructuredMessage},
    request::{MessageRequest, ProcessDefaults},
    transport,
};

/// Sends one message per call, on top of a set of default options
#[derive(Debug, Clone)]
pub struct MailDispatcher<M, H>
where
    M: Mailer,
    H: HostEnvironment,
{
    defaults: ProcessDefaults,
    mailer: Arc<M>,
    host: Arc<H>,
}

impl<M, H> MailDispatcher<M, H>
where
    M: Mailer,
    H: HostEnvironment,
{
    /// Creates a new dispatcher.
    pub fn new(defaults: ProcessDefaults, mailer: Arc<M>, host: Arc<H>) -> Self {
        Self {
            defaults,
            mailer,
            host,
        }
    }

    /// The options every request is merged over
    pub fn defaults(&self) -> &ProcessDefaults {
        &self.defaults
    }

    /// Replaces the default options. The previous defaults are dropped, not merged.
    pub fn configure_defaults(&mut self, defaults: ProcessDefaults) {
        debug!("replacing default options");

        self.defaults = defaults;
    }

    /// Builds the message `request` describes without delivering it.
    ///
    /// # Arguments
    /// * `request` - The [`MessageRequest`] to merge over the defaults.
    ///
    /// # Returns
    /// A [`Result`] which is [`Ok`] containing the [`StructuredMessage`], or an [`Err`]
    /// containing [`DispatchError::InvalidRequest`] if no recipient is left after merging.
    pub fn prepare(&self, request: MessageRequest) -> Result<StructuredMessage, DispatchError> {
        let mut request = self.defaults.apply(request);

        if !request.has_recipients() {
            return Err(DispatchError::InvalidRequest);
        }

        let binding = transport::resolve(
            request.via.take(),
            request.via_options.take(),
            self.host.as_ref(),
        );

        let hostname = if request.attachments.is_some() || request.inline_attachments.is_some() {
            self.host.hostname()
        } else {
            String::new()
        };

        Ok(compose(&request, binding, &hostname))
    }

    /// Builds and delivers the message `request` describes.
    ///
    /// # Arguments
    /// * `request` - The [`MessageRequest`] to merge over the defaults.
    ///
    /// # Returns
    /// A [`Result`] which is [`Ok`] once the transport accepted the message. Validation
    /// failures are reported before anything is built; delivery failures are passed through.
    pub async fn send(&self, request: MessageRequest) -> Result<(), DispatchError> {
        let message = self.prepare(request)?;

        info!(
            via = %message.transport().via,
            to = message.header("To").unwrap_or_default(),
            "delivering message"
        );

        self.mailer.deliver(&message).await?;

        Ok(())
    }
}
