//! Mail composition and dispatch

pub mod dispatcher;
pub mod errors;
pub mod host;
pub mod mailer;
pub mod message;
pub mod request;
pub mod transport;
