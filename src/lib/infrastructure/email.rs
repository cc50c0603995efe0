//! Rendering and delivery through lettre

pub mod mailer;
pub mod render;
pub mod sendmail;
pub mod smtp;
