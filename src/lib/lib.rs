#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Mail dispatch library
//!
//! Merges a [`MessageRequest`](domain::communication::request::MessageRequest) over a set of
//! process defaults, picks sendmail or SMTP, composes the MIME structure and hands the result
//! to lettre.

pub mod domain;
pub mod infrastructure;
