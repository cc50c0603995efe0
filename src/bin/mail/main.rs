#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Sends one message from the command line

use std::{
    io::{self, Write},
    sync::Arc,
};

use anyhow::Result;
use clap::Parser;
use mail_dispatch::{
    domain::communication::dispatcher::MailDispatcher,
    infrastructure::{
        config::{DefaultsConfig, MessageArgs},
        email::{mailer::LettreMailer, render::render},
        system::SystemHost,
    },
};
use tracing::info;

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
#[clap(version, about)]
pub struct Args {
    /// Options applied to every message
    #[clap(flatten)]
    pub defaults: DefaultsConfig,

    /// The message to send
    #[clap(flatten)]
    pub message: MessageArgs,

    /// Print the rendered message instead of delivering it
    #[clap(long)]
    pub dry_run: bool,
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load environment: {}", e);

            return Err(e.into());
        }
    }

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let dispatcher = MailDispatcher::new(
        args.defaults.load()?,
        Arc::new(LettreMailer::new()),
        Arc::new(SystemHost),
    );

    let request = args.message.into_request()?;

    if args.dry_run {
        let message = dispatcher.prepare(request)?;

        info!(via = %message.transport().via, "dry run, not delivering");

        io::stdout().write_all(&render(&message)?.formatted())?;

        return Ok(());
    }

    dispatcher.send(request).await?;

    Ok(())
}
