//! SMTP transport

use std::time::Duration;

use clap::Parser;
use lettre::{
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{Tls, TlsParameters},
        extension::ClientId,
    },
    AsyncSmtpTransport, Tokio1Executor,
};

use crate::domain::communication::{
    mailer::MailerError,
    transport::{Authentication, ViaOptions},
};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 25;

/// SMTP configuration
#[derive(Clone, Default, Debug, PartialEq, Eq, Parser)]
pub struct SmtpConfig {
    /// The SMTP host
    #[clap(long = "smtp-host", env = "SMTP_HOST")]
    pub host: Option<String>,

    /// The SMTP port
    #[clap(long = "smtp-port", env = "SMTP_PORT")]
    pub port: Option<u16>,

    /// The SMTP username
    #[clap(long = "smtp-user", env = "SMTP_USER")]
    pub username: Option<String>,

    /// The SMTP password
    #[clap(long = "smtp-password", env = "SMTP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// The HELO domain
    #[clap(long = "smtp-domain", env = "SMTP_DOMAIN")]
    pub domain: Option<String>,

    /// Verify the TLS certificate
    #[clap(long = "smtp-verify-tls", env = "SMTP_VERIFY_TLS")]
    pub verify_tls: Option<bool>,

    /// Enable STARTTLS (TLS upgrade on connection)
    #[clap(long = "smtp-starttls", env = "SMTP_STARTTLS")]
    pub starttls: Option<bool>,

    /// Connect with implicit TLS
    #[clap(long = "smtp-tls", env = "SMTP_TLS")]
    pub tls: Option<bool>,
}

impl SmtpConfig {
    /// Whether any SMTP setting was given
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Lays these settings over `options`; set fields win.
    pub fn apply(&self, options: ViaOptions) -> ViaOptions {
        ViaOptions {
            address: self.host.clone().or(options.address),
            port: self.port.or(options.port),
            user_name: self.username.clone().or(options.user_name),
            password: self.password.clone().or(options.password),
            domain: self.domain.clone().or(options.domain),
            verify_tls: self.verify_tls.or(options.verify_tls),
            enable_starttls_auto: self.starttls.or(options.enable_starttls_auto),
            tls: self.tls.or(options.tls),
            ..options
        }
    }
}

/// Builds an SMTP transport from the message's transport options.
pub fn transport(options: &ViaOptions) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailerError> {
    let host = options.address.as_deref().unwrap_or(DEFAULT_HOST);
    let parameters = || {
        TlsParameters::builder(host.to_string())
            .dangerous_accept_invalid_certs(!options.verify_tls.unwrap_or(true))
            .build()
    };

    let tls = if options.tls.unwrap_or(false) {
        Tls::Wrapper(parameters()?)
    } else if options.enable_starttls_auto.unwrap_or(true) {
        Tls::Opportunistic(parameters()?)
    } else {
        Tls::None
    };

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        .port(options.port.unwrap_or(DEFAULT_PORT))
        .tls(tls);

    if let (Some(user_name), Some(password)) = (&options.user_name, &options.password) {
        builder = builder.credentials(Credentials::new(user_name.clone(), password.clone()));
    }

    if let Some(authentication) = options.authentication {
        builder = builder.authentication(vec![mechanism(authentication)]);
    }

    if let Some(domain) = &options.domain {
        builder = builder.hello_name(ClientId::Domain(domain.clone()));
    }

    if let Some(seconds) = options.timeout_secs {
        builder = builder.timeout(Some(Duration::from_secs(seconds)));
    }

    Ok(builder.build())
}

fn mechanism(authentication: Authentication) -> Mechanism {
    match authentication {
        Authentication::Plain => Mechanism::Plain,
        Authentication::Login => Mechanism::Login,
        Authentication::Xoauth2 => Mechanism::Xoauth2,
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_config_overrides_options() {
        let config = SmtpConfig {
            host: Some("smtp.example.com".to_string()),
            port: Some(587),
            ..Default::default()
        };

        let options = config.apply(ViaOptions {
            address: Some("localhost".to_string()),
            user_name: Some("user".to_string()),
            ..Default::default()
        });

        assert_eq!(options.address.as_deref(), Some("smtp.example.com"));
        assert_eq!(options.port, Some(587));
        assert_eq!(options.user_name.as_deref(), Some("user"));
    }

    #[test]
    fn test_empty_config() {
        assert!(SmtpConfig::default().is_empty());
        assert!(!SmtpConfig {
            tls: Some(true),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_config_from_args() -> TestResult {
        let config = SmtpConfig::try_parse_from([
            "smtp",
            "--smtp-host",
            "smtp.example.com",
            "--smtp-port",
            "2525",
            "--smtp-starttls",
            "false",
        ])?;

        assert_eq!(config.host.as_deref(), Some("smtp.example.com"));
        assert_eq!(config.port, Some(2525));
        assert_eq!(config.starttls, Some(false));

        Ok(())
    }

    #[tokio::test]
    async fn test_transport_from_defaults() -> TestResult {
        transport(&ViaOptions::default())?;

        Ok(())
    }

    #[tokio::test]
    async fn test_transport_with_credentials_and_plaintext() -> TestResult {
        transport(&ViaOptions {
            address: Some("smtp.example.com".to_string()),
            port: Some(587),
            user_name: Some("user".to_string()),
            password: Some("secret".to_string()),
            authentication: Some(Authentication::Login),
            domain: Some("client.example.com".to_string()),
            enable_starttls_auto: Some(false),
            timeout_secs: Some(5),
            ..Default::default()
        })?;

        Ok(())
    }

    #[test]
    fn test_mechanism_mapping() {
        assert_eq!(mechanism(Authentication::Plain), Mechanism::Plain);
        assert_eq!(mechanism(Authentication::Login), Mechanism::Login);
        assert_eq!(mechanism(Authentication::Xoauth2), Mechanism::Xoauth2);
    }
}
