//! SMTP delivery via lettre.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use serde::{Deserialize, Serialize};

use crate::{Notifier, NotifyError, local_hostname};

/// SMTP relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    /// Relay hostname.
    #[serde(default = "default_host")]
    pub host: String,
    /// Relay port. Common values: 25 (plain), 465 (TLS), 587 (STARTTLS).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Optional relay username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Optional relay password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Sender address on outgoing reports.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Upgrade the connection with STARTTLS.
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    587
}

fn default_from_address() -> String {
    format!("cron-monitor@{}", local_hostname())
}

fn default_use_tls() -> bool {
    true
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            from_address: default_from_address(),
            use_tls: default_use_tls(),
        }
    }
}

/// Mail transport for monitoring reports.
///
/// The transport is built eagerly; the relay connection is made lazily on
/// the first send.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &MailerConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| NotifyError::Address(format!("{}: {e}", config.from_address)))?;

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotifyError::Connection(format!("{e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let mut builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| NotifyError::Address(format!("{recipient}: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Send(format!("failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Send(format!("{e}")))?;

        tracing::debug!(recipient, "report mail sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MailerConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 587);
        assert!(config.username.is_none());
        assert!(config.use_tls);
        assert!(config.from_address.starts_with("cron-monitor@"));
    }

    #[test]
    fn test_notifier_builds_from_defaults() {
        assert!(SmtpNotifier::new(&MailerConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_from_address_rejected() {
        let config = MailerConfig {
            from_address: "not an address".into(),
            ..MailerConfig::default()
        };
        match SmtpNotifier::new(&config) {
            Err(NotifyError::Address(msg)) => assert!(msg.contains("not an address")),
            Err(other) => panic!("expected address error, got {other}"),
            Ok(_) => panic!("expected address error"),
        }
    }
}
