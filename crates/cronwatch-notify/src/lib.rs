//! cronwatch-notify: report delivery.
//!
//! Defines the [`Notifier`] trait the monitor fans out over, plus the SMTP
//! implementation used in production. Implementations deliver to a single
//! receiver; batching and failure aggregation happen in the caller.

pub mod smtp;

pub use smtp::{MailerConfig, SmtpNotifier};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid address: {0}")]
    Address(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("send failed: {0}")]
    Send(String),
}

/// Transport for delivering a report to one receiver.
///
/// Use `&self`; implementations hold their own connection state.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Best-effort local hostname, "unknown" if the OS lookup fails.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Check that an address parses as a mailbox. Validates the format only,
/// not whether the mailbox exists.
pub fn is_valid_address(address: &str) -> bool {
    address.parse::<lettre::message::Mailbox>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_hostname_not_empty() {
        assert!(!local_hostname().is_empty());
    }

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_address("ops@example.com"));
        assert!(is_valid_address("Ops Team <ops@example.com>"));
        assert!(is_valid_address("ops+cron@mail.example.com"));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("not-an-address"));
        assert!(!is_valid_address("@example.com"));
        assert!(!is_valid_address("ops@"));
    }
}
