use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{info, instrument};

use crate::error::Result;

/// Delivers a rendered report.
pub trait Notifier {
    fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<()>;
}

/// SMTP account used for outgoing mail.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
}

/// Sends HTML email through an SMTP relay using STARTTLS.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let credentials = Credentials::new(self.config.sender.clone(), self.config.password.clone());
        Ok(SmtpTransport::starttls_relay(&self.config.host)?
            .port(self.config.port)
            .credentials(credentials)
            .build())
    }
}

/// Assembles the HTML message sent for a report.
pub fn build_message(sender: &str, recipient: &str, subject: &str, html_body: &str) -> Result<Message> {
    let from: Mailbox = sender.parse()?;
    let to: Mailbox = recipient.parse()?;
    Ok(Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html_body.to_string())?)
}

impl Notifier for SmtpNotifier {
    #[instrument(level = "info", skip(self, html_body), fields(host = %self.config.host))]
    fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<()> {
        let message = build_message(&self.config.sender, recipient, subject, html_body)?;
        self.transport()?.send(&message)?;
        info!("email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_carries_html_body() {
        let message = build_message(
            "stock@example.com",
            "buyer@example.com",
            "Warning",
            "<html><body></body></html>",
        )
        .expect("message built");
        let raw = String::from_utf8(message.formatted()).expect("utf-8 message");
        assert!(raw.contains("Subject: Warning"));
        assert!(raw.contains("Content-Type: text/html"));
    }

    #[test]
    fn invalid_recipient_is_rejected() {
        let result = build_message("stock@example.com", "not an address", "Warning", "");
        assert!(result.is_err());
    }
}
