//! Notification email delivery
//!
//! Three notifications leave the system: the consigner welcome message, the
//! password-reset link, and the part-sold alert to the shop's operational
//! address. All of them are best-effort side effects: a delivery failure
//! is logged and swallowed, never propagated to the request that triggered
//! it, and sends happen after the data mutation they accompany has
//! committed.
//!
//! When SMTP is not configured, messages are logged instead of sent so
//! development environments work without a relay.

use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, warn};

/// Error type for mail operations
#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    /// A recipient or sender address could not be parsed
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The message could not be assembled
    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    /// SMTP delivery failed
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// SMTP settings for the mailer
///
/// `host = None` selects log-only mode.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,

    /// Sender address on outgoing mail
    pub from: String,
}

/// Outgoing mail transport
///
/// Cheap to clone behind an `Arc` in application state.
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl Mailer {
    /// Builds a mailer from SMTP settings
    ///
    /// # Errors
    ///
    /// Returns an error if the sender address is malformed or the relay
    /// could not be configured.
    pub fn new(config: &MailerConfig) -> Result<Self, MailerError> {
        let from: Mailbox = config.from.parse()?;

        let transport = match &config.host {
            Some(host) => {
                let mut builder =
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.port(config.port);

                if let (Some(username), Some(password)) = (&config.username, &config.password) {
                    builder = builder
                        .credentials(Credentials::new(username.clone(), password.clone()));
                }

                Some(builder.build())
            }
            None => {
                warn!("SMTP not configured; emails will be logged instead of sent");
                None
            }
        };

        Ok(Self { transport, from })
    }

    /// Sends one message
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed recipient or a transport failure.
    /// Callers on the request path should prefer [`Mailer::send_best_effort`].
    pub async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), MailerError> {
        let Some(transport) = &self.transport else {
            info!(
                to = %to,
                subject = %subject,
                "=== EMAIL (not sent) ===\n{}",
                body
            );
            return Ok(());
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .body(body)?;

        transport.send(message).await?;
        Ok(())
    }

    /// Sends one message, logging failure instead of returning it
    ///
    /// Delivery failure must never roll back or fail the mutation it
    /// accompanies.
    pub async fn send_best_effort(&self, to: &str, subject: &str, body: String) {
        if let Err(e) = self.send(to, subject, body).await {
            warn!(to = %to, subject = %subject, error = %e, "Failed to send email");
        }
    }
}

/// Welcome message for a newly created consigner
///
/// Returns `(subject, body)`.
pub fn welcome_message(
    shop_name: &str,
    name: &str,
    email: &str,
    base_url: &str,
) -> (String, String) {
    let subject = format!("Welcome to {}!", shop_name);
    let body = format!(
        "Hi {name},\n\n\
         Welcome to {shop_name}! We're excited to have you onboard as a consigner.\n\n\
         Your account has been created with the email: {email}\n\
         Your account currently has a temporary password which must be changed.\n\n\
         To reset your password, visit:\n\
         {base_url}/forgot-password\n\
         Enter your account email to be sent a link to reset your password.\n\n\
         Once completed, you can log in with your account email and new password.\n\n\
         If you have any questions, feel free to reach out.\n\n\
         Best regards,\n\
         The {shop_name} Team\n"
    );
    (subject, body)
}

/// Password-reset message carrying a single-use link
pub fn password_reset_message(shop_name: &str, reset_url: &str) -> (String, String) {
    let subject = format!("{} password reset", shop_name);
    let body = format!(
        "A password reset was requested for your {shop_name} account.\n\n\
         To choose a new password, visit:\n\
         {reset_url}\n\n\
         The link expires in one hour. If you did not request this, you can\n\
         ignore this message.\n"
    );
    (subject, body)
}

/// Part-sold alert sent to the shop's operational address
pub fn part_sold_message(
    consigner_code: &str,
    part_number: Option<&str>,
    serial_number: Option<&str>,
    description: Option<&str>,
    condition: Option<&str>,
    price: f64,
) -> (String, String) {
    let subject = format!("Part Sold — {}", consigner_code);
    let body = format!(
        "A part has been marked as sold.\n\n\
         Consigner Code: {consigner_code}\n\
         Part Number: {}\n\
         Serial Number: {}\n\
         Description: {}\n\
         Condition: {}\n\
         Price: ${price:.2}\n",
        part_number.unwrap_or("-"),
        serial_number.unwrap_or("-"),
        description.unwrap_or("-"),
        condition.unwrap_or("-"),
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_only_mailer_never_fails() {
        let mailer = Mailer::new(&MailerConfig {
            host: None,
            port: 587,
            username: None,
            password: None,
            from: "noreply@example.com".to_string(),
        })
        .unwrap();

        assert!(mailer.transport.is_none());
    }

    #[test]
    fn test_bad_sender_address_is_an_error() {
        let result = Mailer::new(&MailerConfig {
            host: None,
            port: 587,
            username: None,
            password: None,
            from: "not an address".to_string(),
        });

        assert!(result.is_err());
    }

    #[test]
    fn test_welcome_message_mentions_reset_flow() {
        let (subject, body) =
            welcome_message("PartLedger", "Jo", "jo@example.com", "https://shop.example.com");

        assert_eq!(subject, "Welcome to PartLedger!");
        assert!(body.contains("jo@example.com"));
        assert!(body.contains("https://shop.example.com/forgot-password"));
    }

    #[test]
    fn test_part_sold_message_fields() {
        let (subject, body) = part_sold_message(
            "C01",
            Some("PN-1"),
            Some("SN-1"),
            Some("Altimeter"),
            Some("AR"),
            125.5,
        );

        assert_eq!(subject, "Part Sold — C01");
        assert!(body.contains("Consigner Code: C01"));
        assert!(body.contains("Price: $125.50"));
    }
}
