use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::account::errors::MailError;
use crate::account::ports::MailSender;
use crate::config::SmtpConfig;

/// SMTP adapter delivering the activation and reset links.
///
/// The transport keeps a small connection pool against the relay; one
/// instance lives for the whole process behind the service.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from: Mailbox = format!("{} <{}>", config.sender_name, config.sender_address)
            .parse()
            .map_err(|e| MailError::InvalidMessage(format!("invalid from address: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| MailError::DeliveryFailed(format!("relay setup failed: {e}")))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .port(config.port)
            .pool_config(PoolConfig::new().max_size(4))
            .timeout(Some(std::time::Duration::from_secs(10)))
            .build();

        Ok(Self { transport, from })
    }

    fn body_for(subject: &str, link: &str) -> String {
        format!(
            "Hello,\n\
            \n\
            {subject}.\n\
            \n\
            Please follow the link below:\n\
            \n\
            {link}\n\
            \n\
            If you did not request this, you can safely ignore this email.\n"
        )
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, link: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| MailError::InvalidMessage(format!("invalid to address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(Self::body_for(subject, link))
            .map_err(|e| MailError::InvalidMessage(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::DeliveryFailed(e.to_string()))?;

        tracing::debug!(to, subject, "email dispatched");
        Ok(())
    }
}
