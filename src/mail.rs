use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::{Arc, Mutex};

use crate::config::{EmailBackend, MailConfig};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp transport: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// A message as handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

pub type Outbox = Arc<Mutex<Vec<OutgoingMail>>>;

#[derive(Clone)]
enum Transport {
    /// Logs every message instead of delivering it.
    Console,
    Smtp(Arc<AsyncSmtpTransport<Tokio1Executor>>),
    /// Collects messages in memory.
    Memory(Outbox),
}

#[derive(Clone)]
pub struct Mailer {
    from: String,
    transport: Transport,
}

impl Mailer {
    pub fn from_config(config: &MailConfig) -> Self {
        match config.backend {
            EmailBackend::Console => Self::console(&config.default_from),
            EmailBackend::Memory => Self::memory(&config.default_from).0,
            EmailBackend::Smtp => {
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                    .port(config.smtp_port);
                if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
                    builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
                }
                Self {
                    from: config.default_from.clone(),
                    transport: Transport::Smtp(Arc::new(builder.build())),
                }
            }
        }
    }

    pub fn console(from: &str) -> Self {
        Self {
            from: from.to_string(),
            transport: Transport::Console,
        }
    }

    /// Mailer that keeps sent messages, plus a handle to read them back.
    pub fn memory(from: &str) -> (Self, Outbox) {
        let outbox = Outbox::default();
        let mailer = Self {
            from: from.to_string(),
            transport: Transport::Memory(outbox.clone()),
        };
        (mailer, outbox)
    }

    /// Plaintext SMTP relay without credentials.
    pub fn smtp(from: &str, host: &str, port: u16) -> Self {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();
        Self {
            from: from.to_string(),
            transport: Transport::Smtp(Arc::new(transport)),
        }
    }

    /// Send a plain-text message from the default sender.
    pub async fn send_mail(&self, subject: &str, body: &str, recipients: &[String]) -> Result<(), MailError> {
        let mut builder = Message::builder()
            .from(self.from.parse::<Mailbox>()?)
            .subject(subject);
        for recipient in recipients {
            builder = builder.to(Mailbox::new(None, recipient.parse::<Address>()?));
        }
        let message = builder.body(body.to_string())?;

        match &self.transport {
            Transport::Console => {
                tracing::info!(
                    from = %self.from,
                    to = ?recipients,
                    subject,
                    "email (console backend)\n{body}"
                );
            }
            Transport::Smtp(transport) => {
                transport.send(message).await?;
            }
            Transport::Memory(outbox) => {
                let mut outbox = outbox.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                outbox.push(OutgoingMail {
                    from: self.from.clone(),
                    to: recipients.to_vec(),
                    subject: subject.to_string(),
                    body: body.to_string(),
                });
            }
        }

        Ok(())
    }
}
