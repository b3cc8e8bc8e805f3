// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP delivery gateway built on lettre.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, warn};

use smelinx_config::model::EmailConfig;
use smelinx_core::{AdapterType, Delivery, DeliveryGateway, HealthStatus, PluginAdapter, SmelinxError};

use crate::render;

/// Port on which the relay expects TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends one multipart (text + HTML) message per recipient.
pub struct SmtpGateway {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl std::fmt::Debug for SmtpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpGateway")
            .field("host", &self.host)
            .field("from", &self.from.to_string())
            .finish()
    }
}

fn is_local(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

impl SmtpGateway {
    /// Build the transport from configuration. No connection is opened.
    ///
    /// Port 465 uses implicit TLS, local hosts are reached in plain text,
    /// and anything else negotiates STARTTLS.
    pub fn from_config(config: &EmailConfig) -> Result<Self, SmelinxError> {
        let host = config
            .smtp_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| SmelinxError::Config("email.smtp_host is not set".into()))?;
        let from_address = config
            .from_address
            .as_deref()
            .ok_or_else(|| SmelinxError::Config("email.from_address is not set".into()))?;
        let address: Address = from_address.trim().parse().map_err(|e| {
            SmelinxError::Config(format!("invalid email.from_address `{from_address}`: {e}"))
        })?;
        let name = Some(config.from_name.clone()).filter(|n| !n.trim().is_empty());
        let from = Mailbox::new(name, address);

        let builder = if is_local(host) {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        } else if config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| SmelinxError::Config(format!("smtp relay `{host}`: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| SmelinxError::Config(format!("smtp relay `{host}`: {e}")))?
        };
        let mut builder = builder.port(config.smtp_port);
        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            host: host.to_string(),
        })
    }

    fn message(
        &self,
        to: Mailbox,
        notice: &render::RenderedNotice,
    ) -> Result<Message, SmelinxError> {
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notice.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                notice.text.clone(),
                notice.html.clone(),
            ))
            .map_err(|e| SmelinxError::Internal(format!("failed to build message: {e}")))
    }
}

#[async_trait]
impl PluginAdapter for SmtpGateway {
    fn name(&self) -> &str {
        "smtp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Delivery
    }

    async fn health_check(&self) -> Result<HealthStatus, SmelinxError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(HealthStatus::Healthy),
            Ok(false) => Ok(HealthStatus::Degraded(format!(
                "smtp relay {} did not accept NOOP",
                self.host
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "smtp relay {} unreachable: {e}",
                self.host
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), SmelinxError> {
        Ok(())
    }
}

/// Hand the notice to each recipient in turn.
///
/// Accepted recipients already hold their copy, so partial success counts as
/// sent and the rejected addresses are only logged. A notice nobody accepted
/// is a retryable failure.
async fn send_each<F, Fut>(delivery: &Delivery, mut send_one: F) -> Result<usize, SmelinxError>
where
    F: FnMut(Mailbox) -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    let mut failures = Vec::new();
    let mut sent = 0usize;

    for recipient in &delivery.recipients {
        let to: Mailbox = match recipient.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                warn!(
                    notification_id = %delivery.notification_id,
                    recipient = %recipient,
                    error = %e,
                    "skipping unparseable recipient"
                );
                continue;
            }
        };
        match send_one(to).await {
            Ok(()) => sent += 1,
            Err(e) => failures.push(format!("{recipient}: {e}")),
        }
    }

    if sent == 0 && !failures.is_empty() {
        return Err(SmelinxError::delivery(format!(
            "smtp rejected all {} recipients: {}",
            failures.len(),
            failures.join("; ")
        )));
    }
    if sent == 0 {
        return Err(SmelinxError::Validation(
            "no deliverable recipient addresses".into(),
        ));
    }
    if !failures.is_empty() {
        warn!(
            notification_id = %delivery.notification_id,
            accepted = sent,
            rejected = failures.len(),
            failures = %failures.join("; "),
            "smtp rejected some recipients; not retrying the others"
        );
    }
    Ok(sent)
}

#[async_trait]
impl DeliveryGateway for SmtpGateway {
    async fn send(&self, delivery: &Delivery) -> Result<(), SmelinxError> {
        let notice = render::render(delivery);

        let sent = send_each(delivery, |to| {
            let recipient = to.to_string();
            let message = self.message(to, &notice);
            async move {
                let message = message.map_err(|e| e.to_string())?;
                let response = self
                    .transport
                    .send(message)
                    .await
                    .map_err(|e| e.to_string())?;
                debug!(
                    notification_id = %delivery.notification_id,
                    recipient = %recipient,
                    code = %response.code(),
                    "smtp accepted message"
                );
                Ok(())
            }
        })
        .await?;

        info!(
            notification_id = %delivery.notification_id,
            recipients = sent,
            subject = %notice.subject,
            "notice emailed"
        );
        Ok(())
    }
}
