// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery gateways for Smelinx lifecycle notices.
//!
//! [`SmtpGateway`] sends multipart email through an SMTP relay via lettre;
//! [`ConsoleGateway`] logs notices instead and is selected when no relay is
//! configured.

pub mod console;
pub mod render;
pub mod smtp;

use std::sync::Arc;

use smelinx_config::model::EmailConfig;
use smelinx_core::{DeliveryGateway, SmelinxError};

pub use console::ConsoleGateway;
pub use render::{RenderedNotice, render};
pub use smtp::SmtpGateway;

/// Pick the gateway for `config`: SMTP when a host is set, console otherwise.
pub fn gateway_from_config(config: &EmailConfig) -> Result<Arc<dyn DeliveryGateway>, SmelinxError> {
    let has_host = config
        .smtp_host
        .as_deref()
        .is_some_and(|h| !h.trim().is_empty());
    if has_host {
        Ok(Arc::new(SmtpGateway::from_config(config)?))
    } else {
        tracing::warn!("email.smtp_host not set; notices will be logged, not sent");
        Ok(Arc::new(ConsoleGateway::new()))
    }
}
