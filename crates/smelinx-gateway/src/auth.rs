// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication for the gateway.
//!
//! Every authenticated request carries `Authorization: Bearer <token>`. The
//! configured [`SessionValidator`] resolves the token to an organization id,
//! which the middleware attaches to the request as an [`OrgContext`]. With no
//! tokens configured all requests are rejected (fail-closed).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use smelinx_config::model::TokenConfig;
use smelinx_core::{AdapterType, HealthStatus, PluginAdapter, SessionValidator, SmelinxError};

use crate::error::ApiError;

/// Organization the authenticated caller acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgContext(pub String);

/// Session validator backed by the static token table from configuration.
#[derive(Clone)]
pub struct StaticTokenValidator {
    tokens: Arc<HashMap<String, String>>,
}

impl StaticTokenValidator {
    pub fn new(tokens: &[TokenConfig]) -> Self {
        let tokens = tokens
            .iter()
            .map(|t| (t.token.clone(), t.org_id.clone()))
            .collect();
        Self {
            tokens: Arc::new(tokens),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl std::fmt::Debug for StaticTokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenValidator")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

#[async_trait]
impl PluginAdapter for StaticTokenValidator {
    fn name(&self) -> &str {
        "static-tokens"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, SmelinxError> {
        if self.tokens.is_empty() {
            Ok(HealthStatus::Degraded(
                "no gateway tokens configured; all requests are rejected".into(),
            ))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), SmelinxError> {
        Ok(())
    }
}

#[async_trait]
impl SessionValidator for StaticTokenValidator {
    async fn validate(&self, token: &str) -> Result<String, SmelinxError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(SmelinxError::Unauthorized)
    }
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Middleware that resolves the bearer token to an [`OrgContext`].
pub async fn auth_middleware(
    State(validator): State<Arc<dyn SessionValidator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(&request) else {
        return Err(SmelinxError::Unauthorized.into());
    };
    let org_id = validator.validate(&token).await.map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        ApiError::from(SmelinxError::Unauthorized)
    })?;
    request.extensions_mut().insert(OrgContext(org_id));
    Ok(next.run(request).await)
}
