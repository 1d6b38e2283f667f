//! Ranking session key extraction
//!
//! The key is the client's IP address, taken from the connection. It is an
//! opaque string to the ranking engine; clients behind one address share a
//! session.

use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::ApiError;

/// Opaque per-requester key identifying a ranking session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Goes through axum's extractor so `MockConnectInfo` also applies
        let ConnectInfo(addr) = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                warn!("No client address on request: {}", rejection);
                ApiError::Internal("client address unavailable".to_string())
            })?;

        Ok(SessionKey(addr.ip().to_string()))
    }
}
