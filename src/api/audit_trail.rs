//! Audit trail service

use std::net::IpAddr;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_client_ip::ClientIp;

use crate::storage::AuditEntry;
use crate::storage::Storage;

use super::CurrentUser;
use super::Error;

/// Audit trail service
pub struct AuditTrail<S: Storage> {
    /// Storage in where the trail is saved
    storage: S,

    /// The current user for the audit trail
    current_user: CurrentUser<S>,

    /// The IP address associated with the audit trail
    ip_address: Option<IpAddr>,
}

impl<S: Storage> AuditTrail<S> {
    /// Register an entry on the audit trail
    pub async fn register(&self, entry: AuditEntry<'_>) {
        let result = self
            .storage
            .register_audit_trail(&self.current_user, &entry, self.ip_address.as_ref())
            .await;

        if let Err(err) = result {
            tracing::error!("Could register audit trail entry: {err}");
        }
    }
}

impl<B, S: Storage> FromRequestParts<B> for AuditTrail<S>
where
    B: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &B) -> Result<Self, Self::Rejection> {
        let Extension(storage) = parts
            .extract::<Extension<S>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get a storage pool"))?;

        let current_user = CurrentUser::from_request_parts(parts, state).await?;

        // not every deployment sits behind something that reports an address
        let ip_address = ClientIp::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ip| ip.0);

        Ok(AuditTrail {
            storage,
            current_user,
            ip_address,
        })
    }
}
