use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Who is acting, on behalf of which dealer. Identity is established by the
/// gateway upstream; this layer only consumes the forwarded headers and
/// enforces dealer scoping on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: Uuid,
    pub dealer_id: Uuid,
    pub role: Role,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Technician,
    Admin,
    SuperAdmin,
}

impl ActorContext {
    /// Fails closed: any dealer mismatch is Forbidden unless the actor is a
    /// super admin operating across dealers.
    pub fn ensure_dealer(&self, resource_dealer_id: Uuid) -> Result<(), ServiceError> {
        if self.role == Role::SuperAdmin || self.dealer_id == resource_dealer_id {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(
                "resource belongs to another dealer".to_string(),
            ))
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::SuperAdmin)
    }
}

fn header_uuid(parts: &Parts, name: &str) -> Result<Uuid, ServiceError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ServiceError::Unauthorized(format!("missing or invalid {} header", name)))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor_id = header_uuid(parts, "x-actor-id")?;
        let dealer_id = header_uuid(parts, "x-dealer-id")?;
        let role = parts
            .headers
            .get("x-actor-role")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<Role>().ok())
            .ok_or_else(|| {
                ServiceError::Unauthorized("missing or invalid x-actor-role header".to_string())
            })?;

        Ok(ActorContext {
            actor_id,
            dealer_id,
            role,
        })
    }
}
