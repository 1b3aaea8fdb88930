use crate::domain::auth::Caller;
use crate::routing_utils::UnauthenticatedResponse;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Extracts the verified caller identity from the request. The identity is inserted
/// as a request extension by the authentication layer sitting in front of this
/// service, so a request reaching a handler without one is unauthenticated.
#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = UnauthenticatedResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .copied()
            .ok_or(UnauthenticatedResponse)
    }
}
