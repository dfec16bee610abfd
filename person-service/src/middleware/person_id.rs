use axum::async_trait;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;

/// The `:id` path segment, parsed as a 24-hex object id.
///
/// A malformed id is a 400; it never falls through to a lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonId(pub ObjectId);

impl PersonId {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        ObjectId::parse_str(raw).map(PersonId).map_err(|_| {
            AppError::BadRequest(anyhow::anyhow!(
                "Invalid person id '{}': expected 24 hex characters",
                raw
            ))
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PersonId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

        let id = PersonId::parse(&raw)?;
        tracing::Span::current().record("person_id", tracing::field::display(&id.0));

        Ok(id)
    }
}
