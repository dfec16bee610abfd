use axum::{extract::State, http::StatusCode, Json};
use service_core::error::AppError;

use crate::dtos::{InsertResponse, PersonPayload, PersonResponse};
use crate::middleware::{JsonBody, PersonId};
use crate::models::Person;
use crate::startup::AppState;

/// `POST /person`
#[tracing::instrument(skip(state, payload))]
pub async fn create_person(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<PersonPayload>,
) -> Result<(StatusCode, Json<InsertResponse>), AppError> {
    let person = Person::from(payload);
    let id = state.db.insert(&person).await?;

    tracing::info!(person_id = %id, "Person created");

    Ok((StatusCode::CREATED, Json(InsertResponse::from(id))))
}

/// `GET /person`
#[tracing::instrument(skip(state))]
pub async fn list_people(
    State(state): State<AppState>,
) -> Result<Json<Vec<PersonResponse>>, AppError> {
    let people = state.db.find_all().await?;

    tracing::debug!(count = people.len(), "Listed people");

    Ok(Json(people.into_iter().map(PersonResponse::from).collect()))
}

/// `GET /person/:id`
///
/// Answers with a one-element array so both read routes share a shape.
#[tracing::instrument(skip(state))]
pub async fn get_person(
    State(state): State<AppState>,
    PersonId(id): PersonId,
) -> Result<Json<Vec<PersonResponse>>, AppError> {
    let person = state
        .db
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Person not found: {}", id)))?;

    Ok(Json(vec![PersonResponse::from(person)]))
}
