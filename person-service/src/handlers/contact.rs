//! The contact embedded in a person, addressed through the person's id.

use axum::{extract::State, http::StatusCode, Json};
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;

use crate::dtos::ContactPatch;
use crate::middleware::{JsonBody, PersonId};
use crate::models::{Contact, Person};
use crate::services::ContactWrite;
use crate::startup::AppState;

fn person_not_found(id: ObjectId) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Person not found: {}", id))
}

fn contact_of(person: Person) -> Contact {
    person.contact.unwrap_or_default()
}

/// `GET /person/:id/contact`
#[tracing::instrument(skip(state))]
pub async fn get_contact(
    State(state): State<AppState>,
    PersonId(id): PersonId,
) -> Result<Json<Contact>, AppError> {
    let person = state
        .db
        .find_by_id(id)
        .await?
        .ok_or_else(|| person_not_found(id))?;

    person
        .contact
        .map(Json)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Person {} has no contact", id)))
}

/// `POST /person/:id/contact`; fails with 409 when a contact is already set.
#[tracing::instrument(skip(state, contact))]
pub async fn create_contact(
    State(state): State<AppState>,
    PersonId(id): PersonId,
    JsonBody(contact): JsonBody<Contact>,
) -> Result<(StatusCode, Json<Contact>), AppError> {
    match state.db.attach_contact(id, &contact).await? {
        ContactWrite::Applied(person) => {
            tracing::info!(person_id = %id, "Contact attached");
            Ok((StatusCode::CREATED, Json(contact_of(person))))
        }
        ContactWrite::Conflict => Err(AppError::Conflict(anyhow::anyhow!(
            "Person {} already has a contact",
            id
        ))),
        ContactWrite::Missing => Err(person_not_found(id)),
    }
}

/// `PUT /person/:id/contact`
#[tracing::instrument(skip(state, contact))]
pub async fn replace_contact(
    State(state): State<AppState>,
    PersonId(id): PersonId,
    JsonBody(contact): JsonBody<Contact>,
) -> Result<Json<Contact>, AppError> {
    let person = state
        .db
        .replace_contact(id, &contact)
        .await?
        .ok_or_else(|| person_not_found(id))?;

    tracing::info!(person_id = %id, "Contact replaced");
    Ok(Json(contact_of(person)))
}

/// `PATCH /person/:id/contact`
#[tracing::instrument(skip(state, patch))]
pub async fn patch_contact(
    State(state): State<AppState>,
    PersonId(id): PersonId,
    JsonBody(patch): JsonBody<ContactPatch>,
) -> Result<Json<Contact>, AppError> {
    let person = state
        .db
        .patch_contact(id, &patch)
        .await?
        .ok_or_else(|| person_not_found(id))?;

    tracing::info!(person_id = %id, "Contact patched");
    Ok(Json(contact_of(person)))
}

/// `DELETE /person/:id/contact`; succeeds whether or not a contact was set.
#[tracing::instrument(skip(state))]
pub async fn delete_contact(
    State(state): State<AppState>,
    PersonId(id): PersonId,
) -> Result<StatusCode, AppError> {
    state
        .db
        .remove_contact(id)
        .await?
        .ok_or_else(|| person_not_found(id))?;

    tracing::info!(person_id = %id, "Contact removed");
    Ok(StatusCode::NO_CONTENT)
}
