//! Request and response bodies for the HTTP surface.

mod contact;
mod person;

pub use contact::ContactPatch;
pub use person::{InsertResponse, PersonPayload, PersonResponse};
