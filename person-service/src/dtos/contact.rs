use mongodb::bson::{doc, Document};
use serde::Deserialize;

use crate::models::{Address, Phone};

/// Body accepted by `PATCH /person/:id/contact`.
///
/// Only the leaves that are present are written; everything else in the
/// stored contact is left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPatch {
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub phone: Option<Phone>,
}

impl ContactPatch {
    /// Flatten into dotted `$set` paths under `contact`.
    pub fn set_fields(&self) -> Document {
        let mut fields = doc! {};

        if let Some(address) = &self.address {
            insert_if_some(&mut fields, "contact.address.city", &address.city);
            insert_if_some(&mut fields, "contact.address.state", &address.state);
        }

        if let Some(phone) = &self.phone {
            insert_if_some(&mut fields, "contact.phone.ddd", &phone.ddd);
            insert_if_some(&mut fields, "contact.phone.number", &phone.number);
        }

        fields
    }
}

fn insert_if_some(fields: &mut Document, path: &str, value: &Option<String>) {
    if let Some(value) = value {
        fields.insert(path, value.as_str());
    }
}
