use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::{Contact, Person};

/// Body accepted by `POST /person`.
///
/// There is no `_id` here: ids are assigned by the store, so a client-supplied
/// one is dropped along with any other unknown key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonPayload {
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub contact: Option<Contact>,
}

impl From<PersonPayload> for Person {
    fn from(payload: PersonPayload) -> Self {
        Person {
            id: None,
            firstname: payload.firstname,
            lastname: payload.lastname,
            contact: payload.contact,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PersonResponse {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

impl From<Person> for PersonResponse {
    fn from(person: Person) -> Self {
        PersonResponse {
            id: person.id.map(|id| id.to_hex()),
            firstname: person.firstname,
            lastname: person.lastname,
            contact: person.contact,
        }
    }
}

/// Acknowledgment returned by `POST /person`.
///
/// `acknowledged` is always `true`: the client runs with the default
/// acknowledged write concern, so an insert that returns an id was acknowledged
/// and a failed one surfaces as an error before this is built.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InsertResponse {
    pub inserted_id: String,
    pub acknowledged: bool,
}

impl From<ObjectId> for InsertResponse {
    fn from(id: ObjectId) -> Self {
        InsertResponse {
            inserted_id: id.to_hex(),
            acknowledged: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_ignores_client_id() {
        let payload: PersonPayload = serde_json::from_value(json!({
            "_id": "65f0c0ffee0000000000beef",
            "firstname": "Ana",
            "lastname": "Silva"
        }))
        .unwrap();

        let person = Person::from(payload);
        assert!(person.id.is_none());
        assert_eq!(person.firstname.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_response_renders_hex_id() {
        let id = ObjectId::parse_str("65f0c0ffee0000000000beef").unwrap();
        let response = PersonResponse::from(Person {
            id: Some(id),
            firstname: Some("Ana".into()),
            lastname: Some("Silva".into()),
            contact: None,
        });

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "_id": "65f0c0ffee0000000000beef",
                "firstname": "Ana",
                "lastname": "Silva"
            })
        );
    }

    #[test]
    fn test_insert_acknowledgment_shape() {
        let id = ObjectId::parse_str("65f0c0ffee0000000000beef").unwrap();
        assert_eq!(
            serde_json::to_value(InsertResponse::from(id)).unwrap(),
            json!({ "inserted_id": "65f0c0ffee0000000000beef", "acknowledged": true })
        );
    }
}
