pub mod json_body;
pub mod person_id;

pub use json_body::JsonBody;
pub use person_id::PersonId;
