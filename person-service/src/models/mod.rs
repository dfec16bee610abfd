pub mod person;

pub use person::{Address, Contact, Person, Phone};
