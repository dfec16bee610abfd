use crate::config::{MongoConfig, TimeoutConfig};
use crate::dtos::ContactPatch;
use crate::models::{Contact, Person};
use futures::TryStreamExt;
use metrics::{counter, histogram};
use mongodb::{
    bson::{self, doc, oid::ObjectId, Document},
    options::{ClientOptions, FindOneAndUpdateOptions, ReturnDocument},
    Client as MongoClient, Collection,
};
use service_core::error::AppError;
use std::future::Future;
use std::time::{Duration, Instant};

/// Outcome of attaching a contact to a person that may already have one.
#[derive(Debug, Clone, PartialEq)]
pub enum ContactWrite {
    Applied(Person),
    Conflict,
    Missing,
}

#[derive(Clone)]
pub struct PersonDb {
    client: MongoClient,
    people: Collection<Person>,
    timeouts: TimeoutConfig,
}

impl PersonDb {
    /// Build the client and verify the server answers a ping.
    pub async fn connect(mongo: &MongoConfig, timeouts: &TimeoutConfig) -> Result<Self, AppError> {
        tracing::info!(uri = %mongo.uri, "Connecting to MongoDB");
        let db = Self::new(mongo, timeouts).await?;
        db.health_check().await.map_err(|e| {
            tracing::error!("MongoDB at {} is not reachable: {}", mongo.uri, e);
            e
        })?;
        tracing::info!(
            database = %mongo.database,
            collection = %mongo.collection,
            "Successfully connected to MongoDB"
        );
        Ok(db)
    }

    /// Build the client without touching the network.
    ///
    /// The driver connects lazily, so this succeeds even when no server is up.
    pub async fn new(mongo: &MongoConfig, timeouts: &TimeoutConfig) -> Result<Self, AppError> {
        let mut options = ClientOptions::parse(&mongo.uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
        options.app_name = Some(mongo.app_name.clone());
        options.connect_timeout = Some(timeouts.connect);
        options.server_selection_timeout = Some(timeouts.connect);

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::from(e)
        })?;
        let people = client
            .database(&mongo.database)
            .collection::<Person>(&mongo.collection);

        Ok(Self {
            client,
            people,
            timeouts: timeouts.clone(),
        })
    }

    pub fn people(&self) -> &Collection<Person> {
        &self.people
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        let admin = self.client.database("admin");
        self.bounded(
            "ping",
            self.timeouts.connect,
            admin.run_command(doc! { "ping": 1 }, None),
        )
        .await?;
        Ok(())
    }

    pub async fn insert(&self, person: &Person) -> Result<ObjectId, AppError> {
        let result = self
            .bounded(
                "insert_person",
                self.timeouts.write,
                self.people.insert_one(person, None),
            )
            .await?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Store returned a non-ObjectId id: {}",
                result.inserted_id
            ))
        })
    }

    /// Every person in the collection, in natural order.
    pub async fn find_all(&self) -> Result<Vec<Person>, AppError> {
        self.bounded("find_people", self.timeouts.read, async {
            let cursor = self.people.find(doc! {}, None).await?;
            let people: Vec<Person> = cursor.try_collect().await?;
            Ok::<_, mongodb::error::Error>(people)
        })
        .await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Person>, AppError> {
        self.bounded(
            "find_person",
            self.timeouts.read,
            self.people.find_one(doc! { "_id": id }, None),
        )
        .await
    }

    /// Set the contact only if the person does not have one yet.
    ///
    /// When the conditional update misses, the person is re-read to tell a
    /// conflict from a missing person. If the contact vanished in between
    /// (a concurrent delete), the update is tried again.
    pub async fn attach_contact(
        &self,
        id: ObjectId,
        contact: &Contact,
    ) -> Result<ContactWrite, AppError> {
        let value = contact_bson(contact)?;

        for _ in 0..ATTACH_ATTEMPTS {
            let filter = doc! { "_id": id, "contact": { "$exists": false } };
            let update = doc! { "$set": { "contact": value.clone() } };

            if let Some(person) = self.update_returning("attach_contact", filter, update).await? {
                return Ok(ContactWrite::Applied(person));
            }

            if let Some(outcome) = attach_miss_outcome(self.find_by_id(id).await?) {
                return Ok(outcome);
            }
        }

        // Contact keeps flipping under us; someone else is writing it.
        Ok(ContactWrite::Conflict)
    }

    pub async fn replace_contact(
        &self,
        id: ObjectId,
        contact: &Contact,
    ) -> Result<Option<Person>, AppError> {
        let update = doc! { "$set": { "contact": contact_bson(contact)? } };
        self.update_returning("replace_contact", doc! { "_id": id }, update)
            .await
    }

    pub async fn patch_contact(
        &self,
        id: ObjectId,
        patch: &ContactPatch,
    ) -> Result<Option<Person>, AppError> {
        let fields = patch.set_fields();
        if fields.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Contact patch must set at least one field"
            )));
        }

        self.update_returning("patch_contact", doc! { "_id": id }, doc! { "$set": fields })
            .await
    }

    pub async fn remove_contact(&self, id: ObjectId) -> Result<Option<Person>, AppError> {
        self.update_returning(
            "remove_contact",
            doc! { "_id": id },
            doc! { "$unset": { "contact": "" } },
        )
        .await
    }

    async fn update_returning(
        &self,
        operation: &'static str,
        filter: Document,
        update: Document,
    ) -> Result<Option<Person>, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.bounded(
            operation,
            self.timeouts.write,
            self.people.find_one_and_update(filter, update, options),
        )
        .await
    }

    /// Run one driver call under `limit`.
    ///
    /// On expiry the driver future is dropped, which cancels the call and
    /// releases whatever it held.
    async fn bounded<T, F>(
        &self,
        operation: &'static str,
        limit: Duration,
        call: F,
    ) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, mongodb::error::Error>>,
    {
        let start = Instant::now();
        let outcome = tokio::time::timeout(limit, call).await;
        histogram!("db_operation_duration_seconds", "operation" => operation)
            .record(start.elapsed().as_secs_f64());

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                counter!("db_operation_errors_total", "operation" => operation).increment(1);
                tracing::error!(operation, "MongoDB operation failed: {}", e);
                Err(AppError::from(e))
            }
            Err(_) => {
                counter!("db_operation_errors_total", "operation" => operation).increment(1);
                tracing::error!(
                    operation,
                    timeout_secs = limit.as_secs(),
                    "MongoDB operation timed out"
                );
                Err(AppError::Timeout(format!(
                    "{} timed out after {}s",
                    operation,
                    limit.as_secs()
                )))
            }
        }
    }
}

const ATTACH_ATTEMPTS: usize = 3;

/// Classify a missed conditional attach from the person as it is now.
/// `None` means the contact is gone again and the attach should be retried.
fn attach_miss_outcome(current: Option<Person>) -> Option<ContactWrite> {
    match current {
        None => Some(ContactWrite::Missing),
        Some(person) if person.contact.is_some() => Some(ContactWrite::Conflict),
        Some(_) => None,
    }
}

fn contact_bson(contact: &Contact) -> Result<bson::Bson, AppError> {
    bson::to_bson(contact).map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Failed to encode contact: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Address, Phone};

    fn config() -> (MongoConfig, TimeoutConfig) {
        (
            MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "senai".to_string(),
                collection: "people".to_string(),
                app_name: "person-service-test".to_string(),
            },
            TimeoutConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_new_does_not_require_a_server() {
        let (mongo, timeouts) = config();
        let db = PersonDb::new(&mongo, &timeouts).await.unwrap();
        assert_eq!(db.people().name(), "people");
        assert_eq!(db.people().namespace().db, "senai");
    }

    #[tokio::test]
    async fn test_bounded_reports_timeout() {
        let (mongo, timeouts) = config();
        let db = PersonDb::new(&mongo, &timeouts).await.unwrap();

        let result: Result<(), AppError> = db
            .bounded("slow_op", Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<(), mongodb::error::Error>(())
            })
            .await;

        match result {
            Err(AppError::Timeout(msg)) => assert!(msg.starts_with("slow_op timed out")),
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_empty_patch_is_rejected_before_the_store() {
        let (mongo, timeouts) = config();
        let db = PersonDb::new(&mongo, &timeouts).await.unwrap();

        let err = db
            .patch_contact(ObjectId::new(), &ContactPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_attach_miss_outcome() {
        assert_eq!(attach_miss_outcome(None), Some(ContactWrite::Missing));

        let with_contact = Person {
            id: Some(ObjectId::new()),
            contact: Some(Contact::default()),
            ..Default::default()
        };
        assert_eq!(
            attach_miss_outcome(Some(with_contact)),
            Some(ContactWrite::Conflict)
        );

        // Contact removed between the update and the re-read: retry, not 409
        let without_contact = Person {
            id: Some(ObjectId::new()),
            ..Default::default()
        };
        assert_eq!(attach_miss_outcome(Some(without_contact)), None);
    }

    #[test]
    fn test_contact_bson_skips_absent_parts() {
        let contact = Contact {
            address: Some(Address {
                city: Some("Recife".into()),
                state: None,
            }),
            phone: Some(Phone::default()),
        };

        let encoded = contact_bson(&contact).unwrap();
        assert_eq!(
            encoded,
            bson::Bson::Document(doc! { "address": { "city": "Recife" }, "phone": {} })
        );
    }
}
