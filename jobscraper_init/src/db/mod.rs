use mongodb::{Client, Database};

use crate::config::JMongoConfig;
use crate::prelude::*;

pub mod model;
pub mod models;
pub mod sort;

use model::JobProfile;
use models::{ModelCollection as _, OnConflict};

/// What a provisioning run did and found.
#[derive(Debug)]
#[must_use]
pub struct Provisioned {
    /// The database name.
    pub database: String,
    /// The collection name.
    pub collection: &'static str,
    /// Whether the collection was created by this run.
    pub created_collection: bool,
    /// Server-side names of the indices this run verified.
    pub indices: Vec<String>,
}

/// Connects to the configured cluster and selects the database.
pub async fn connect(config: &JMongoConfig) -> Result<Database> {
    let client = Client::with_uri_str(&config.uri)
        .await
        .context("failed to connect to database cluster")?;

    Ok(client.database(&config.database))
}

/// Ensures the job profile collection and its indices exist, then checks the
/// resulting index set.
pub async fn provision(db: &Database, on_conflict: OnConflict) -> Result<Provisioned> {
    let created_collection = JobProfile::ensure_collection(db).await?;
    if !created_collection {
        let count = JobProfile::collection(db)
            .estimated_document_count()
            .await
            .context("could not count existing job profiles")?;
        log::info!("Collection {} already holds ~{count} documents.", JobProfile::COLLECTION_NAME);
    }

    JobProfile::update_indices(db, on_conflict).await?;

    let indices = JobProfile::verify_indices(db).await?;

    Ok(Provisioned {
        database: db.name().to_owned(),
        collection: JobProfile::COLLECTION_NAME,
        created_collection,
        indices,
    })
}

#[cfg(test)]
mod tests {
    use bson::Document;
    use bson::oid::ObjectId;
    use mongodb::options::IndexOptions;

    use super::*;

    const NEEDS_SERVER: &str = "needs JOBSCRAPER_TEST_MONGODB_URI";

    /// Connects to a throwaway database on the server named by
    /// `JOBSCRAPER_TEST_MONGODB_URI`.
    async fn test_database() -> Database {
        let uri = std::env::var("JOBSCRAPER_TEST_MONGODB_URI").expect(NEEDS_SERVER);
        let config = JMongoConfig {
            uri,
            database: format!("jobscraper_test_{}", ObjectId::new()),
            on_conflict: OnConflict::Fail,
        };

        connect(&config).await.expect("test server must be reachable")
    }

    async fn collection_names(db: &Database) -> Vec<String> {
        db.list_collection_names().await.expect("must list collections")
    }

    #[tokio::test]
    #[ignore = "needs JOBSCRAPER_TEST_MONGODB_URI"]
    async fn provision_empty_database() {
        let db = test_database().await;

        let run = provision(&db, OnConflict::Fail).await.expect("must provision");
        assert!(run.created_collection, "collection must be created");
        assert_eq!(run.collection, "jobsprofiles", "collection name");
        assert_eq!(run.indices.len(), 7, "seven secondary indices");
        assert_eq!(collection_names(&db).await, ["jobsprofiles"], "one collection");

        db.drop().await.expect("must drop test database");
    }

    #[tokio::test]
    #[ignore = "needs JOBSCRAPER_TEST_MONGODB_URI"]
    async fn provision_is_idempotent() {
        let db = test_database().await;

        let first = provision(&db, OnConflict::Fail).await.expect("first run");
        let second = provision(&db, OnConflict::Fail).await.expect("second run");

        assert!(!second.created_collection, "collection must already exist");
        assert_eq!(first.indices, second.indices, "same index set");
        assert_eq!(collection_names(&db).await, ["jobsprofiles"], "one collection");

        db.drop().await.expect("must drop test database");
    }

    #[tokio::test]
    #[ignore = "needs JOBSCRAPER_TEST_MONGODB_URI"]
    async fn provision_conflict() {
        let db = test_database().await;

        // same name as the index we create, different keys
        let raw = db.collection::<Document>("jobsprofiles");
        let name = models::index_name(&bson::doc! { "job_title": 1 });
        let conflicting = mongodb::IndexModel::builder()
            .keys(bson::doc! { "job_title": -1 })
            .options(IndexOptions::builder().name(name).build())
            .build();
        raw.create_index(conflicting).await.expect("must create conflicting index");

        let err = provision(&db, OnConflict::Fail).await.expect_err("must fail on conflict");
        assert!(
            err.downcast_ref::<models::ProvisionError>().is_some(),
            "conflict must surface as a provision error: {err:?}"
        );

        let run = provision(&db, OnConflict::Recreate).await.expect("must recreate");
        assert_eq!(run.indices.len(), 7, "seven secondary indices");

        db.drop().await.expect("must drop test database");
    }

    #[tokio::test]
    #[ignore = "needs JOBSCRAPER_TEST_MONGODB_URI"]
    async fn provision_conflict_other_name() {
        let db = test_database().await;

        // same keys as one of ours, different name
        let raw = db.collection::<Document>("jobsprofiles");
        let conflicting = mongodb::IndexModel::builder()
            .keys(bson::doc! { "company_name": 1 })
            .options(IndexOptions::builder().name("foo".to_owned()).build())
            .build();
        raw.create_index(conflicting).await.expect("must create conflicting index");

        let err = provision(&db, OnConflict::Fail).await.expect_err("must fail on conflict");
        assert!(
            err.downcast_ref::<models::ProvisionError>().is_some(),
            "conflict must surface as a provision error: {err:?}"
        );

        let run = provision(&db, OnConflict::Recreate).await.expect("must recreate");
        assert_eq!(run.indices.len(), 7, "seven verified indices");
        assert!(
            run.indices.iter().any(|name| name == "company_name_1"),
            "index must be recreated under its default name"
        );

        let names = raw.list_index_names().await.expect("must list indices");
        assert!(!names.iter().any(|name| name == "foo"), "old index must be dropped");

        db.drop().await.expect("must drop test database");
    }
}
