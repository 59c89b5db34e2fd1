use bson::oid::ObjectId;
use bson::{DateTime, doc};
use mongodb::IndexModel;
use serde::{Deserialize, Serialize};

use crate::db::models::{ModelCollection, index};
use crate::db::sort::Sort::{Asc, Desc};

/// A scraped job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProfile {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub job_title: String,
    pub company_name: String,
    pub location: Option<String>,
    #[serde(default)]
    pub description: String,
    pub job_url: String,
    /// The job board this was scraped from, i.e. `"lever"`.
    pub source: String,
    pub scraped_at: DateTime,
}

impl ModelCollection for JobProfile {
    const COLLECTION_NAME: &str = "jobsprofiles";

    fn indices() -> Vec<IndexModel> {
        vec![
            index(doc! { "company_name": Asc }),
            index(doc! { "location": Asc }),
            index(doc! { "scraped_at": Desc }),
            index(doc! { "job_title": Asc }),
            index(doc! { "source": Asc }),
            // latest postings per company or location
            index(doc! {
                "company_name": Asc,
                "scraped_at": Desc,
            }),
            index(doc! {
                "location": Asc,
                "scraped_at": Desc,
            }),
        ]
    }
}
