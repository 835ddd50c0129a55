//! Job posting data model — typed identity over an open JSON record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// A single job posting.
///
/// Only `id` is structured; everything else the client sends is carried
/// opaquely and round-tripped as-is. This keeps "accept any shape" semantics
/// while the server stays in control of identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    /// Server-assigned identifier, unique within one session's collection.
    #[serde(default)]
    pub id: u64,
    /// Opaque client-supplied fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl JobPosting {
    /// Build a posting from a raw request body, forcing the server-assigned id.
    ///
    /// Any `id` key in the body is discarded so it cannot shadow the typed
    /// field on serialization.
    pub fn from_body(mut fields: Map<String, Value>, id: u64) -> Self {
        fields.remove("id");
        Self { id, fields }
    }
}

/// Next identifier for a collection: 1 when empty, max + 1 otherwise.
///
/// The empty-collection case is a defined constant rather than an artifact of
/// folding `max` over nothing.
pub fn next_id(jobs: &[JobPosting]) -> u64 {
    jobs.iter().map(|j| j.id).max().map_or(1, |max| max + 1)
}

/// The fixed dataset copied into every new session's collection.
pub fn seed_postings() -> Vec<JobPosting> {
    fn posting(id: u64, body: Value) -> JobPosting {
        match body {
            Value::Object(fields) => JobPosting::from_body(fields, id),
            _ => unreachable!("seed entries are object literals"),
        }
    }

    vec![
        posting(
            1,
            json!({
                "title": "Backend Engineer",
                "company": "Initech",
                "location": "Remote",
                "salary": 120_000,
            }),
        ),
        posting(
            2,
            json!({
                "title": "Frontend Developer",
                "company": "Globex",
                "location": "Austin, TX",
                "salary": 105_000,
            }),
        ),
        posting(
            3,
            json!({
                "title": "Site Reliability Engineer",
                "company": "Hooli",
                "location": "New York, NY",
                "salary": 140_000,
            }),
        ),
    ]
}
