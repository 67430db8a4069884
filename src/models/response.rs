use crate::models::fixture::{Event, Fixture};
use serde::{Deserialize, Serialize};

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
    pub status_code: u16,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FixtureWithEvents {
    #[serde(flatten)]
    pub fixture: Fixture,
    pub events: Vec<Event>,
}

/// What the provider currently reports for a fixture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveStatus {
    pub status: Option<String>,
    pub status_long: Option<String>,
    pub elapsed: Option<i32>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FixtureLiveView {
    #[serde(flatten)]
    pub fixture: Fixture,
    pub live: Option<LiveStatus>,
}

/// Counts reported by the ingestion endpoints.
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SyncReport {
    pub entity: String,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl SyncReport {
    pub fn new(entity: &str) -> Self {
        SyncReport {
            entity: entity.to_string(),
            ..Default::default()
        }
    }
}
