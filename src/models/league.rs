use crate::models::entity::{stamp, Entity, Reference};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::{AsChangeset, Insertable, Queryable};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

lazy_static! {
    pub static ref COUNTRY_CODE_RE: Regex = Regex::new(r"^[A-Z]{2}(-[A-Z]{3})?$").unwrap();
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Queryable, Insertable, AsChangeset, Validate)]
#[diesel(table_name = crate::models::schema::leagues)]
pub struct League {
    pub id: i64,
    #[validate(length(min = 1, max = 255, message = "League name must not be empty"))]
    pub name: String,
    pub country: Option<String>,
    #[validate(regex(
        path = "COUNTRY_CODE_RE",
        message = "Country code must look like GB or GB-ENG"
    ))]
    pub country_code: Option<String>,
    pub logo: Option<String>,
    pub flag: Option<String>,
    #[validate(length(max = 50))]
    pub league_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LeaguePatch {
    pub name: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub logo: Option<String>,
    pub flag: Option<String>,
    pub league_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeagueFilter {
    pub country: Option<String>,
}

impl Entity for League {
    type Id = i64;
    type Patch = LeaguePatch;
    type Filter = LeagueFilter;

    const NAME: &'static str = "League";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        stamp(&mut self.created_at, &mut self.updated_at, now);
    }

    fn keep_created_at(&mut self, stored: &Self) {
        self.created_at = stored.created_at.or(self.created_at);
    }

    fn matches(&self, filter: &LeagueFilter) -> bool {
        filter
            .country
            .as_ref()
            .map_or(true, |country| self.country.as_ref() == Some(country))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Queryable, Insertable, AsChangeset, Validate)]
#[diesel(table_name = crate::models::schema::seasons)]
#[validate(schema(function = "validate_season_dates"))]
pub struct Season {
    #[serde(default = "uuid::Uuid::new_v4")]
    pub id: Uuid,
    pub league_id: i64,
    #[validate(range(min = 1850, max = 2200, message = "Season year is out of range"))]
    pub year: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn validate_season_dates(season: &Season) -> Result<(), ValidationError> {
    match (season.start_date, season.end_date) {
        (Some(start), Some(end)) if end < start => {
            let mut err = ValidationError::new("season_dates");
            err.message = Some("Season end date is before its start date".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SeasonPatch {
    pub year: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonFilter {
    pub league_id: Option<i64>,
    pub year: Option<i32>,
}

impl Entity for Season {
    type Id = Uuid;
    type Patch = SeasonPatch;
    type Filter = SeasonFilter;

    const NAME: &'static str = "Season";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        stamp(&mut self.created_at, &mut self.updated_at, now);
    }

    fn keep_created_at(&mut self, stored: &Self) {
        self.created_at = stored.created_at.or(self.created_at);
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::to::<League>(&self.league_id)]
    }

    fn matches(&self, filter: &SeasonFilter) -> bool {
        filter.league_id.map_or(true, |id| self.league_id == id)
            && filter.year.map_or(true, |year| self.year == year)
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![format!("league_year:{}:{}", self.league_id, self.year)]
    }
}
