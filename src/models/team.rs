use crate::models::entity::{stamp, Entity, Reference};
use crate::models::league::Season;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::{AsChangeset, Insertable, Queryable};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Queryable, Insertable, AsChangeset, Validate)]
#[diesel(table_name = crate::models::schema::teams)]
pub struct Team {
    pub id: i64,
    #[validate(length(min = 1, max = 255, message = "Team name must not be empty"))]
    pub name: String,
    #[validate(length(max = 16))]
    pub short_code: Option<String>,
    pub country: Option<String>,
    #[validate(range(min = 1800, max = 2200))]
    pub founded: Option<i32>,
    #[serde(default)]
    pub national: bool,
    pub logo: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TeamPatch {
    pub name: Option<String>,
    pub short_code: Option<String>,
    pub country: Option<String>,
    pub founded: Option<i32>,
    pub national: Option<bool>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamFilter {
    pub name: Option<String>,
    pub country: Option<String>,
}

impl Entity for Team {
    type Id = i64;
    type Patch = TeamPatch;
    type Filter = TeamFilter;

    const NAME: &'static str = "Team";

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

    fn matches(&self, filter: &TeamFilter) -> bool {
        filter.name.as_ref().map_or(true, |name| &self.name == name)
            && filter
                .country
                .as_ref()
                .map_or(true, |country| self.country.as_ref() == Some(country))
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![format!("name:{}", self.name)]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Queryable, Insertable, AsChangeset, Validate)]
#[diesel(table_name = crate::models::schema::players)]
pub struct Player {
    pub id: i64,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub nationality: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[validate(length(max = 16))]
    pub height: Option<String>,
    #[validate(length(max = 16))]
    pub weight: Option<String>,
    pub photo: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PlayerPatch {
    pub name: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub nationality: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerFilter {
    pub nationality: Option<String>,
}

impl Entity for Player {
    type Id = i64;
    type Patch = PlayerPatch;
    type Filter = PlayerFilter;

    const NAME: &'static str = "Player";

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

    fn matches(&self, filter: &PlayerFilter) -> bool {
        filter
            .nationality
            .as_ref()
            .map_or(true, |nationality| self.nationality.as_ref() == Some(nationality))
    }
}

/// A player's registration with a team for one season.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Queryable, Insertable, AsChangeset, Validate)]
#[diesel(table_name = crate::models::schema::player_team_seasons)]
#[validate(schema(function = "validate_registration_dates"))]
pub struct PlayerTeamSeason {
    #[serde(default = "uuid::Uuid::new_v4")]
    pub id: Uuid,
    pub player_id: i64,
    pub team_id: i64,
    pub season_id: Uuid,
    #[validate(range(min = 0, max = 99))]
    pub number: Option<i32>,
    #[validate(length(max = 32))]
    pub position: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn validate_registration_dates(row: &PlayerTeamSeason) -> Result<(), ValidationError> {
    match (row.start_date, row.end_date) {
        (Some(start), Some(end)) if end < start => {
            let mut err = ValidationError::new("registration_dates");
            err.message = Some("Registration ends before it starts".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PlayerTeamSeasonPatch {
    pub number: Option<i32>,
    pub position: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerTeamSeasonFilter {
    pub player_id: Option<i64>,
    pub team_id: Option<i64>,
    pub season_id: Option<Uuid>,
    pub is_current: Option<bool>,
}

impl Entity for PlayerTeamSeason {
    type Id = Uuid;
    type Patch = PlayerTeamSeasonPatch;
    type Filter = PlayerTeamSeasonFilter;

    const NAME: &'static str = "PlayerTeamSeason";

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
        vec![
            Reference::to::<Player>(&self.player_id),
            Reference::to::<Team>(&self.team_id),
            Reference::to::<Season>(&self.season_id),
        ]
    }

    fn matches(&self, filter: &PlayerTeamSeasonFilter) -> bool {
        filter.player_id.map_or(true, |id| self.player_id == id)
            && filter.team_id.map_or(true, |id| self.team_id == id)
            && filter.season_id.map_or(true, |id| self.season_id == id)
            && filter.is_current.map_or(true, |current| self.is_current == current)
    }

    fn unique_keys(&self) -> Vec<String> {
        let mut keys = vec![format!(
            "player_team_season:{}:{}:{}",
            self.player_id, self.team_id, self.season_id
        )];
        if self.is_current {
            keys.push(format!("current:{}:{}", self.player_id, self.season_id));
        }
        keys
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Queryable, Insertable, AsChangeset, Validate)]
#[diesel(table_name = crate::models::schema::transfers)]
pub struct Transfer {
    #[serde(default = "uuid::Uuid::new_v4")]
    pub id: Uuid,
    pub player_id: i64,
    pub from_team_id: Option<i64>,
    pub to_team_id: Option<i64>,
    pub transfer_date: Option<NaiveDate>,
    #[validate(length(max = 32))]
    pub transfer_type: Option<String>,
    #[validate(range(min = 0.0))]
    pub fee: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TransferPatch {
    pub from_team_id: Option<i64>,
    pub to_team_id: Option<i64>,
    pub transfer_date: Option<NaiveDate>,
    pub transfer_type: Option<String>,
    pub fee: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferFilter {
    pub player_id: Option<i64>,
}

impl Entity for Transfer {
    type Id = Uuid;
    type Patch = TransferPatch;
    type Filter = TransferFilter;

    const NAME: &'static str = "Transfer";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
    }

    fn keep_created_at(&mut self, stored: &Self) {
        self.created_at = stored.created_at.or(self.created_at);
    }

    fn references(&self) -> Vec<Reference> {
        let mut references = vec![Reference::to::<Player>(&self.player_id)];
        for team_id in [self.from_team_id, self.to_team_id].iter().flatten() {
            references.push(Reference::to::<Team>(team_id));
        }
        references
    }

    fn matches(&self, filter: &TransferFilter) -> bool {
        filter.player_id.map_or(true, |id| self.player_id == id)
    }
}
