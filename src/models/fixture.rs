use crate::models::entity::{stamp, Entity, Reference};
use crate::models::league::{League, Season};
use crate::models::team::Team;
use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

lazy_static! {
    static ref STATUS_CODE_RE: Regex = Regex::new(r"^[A-Z0-9]{1,4}$").unwrap();
}

/// Provider short status codes that mean the result is final.
pub const FINISHED_STATUSES: [&str; 3] = ["FT", "AET", "PEN"];

pub const WINNER_DRAW: i32 = 0;
pub const WINNER_HOME: i32 = 1;
pub const WINNER_AWAY: i32 = 2;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Queryable, Insertable, AsChangeset, Validate)]
#[diesel(table_name = crate::models::schema::fixtures)]
#[validate(schema(function = "validate_fixture"))]
pub struct Fixture {
    pub id: i64,
    pub league_id: Option<i64>,
    pub season_id: Option<Uuid>,
    pub group_name: Option<String>,
    pub round_name: Option<String>,
    pub referee: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    #[validate(regex(path = "STATUS_CODE_RE", message = "Unknown fixture status code"))]
    pub status: Option<String>,
    pub home_team_id: i64,
    pub away_team_id: i64,
    #[validate(range(min = 0))]
    pub home_score: Option<i32>,
    #[validate(range(min = 0))]
    pub away_score: Option<i32>,
    #[validate(range(min = 0, max = 2))]
    pub winner: Option<i32>,
    #[validate(range(min = 0))]
    pub attendance: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Fixture {
    pub fn is_finished(&self) -> bool {
        self.status
            .as_deref()
            .map_or(false, |status| FINISHED_STATUSES.contains(&status))
    }

    pub fn involves(&self, team_id: i64) -> bool {
        self.home_team_id == team_id || self.away_team_id == team_id
    }
}

/// Winner code implied by a final score.
pub fn winner_code(home_score: i32, away_score: i32) -> i32 {
    match home_score.cmp(&away_score) {
        std::cmp::Ordering::Greater => WINNER_HOME,
        std::cmp::Ordering::Less => WINNER_AWAY,
        std::cmp::Ordering::Equal => WINNER_DRAW,
    }
}

fn fixture_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn validate_fixture(fixture: &Fixture) -> Result<(), ValidationError> {
    if fixture.home_team_id == fixture.away_team_id {
        return Err(fixture_error(
            "same_team",
            "Home and away team of a fixture must differ",
        ));
    }
    if fixture.is_finished() {
        if let (Some(home), Some(away), Some(winner)) =
            (fixture.home_score, fixture.away_score, fixture.winner)
        {
            // Penalty shoot-outs decide level games, so only the drawn-winner combination is impossible there.
            let consistent = if fixture.status.as_deref() == Some("PEN") {
                home != away || winner != WINNER_DRAW
            } else {
                winner == winner_code(home, away)
            };
            if !consistent {
                return Err(fixture_error(
                    "winner_mismatch",
                    "Winner code does not match the final score",
                ));
            }
        }
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FixturePatch {
    pub league_id: Option<i64>,
    pub season_id: Option<Uuid>,
    pub group_name: Option<String>,
    pub round_name: Option<String>,
    pub referee: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub home_team_id: Option<i64>,
    pub away_team_id: Option<i64>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub winner: Option<i32>,
    pub attendance: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureFilter {
    pub team_id: Option<i64>,
    pub league_id: Option<i64>,
    pub season_id: Option<Uuid>,
    pub status: Option<String>,
}

impl Entity for Fixture {
    type Id = i64;
    type Patch = FixturePatch;
    type Filter = FixtureFilter;

    const NAME: &'static str = "Fixture";

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

    fn references(&self) -> Vec<Reference> {
        let mut references = vec![
            Reference::to::<Team>(&self.home_team_id),
            Reference::to::<Team>(&self.away_team_id),
        ];
        if let Some(league_id) = &self.league_id {
            references.push(Reference::to::<League>(league_id));
        }
        if let Some(season_id) = &self.season_id {
            references.push(Reference::to::<Season>(season_id));
        }
        references
    }

    fn matches(&self, filter: &FixtureFilter) -> bool {
        filter.team_id.map_or(true, |team| self.involves(team))
            && filter.league_id.map_or(true, |id| self.league_id == Some(id))
            && filter.season_id.map_or(true, |id| self.season_id == Some(id))
            && filter
                .status
                .as_ref()
                .map_or(true, |status| self.status.as_ref() == Some(status))
    }
}

/// Something that happened during a fixture: goal, card, substitution, VAR decision.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Queryable, Insertable, AsChangeset, Validate)]
#[diesel(table_name = crate::models::schema::events)]
pub struct Event {
    #[serde(default = "uuid::Uuid::new_v4")]
    pub id: Uuid,
    pub fixture_id: i64,
    pub team_id: Option<i64>,
    pub player_id: Option<i64>,
    pub assist_id: Option<i64>,
    #[validate(length(min = 1, max = 64))]
    pub event_type: String,
    pub detail: Option<String>,
    #[validate(range(min = 0, max = 200))]
    pub minute: Option<i32>,
    #[validate(range(min = 0, max = 60))]
    pub extra_minute: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Chronological position inside the match.
    pub fn timeline_key(&self) -> (i32, i32) {
        (self.minute.unwrap_or(0), self.extra_minute.unwrap_or(0))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EventPatch {
    pub team_id: Option<i64>,
    pub player_id: Option<i64>,
    pub assist_id: Option<i64>,
    pub event_type: Option<String>,
    pub detail: Option<String>,
    pub minute: Option<i32>,
    pub extra_minute: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub fixture_id: Option<i64>,
}

impl Entity for Event {
    type Id = Uuid;
    type Patch = EventPatch;
    type Filter = EventFilter;

    const NAME: &'static str = "Event";

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
        vec![Reference::to::<Fixture>(&self.fixture_id)]
    }

    fn matches(&self, filter: &EventFilter) -> bool {
        filter.fixture_id.map_or(true, |id| self.fixture_id == id)
    }
}

/// A derived league-table row. Only the standings routines write these.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Queryable, Insertable, AsChangeset, Validate)]
#[diesel(table_name = crate::models::schema::standings)]
#[validate(schema(function = "validate_standing"))]
pub struct Standing {
    #[serde(default = "uuid::Uuid::new_v4")]
    pub id: Uuid,
    pub league_id: i64,
    pub season_id: Uuid,
    pub group_name: Option<String>,
    pub team_id: i64,
    #[validate(range(min = 1))]
    pub rank: Option<i32>,
    pub played: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub points: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_diff: i32,
    pub form: Option<String>,
    #[serde(default)]
    pub stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

fn validate_standing(row: &Standing) -> Result<(), ValidationError> {
    if row.goal_diff != row.goals_for - row.goals_against {
        let mut err = ValidationError::new("goal_diff");
        err.message = Some("goal_diff must equal goals_for - goals_against".into());
        return Err(err);
    }
    if row.played != row.wins + row.draws + row.losses {
        let mut err = ValidationError::new("played");
        err.message = Some("played must equal wins + draws + losses".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StandingPatch {
    pub rank: Option<i32>,
    pub form: Option<String>,
    pub stale: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandingFilter {
    pub league_id: Option<i64>,
    pub season_id: Option<Uuid>,
    pub team_id: Option<i64>,
}

impl Entity for Standing {
    type Id = Uuid;
    type Patch = StandingPatch;
    type Filter = StandingFilter;

    const NAME: &'static str = "Standing";

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::to::<League>(&self.league_id),
            Reference::to::<Season>(&self.season_id),
            Reference::to::<Team>(&self.team_id),
        ]
    }

    fn matches(&self, filter: &StandingFilter) -> bool {
        filter.league_id.map_or(true, |id| self.league_id == id)
            && filter.season_id.map_or(true, |id| self.season_id == id)
            && filter.team_id.map_or(true, |id| self.team_id == id)
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![format!(
            "table_row:{}:{}:{}:{}",
            self.league_id,
            self.season_id,
            self.group_name.as_deref().unwrap_or(""),
            self.team_id
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixture(status: &str, home: i32, away: i32, winner: i32) -> Fixture {
        Fixture {
            id: 1,
            league_id: Some(39),
            season_id: None,
            group_name: None,
            round_name: Some("Regular Season - 1".to_string()),
            referee: None,
            event_date: Utc.with_ymd_and_hms(2023, 8, 11, 19, 0, 0).single(),
            status: Some(status.to_string()),
            home_team_id: 33,
            away_team_id: 34,
            home_score: Some(home),
            away_score: Some(away),
            winner: Some(winner),
            attendance: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn finished_fixture_winner_must_match_score() {
        assert!(fixture("FT", 2, 1, WINNER_HOME).validate().is_ok());
        assert!(fixture("FT", 1, 1, WINNER_DRAW).validate().is_ok());
        assert!(fixture("FT", 2, 1, WINNER_AWAY).validate().is_err());
        assert!(fixture("FT", 0, 0, WINNER_HOME).validate().is_err());
    }

    #[test]
    fn unfinished_fixture_skips_winner_check() {
        assert!(fixture("1H", 2, 1, WINNER_AWAY).validate().is_ok());
    }

    #[test]
    fn penalty_shootout_allows_level_score_with_a_winner() {
        assert!(fixture("PEN", 1, 1, WINNER_AWAY).validate().is_ok());
        assert!(fixture("PEN", 1, 1, WINNER_DRAW).validate().is_err());
    }

    #[test]
    fn team_cannot_play_itself() {
        let mut f = fixture("NS", 0, 0, WINNER_DRAW);
        f.away_team_id = f.home_team_id;
        assert!(f.validate().is_err());
    }

    #[test]
    fn standing_goal_diff_is_checked() {
        let row = Standing {
            id: Uuid::new_v4(),
            league_id: 39,
            season_id: Uuid::new_v4(),
            group_name: None,
            team_id: 33,
            rank: Some(1),
            played: 2,
            wins: 1,
            draws: 1,
            losses: 0,
            points: 4,
            goals_for: 3,
            goals_against: 1,
            goal_diff: 1,
            form: None,
            stale: false,
            updated_at: None,
        };
        assert!(row.validate().is_err());
        let fixed = Standing { goal_diff: 2, ..row };
        assert!(fixed.validate().is_ok());
    }
}
