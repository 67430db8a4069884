//! Typed views of the API-Football v3 `response` arrays the ingestion uses.
//!
//! Only the fields we persist are modelled; everything else in the payload
//! is ignored by serde.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LeagueItem {
    pub league: LeagueInfo,
    #[serde(default)]
    pub country: CountryInfo,
    #[serde(default)]
    pub seasons: Vec<SeasonInfo>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LeagueInfo {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub league_type: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CountryInfo {
    pub name: Option<String>,
    pub code: Option<String>,
    pub flag: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SeasonInfo {
    pub year: i32,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub current: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TeamItem {
    pub team: TeamInfo,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TeamInfo {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub country: Option<String>,
    pub founded: Option<i32>,
    #[serde(default)]
    pub national: bool,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FixtureItem {
    pub fixture: FixtureInfo,
    pub league: FixtureLeague,
    pub teams: FixtureTeams,
    #[serde(default)]
    pub goals: Goals,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FixtureInfo {
    pub id: i64,
    pub referee: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: FixtureStatus,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FixtureStatus {
    pub long: Option<String>,
    pub short: Option<String>,
    pub elapsed: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FixtureLeague {
    pub id: i64,
    pub season: i32,
    pub round: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FixtureTeams {
    pub home: TeamSide,
    pub away: TeamSide,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TeamSide {
    pub id: i64,
    pub name: Option<String>,
    pub winner: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
pub struct Goals {
    pub home: Option<i32>,
    pub away: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EventItem {
    pub time: EventTime,
    #[serde(default)]
    pub team: Option<Reference>,
    #[serde(default)]
    pub player: Option<Reference>,
    #[serde(default)]
    pub assist: Option<Reference>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct EventTime {
    pub elapsed: Option<i32>,
    pub extra: Option<i32>,
}

/// `{ "id": .., "name": .. }` objects whose id the provider may send as null.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Reference {
    pub id: Option<i64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StandingsItem {
    pub league: StandingsLeague,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StandingsLeague {
    pub id: i64,
    pub season: i32,
    /// One table per group; single-table leagues have one entry.
    #[serde(default)]
    pub standings: Vec<Vec<StandingRow>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StandingRow {
    pub rank: i32,
    pub team: Reference,
    pub points: i32,
    #[serde(rename = "goalsDiff")]
    pub goals_diff: i32,
    pub group: Option<String>,
    pub form: Option<String>,
    pub all: StandingRecord,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct StandingRecord {
    pub played: i32,
    pub win: i32,
    pub draw: i32,
    pub lose: i32,
    pub goals: StandingGoals,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct StandingGoals {
    #[serde(rename = "for")]
    pub scored: i32,
    pub against: i32,
}
