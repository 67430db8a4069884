pub mod api_football;
pub mod cache;
pub mod error;
pub mod payload;
pub mod rate_limiter;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

pub use error::{ClientError, ClientResult};
use payload::{EventItem, FixtureItem, LeagueItem, StandingsItem, TeamItem};

/// Query parameters accepted by the `/fixtures` endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureQuery {
    pub id: Option<i64>,
    pub league: Option<i64>,
    pub season: Option<i32>,
    pub team: Option<i64>,
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub round: Option<String>,
    pub status: Option<String>,
    pub live: Option<String>,
    pub last: Option<u32>,
    pub next: Option<u32>,
}

impl FixtureQuery {
    pub fn by_id(id: i64) -> Self {
        FixtureQuery {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn live() -> Self {
        FixtureQuery {
            live: Some("all".to_string()),
            ..Default::default()
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(id) = self.id {
            params.push(("id", id.to_string()));
        }
        if let Some(league) = self.league {
            params.push(("league", league.to_string()));
        }
        if let Some(season) = self.season {
            params.push(("season", season.to_string()));
        }
        if let Some(team) = self.team {
            params.push(("team", team.to_string()));
        }
        if let Some(date) = self.date {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(from) = self.from {
            params.push(("from", from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.to {
            params.push(("to", to.format("%Y-%m-%d").to_string()));
        }
        if let Some(round) = &self.round {
            params.push(("round", round.clone()));
        }
        if let Some(status) = &self.status {
            params.push(("status", status.clone()));
        }
        if let Some(live) = &self.live {
            params.push(("live", live.clone()));
        }
        if let Some(last) = self.last {
            params.push(("last", last.to_string()));
        }
        if let Some(next) = self.next {
            params.push(("next", next.to_string()));
        }
        params
    }
}

/// Where the orchestrator gets provider data from.
///
/// `raw` is the only untyped call; the endpoints we do not persist are
/// passed through as JSON on top of it.
#[async_trait]
pub trait FootballDataSource: Send + Sync {
    async fn leagues(&self, league_id: i64, season: Option<i32>) -> ClientResult<Vec<LeagueItem>>;

    async fn teams(&self, league_id: i64, season: i32) -> ClientResult<Vec<TeamItem>>;

    async fn fixtures(&self, query: &FixtureQuery) -> ClientResult<Vec<FixtureItem>>;

    async fn fixture_events(&self, fixture_id: i64) -> ClientResult<Vec<EventItem>>;

    async fn standings(&self, league_id: i64, season: i32) -> ClientResult<Vec<StandingsItem>>;

    async fn raw(&self, endpoint: &str, params: Vec<(&'static str, String)>) -> ClientResult<Value>;

    /// Untyped `/fixtures` listing, for reads we serve without storing.
    async fn fixtures_json(&self, query: &FixtureQuery) -> ClientResult<Value> {
        self.raw("/fixtures", query.params()).await
    }

    async fn head_to_head(&self, team1: i64, team2: i64, last: Option<u32>) -> ClientResult<Value> {
        let mut params = vec![("h2h", format!("{team1}-{team2}"))];
        if let Some(last) = last {
            params.push(("last", last.to_string()));
        }
        self.raw("/fixtures/headtohead", params).await
    }

    async fn predictions(&self, fixture_id: i64) -> ClientResult<Value> {
        self.raw("/predictions", vec![("fixture", fixture_id.to_string())])
            .await
    }

    async fn team_statistics(&self, team_id: i64, league_id: i64, season: i32) -> ClientResult<Value> {
        self.raw(
            "/teams/statistics",
            vec![
                ("team", team_id.to_string()),
                ("league", league_id.to_string()),
                ("season", season.to_string()),
            ],
        )
        .await
    }

    async fn fixture_statistics(&self, fixture_id: i64) -> ClientResult<Value> {
        self.raw("/fixtures/statistics", vec![("fixture", fixture_id.to_string())])
            .await
    }

    async fn fixture_lineups(&self, fixture_id: i64) -> ClientResult<Value> {
        self.raw("/fixtures/lineups", vec![("fixture", fixture_id.to_string())])
            .await
    }

    async fn player(&self, player_id: i64, season: i32) -> ClientResult<Value> {
        self.raw(
            "/players",
            vec![("id", player_id.to_string()), ("season", season.to_string())],
        )
        .await
    }

    async fn top_scorers(&self, league_id: i64, season: i32) -> ClientResult<Value> {
        self.raw(
            "/players/topscorers",
            vec![("league", league_id.to_string()), ("season", season.to_string())],
        )
        .await
    }

    async fn top_assists(&self, league_id: i64, season: i32) -> ClientResult<Value> {
        self.raw(
            "/players/topassists",
            vec![("league", league_id.to_string()), ("season", season.to_string())],
        )
        .await
    }

    async fn search_players(
        &self,
        name: &str,
        league_id: Option<i64>,
        season: Option<i32>,
    ) -> ClientResult<Value> {
        let mut params = vec![("search", name.to_string())];
        if let Some(league_id) = league_id {
            params.push(("league", league_id.to_string()));
        }
        if let Some(season) = season {
            params.push(("season", season.to_string()));
        }
        self.raw("/players", params).await
    }

    /// The provider's own table, optionally narrowed to one team.
    async fn standings_json(&self, league_id: i64, season: i32, team_id: Option<i64>) -> ClientResult<Value> {
        let mut params = vec![("league", league_id.to_string()), ("season", season.to_string())];
        if let Some(team_id) = team_id {
            params.push(("team", team_id.to_string()));
        }
        self.raw("/standings", params).await
    }
}
