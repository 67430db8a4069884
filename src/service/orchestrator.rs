use crate::client::payload::{EventItem, FixtureItem, LeagueItem, StandingRow, StandingsItem, TeamItem};
use crate::client::{FixtureQuery, FootballDataSource};
use crate::models::fixture::{
    winner_code, Event, EventFilter, Fixture, Standing, StandingFilter, FINISHED_STATUSES,
    WINNER_AWAY, WINNER_HOME,
};
use crate::models::league::{League, Season, SeasonFilter};
use crate::models::response::{FixtureLiveView, LiveStatus, SyncReport};
use crate::models::team::Team;
use crate::repository::{finish, FootballRepositories, StandingsRoutine, Store};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::Services;
use chrono::NaiveDate;
use log::{info, warn};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Combines local storage with the provider: composite reads and ingestion.
#[derive(Clone)]
pub struct Orchestrator {
    source: Arc<dyn FootballDataSource>,
    services: Services,
}

impl From<&FixtureItem> for LiveStatus {
    fn from(item: &FixtureItem) -> Self {
        LiveStatus {
            status: item.fixture.status.short.clone(),
            status_long: item.fixture.status.long.clone(),
            elapsed: item.fixture.status.elapsed,
            home_score: item.goals.home,
            away_score: item.goals.away,
        }
    }
}

/// Winner code from the provider's per-side winner flags, falling back to the score.
fn derive_winner(item: &FixtureItem) -> Option<i32> {
    let status = item.fixture.status.short.as_deref()?;
    if !FINISHED_STATUSES.contains(&status) {
        return None;
    }
    match (item.teams.home.winner, item.teams.away.winner) {
        (Some(true), _) => Some(WINNER_HOME),
        (_, Some(true)) => Some(WINNER_AWAY),
        _ => match (item.goals.home, item.goals.away) {
            (Some(home), Some(away)) => Some(winner_code(home, away)),
            _ => None,
        },
    }
}

fn fixture_from_item(item: &FixtureItem, season_id: Uuid) -> Fixture {
    Fixture {
        id: item.fixture.id,
        league_id: Some(item.league.id),
        season_id: Some(season_id),
        group_name: None,
        round_name: item.league.round.clone(),
        referee: item.fixture.referee.clone(),
        event_date: item.fixture.date,
        status: item.fixture.status.short.clone(),
        home_team_id: item.teams.home.id,
        away_team_id: item.teams.away.id,
        home_score: item.goals.home,
        away_score: item.goals.away,
        winner: derive_winner(item),
        attendance: None,
        created_at: None,
        updated_at: None,
    }
}

fn standing_from_row(
    row: &StandingRow,
    league_id: i64,
    season_id: Uuid,
    group_name: Option<String>,
) -> ServiceResult<Standing> {
    let team_id = row
        .team
        .id
        .ok_or_else(|| ServiceError::BadResponse("standing row without a team id".to_string()))?;
    Ok(Standing {
        id: Uuid::new_v4(),
        league_id,
        season_id,
        group_name,
        team_id,
        rank: Some(row.rank),
        played: row.all.played,
        wins: row.all.win,
        draws: row.all.draw,
        losses: row.all.lose,
        points: row.points,
        goals_for: row.all.goals.scored,
        goals_against: row.all.goals.against,
        goal_diff: row.all.goals.scored - row.all.goals.against,
        form: row.form.clone(),
        stale: false,
        updated_at: None,
    })
}

impl Orchestrator {
    pub fn new(source: Arc<dyn FootballDataSource>, services: Services) -> Self {
        Orchestrator { source, services }
    }

    /// The stored fixture plus what the provider reports right now.
    ///
    /// The stored row is read in its own short session; the provider is asked
    /// after it has been released. A provider failure degrades to
    /// `live: None` instead of failing the read.
    pub async fn fixture_with_live_status<St: Store>(
        &self,
        store: &St,
        fixture_id: i64,
    ) -> ServiceResult<FixtureLiveView> {
        let fixture = self.stored_fixture(store, fixture_id).await?;
        let live = match self.source.fixtures(&FixtureQuery::by_id(fixture_id)).await {
            Ok(items) => items.first().map(LiveStatus::from),
            Err(err) => {
                warn!(
                    "Live status for fixture {} unavailable, serving stored data: {}",
                    fixture_id, err
                );
                None
            }
        };
        Ok(FixtureLiveView { fixture, live })
    }

    pub async fn live_matches(&self) -> ServiceResult<Value> {
        Ok(self.source.fixtures_json(&FixtureQuery::live()).await?)
    }

    /// Provider fixtures for one calendar day.
    pub async fn matches_on(&self, date: NaiveDate) -> ServiceResult<Value> {
        let query = FixtureQuery {
            date: Some(date),
            ..Default::default()
        };
        Ok(self.source.fixtures_json(&query).await?)
    }

    /// Any `/fixtures` listing; the caller decides which filters are set.
    pub async fn matches(&self, query: &FixtureQuery) -> ServiceResult<Value> {
        Ok(self.source.fixtures_json(query).await?)
    }

    pub async fn head_to_head(&self, team1: i64, team2: i64, last: Option<u32>) -> ServiceResult<Value> {
        Ok(self.source.head_to_head(team1, team2, last).await?)
    }

    pub async fn predictions(&self, fixture_id: i64) -> ServiceResult<Value> {
        Ok(self.source.predictions(fixture_id).await?)
    }

    pub async fn team_statistics(&self, team_id: i64, league_id: i64, season: i32) -> ServiceResult<Value> {
        Ok(self.source.team_statistics(team_id, league_id, season).await?)
    }

    pub async fn fixture_statistics(&self, fixture_id: i64) -> ServiceResult<Value> {
        Ok(self.source.fixture_statistics(fixture_id).await?)
    }

    pub async fn fixture_lineups(&self, fixture_id: i64) -> ServiceResult<Value> {
        Ok(self.source.fixture_lineups(fixture_id).await?)
    }

    pub async fn player(&self, player_id: i64, season: i32) -> ServiceResult<Value> {
        Ok(self.source.player(player_id, season).await?)
    }

    pub async fn top_scorers(&self, league_id: i64, season: i32) -> ServiceResult<Value> {
        Ok(self.source.top_scorers(league_id, season).await?)
    }

    pub async fn top_assists(&self, league_id: i64, season: i32) -> ServiceResult<Value> {
        Ok(self.source.top_assists(league_id, season).await?)
    }

    pub async fn search_players(
        &self,
        name: &str,
        league_id: Option<i64>,
        season: Option<i32>,
    ) -> ServiceResult<Value> {
        Ok(self.source.search_players(name, league_id, season).await?)
    }

    pub async fn provider_standings(
        &self,
        league_id: i64,
        season: i32,
        team_id: Option<i64>,
    ) -> ServiceResult<Value> {
        Ok(self.source.standings_json(league_id, season, team_id).await?)
    }

    /// Upserts the league and every season the provider lists for it.
    pub async fn sync_league<St: Store>(
        &self,
        store: &St,
        league_id: i64,
        season: Option<i32>,
    ) -> ServiceResult<SyncReport> {
        let items = self.source.leagues(league_id, season).await?;
        let item = items.into_iter().next().ok_or_else(|| {
            ServiceError::NotFound(format!("API-Football has no league {league_id}"))
        })?;

        let mut session = store.begin().await?;
        let result = self.store_league(&mut session, item).await;
        let report = finish(session, result).await?;
        info!(
            "Synced league {}: {} created, {} updated",
            league_id, report.created, report.updated
        );
        Ok(report)
    }

    pub async fn sync_teams<St: Store>(
        &self,
        store: &St,
        league_id: i64,
        season: i32,
    ) -> ServiceResult<SyncReport> {
        let items = self.source.teams(league_id, season).await?;

        let mut session = store.begin().await?;
        let result = self.store_teams(&mut session, items).await;
        let report = finish(session, result).await?;
        info!(
            "Synced teams of league {} season {}: {} created, {} updated",
            league_id, season, report.created, report.updated
        );
        Ok(report)
    }

    /// Upserts the season's fixtures, creating the season and any unseen team on the way.
    pub async fn sync_fixtures<St: Store>(
        &self,
        store: &St,
        league_id: i64,
        season: i32,
    ) -> ServiceResult<SyncReport> {
        self.stored_league(store, league_id).await?;
        let query = FixtureQuery {
            league: Some(league_id),
            season: Some(season),
            ..Default::default()
        };
        let items = self.source.fixtures(&query).await?;

        let mut session = store.begin().await?;
        let result = self
            .store_fixtures(&mut session, league_id, season, &items)
            .await;
        let report = finish(session, result).await?;
        info!(
            "Synced fixtures of league {} season {}: {} created, {} updated",
            league_id, season, report.created, report.updated
        );
        Ok(report)
    }

    /// Replaces the stored events of a fixture with the provider's timeline.
    pub async fn sync_fixture_events<St: Store>(
        &self,
        store: &St,
        fixture_id: i64,
    ) -> ServiceResult<SyncReport> {
        self.stored_fixture(store, fixture_id).await?;
        let items = self.source.fixture_events(fixture_id).await?;

        let mut session = store.begin().await?;
        let result = self.store_events(&mut session, fixture_id, items).await;
        let report = finish(session, result).await?;
        info!(
            "Synced events of fixture {}: {} replaced by {}",
            fixture_id, report.deleted, report.created
        );
        Ok(report)
    }

    /// Replaces the (league, season) table with the one the provider publishes.
    pub async fn sync_standings<St: Store>(
        &self,
        store: &St,
        league_id: i64,
        season: i32,
    ) -> ServiceResult<SyncReport> {
        self.stored_league(store, league_id).await?;
        let items = self.source.standings(league_id, season).await?;

        let mut session = store.begin().await?;
        let result = self
            .store_standings(&mut session, league_id, season, &items)
            .await;
        let report = finish(session, result).await?;
        info!(
            "Synced standings of league {} season {}: {} rows",
            league_id, season, report.created
        );
        Ok(report)
    }

    /// Regenerates the table from stored fixtures through the standings routine.
    pub async fn recompute_standings<St: Store>(
        &self,
        store: &St,
        league_id: i64,
        season_id: Uuid,
        group_name: Option<String>,
    ) -> ServiceResult<usize> {
        let mut session = store.begin().await?;
        let result = self
            .recompute_in(&mut session, league_id, season_id, group_name)
            .await;
        finish(session, result).await
    }

    async fn stored_fixture<St: Store>(&self, store: &St, fixture_id: i64) -> ServiceResult<Fixture> {
        let mut session = store.begin().await?;
        let result = self.services.fixtures.fixtures.fetch(&mut session, &fixture_id).await;
        finish(session, result).await
    }

    async fn stored_league<St: Store>(&self, store: &St, league_id: i64) -> ServiceResult<League> {
        let mut session = store.begin().await?;
        let result = self.services.leagues.leagues.fetch(&mut session, &league_id).await;
        finish(session, result).await
    }

    async fn store_league<S: FootballRepositories>(
        &self,
        session: &mut S,
        item: LeagueItem,
    ) -> ServiceResult<SyncReport> {
        let mut report = SyncReport::new("league");
        let league = League {
            id: item.league.id,
            name: item.league.name,
            country: item.country.name,
            country_code: item.country.code,
            logo: item.league.logo,
            flag: item.country.flag,
            league_type: item.league.league_type,
            created_at: None,
            updated_at: None,
        };
        let (_, created) = self.services.leagues.leagues.upsert(session, league).await?;
        count(&mut report, created);

        for info in item.seasons {
            let filter = SeasonFilter {
                league_id: Some(item.league.id),
                year: Some(info.year),
            };
            let season = Season {
                id: Uuid::new_v4(),
                league_id: item.league.id,
                year: info.year,
                start_date: info.start,
                end_date: info.end,
                is_current: info.current,
                created_at: None,
                updated_at: None,
            };
            let (_, created) = self
                .services
                .leagues
                .seasons
                .upsert_by(session, &filter, season)
                .await?;
            count(&mut report, created);
        }
        Ok(report)
    }

    async fn store_teams<S: FootballRepositories>(
        &self,
        session: &mut S,
        items: Vec<TeamItem>,
    ) -> ServiceResult<SyncReport> {
        let mut report = SyncReport::new("team");
        for item in items {
            let team = Team {
                id: item.team.id,
                name: item.team.name,
                short_code: item.team.code,
                country: item.team.country,
                founded: item.team.founded,
                national: item.team.national,
                logo: item.team.logo,
                created_at: None,
                updated_at: None,
            };
            let (_, created) = self.services.teams.teams.upsert(session, team).await?;
            count(&mut report, created);
        }
        Ok(report)
    }

    async fn store_fixtures<S: FootballRepositories>(
        &self,
        session: &mut S,
        league_id: i64,
        season: i32,
        items: &[FixtureItem],
    ) -> ServiceResult<SyncReport> {
        let season_row = self
            .services
            .leagues
            .ensure_season(session, league_id, season)
            .await?;
        let mut report = SyncReport::new("fixture");
        for item in items {
            self.ensure_team(session, item.teams.home.id, item.teams.home.name.as_deref())
                .await?;
            self.ensure_team(session, item.teams.away.id, item.teams.away.name.as_deref())
                .await?;
            let fixture = fixture_from_item(item, season_row.id);
            let (_, created) = self.services.fixtures.fixtures.upsert(session, fixture).await?;
            count(&mut report, created);
        }
        Ok(report)
    }

    async fn store_events<S: FootballRepositories>(
        &self,
        session: &mut S,
        fixture_id: i64,
        items: Vec<EventItem>,
    ) -> ServiceResult<SyncReport> {
        let events: Vec<Event> = items
            .into_iter()
            .map(|item| Event {
                id: Uuid::new_v4(),
                fixture_id,
                team_id: item.team.and_then(|team| team.id),
                player_id: item.player.and_then(|player| player.id),
                assist_id: item.assist.and_then(|assist| assist.id),
                event_type: item.event_type,
                detail: item.detail,
                minute: item.time.elapsed,
                extra_minute: item.time.extra,
                created_at: None,
            })
            .collect();

        let events_service = self.services.fixtures.events;
        let mut report = SyncReport::new("event");
        report.deleted = events_service
            .delete_where(
                session,
                &EventFilter {
                    fixture_id: Some(fixture_id),
                },
            )
            .await?;
        report.created = events_service.add_many(session, events).await?.len();
        Ok(report)
    }

    async fn store_standings<S: FootballRepositories>(
        &self,
        session: &mut S,
        league_id: i64,
        season: i32,
        items: &[StandingsItem],
    ) -> ServiceResult<SyncReport> {
        let season_row = self
            .services
            .leagues
            .ensure_season(session, league_id, season)
            .await?;
        let mut rows = Vec::new();
        for item in items {
            let grouped = item.league.standings.len() > 1;
            for table in &item.league.standings {
                for row in table {
                    let group = if grouped { row.group.clone() } else { None };
                    let team_name = row.team.name.as_deref();
                    let standing = standing_from_row(row, league_id, season_row.id, group)?;
                    self.ensure_team(session, standing.team_id, team_name).await?;
                    rows.push(standing);
                }
            }
        }

        let standings = self.services.standings;
        let mut report = SyncReport::new("standing");
        report.deleted = standings
            .delete_where(
                session,
                &StandingFilter {
                    league_id: Some(league_id),
                    season_id: Some(season_row.id),
                    team_id: None,
                },
            )
            .await?;
        report.created = standings.add_many(session, rows).await?.len();
        Ok(report)
    }

    async fn recompute_in<S: FootballRepositories>(
        &self,
        session: &mut S,
        league_id: i64,
        season_id: Uuid,
        group_name: Option<String>,
    ) -> ServiceResult<usize> {
        let season = self.services.leagues.seasons.fetch(session, &season_id).await?;
        if season.league_id != league_id {
            return Err(ServiceError::Validation(format!(
                "season {season_id} does not belong to league {league_id}"
            )));
        }
        let rows = StandingsRoutine::recompute_standings(session, league_id, season_id, group_name)
            .await?;
        info!(
            "Recomputed standings of league {} season {}: {} rows",
            league_id, season.year, rows
        );
        Ok(rows)
    }

    /// Creates a placeholder team for ids the provider references before we synced them.
    async fn ensure_team<S: FootballRepositories>(
        &self,
        session: &mut S,
        team_id: i64,
        name: Option<&str>,
    ) -> ServiceResult<()> {
        let teams = self.services.teams.teams;
        if teams.get(session, &team_id).await?.is_some() {
            return Ok(());
        }
        let team = Team {
            id: team_id,
            name: name.map_or_else(|| format!("Team {team_id}"), str::to_string),
            short_code: None,
            country: None,
            founded: None,
            national: false,
            logo: None,
            created_at: None,
            updated_at: None,
        };
        teams.create(session, team).await?;
        Ok(())
    }
}

fn count(report: &mut SyncReport, created: bool) {
    if created {
        report.created += 1;
    } else {
        report.updated += 1;
    }
}
