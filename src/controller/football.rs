use crate::client::FixtureQuery;
use crate::models::fixture::{Fixture, FixturePatch, Standing, StandingFilter};
use crate::repository::{finish, Store};
use crate::service::team::FixtureWindow;
use crate::service::ServiceError;
use crate::AppState;
use actix_web::web::{Data, Json, Path, Query};
use actix_web::HttpResponse;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Shortest name `/players/search` accepts.
const MIN_SEARCH_LENGTH: usize = 2;

#[derive(Debug, Deserialize)]
pub struct StandingParams {
    pub league_id: Option<i64>,
    pub season_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SeasonParam {
    pub season: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct LeagueSeasonParams {
    pub league: i64,
    pub season: i32,
}

#[derive(Debug, Deserialize)]
pub struct LastParam {
    pub last: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LeagueFixtureParams {
    pub season: Option<i32>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub round_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TeamMatchParams {
    pub season: Option<i32>,
    pub last: Option<u32>,
    pub next: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerSearchParams {
    pub query: String,
    pub league_id: Option<i64>,
    pub season: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderStandingParams {
    pub season: Option<i32>,
    pub team_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RecomputeRequest {
    pub league_id: i64,
    pub season_id: Uuid,
    pub group_name: Option<String>,
}

pub async fn create_fixture<S: Store>(
    data: Data<AppState<S>>,
    body: Json<Fixture>,
) -> Result<HttpResponse, ServiceError> {
    let mut session = data.store.begin().await?;
    let result = data
        .services
        .fixtures
        .create(&mut session, body.into_inner())
        .await;
    let fixture = finish(session, result).await?;
    Ok(HttpResponse::Created().json(fixture))
}

pub async fn update_fixture<S: Store>(
    data: Data<AppState<S>>,
    fixture_id: Path<i64>,
    patch: Json<FixturePatch>,
) -> Result<HttpResponse, ServiceError> {
    let mut session = data.store.begin().await?;
    let result = data
        .services
        .fixtures
        .update(&mut session, fixture_id.into_inner(), &patch)
        .await;
    let fixture = finish(session, result).await?;
    Ok(HttpResponse::Ok().json(fixture))
}

pub async fn list_standings<S: Store>(
    data: Data<AppState<S>>,
    params: Query<StandingParams>,
) -> Result<HttpResponse, ServiceError> {
    let standings = data.services.standings;
    let mut session = data.store.begin().await?;
    let result = if params.league_id.is_some() || params.season_id.is_some() {
        let filter = StandingFilter {
            league_id: params.league_id,
            season_id: params.season_id,
            team_id: None,
        };
        match standings.find(&mut session, &filter).await {
            Ok(mut rows) => {
                rows.sort_by_key(|row: &Standing| (row.group_name.clone(), row.rank));
                data.services
                    .pagination
                    .slice(rows, params.limit, params.offset)
            }
            Err(err) => Err(err),
        }
    } else {
        standings.list(&mut session, params.limit, params.offset).await
    };
    let rows = finish(session, result).await?;
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn league_seasons<S: Store>(
    data: Data<AppState<S>>,
    league_id: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let mut session = data.store.begin().await?;
    let result = data
        .services
        .leagues
        .get_seasons(&mut session, league_id.into_inner())
        .await;
    let seasons = finish(session, result).await?;
    Ok(HttpResponse::Ok().json(seasons))
}

pub async fn team_fixtures<S: Store>(
    data: Data<AppState<S>>,
    team_id: Path<i64>,
    window: Query<FixtureWindow>,
) -> Result<HttpResponse, ServiceError> {
    let mut session = data.store.begin().await?;
    let result = data
        .services
        .teams
        .get_fixtures(&mut session, team_id.into_inner(), window.into_inner())
        .await;
    let fixtures = finish(session, result).await?;
    Ok(HttpResponse::Ok().json(fixtures))
}

pub async fn player_current_team<S: Store>(
    data: Data<AppState<S>>,
    player_id: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let mut session = data.store.begin().await?;
    let result = data
        .services
        .players
        .get_current_team(&mut session, player_id.into_inner())
        .await;
    let team = finish(session, result).await?;
    Ok(HttpResponse::Ok().json(team))
}

pub async fn fixture_events<S: Store>(
    data: Data<AppState<S>>,
    fixture_id: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let mut session = data.store.begin().await?;
    let result = data
        .services
        .fixtures
        .with_events(&mut session, fixture_id.into_inner())
        .await;
    let view = finish(session, result).await?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn match_live<S: Store>(
    data: Data<AppState<S>>,
    fixture_id: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let view = data
        .orchestrator
        .fixture_with_live_status(&data.store, fixture_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn live_matches<S: Store>(data: Data<AppState<S>>) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(data.orchestrator.live_matches().await?))
}

pub async fn matches_today<S: Store>(data: Data<AppState<S>>) -> Result<HttpResponse, ServiceError> {
    let body = data.orchestrator.matches_on(Utc::now().date_naive()).await?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn matches_on_date<S: Store>(
    data: Data<AppState<S>>,
    date: Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|err| ServiceError::Validation(format!("date must be YYYY-MM-DD: {err}")))?;
    let body = data.orchestrator.matches_on(date).await?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn league_matches<S: Store>(
    data: Data<AppState<S>>,
    league_id: Path<i64>,
    params: Query<LeagueFixtureParams>,
) -> Result<HttpResponse, ServiceError> {
    let params = params.into_inner();
    let query = FixtureQuery {
        league: Some(league_id.into_inner()),
        season: Some(required_season(params.season)?),
        from: params.from_date,
        to: params.to_date,
        round: params.round_name,
        ..Default::default()
    };
    Ok(HttpResponse::Ok().json(data.orchestrator.matches(&query).await?))
}

pub async fn team_matches<S: Store>(
    data: Data<AppState<S>>,
    team_id: Path<i64>,
    params: Query<TeamMatchParams>,
) -> Result<HttpResponse, ServiceError> {
    if params.last.is_some() && params.next.is_some() {
        return Err(ServiceError::Validation(
            "last and next cannot be combined".to_string(),
        ));
    }
    let query = FixtureQuery {
        team: Some(team_id.into_inner()),
        season: params.season,
        last: params.last,
        next: params.next,
        ..Default::default()
    };
    Ok(HttpResponse::Ok().json(data.orchestrator.matches(&query).await?))
}

pub async fn head_to_head<S: Store>(
    data: Data<AppState<S>>,
    teams: Path<(i64, i64)>,
    params: Query<LastParam>,
) -> Result<HttpResponse, ServiceError> {
    let (team1, team2) = teams.into_inner();
    let body = data
        .orchestrator
        .head_to_head(team1, team2, params.last)
        .await?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn predictions<S: Store>(
    data: Data<AppState<S>>,
    fixture_id: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let body = data.orchestrator.predictions(fixture_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn match_statistics<S: Store>(
    data: Data<AppState<S>>,
    fixture_id: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let body = data
        .orchestrator
        .fixture_statistics(fixture_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn match_lineups<S: Store>(
    data: Data<AppState<S>>,
    fixture_id: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let body = data
        .orchestrator
        .fixture_lineups(fixture_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn team_statistics<S: Store>(
    data: Data<AppState<S>>,
    team_id: Path<i64>,
    params: Query<LeagueSeasonParams>,
) -> Result<HttpResponse, ServiceError> {
    let body = data
        .orchestrator
        .team_statistics(team_id.into_inner(), params.league, params.season)
        .await?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn player_statistics<S: Store>(
    data: Data<AppState<S>>,
    player_id: Path<i64>,
    params: Query<SeasonParam>,
) -> Result<HttpResponse, ServiceError> {
    let season = required_season(params.season)?;
    let body = data
        .orchestrator
        .player(player_id.into_inner(), season)
        .await?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn top_scorers<S: Store>(
    data: Data<AppState<S>>,
    league_id: Path<i64>,
    params: Query<SeasonParam>,
) -> Result<HttpResponse, ServiceError> {
    let season = required_season(params.season)?;
    let body = data
        .orchestrator
        .top_scorers(league_id.into_inner(), season)
        .await?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn top_assists<S: Store>(
    data: Data<AppState<S>>,
    league_id: Path<i64>,
    params: Query<SeasonParam>,
) -> Result<HttpResponse, ServiceError> {
    let season = required_season(params.season)?;
    let body = data
        .orchestrator
        .top_assists(league_id.into_inner(), season)
        .await?;
    Ok(HttpResponse::Ok().json(body))
}

pub async fn search_players<S: Store>(
    data: Data<AppState<S>>,
    params: Query<PlayerSearchParams>,
) -> Result<HttpResponse, ServiceError> {
    let name = params.query.trim();
    if name.chars().count() < MIN_SEARCH_LENGTH {
        return Err(ServiceError::Validation(format!(
            "query must be at least {MIN_SEARCH_LENGTH} characters"
        )));
    }
    let body = data
        .orchestrator
        .search_players(name, params.league_id, params.season)
        .await?;
    Ok(HttpResponse::Ok().json(body))
}

/// The provider's table as published, without touching stored standings.
pub async fn provider_standings<S: Store>(
    data: Data<AppState<S>>,
    league_id: Path<i64>,
    params: Query<ProviderStandingParams>,
) -> Result<HttpResponse, ServiceError> {
    let season = required_season(params.season)?;
    let body = data
        .orchestrator
        .provider_standings(league_id.into_inner(), season, params.team_id)
        .await?;
    Ok(HttpResponse::Ok().json(body))
}

fn required_season(season: Option<i32>) -> Result<i32, ServiceError> {
    season.ok_or_else(|| ServiceError::Validation("season is required".to_string()))
}

pub async fn sync_league<S: Store>(
    data: Data<AppState<S>>,
    league_id: Path<i64>,
    params: Query<SeasonParam>,
) -> Result<HttpResponse, ServiceError> {
    let report = data
        .orchestrator
        .sync_league(&data.store, league_id.into_inner(), params.season)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

pub async fn sync_teams<S: Store>(
    data: Data<AppState<S>>,
    path: Path<(i64, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (league_id, season) = path.into_inner();
    let report = data
        .orchestrator
        .sync_teams(&data.store, league_id, season)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

pub async fn sync_fixtures<S: Store>(
    data: Data<AppState<S>>,
    path: Path<(i64, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (league_id, season) = path.into_inner();
    let report = data
        .orchestrator
        .sync_fixtures(&data.store, league_id, season)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

pub async fn sync_fixture_events<S: Store>(
    data: Data<AppState<S>>,
    fixture_id: Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let report = data
        .orchestrator
        .sync_fixture_events(&data.store, fixture_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

pub async fn sync_standings<S: Store>(
    data: Data<AppState<S>>,
    path: Path<(i64, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (league_id, season) = path.into_inner();
    let report = data
        .orchestrator
        .sync_standings(&data.store, league_id, season)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

pub async fn recompute_standings<S: Store>(
    data: Data<AppState<S>>,
    body: Json<RecomputeRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = body.into_inner();
    let rows = data
        .orchestrator
        .recompute_standings(
            &data.store,
            request.league_id,
            request.season_id,
            request.group_name,
        )
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "rows": rows })))
}
