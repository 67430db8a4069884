use crate::controller::crud;
use crate::controller::football;
use crate::models::entity::Entity;
use crate::models::fixture::{Event, Fixture, Standing};
use crate::models::league::{League, Season};
use crate::models::team::{Player, PlayerTeamSeason, Team, Transfer};
use crate::repository::{Repository, Store};
use crate::service::ServiceError;
use actix_web::web;

/// List/create on `path`, read/update/delete on `path/{id}`.
fn crud_routes<S, E>(conf: &mut web::ServiceConfig, path: &str)
where
    S: Store,
    S::Session: Repository<E>,
    E: Entity,
{
    conf.service(
        web::resource(path)
            .route(web::get().to(crud::list::<S, E>))
            .route(web::post().to(crud::create::<S, E>)),
    )
    .service(
        web::resource(format!("{path}/{{id}}"))
            .route(web::get().to(crud::get::<S, E>))
            .route(web::put().to(crud::update::<S, E>))
            .route(web::delete().to(crud::delete::<S, E>)),
    );
}

fn extractor_errors(conf: &mut web::ServiceConfig) {
    conf.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| ServiceError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| ServiceError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _| ServiceError::Validation(err.to_string()).into()),
    );
}

fn football_routes<S: Store>(conf: &mut web::ServiceConfig) {
    conf.route("/leagues/{id}/seasons", web::get().to(football::league_seasons::<S>))
        .route("/leagues/{id}/top-scorers", web::get().to(football::top_scorers::<S>))
        .route("/leagues/{id}/top-assists", web::get().to(football::top_assists::<S>))
        .route("/teams/{id}/fixtures", web::get().to(football::team_fixtures::<S>))
        .route("/teams/{id}/statistics", web::get().to(football::team_statistics::<S>))
        .route("/players/search", web::get().to(football::search_players::<S>))
        .route(
            "/players/{id}/current-team",
            web::get().to(football::player_current_team::<S>),
        )
        .route(
            "/players/{id}/statistics",
            web::get().to(football::player_statistics::<S>),
        )
        .route("/fixtures/{id}/events", web::get().to(football::fixture_events::<S>))
        .route("/fixtures/{id}/details", web::get().to(football::fixture_events::<S>))
        .route("/matches/live", web::get().to(football::live_matches::<S>))
        .route("/matches/today", web::get().to(football::matches_today::<S>))
        .route("/matches/date/{date}", web::get().to(football::matches_on_date::<S>))
        .route("/matches/league/{id}", web::get().to(football::league_matches::<S>))
        .route("/matches/team/{id}", web::get().to(football::team_matches::<S>))
        .route(
            "/matches/h2h/{team1}/{team2}",
            web::get().to(football::head_to_head::<S>),
        )
        .route("/matches/{id}/live", web::get().to(football::match_live::<S>))
        .route(
            "/matches/{id}/statistics",
            web::get().to(football::match_statistics::<S>),
        )
        .route("/matches/{id}/lineups", web::get().to(football::match_lineups::<S>))
        .route("/predictions/{id}", web::get().to(football::predictions::<S>))
        .route(
            "/standings/league/{id}",
            web::get().to(football::provider_standings::<S>),
        );
}

fn sync_routes<S: Store>(conf: &mut web::ServiceConfig) {
    conf.route("/sync/leagues/{id}", web::post().to(football::sync_league::<S>))
        .route(
            "/sync/leagues/{id}/seasons/{year}/teams",
            web::post().to(football::sync_teams::<S>),
        )
        .route(
            "/sync/leagues/{id}/seasons/{year}/fixtures",
            web::post().to(football::sync_fixtures::<S>),
        )
        .route(
            "/sync/leagues/{id}/seasons/{year}/standings",
            web::post().to(football::sync_standings::<S>),
        )
        .route(
            "/sync/fixtures/{id}/events",
            web::post().to(football::sync_fixture_events::<S>),
        )
        .route(
            "/standings/recompute",
            web::post().to(football::recompute_standings::<S>),
        );
}

pub fn config<S: Store>(conf: &mut web::ServiceConfig) {
    let scope = web::scope("/api/v1")
        .configure(extractor_errors)
        // Literal paths go first so they are not captured by `{id}` resources.
        .configure(sync_routes::<S>)
        .configure(football_routes::<S>)
        .configure(|conf| {
            crud_routes::<S, League>(conf, "/leagues");
            crud_routes::<S, Season>(conf, "/seasons");
            crud_routes::<S, Team>(conf, "/teams");
            crud_routes::<S, Player>(conf, "/players");
            crud_routes::<S, PlayerTeamSeason>(conf, "/player-team-seasons");
            crud_routes::<S, Event>(conf, "/events");
            crud_routes::<S, Transfer>(conf, "/transfers");
        })
        .service(
            web::resource("/fixtures")
                .route(web::get().to(crud::list::<S, Fixture>))
                .route(web::post().to(football::create_fixture::<S>)),
        )
        .service(
            web::resource("/fixtures/{id}")
                .route(web::get().to(crud::get::<S, Fixture>))
                .route(web::put().to(football::update_fixture::<S>))
                .route(web::delete().to(crud::delete::<S, Fixture>)),
        )
        .route("/standings", web::get().to(football::list_standings::<S>))
        .route("/standings/{id}", web::get().to(crud::get::<S, Standing>));

    conf.service(scope);
}
