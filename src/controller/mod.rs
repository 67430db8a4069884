pub mod crud;
pub mod error;
pub mod football;
pub mod handler;

#[cfg(test)]
mod tests {
    use crate::models::fixture::Fixture;
    use crate::models::league::{League, Season};
    use crate::models::response::{ErrorResponse, FixtureLiveView, SyncReport};
    use crate::repository::memory::MemoryStore;
    use crate::service::entity::Pagination;
    use crate::service::orchestrator::tests::StubSource;
    use crate::service::Services;
    use crate::AppState;
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn state_with(source: StubSource, pagination: Pagination) -> web::Data<AppState<MemoryStore>> {
        web::Data::new(AppState::new(
            MemoryStore::new(),
            Services::new(pagination),
            Arc::new(source),
        ))
    }

    fn state(offline: bool) -> web::Data<AppState<MemoryStore>> {
        let source = if offline {
            StubSource::offline()
        } else {
            StubSource::online()
        };
        state_with(source, Pagination::new(50))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .configure(super::handler::config::<MemoryStore>),
            )
            .await
        };
    }

    async fn body_json(resp: ServiceResponse) -> Value {
        test::read_body_json(resp).await
    }

    fn premier_league() -> Value {
        json!({
            "id": 39,
            "name": "Premier League",
            "country": "England",
            "country_code": "GB-ENG",
            "logo": null,
            "flag": null,
            "league_type": "League",
            "created_at": null,
            "updated_at": null
        })
    }

    #[actix_web::test]
    async fn league_crud_lifecycle() {
        let state = state(false);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/leagues")
            .set_json(premier_league())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::put()
            .uri("/api/v1/leagues/39")
            .set_json(json!({"name": "EPL"}))
            .to_request();
        let league: League = test::call_and_read_body_json(&app, req).await;
        assert_eq!(league.name, "EPL");
        assert_eq!(league.country.as_deref(), Some("England"));

        let req = test::TestRequest::get().uri("/api/v1/leagues?limit=10").to_request();
        let leagues: Vec<League> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(leagues.len(), 1);

        let req = test::TestRequest::delete().uri("/api/v1/leagues/39").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::delete().uri("/api/v1/leagues/39").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let error: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(error.status_code, 404);
    }

    #[actix_web::test]
    async fn duplicate_create_is_a_conflict() {
        let state = state(false);
        let app = app!(state);
        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let req = test::TestRequest::post()
                .uri("/api/v1/leagues")
                .set_json(premier_league())
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
        }
    }

    #[actix_web::test]
    async fn invalid_input_is_unprocessable() {
        let state = state(false);
        let app = app!(state);

        let mut league = premier_league();
        league["country_code"] = json!("england");
        let req = test::TestRequest::post()
            .uri("/api/v1/leagues")
            .set_json(league)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::get().uri("/api/v1/leagues?limit=0").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(resp).await;
        assert_eq!(body["status_code"], 422);

        let req = test::TestRequest::get().uri("/api/v1/leagues/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn seasons_of_missing_league_is_404() {
        let state = state(false);
        let app = app!(state);
        let req = test::TestRequest::get()
            .uri("/api/v1/leagues/999/seasons")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    /// Syncs league 39, its 2023 teams and fixtures, and returns the season id.
    macro_rules! seed {
        ($app:expr) => {{
            for uri in [
                "/api/v1/sync/leagues/39",
                "/api/v1/sync/leagues/39/seasons/2023/teams",
                "/api/v1/sync/leagues/39/seasons/2023/fixtures",
            ] {
                let req = test::TestRequest::post().uri(uri).to_request();
                let resp = test::call_service(&$app, req).await;
                assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            }
            let req = test::TestRequest::get()
                .uri("/api/v1/leagues/39/seasons")
                .to_request();
            let seasons: Vec<Season> = test::call_and_read_body_json(&$app, req).await;
            seasons
                .iter()
                .find(|season| season.year == 2023)
                .map(|season| season.id)
                .unwrap()
        }};
    }

    #[actix_web::test]
    async fn sync_then_read_through_the_api() {
        let state = state(false);
        let app = app!(state);

        for uri in [
            "/api/v1/sync/leagues/39",
            "/api/v1/sync/leagues/39/seasons/2023/teams",
            "/api/v1/sync/leagues/39/seasons/2023/fixtures",
            "/api/v1/sync/fixtures/1035037/events",
        ] {
            let req = test::TestRequest::post().uri(uri).to_request();
            let report: SyncReport = test::call_and_read_body_json(&app, req).await;
            assert!(report.created + report.updated > 0, "{uri} synced nothing");
        }

        let req = test::TestRequest::get()
            .uri("/api/v1/leagues/39/seasons")
            .to_request();
        let seasons: Vec<Season> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(seasons[0].year, 2023);

        let req = test::TestRequest::get()
            .uri("/api/v1/teams/44/fixtures?last=2")
            .to_request();
        let fixtures: Vec<Fixture> = test::call_and_read_body_json(&app, req).await;
        let ids: Vec<i64> = fixtures.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1035038, 1035037]);

        let req = test::TestRequest::get()
            .uri("/api/v1/fixtures/1035037/events")
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["id"], 1035037);
        assert_eq!(body["events"].as_array().map(Vec::len), Some(2));

        let req = test::TestRequest::get()
            .uri("/api/v1/matches/1035037/live")
            .to_request();
        let view: FixtureLiveView = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view.live.and_then(|l| l.elapsed), Some(90));

        let season_id = seasons[0].id;
        let req = test::TestRequest::post()
            .uri("/api/v1/standings/recompute")
            .set_json(json!({"league_id": 39, "season_id": season_id}))
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["rows"], 3);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/standings?league_id=39&season_id={season_id}"))
            .to_request();
        let table: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(table[0]["team_id"], 50);
    }

    #[actix_web::test]
    async fn fixture_update_checks_both_teams() {
        let state = state(false);
        let app = app!(state);
        seed!(app);

        let req = test::TestRequest::put()
            .uri("/api/v1/fixtures/1035037")
            .set_json(json!({"away_team_id": 999}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::put()
            .uri("/api/v1/fixtures/1035037")
            .set_json(json!({"attendance": 21684}))
            .to_request();
        let fixture: Fixture = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fixture.away_team_id, 50);
        assert_eq!(fixture.attendance, Some(21684));
    }

    #[actix_web::test]
    async fn referenced_league_cannot_be_deleted() {
        let state = state(false);
        let app = app!(state);
        seed!(app);
        let req = test::TestRequest::delete().uri("/api/v1/leagues/39").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::get().uri("/api/v1/leagues/39").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn filtered_standings_are_paged() {
        let state = state_with(StubSource::online(), Pagination::new(2));
        let app = app!(state);
        let season_id = seed!(app);
        let req = test::TestRequest::post()
            .uri("/api/v1/standings/recompute")
            .set_json(json!({"league_id": 39, "season_id": season_id}))
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["rows"], 3);

        let uri = format!("/api/v1/standings?league_id=39&season_id={season_id}");
        let req = test::TestRequest::get().uri(&uri).to_request();
        let table: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(table.len(), 2);
        assert_eq!(table[0]["rank"], 1);

        let req = test::TestRequest::get()
            .uri(&format!("{uri}&limit=1&offset=2"))
            .to_request();
        let table: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(table.len(), 1);
        assert_eq!(table[0]["rank"], 3);

        let req = test::TestRequest::get()
            .uri("/api/v1/standings?league_id=39&limit=0")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn failed_sync_leaves_no_partial_write() {
        let source = StubSource {
            duplicate_standings: true,
            ..StubSource::online()
        };
        let state = state_with(source, Pagination::new(50));
        let app = app!(state);
        let season_id = seed!(app);
        let req = test::TestRequest::post()
            .uri("/api/v1/standings/recompute")
            .set_json(json!({"league_id": 39, "season_id": season_id}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // The published table lists a new team, then one team twice.
        let req = test::TestRequest::post()
            .uri("/api/v1/sync/leagues/39/seasons/2023/standings")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/standings?league_id=39&season_id={season_id}"))
            .to_request();
        let table: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(table.len(), 3);
        let req = test::TestRequest::get().uri("/api/v1/teams/1359").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn fixture_listings_forward_their_filters() {
        let state = state(false);
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/v1/matches/today").to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["endpoint"], "/fixtures");
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(body["parameters"]["date"], today);

        let req = test::TestRequest::get()
            .uri("/api/v1/matches/date/2023-08-11")
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["parameters"]["date"], "2023-08-11");

        let req = test::TestRequest::get()
            .uri("/api/v1/matches/date/11-08-2023")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::get()
            .uri("/api/v1/matches/league/39?season=2023&from_date=2023-08-01&round_name=Regular%20Season%20-%201")
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["parameters"]["league"], "39");
        assert_eq!(body["parameters"]["season"], "2023");
        assert_eq!(body["parameters"]["from"], "2023-08-01");
        assert_eq!(body["parameters"]["round"], "Regular Season - 1");

        let req = test::TestRequest::get()
            .uri("/api/v1/matches/league/39")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::get()
            .uri("/api/v1/matches/team/33?last=5")
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["parameters"]["team"], "33");
        assert_eq!(body["parameters"]["last"], "5");
    }

    #[actix_web::test]
    async fn player_and_table_passthroughs() {
        let state = state(false);
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/v1/leagues/39/top-assists?season=2023")
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["endpoint"], "/players/topassists");

        let req = test::TestRequest::get()
            .uri("/api/v1/players/search?query=H")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::get()
            .uri("/api/v1/players/search?query=Haaland&league_id=39")
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["endpoint"], "/players");
        assert_eq!(body["parameters"]["search"], "Haaland");
        assert_eq!(body["parameters"]["league"], "39");

        let req = test::TestRequest::get()
            .uri("/api/v1/standings/league/39?season=2023&team_id=33")
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["endpoint"], "/standings");
        assert_eq!(body["parameters"]["team"], "33");
    }

    #[actix_web::test]
    async fn fixture_details_include_events() {
        let state = state(false);
        let app = app!(state);
        seed!(app);
        let req = test::TestRequest::post()
            .uri("/api/v1/sync/fixtures/1035037/events")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/v1/fixtures/1035037/details")
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["id"], 1035037);
        assert_eq!(body["events"][0]["minute"], 4);
    }

    #[actix_web::test]
    async fn provider_outage_maps_to_503() {
        let state = state(true);
        let app = app!(state);
        let req = test::TestRequest::get().uri("/api/v1/matches/live").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn provider_passthrough_forwards_parameters() {
        let state = state(false);
        let app = app!(state);
        let req = test::TestRequest::get()
            .uri("/api/v1/matches/h2h/33/34?last=5")
            .to_request();
        let body = body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["endpoint"], "/fixtures/headtohead");
        assert_eq!(body["parameters"]["h2h"], "33-34");
        assert_eq!(body["parameters"]["last"], "5");
    }

    #[actix_web::test]
    async fn standings_have_no_create_route() {
        let state = state(false);
        let app = app!(state);
        let req = test::TestRequest::post()
            .uri("/api/v1/standings")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
