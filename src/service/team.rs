use crate::models::fixture::{Fixture, FixtureFilter};
use crate::models::team::Team;
use crate::repository::Repository;
use crate::service::entity::{EntityService, Pagination};
use crate::service::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Reverse;
use uuid::Uuid;

pub const MAX_FIXTURE_WINDOW: u32 = 100;

/// Which of a team's fixtures to return.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FixtureWindow {
    pub season_id: Option<Uuid>,
    /// Most recent N already played.
    pub last: Option<u32>,
    /// Soonest N still to come.
    pub next: Option<u32>,
}

#[derive(Clone, Copy)]
pub struct TeamService {
    pub teams: EntityService<Team>,
    pub fixtures: EntityService<Fixture>,
}

impl TeamService {
    pub fn new(pagination: Pagination) -> Self {
        TeamService {
            teams: EntityService::new(pagination),
            fixtures: EntityService::new(pagination),
        }
    }

    pub async fn get_fixtures<S>(
        &self,
        session: &mut S,
        team_id: i64,
        window: FixtureWindow,
    ) -> ServiceResult<Vec<Fixture>>
    where
        S: Repository<Team> + Repository<Fixture>,
    {
        self.get_fixtures_at(session, team_id, window, Utc::now()).await
    }

    /// `get_fixtures` with an explicit notion of "now".
    pub async fn get_fixtures_at<S>(
        &self,
        session: &mut S,
        team_id: i64,
        window: FixtureWindow,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<Fixture>>
    where
        S: Repository<Team> + Repository<Fixture>,
    {
        check_window(&window)?;
        self.teams.fetch(session, &team_id).await?;
        let filter = FixtureFilter {
            team_id: Some(team_id),
            season_id: window.season_id,
            ..Default::default()
        };
        let mut fixtures = self.fixtures.find(session, &filter).await?;

        match (window.last, window.next) {
            (Some(last), None) => {
                fixtures.retain(|f| f.event_date.map_or(false, |date| date <= now));
                fixtures.sort_by_key(|f| Reverse(f.event_date));
                fixtures.truncate(last as usize);
            }
            (None, Some(next)) => {
                fixtures.retain(|f| f.event_date.map_or(false, |date| date > now));
                fixtures.sort_by_key(|f| f.event_date);
                fixtures.truncate(next as usize);
            }
            _ => {
                // Undated fixtures sort last.
                fixtures.sort_by_key(|f| (f.event_date.is_none(), Reverse(f.event_date)));
            }
        }
        Ok(fixtures)
    }
}

fn check_window(window: &FixtureWindow) -> ServiceResult<()> {
    if window.last.is_some() && window.next.is_some() {
        return Err(ServiceError::Validation(
            "last and next cannot be combined".to_string(),
        ));
    }
    for (name, value) in [("last", window.last), ("next", window.next)] {
        if let Some(n) = value {
            if n == 0 || n > MAX_FIXTURE_WINDOW {
                return Err(ServiceError::Validation(format!(
                    "{name} must be between 1 and {MAX_FIXTURE_WINDOW}, got {n}"
                )));
            }
        }
    }
    Ok(())
}
