use crate::models::entity::merge_patch;
use crate::models::fixture::{Event, EventFilter, Fixture, FixturePatch};
use crate::models::response::FixtureWithEvents;
use crate::models::team::Team;
use crate::repository::Repository;
use crate::service::entity::{EntityService, Pagination};
use crate::service::error::{ServiceError, ServiceResult};

#[derive(Clone, Copy)]
pub struct FixtureService {
    pub fixtures: EntityService<Fixture>,
    pub events: EntityService<Event>,
    teams: EntityService<Team>,
}

impl FixtureService {
    pub fn new(pagination: Pagination) -> Self {
        FixtureService {
            fixtures: EntityService::new(pagination),
            events: EntityService::new(pagination),
            teams: EntityService::new(pagination),
        }
    }

    /// Creates a fixture after checking that both teams exist.
    pub async fn create<S>(&self, session: &mut S, fixture: Fixture) -> ServiceResult<Fixture>
    where
        S: Repository<Fixture> + Repository<Team>,
    {
        self.require_teams(session, &fixture).await?;
        self.fixtures.create(session, fixture).await
    }

    /// Applies `patch` under the same team checks as `create`.
    pub async fn update<S>(&self, session: &mut S, id: i64, patch: &FixturePatch) -> ServiceResult<Fixture>
    where
        S: Repository<Fixture> + Repository<Team>,
    {
        let current = self.fixtures.fetch(session, &id).await?;
        let merged = merge_patch(&current, patch)
            .map_err(|err| ServiceError::Validation(err.to_string()))?;
        self.require_teams(session, &merged).await?;
        self.fixtures.update(session, &id, patch).await
    }

    async fn require_teams<S: Repository<Team>>(&self, session: &mut S, fixture: &Fixture) -> ServiceResult<()> {
        for team_id in [fixture.home_team_id, fixture.away_team_id] {
            if self.teams.get(session, &team_id).await?.is_none() {
                return Err(ServiceError::Validation(format!(
                    "team {team_id} does not exist"
                )));
            }
        }
        Ok(())
    }

    /// The fixture and its events in match order.
    pub async fn with_events<S>(&self, session: &mut S, fixture_id: i64) -> ServiceResult<FixtureWithEvents>
    where
        S: Repository<Fixture> + Repository<Event>,
    {
        let fixture = self.fixtures.fetch(session, &fixture_id).await?;
        let filter = EventFilter {
            fixture_id: Some(fixture_id),
        };
        let mut events = self.events.find(session, &filter).await?;
        events.sort_by_key(Event::timeline_key);
        Ok(FixtureWithEvents { fixture, events })
    }
}
