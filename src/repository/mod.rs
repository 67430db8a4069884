pub mod database;
pub mod error;
pub mod memory;

use crate::models::entity::Entity;
use crate::models::fixture::{Event, Fixture, Standing};
use crate::models::league::{League, Season};
use crate::models::team::{Player, PlayerTeamSeason, Team, Transfer};
use async_trait::async_trait;
use log::warn;
use uuid::Uuid;

pub use error::{RepoError, RepoResult};

/// A bounded window over a table in primary-key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

/// Uniform persistence operations for one entity type.
///
/// Implemented by session types, so every call runs inside the caller's
/// transaction. Implementations never commit or roll back on their own.
#[async_trait]
pub trait Repository<E: Entity>: Send {
    /// `None` when no row has this key.
    async fn get(&mut self, id: &E::Id) -> RepoResult<Option<E>>;

    async fn list(&mut self, page: Page) -> RepoResult<Vec<E>>;

    async fn find(&mut self, filter: &E::Filter) -> RepoResult<Vec<E>>;

    /// Fails with `Conflict` on a primary or unique key collision.
    async fn create(&mut self, entity: E) -> RepoResult<E>;

    /// Merges the present fields of `patch` into the stored row.
    async fn update(&mut self, id: &E::Id, patch: &E::Patch) -> RepoResult<E>;

    /// Returns whether a row was removed. Deleting a missing row is not an error.
    async fn delete(&mut self, id: &E::Id) -> RepoResult<bool>;

    async fn delete_where(&mut self, filter: &E::Filter) -> RepoResult<usize>;

    /// Inserts all rows or none of them.
    async fn add_many(&mut self, entities: Vec<E>) -> RepoResult<Vec<E>>;

    /// Insert-or-update keyed by primary key.
    async fn upsert(&mut self, entity: E) -> RepoResult<E>;
}

/// One transaction against a store.
#[async_trait]
pub trait Session: Send + Sized {
    async fn commit(self) -> RepoResult<()>;

    async fn rollback(self) -> RepoResult<()>;
}

/// Regenerates the derived league table for one (league, season, group).
#[async_trait]
pub trait StandingsRoutine: Send {
    async fn recompute_standings(
        &mut self,
        league_id: i64,
        season_id: Uuid,
        group_name: Option<String>,
    ) -> RepoResult<usize>;
}

/// Every repository the football services need, behind one bound.
pub trait FootballRepositories:
    Repository<League>
    + Repository<Season>
    + Repository<Team>
    + Repository<Player>
    + Repository<PlayerTeamSeason>
    + Repository<Fixture>
    + Repository<Event>
    + Repository<Standing>
    + Repository<Transfer>
    + StandingsRoutine
{
}

impl<T> FootballRepositories for T where
    T: Repository<League>
        + Repository<Season>
        + Repository<Team>
        + Repository<Player>
        + Repository<PlayerTeamSeason>
        + Repository<Fixture>
        + Repository<Event>
        + Repository<Standing>
        + Repository<Transfer>
        + StandingsRoutine
{
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Session: Session + FootballRepositories;

    async fn begin(&self) -> RepoResult<Self::Session>;
}

/// Commits the session when `result` is `Ok`, rolls it back otherwise.
pub async fn finish<S, T, E>(session: S, result: Result<T, E>) -> Result<T, E>
where
    S: Session,
    E: From<RepoError>,
{
    match result {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = session.rollback().await {
                warn!("Rolling back the session failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}
