use crate::config::config::Config;
use crate::models::entity::{merge_patch, Entity};
use crate::models::fixture::{Event, EventFilter, Fixture, FixtureFilter, Standing, StandingFilter};
use crate::models::league::{League, LeagueFilter, Season, SeasonFilter};
use crate::models::schema;
use crate::models::team::{
    Player, PlayerFilter, PlayerTeamSeason, PlayerTeamSeasonFilter, Team, TeamFilter, Transfer,
    TransferFilter,
};
use crate::repository::{Page, RepoError, RepoResult, Repository, Session, StandingsRoutine, Store};
use async_trait::async_trait;
use chrono::Utc;
use deadpool::managed::Object;
use diesel::pg::Pg;
use diesel::sql_types::{BigInt, Integer, Nullable, Text};
use diesel::{
    BoolExpressionMethods, ConnectionError, ConnectionResult, ExpressionMethods, OptionalExtension,
    QueryDsl, QueryableByName,
};
use diesel_async::pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager};
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};
use log::{error, info};
use openssl::ssl::{SslConnector, SslMethod};
use postgres_openssl::MakeTlsConnector;
use uuid::Uuid;
use validator::Validate;

pub type DBPool = deadpool::managed::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;
type PooledConnection = Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

#[derive(Clone)]
pub struct Database {
    pool: DBPool,
}

impl Database {
    pub fn new(config: &Config) -> RepoResult<Self> {
        let ca_file = config.database_ca_file.clone();
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_setup(
            config.database_url.clone(),
            move |url| Box::pin(Self::establish(url.to_string(), ca_file.clone())),
        );
        let pool = Pool::builder(manager)
            .max_size(config.database_pool_size)
            .build()
            .map_err(|e| RepoError::PoolBuild(e.to_string()))?;
        info!(
            "PostgreSQL pool ready (max {} connections)",
            config.database_pool_size
        );
        Ok(Database { pool })
    }

    /// Opens one connection, over TLS when a CA bundle is configured.
    async fn establish(
        database_url: String,
        ca_file: Option<String>,
    ) -> ConnectionResult<AsyncPgConnection> {
        let client = match ca_file {
            Some(ca_file) => {
                let mut builder = SslConnector::builder(SslMethod::tls())
                    .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
                builder
                    .set_ca_file(&ca_file)
                    .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
                let connector = MakeTlsConnector::new(builder.build());
                let (client, connection) = tokio_postgres::connect(&database_url, connector)
                    .await
                    .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        error!("connection error: {e}");
                    }
                });
                client
            }
            None => {
                let (client, connection) =
                    tokio_postgres::connect(&database_url, tokio_postgres::NoTls)
                        .await
                        .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        error!("connection error: {e}");
                    }
                });
                client
            }
        };
        AsyncPgConnection::try_from(client).await
    }
}

/// A pooled connection with an open transaction.
///
/// A session dropped without `commit` or `rollback` still has its transaction
/// open, so the pool refuses to recycle the connection and PostgreSQL rolls
/// the work back when it closes.
pub struct PgSession {
    conn: PooledConnection,
}

impl PgSession {
    fn conn(&mut self) -> &mut AsyncPgConnection {
        &mut self.conn
    }
}

#[async_trait]
impl Store for Database {
    type Session = PgSession;

    async fn begin(&self) -> RepoResult<PgSession> {
        let mut conn = self.pool.get().await?;
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::begin_transaction(
            &mut *conn,
        )
        .await?;
        Ok(PgSession { conn })
    }
}

#[async_trait]
impl Session for PgSession {
    async fn commit(mut self) -> RepoResult<()> {
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::commit_transaction(
            self.conn(),
        )
        .await?;
        Ok(())
    }

    async fn rollback(mut self) -> RepoResult<()> {
        <AnsiTransactionManager as TransactionManager<AsyncPgConnection>>::rollback_transaction(
            self.conn(),
        )
        .await?;
        Ok(())
    }
}

fn checked<E: Entity>(mut entity: E) -> RepoResult<E> {
    entity.touch(Utc::now());
    entity.validate().map_err(RepoError::invalid::<E>)?;
    Ok(entity)
}

fn league_query(filter: &LeagueFilter) -> schema::leagues::BoxedQuery<'static, Pg> {
    use schema::leagues::dsl::*;
    let mut query = leagues.order(id.asc()).into_boxed();
    if let Some(value) = &filter.country {
        query = query.filter(country.eq(value.clone()));
    }
    query
}

fn season_query(filter: &SeasonFilter) -> schema::seasons::BoxedQuery<'static, Pg> {
    use schema::seasons::dsl::*;
    let mut query = seasons.order(id.asc()).into_boxed();
    if let Some(value) = filter.league_id {
        query = query.filter(league_id.eq(value));
    }
    if let Some(value) = filter.year {
        query = query.filter(year.eq(value));
    }
    query
}

fn team_query(filter: &TeamFilter) -> schema::teams::BoxedQuery<'static, Pg> {
    use schema::teams::dsl::*;
    let mut query = teams.order(id.asc()).into_boxed();
    if let Some(value) = &filter.name {
        query = query.filter(name.eq(value.clone()));
    }
    if let Some(value) = &filter.country {
        query = query.filter(country.eq(value.clone()));
    }
    query
}

fn player_query(filter: &PlayerFilter) -> schema::players::BoxedQuery<'static, Pg> {
    use schema::players::dsl::*;
    let mut query = players.order(id.asc()).into_boxed();
    if let Some(value) = &filter.nationality {
        query = query.filter(nationality.eq(value.clone()));
    }
    query
}

fn registration_query(
    filter: &PlayerTeamSeasonFilter,
) -> schema::player_team_seasons::BoxedQuery<'static, Pg> {
    use schema::player_team_seasons::dsl::*;
    let mut query = player_team_seasons.order(id.asc()).into_boxed();
    if let Some(value) = filter.player_id {
        query = query.filter(player_id.eq(value));
    }
    if let Some(value) = filter.team_id {
        query = query.filter(team_id.eq(value));
    }
    if let Some(value) = filter.season_id {
        query = query.filter(season_id.eq(value));
    }
    if let Some(value) = filter.is_current {
        query = query.filter(is_current.eq(value));
    }
    query
}

fn fixture_query(filter: &FixtureFilter) -> schema::fixtures::BoxedQuery<'static, Pg> {
    use schema::fixtures::dsl::*;
    let mut query = fixtures.order(id.asc()).into_boxed();
    if let Some(team) = filter.team_id {
        query = query.filter(home_team_id.eq(team).or(away_team_id.eq(team)));
    }
    if let Some(value) = filter.league_id {
        query = query.filter(league_id.eq(value));
    }
    if let Some(value) = filter.season_id {
        query = query.filter(season_id.eq(value));
    }
    if let Some(value) = &filter.status {
        query = query.filter(status.eq(value.clone()));
    }
    query
}

fn event_query(filter: &EventFilter) -> schema::events::BoxedQuery<'static, Pg> {
    use schema::events::dsl::*;
    let mut query = events.order(id.asc()).into_boxed();
    if let Some(value) = filter.fixture_id {
        query = query.filter(fixture_id.eq(value));
    }
    query
}

fn standing_query(filter: &StandingFilter) -> schema::standings::BoxedQuery<'static, Pg> {
    use schema::standings::dsl::*;
    let mut query = standings.order(id.asc()).into_boxed();
    if let Some(value) = filter.league_id {
        query = query.filter(league_id.eq(value));
    }
    if let Some(value) = filter.season_id {
        query = query.filter(season_id.eq(value));
    }
    if let Some(value) = filter.team_id {
        query = query.filter(team_id.eq(value));
    }
    query
}

fn transfer_query(filter: &TransferFilter) -> schema::transfers::BoxedQuery<'static, Pg> {
    use schema::transfers::dsl::*;
    let mut query = transfers.order(id.asc()).into_boxed();
    if let Some(value) = filter.player_id {
        query = query.filter(player_id.eq(value));
    }
    query
}

/// Implements `Repository<$entity>` for `PgSession` against one diesel table.
macro_rules! pg_repository {
    ($entity:ty, $table:ident, $query:ident) => {
        #[async_trait]
        impl Repository<$entity> for PgSession {
            async fn get(
                &mut self,
                id: &<$entity as Entity>::Id,
            ) -> RepoResult<Option<$entity>> {
                Ok(schema::$table::table
                    .find(id.clone())
                    .first::<$entity>(self.conn())
                    .await
                    .optional()?)
            }

            async fn list(&mut self, page: Page) -> RepoResult<Vec<$entity>> {
                Ok(schema::$table::table
                    .order(schema::$table::id.asc())
                    .limit(page.limit)
                    .offset(page.offset)
                    .load::<$entity>(self.conn())
                    .await?)
            }

            async fn find(
                &mut self,
                filter: &<$entity as Entity>::Filter,
            ) -> RepoResult<Vec<$entity>> {
                Ok($query(filter).load::<$entity>(self.conn()).await?)
            }

            async fn create(&mut self, entity: $entity) -> RepoResult<$entity> {
                let entity = checked(entity)?;
                Ok(diesel::insert_into(schema::$table::table)
                    .values(&entity)
                    .get_result::<$entity>(self.conn())
                    .await?)
            }

            async fn update(
                &mut self,
                id: &<$entity as Entity>::Id,
                patch: &<$entity as Entity>::Patch,
            ) -> RepoResult<$entity> {
                let current = Repository::<$entity>::get(self, id)
                    .await?
                    .ok_or_else(|| RepoError::not_found::<$entity>(id))?;
                let merged = checked(merge_patch(&current, patch)?)?;
                Ok(diesel::update(schema::$table::table.find(id.clone()))
                    .set(&merged)
                    .get_result::<$entity>(self.conn())
                    .await?)
            }

            async fn delete(&mut self, id: &<$entity as Entity>::Id) -> RepoResult<bool> {
                let removed = diesel::delete(schema::$table::table.find(id.clone()))
                    .execute(self.conn())
                    .await?;
                Ok(removed > 0)
            }

            async fn delete_where(
                &mut self,
                filter: &<$entity as Entity>::Filter,
            ) -> RepoResult<usize> {
                let rows = $query(filter).load::<$entity>(self.conn()).await?;
                if rows.is_empty() {
                    return Ok(0);
                }
                let ids: Vec<<$entity as Entity>::Id> = rows.iter().map(Entity::id).collect();
                Ok(diesel::delete(
                    schema::$table::table.filter(schema::$table::id.eq_any(ids)),
                )
                .execute(self.conn())
                .await?)
            }

            async fn add_many(&mut self, entities: Vec<$entity>) -> RepoResult<Vec<$entity>> {
                if entities.is_empty() {
                    return Ok(Vec::new());
                }
                let entities = entities
                    .into_iter()
                    .map(checked)
                    .collect::<RepoResult<Vec<$entity>>>()?;
                Ok(diesel::insert_into(schema::$table::table)
                    .values(&entities)
                    .get_results::<$entity>(self.conn())
                    .await?)
            }

            async fn upsert(&mut self, mut entity: $entity) -> RepoResult<$entity> {
                if let Some(stored) = Repository::<$entity>::get(self, &entity.id()).await? {
                    entity.keep_created_at(&stored);
                }
                let entity = checked(entity)?;
                Ok(diesel::insert_into(schema::$table::table)
                    .values(&entity)
                    .on_conflict(schema::$table::id)
                    .do_update()
                    .set(&entity)
                    .get_result::<$entity>(self.conn())
                    .await?)
            }
        }
    };
}

pg_repository!(League, leagues, league_query);
pg_repository!(Season, seasons, season_query);
pg_repository!(Team, teams, team_query);
pg_repository!(Player, players, player_query);
pg_repository!(PlayerTeamSeason, player_team_seasons, registration_query);
pg_repository!(Fixture, fixtures, fixture_query);
pg_repository!(Event, events, event_query);
pg_repository!(Standing, standings, standing_query);
pg_repository!(Transfer, transfers, transfer_query);

#[derive(QueryableByName)]
struct RecomputedRows {
    #[diesel(sql_type = Integer)]
    row_count: i32,
}

#[async_trait]
impl StandingsRoutine for PgSession {
    async fn recompute_standings(
        &mut self,
        league_id: i64,
        season_id: Uuid,
        group_name: Option<String>,
    ) -> RepoResult<usize> {
        let result = diesel::sql_query("SELECT recompute_standings($1, $2, $3) AS row_count")
            .bind::<BigInt, _>(league_id)
            .bind::<diesel::sql_types::Uuid, _>(season_id)
            .bind::<Nullable<Text>, _>(group_name)
            .get_result::<RecomputedRows>(self.conn())
            .await?;
        Ok(usize::try_from(result.row_count).unwrap_or(0))
    }
}
