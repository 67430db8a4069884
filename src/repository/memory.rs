use crate::models::entity::{merge_patch, Entity, Reference};
use crate::models::fixture::{Fixture, Standing, StandingFilter};
use crate::repository::{Page, RepoError, RepoResult, Repository, Session, StandingsRoutine, Store};
use async_trait::async_trait;
use chrono::Utc;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;
use validator::Validate;

type Rows<E> = BTreeMap<<E as Entity>::Id, E>;

trait AnyTable: Send + Sync {
    fn clone_table(&self) -> Box<dyn AnyTable>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn entity(&self) -> &'static str;
    fn contains(&self, id: &str) -> bool;
    fn references(&self, target: &Reference) -> bool;
}

struct Table<E: Entity> {
    rows: Rows<E>,
}

impl<E: Entity> AnyTable for Table<E> {
    fn clone_table(&self) -> Box<dyn AnyTable> {
        Box::new(Table::<E> {
            rows: self.rows.clone(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn entity(&self) -> &'static str {
        E::NAME
    }

    fn contains(&self, id: &str) -> bool {
        id.parse::<E::Id>()
            .map_or(false, |id| self.rows.contains_key(&id))
    }

    fn references(&self, target: &Reference) -> bool {
        self.rows
            .values()
            .any(|row| row.references().contains(target))
    }
}

/// All tables of the memory store, one per entity type.
#[derive(Default)]
pub struct Tables {
    inner: HashMap<TypeId, Box<dyn AnyTable>>,
}

impl Clone for Tables {
    fn clone(&self) -> Self {
        Tables {
            inner: self
                .inner
                .iter()
                .map(|(type_id, table)| (*type_id, table.clone_table()))
                .collect(),
        }
    }
}

impl Tables {
    fn rows<E: Entity>(&self) -> Option<&Rows<E>> {
        self.inner
            .get(&TypeId::of::<E>())
            .and_then(|table| table.as_any().downcast_ref::<Table<E>>())
            .map(|table| &table.rows)
    }

    fn rows_mut<E: Entity>(&mut self) -> RepoResult<&mut Rows<E>> {
        self.inner
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Table::<E> { rows: BTreeMap::new() }) as Box<dyn AnyTable>)
            .as_any_mut()
            .downcast_mut::<Table<E>>()
            .map(|table| &mut table.rows)
            .ok_or_else(|| RepoError::Storage(format!("table for {} is corrupted", E::NAME)))
    }

    fn table(&self, entity: &str) -> Option<&dyn AnyTable> {
        self.inner
            .values()
            .map(|table| &**table)
            .find(|table| table.entity() == entity)
    }

    /// Every foreign key of `entity` must point at a stored row.
    fn check_references<E: Entity>(&self, entity: &E) -> RepoResult<()> {
        for reference in entity.references() {
            let exists = self
                .table(reference.entity)
                .map_or(false, |table| table.contains(&reference.id));
            if !exists {
                return Err(RepoError::ForeignKey(format!(
                    "{} references missing {} {}",
                    E::NAME,
                    reference.entity,
                    reference.id
                )));
            }
        }
        Ok(())
    }

    /// Deletes are restricted while another row still points at the target.
    fn check_unreferenced<E: Entity>(&self, id: &E::Id) -> RepoResult<()> {
        let target = Reference::to::<E>(id);
        match self.inner.values().find(|table| table.references(&target)) {
            Some(table) => Err(RepoError::ForeignKey(format!(
                "{} {} is still referenced by {}",
                E::NAME,
                id,
                table.entity()
            ))),
            None => Ok(()),
        }
    }

    /// Flags the table of a fixture's competition once its result changes.
    fn mark_standings_stale<E: Entity>(&mut self, before: &E, after: &E) -> RepoResult<()> {
        let before = (before as &dyn Any).downcast_ref::<Fixture>();
        let after = (after as &dyn Any).downcast_ref::<Fixture>();
        let (before, after) = match (before, after) {
            (Some(before), Some(after)) => (before, after),
            _ => return Ok(()),
        };
        let changed = before.home_score != after.home_score
            || before.away_score != after.away_score
            || before.status != after.status;
        let (league_id, season_id) = match (after.league_id, after.season_id) {
            (Some(league_id), Some(season_id)) if changed => (league_id, season_id),
            _ => return Ok(()),
        };
        for row in self.rows_mut::<Standing>()?.values_mut() {
            if row.league_id == league_id
                && row.season_id == season_id
                && row.group_name == after.group_name
            {
                row.stale = true;
            }
        }
        Ok(())
    }
}

/// In-process store with the same transactional contract as PostgreSQL.
///
/// A session works on a private copy of the tables and holds the store lock
/// until it is committed or dropped, so sessions are fully serialized.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

pub struct MemorySession {
    committed: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl Store for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> RepoResult<MemorySession> {
        let committed = self.tables.clone().lock_owned().await;
        let working = (*committed).clone();
        Ok(MemorySession { committed, working })
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn commit(self) -> RepoResult<()> {
        let MemorySession {
            mut committed,
            working,
        } = self;
        *committed = working;
        Ok(())
    }

    async fn rollback(self) -> RepoResult<()> {
        Ok(())
    }
}

/// Validates `entity` and checks its unique keys against every other row.
fn check_row<E: Entity>(rows: &Rows<E>, entity: &E, replacing: Option<&E::Id>) -> RepoResult<()> {
    entity.validate().map_err(RepoError::invalid::<E>)?;
    let keys = entity.unique_keys();
    if keys.is_empty() {
        return Ok(());
    }
    let clash = rows
        .iter()
        .filter(|(id, _)| Some(*id) != replacing)
        .any(|(_, other)| other.unique_keys().iter().any(|key| keys.contains(key)));
    if clash {
        return Err(RepoError::Conflict(format!(
            "{} violates a unique constraint",
            E::NAME
        )));
    }
    Ok(())
}

fn insert_new<E: Entity>(rows: &mut Rows<E>, mut entity: E) -> RepoResult<E> {
    let id = entity.id();
    if rows.contains_key(&id) {
        return Err(RepoError::duplicate::<E>(&id));
    }
    entity.touch(Utc::now());
    check_row(rows, &entity, None)?;
    rows.insert(id, entity.clone());
    Ok(entity)
}

#[async_trait]
impl<E: Entity> Repository<E> for MemorySession {
    async fn get(&mut self, id: &E::Id) -> RepoResult<Option<E>> {
        Ok(self.working.rows::<E>().and_then(|rows| rows.get(id)).cloned())
    }

    async fn list(&mut self, page: Page) -> RepoResult<Vec<E>> {
        let offset = usize::try_from(page.offset).unwrap_or(0);
        let limit = usize::try_from(page.limit).unwrap_or(0);
        Ok(self
            .working
            .rows::<E>()
            .map(|rows| rows.values().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn find(&mut self, filter: &E::Filter) -> RepoResult<Vec<E>> {
        Ok(self
            .working
            .rows::<E>()
            .map(|rows| {
                rows.values()
                    .filter(|row| row.matches(filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(&mut self, entity: E) -> RepoResult<E> {
        self.working.check_references(&entity)?;
        let rows = self.working.rows_mut::<E>()?;
        insert_new(rows, entity)
    }

    async fn update(&mut self, id: &E::Id, patch: &E::Patch) -> RepoResult<E> {
        let current = self
            .working
            .rows::<E>()
            .and_then(|rows| rows.get(id))
            .cloned()
            .ok_or_else(|| RepoError::not_found::<E>(id))?;
        let mut merged = merge_patch(&current, patch)?;
        merged.touch(Utc::now());
        self.working.check_references(&merged)?;
        let rows = self.working.rows_mut::<E>()?;
        check_row(rows, &merged, Some(id))?;
        rows.insert(id.clone(), merged.clone());
        self.working.mark_standings_stale(&current, &merged)?;
        Ok(merged)
    }

    async fn delete(&mut self, id: &E::Id) -> RepoResult<bool> {
        let exists = self
            .working
            .rows::<E>()
            .map_or(false, |rows| rows.contains_key(id));
        if !exists {
            return Ok(false);
        }
        self.working.check_unreferenced::<E>(id)?;
        let rows = self.working.rows_mut::<E>()?;
        Ok(rows.remove(id).is_some())
    }

    async fn delete_where(&mut self, filter: &E::Filter) -> RepoResult<usize> {
        let doomed: Vec<E::Id> = self
            .working
            .rows::<E>()
            .map(|rows| {
                rows.values()
                    .filter(|row| row.matches(filter))
                    .map(|row| row.id())
                    .collect()
            })
            .unwrap_or_default();
        for id in &doomed {
            self.working.check_unreferenced::<E>(id)?;
        }
        let rows = self.working.rows_mut::<E>()?;
        for id in &doomed {
            rows.remove(id);
        }
        Ok(doomed.len())
    }

    async fn add_many(&mut self, entities: Vec<E>) -> RepoResult<Vec<E>> {
        for entity in &entities {
            self.working.check_references(entity)?;
        }
        let rows = self.working.rows_mut::<E>()?;
        let mut staged = rows.clone();
        let mut inserted = Vec::with_capacity(entities.len());
        for entity in entities {
            inserted.push(insert_new(&mut staged, entity)?);
        }
        *rows = staged;
        Ok(inserted)
    }

    async fn upsert(&mut self, mut entity: E) -> RepoResult<E> {
        let id = entity.id();
        let stored = self
            .working
            .rows::<E>()
            .and_then(|rows| rows.get(&id))
            .cloned();
        if let Some(stored) = &stored {
            entity.keep_created_at(stored);
        }
        entity.touch(Utc::now());
        self.working.check_references(&entity)?;
        let rows = self.working.rows_mut::<E>()?;
        check_row(rows, &entity, Some(&id))?;
        rows.insert(id, entity.clone());
        if let Some(stored) = &stored {
            self.working.mark_standings_stale(stored, &entity)?;
        }
        Ok(entity)
    }
}

#[derive(Default)]
struct TableLine {
    played: i32,
    wins: i32,
    draws: i32,
    losses: i32,
    goals_for: i32,
    goals_against: i32,
    form: Vec<char>,
}

impl TableLine {
    fn record(&mut self, scored: i32, conceded: i32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        let outcome = match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => {
                self.wins += 1;
                'W'
            }
            std::cmp::Ordering::Equal => {
                self.draws += 1;
                'D'
            }
            std::cmp::Ordering::Less => {
                self.losses += 1;
                'L'
            }
        };
        self.form.push(outcome);
    }

    fn points(&self) -> i32 {
        self.wins * 3 + self.draws
    }
}

/// Builds the table rows from finished fixtures, mirroring the SQL `recompute_standings` function.
fn tabulate(
    league_id: i64,
    season_id: Uuid,
    group_name: Option<String>,
    mut fixtures: Vec<Fixture>,
) -> Vec<Standing> {
    fixtures.sort_by_key(|fixture| (fixture.event_date, fixture.id));
    let mut lines: BTreeMap<i64, TableLine> = BTreeMap::new();
    for fixture in &fixtures {
        if let (Some(home), Some(away)) = (fixture.home_score, fixture.away_score) {
            lines.entry(fixture.home_team_id).or_default().record(home, away);
            lines.entry(fixture.away_team_id).or_default().record(away, home);
        }
    }

    let now = Utc::now();
    let mut rows: Vec<Standing> = lines
        .into_iter()
        .map(|(team_id, line)| {
            let recent = line.form.len().saturating_sub(5);
            Standing {
                id: Uuid::new_v4(),
                league_id,
                season_id,
                group_name: group_name.clone(),
                team_id,
                rank: None,
                played: line.played,
                wins: line.wins,
                draws: line.draws,
                losses: line.losses,
                points: line.points(),
                goals_for: line.goals_for,
                goals_against: line.goals_against,
                goal_diff: line.goals_for - line.goals_against,
                form: Some(line.form[recent..].iter().collect()),
                stale: false,
                updated_at: Some(now),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.goal_diff.cmp(&a.goal_diff))
            .then(b.goals_for.cmp(&a.goals_for))
            .then(a.team_id.cmp(&b.team_id))
    });
    for (position, row) in rows.iter_mut().enumerate() {
        row.rank = Some(position as i32 + 1);
    }
    rows
}

#[async_trait]
impl StandingsRoutine for MemorySession {
    async fn recompute_standings(
        &mut self,
        league_id: i64,
        season_id: Uuid,
        group_name: Option<String>,
    ) -> RepoResult<usize> {
        let fixtures: Vec<Fixture> = self
            .working
            .rows::<Fixture>()
            .map(|rows| {
                rows.values()
                    .filter(|fixture| {
                        fixture.league_id == Some(league_id)
                            && fixture.season_id == Some(season_id)
                            && fixture.group_name == group_name
                            && fixture.is_finished()
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let table = tabulate(league_id, season_id, group_name.clone(), fixtures);
        let standings = self.working.rows_mut::<Standing>()?;
        let filter = StandingFilter {
            league_id: Some(league_id),
            season_id: Some(season_id),
            team_id: None,
        };
        standings.retain(|_, row| !(row.matches(&filter) && row.group_name == group_name));
        let count = table.len();
        for row in table {
            standings.insert(row.id, row);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::league::{League, Season};
    use crate::models::team::Team;

    fn league(id: i64, name: &str) -> League {
        League {
            id,
            name: name.to_string(),
            country: None,
            country_code: None,
            logo: None,
            flag: None,
            league_type: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn team(id: i64, name: &str) -> Team {
        Team {
            id,
            name: name.to_string(),
            short_code: None,
            country: None,
            founded: None,
            national: false,
            logo: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn dropped_session_discards_writes() {
        let store = MemoryStore::new();
        {
            let mut session = store.begin().await.unwrap();
            Repository::<League>::create(&mut session, league(39, "Premier League"))
                .await
                .unwrap();
        }
        let mut session = store.begin().await.unwrap();
        let found = Repository::<League>::get(&mut session, &39).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn committed_session_is_visible_to_the_next_one() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        Repository::<League>::create(&mut session, league(39, "Premier League"))
            .await
            .unwrap();
        session.commit().await.unwrap();

        let mut session = store.begin().await.unwrap();
        let found = Repository::<League>::get(&mut session, &39).await.unwrap();
        assert_eq!(found.map(|l| l.name), Some("Premier League".to_string()));
    }

    #[tokio::test]
    async fn unique_key_collision_is_a_conflict() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        Repository::<Team>::create(&mut session, team(33, "Manchester United"))
            .await
            .unwrap();
        let err = Repository::<Team>::create(&mut session, team(34, "Manchester United"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        let err = Repository::<Team>::update(&mut session, &1, &Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));
    }

    #[tokio::test]
    async fn upsert_replaces_existing_row() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        Repository::<Team>::upsert(&mut session, team(33, "Man Utd"))
            .await
            .unwrap();
        Repository::<Team>::upsert(&mut session, team(33, "Manchester United"))
            .await
            .unwrap();
        let all: Vec<Team> = Repository::<Team>::find(&mut session, &Default::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Manchester United");
    }

    #[tokio::test]
    async fn upsert_keeps_the_creation_time() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        let first = Repository::<Team>::upsert(&mut session, team(33, "Man Utd"))
            .await
            .unwrap();
        let second = Repository::<Team>::upsert(&mut session, team(33, "Manchester United"))
            .await
            .unwrap();
        assert!(first.created_at.is_some());
        assert_eq!(second.created_at, first.created_at);
    }

    fn season(league_id: i64) -> Season {
        Season {
            id: Uuid::new_v4(),
            league_id,
            year: 2023,
            start_date: None,
            end_date: None,
            is_current: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn fixture(season_id: Uuid) -> Fixture {
        Fixture {
            id: 1035037,
            league_id: Some(39),
            season_id: Some(season_id),
            group_name: None,
            round_name: None,
            referee: None,
            event_date: None,
            status: Some("NS".to_string()),
            home_team_id: 44,
            away_team_id: 50,
            home_score: None,
            away_score: None,
            winner: None,
            attendance: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn rows_must_point_at_existing_parents() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        let err = Repository::<Season>::create(&mut session, season(39))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::ForeignKey(_)));

        Repository::<League>::create(&mut session, league(39, "Premier League"))
            .await
            .unwrap();
        let stored = Repository::<Season>::create(&mut session, season(39))
            .await
            .unwrap();
        Repository::<Team>::create(&mut session, team(44, "Burnley"))
            .await
            .unwrap();
        let err = Repository::<Fixture>::create(&mut session, fixture(stored.id))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::ForeignKey(_)));

        Repository::<Team>::create(&mut session, team(50, "Manchester City"))
            .await
            .unwrap();
        Repository::<Fixture>::create(&mut session, fixture(stored.id))
            .await
            .unwrap();
        let patch = crate::models::fixture::FixturePatch {
            away_team_id: Some(999),
            ..Default::default()
        };
        let err = Repository::<Fixture>::update(&mut session, &1035037, &patch)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::ForeignKey(_)));
    }

    #[tokio::test]
    async fn referenced_rows_cannot_be_deleted() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        Repository::<League>::create(&mut session, league(39, "Premier League"))
            .await
            .unwrap();
        let stored = Repository::<Season>::create(&mut session, season(39))
            .await
            .unwrap();

        let err = Repository::<League>::delete(&mut session, &39).await.unwrap_err();
        assert!(matches!(err, RepoError::ForeignKey(_)));
        let filter = crate::models::league::LeagueFilter::default();
        assert!(Repository::<League>::delete_where(&mut session, &filter).await.is_err());

        assert!(Repository::<Season>::delete(&mut session, &stored.id).await.unwrap());
        assert!(Repository::<League>::delete(&mut session, &39).await.unwrap());
    }

    #[tokio::test]
    async fn result_change_marks_the_table_stale() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        Repository::<League>::create(&mut session, league(39, "Premier League"))
            .await
            .unwrap();
        let stored = Repository::<Season>::create(&mut session, season(39))
            .await
            .unwrap();
        for (id, name) in [(44, "Burnley"), (50, "Manchester City")] {
            Repository::<Team>::create(&mut session, team(id, name)).await.unwrap();
        }
        Repository::<Fixture>::create(&mut session, fixture(stored.id))
            .await
            .unwrap();
        let rows = StandingsRoutine::recompute_standings(&mut session, 39, stored.id, None)
            .await
            .unwrap();
        assert_eq!(rows, 0);
        let row = Standing {
            id: Uuid::new_v4(),
            league_id: 39,
            season_id: stored.id,
            group_name: None,
            team_id: 50,
            rank: Some(1),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            points: 0,
            goals_for: 0,
            goals_against: 0,
            goal_diff: 0,
            form: None,
            stale: false,
            updated_at: None,
        };
        Repository::<Standing>::create(&mut session, row).await.unwrap();

        let rename = crate::models::fixture::FixturePatch {
            referee: Some("C. Pawson".to_string()),
            ..Default::default()
        };
        Repository::<Fixture>::update(&mut session, &1035037, &rename)
            .await
            .unwrap();
        let table: Vec<Standing> = Repository::<Standing>::find(&mut session, &StandingFilter::default())
            .await
            .unwrap();
        assert!(!table[0].stale);

        let result = crate::models::fixture::FixturePatch {
            status: Some("FT".to_string()),
            home_score: Some(0),
            away_score: Some(3),
            winner: Some(crate::models::fixture::WINNER_AWAY),
            ..Default::default()
        };
        Repository::<Fixture>::update(&mut session, &1035037, &result)
            .await
            .unwrap();
        let table: Vec<Standing> = Repository::<Standing>::find(&mut session, &StandingFilter::default())
            .await
            .unwrap();
        assert!(table[0].stale);
    }

    #[test]
    fn tabulate_ranks_by_points_then_goal_difference() {
        let season = Uuid::new_v4();
        let played = |id: i64, home: i64, away: i64, hs: i32, aws: i32| Fixture {
            id,
            league_id: Some(39),
            season_id: Some(season),
            group_name: None,
            round_name: None,
            referee: None,
            event_date: None,
            status: Some("FT".to_string()),
            home_team_id: home,
            away_team_id: away,
            home_score: Some(hs),
            away_score: Some(aws),
            winner: Some(crate::models::fixture::winner_code(hs, aws)),
            attendance: None,
            created_at: None,
            updated_at: None,
        };
        let rows = tabulate(
            39,
            season,
            None,
            vec![played(1, 1, 2, 3, 0), played(2, 2, 3, 1, 1), played(3, 3, 1, 0, 1)],
        );
        let order: Vec<i64> = rows.iter().map(|row| row.team_id).collect();
        assert_eq!(order, vec![1, 3, 2]);
        assert_eq!(rows[0].points, 6);
        assert_eq!(rows[0].rank, Some(1));
        assert!(rows.iter().all(|row| row.goal_diff == row.goals_for - row.goals_against));
        assert!(rows.iter().all(|row| row.validate().is_ok()));
    }
}
