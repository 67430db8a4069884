use crate::models::entity::Entity;
use crate::repository::{Page, RepoError, Repository};
use crate::service::error::{ServiceError, ServiceResult};
use std::marker::PhantomData;

pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Page size policy applied to every list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub max_page_size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            max_page_size: 1000,
        }
    }
}

impl Pagination {
    pub fn new(max_page_size: i64) -> Self {
        Pagination {
            max_page_size: max_page_size.max(1),
        }
    }

    pub fn page(&self, limit: Option<i64>, offset: Option<i64>) -> ServiceResult<Page> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = offset.unwrap_or(0);
        if limit < 1 {
            return Err(ServiceError::Validation(format!(
                "limit must be at least 1, got {limit}"
            )));
        }
        if offset < 0 {
            return Err(ServiceError::Validation(format!(
                "offset must not be negative, got {offset}"
            )));
        }
        Ok(Page {
            limit: limit.min(self.max_page_size),
            offset,
        })
    }

    /// Pages rows that were filtered and ordered in memory.
    pub fn slice<T>(&self, rows: Vec<T>, limit: Option<i64>, offset: Option<i64>) -> ServiceResult<Vec<T>> {
        let page = self.page(limit, offset)?;
        let offset = usize::try_from(page.offset).unwrap_or(0);
        let limit = usize::try_from(page.limit).unwrap_or(0);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}

/// Business operations over one entity type, on top of any session that
/// implements `Repository<E>`.
pub struct EntityService<E: Entity> {
    pagination: Pagination,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Entity> Copy for EntityService<E> {}

impl<E: Entity> EntityService<E> {
    pub fn new(pagination: Pagination) -> Self {
        EntityService {
            pagination,
            _entity: PhantomData,
        }
    }

    pub async fn get<S: Repository<E>>(&self, session: &mut S, id: &E::Id) -> ServiceResult<Option<E>> {
        Ok(session.get(id).await?)
    }

    /// Like `get`, but a missing row is `NotFound`.
    pub async fn fetch<S: Repository<E>>(&self, session: &mut S, id: &E::Id) -> ServiceResult<E> {
        session
            .get(id)
            .await?
            .ok_or_else(|| RepoError::not_found::<E>(id).into())
    }

    pub async fn list<S: Repository<E>>(
        &self,
        session: &mut S,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ServiceResult<Vec<E>> {
        let page = self.pagination.page(limit, offset)?;
        Ok(session.list(page).await?)
    }

    pub async fn find<S: Repository<E>>(&self, session: &mut S, filter: &E::Filter) -> ServiceResult<Vec<E>> {
        Ok(session.find(filter).await?)
    }

    pub async fn create<S: Repository<E>>(&self, session: &mut S, entity: E) -> ServiceResult<E> {
        Ok(session.create(entity).await?)
    }

    pub async fn update<S: Repository<E>>(
        &self,
        session: &mut S,
        id: &E::Id,
        patch: &E::Patch,
    ) -> ServiceResult<E> {
        Ok(session.update(id, patch).await?)
    }

    pub async fn delete<S: Repository<E>>(&self, session: &mut S, id: &E::Id) -> ServiceResult<bool> {
        Ok(session.delete(id).await?)
    }

    pub async fn delete_where<S: Repository<E>>(
        &self,
        session: &mut S,
        filter: &E::Filter,
    ) -> ServiceResult<usize> {
        Ok(session.delete_where(filter).await?)
    }

    pub async fn add_many<S: Repository<E>>(&self, session: &mut S, entities: Vec<E>) -> ServiceResult<Vec<E>> {
        Ok(session.add_many(entities).await?)
    }

    /// Insert-or-update keyed by primary key. The flag is true when the row is new.
    pub async fn upsert<S: Repository<E>>(&self, session: &mut S, entity: E) -> ServiceResult<(E, bool)> {
        let created = session.get(&entity.id()).await?.is_none();
        Ok((session.upsert(entity).await?, created))
    }

    /// Upsert keyed by a natural key: the row matching `filter` keeps its
    /// primary key and takes every other field from `entity`.
    ///
    /// Returns the stored row and whether it was newly created.
    pub async fn upsert_by<S: Repository<E>>(
        &self,
        session: &mut S,
        filter: &E::Filter,
        mut entity: E,
    ) -> ServiceResult<(E, bool)> {
        let existing = session.find(filter).await?;
        match existing.as_slice() {
            [] => Ok((session.create(entity).await?, true)),
            [current] => {
                entity.set_id(current.id());
                Ok((session.upsert(entity).await?, false))
            }
            _ => Err(ServiceError::Integrity(format!(
                "{} natural key {:?} matches {} rows",
                E::NAME,
                filter,
                existing.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::league::{League, Season, SeasonFilter};
    use crate::repository::memory::MemoryStore;
    use crate::repository::Store;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn league(id: i64) -> League {
        League {
            id,
            name: format!("League {id}"),
            country: None,
            country_code: None,
            logo: None,
            flag: None,
            league_type: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn season(year: i32) -> Season {
        Season {
            id: Uuid::new_v4(),
            league_id: 39,
            year,
            start_date: None,
            end_date: None,
            is_current: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let pagination = Pagination::new(50);
        assert_eq!(pagination.page(None, None).unwrap(), Page { limit: 50, offset: 0 });
        assert_eq!(
            pagination.page(Some(10), Some(20)).unwrap(),
            Page { limit: 10, offset: 20 }
        );
        assert_eq!(Pagination::new(500).page(None, None).unwrap().limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn pagination_rejects_bad_values() {
        let pagination = Pagination::default();
        assert!(matches!(pagination.page(Some(0), None), Err(ServiceError::Validation(_))));
        assert!(matches!(pagination.page(None, Some(-1)), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn slice_applies_the_same_bounds() {
        let pagination = Pagination::new(2);
        let rows: Vec<i32> = (1..=5).collect();
        assert_eq!(pagination.slice(rows.clone(), None, None).unwrap(), vec![1, 2]);
        assert_eq!(pagination.slice(rows.clone(), Some(1), Some(3)).unwrap(), vec![4]);
        assert!(pagination.slice(rows.clone(), Some(10), Some(10)).unwrap().is_empty());
        assert!(matches!(
            pagination.slice(rows, Some(0), None),
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn pages_cover_every_row_exactly_once() {
        let store = MemoryStore::new();
        let service = EntityService::<League>::new(Pagination::default());
        let mut session = store.begin().await.unwrap();
        for id in 1..=7 {
            service.create(&mut session, league(id)).await.unwrap();
        }
        let mut seen = HashSet::new();
        let mut offset = 0;
        loop {
            let page = service.list(&mut session, Some(3), Some(offset)).await.unwrap();
            assert!(page.len() <= 3);
            if page.is_empty() {
                break;
            }
            for row in &page {
                assert!(seen.insert(row.id));
            }
            offset += 3;
        }
        assert_eq!(seen.len(), 7);
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips() {
        let store = MemoryStore::new();
        let service = EntityService::<League>::new(Pagination::default());
        let mut session = store.begin().await.unwrap();
        let created = service.create(&mut session, league(39)).await.unwrap();
        assert!(created.created_at.is_some());
        let fetched = service.fetch(&mut session, &39).await.unwrap();
        assert_eq!(created, fetched);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let service = EntityService::<League>::new(Pagination::default());
        let mut session = store.begin().await.unwrap();
        service.create(&mut session, league(39)).await.unwrap();
        assert!(service.delete(&mut session, &39).await.unwrap());
        assert!(service.get(&mut session, &39).await.unwrap().is_none());
        assert!(!service.delete(&mut session, &39).await.unwrap());
        assert!(matches!(
            service.fetch(&mut session, &39).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn add_many_with_one_invalid_row_inserts_nothing() {
        let store = MemoryStore::new();
        let service = EntityService::<Season>::new(Pagination::default());
        let mut session = store.begin().await.unwrap();
        Repository::<League>::create(&mut session, league(39)).await.unwrap();
        let rows = vec![season(2021), season(2022), season(2023), season(1200)];
        let err = service.add_many(&mut session, rows).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let stored = service.find(&mut session, &SeasonFilter::default()).await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn upsert_by_keeps_the_existing_key() {
        let store = MemoryStore::new();
        let service = EntityService::<Season>::new(Pagination::default());
        let mut session = store.begin().await.unwrap();
        Repository::<League>::create(&mut session, league(39)).await.unwrap();
        let original = service.create(&mut session, season(2023)).await.unwrap();

        let filter = SeasonFilter {
            league_id: Some(39),
            year: Some(2023),
        };
        let replacement = Season {
            is_current: true,
            ..season(2023)
        };
        let (stored, created) = service
            .upsert_by(&mut session, &filter, replacement)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(stored.id, original.id);
        assert!(stored.is_current);
        assert_eq!(service.find(&mut session, &filter).await.unwrap().len(), 1);
    }
}
