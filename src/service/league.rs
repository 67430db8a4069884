use crate::models::league::{League, Season, SeasonFilter};
use crate::repository::Repository;
use crate::service::entity::{EntityService, Pagination};
use crate::service::error::ServiceResult;

#[derive(Clone, Copy)]
pub struct LeagueService {
    pub leagues: EntityService<League>,
    pub seasons: EntityService<Season>,
}

impl LeagueService {
    pub fn new(pagination: Pagination) -> Self {
        LeagueService {
            leagues: EntityService::new(pagination),
            seasons: EntityService::new(pagination),
        }
    }

    /// Seasons of a league, most recent year first.
    pub async fn get_seasons<S>(&self, session: &mut S, league_id: i64) -> ServiceResult<Vec<Season>>
    where
        S: Repository<League> + Repository<Season>,
    {
        self.leagues.fetch(session, &league_id).await?;
        let filter = SeasonFilter {
            league_id: Some(league_id),
            year: None,
        };
        let mut seasons = self.seasons.find(session, &filter).await?;
        seasons.sort_by(|a, b| b.year.cmp(&a.year));
        Ok(seasons)
    }

    /// The season row for (league, year), created on first sight.
    pub async fn ensure_season<S>(&self, session: &mut S, league_id: i64, year: i32) -> ServiceResult<Season>
    where
        S: Repository<Season>,
    {
        let filter = SeasonFilter {
            league_id: Some(league_id),
            year: Some(year),
        };
        if let Some(season) = self.seasons.find(session, &filter).await?.into_iter().next() {
            return Ok(season);
        }
        let season = Season {
            id: uuid::Uuid::new_v4(),
            league_id,
            year,
            start_date: None,
            end_date: None,
            is_current: false,
            created_at: None,
            updated_at: None,
        };
        self.seasons.create(session, season).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;
    use crate::repository::Store;
    use crate::service::error::ServiceError;

    fn league() -> League {
        League {
            id: 39,
            name: "Premier League".to_string(),
            country: Some("England".to_string()),
            country_code: Some("GB-ENG".to_string()),
            logo: None,
            flag: None,
            league_type: Some("League".to_string()),
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn seasons_are_returned_newest_first() {
        let store = MemoryStore::new();
        let service = LeagueService::new(Pagination::default());
        let mut session = store.begin().await.unwrap();
        service.leagues.create(&mut session, league()).await.unwrap();
        for year in [2021, 2023, 2022] {
            service.ensure_season(&mut session, 39, year).await.unwrap();
        }
        let years: Vec<i32> = service
            .get_seasons(&mut session, 39)
            .await
            .unwrap()
            .iter()
            .map(|s| s.year)
            .collect();
        assert_eq!(years, vec![2023, 2022, 2021]);
    }

    #[tokio::test]
    async fn seasons_of_unknown_league_is_not_found() {
        let store = MemoryStore::new();
        let service = LeagueService::new(Pagination::default());
        let mut session = store.begin().await.unwrap();
        let err = service.get_seasons(&mut session, 999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn ensure_season_is_idempotent() {
        let store = MemoryStore::new();
        let service = LeagueService::new(Pagination::default());
        let mut session = store.begin().await.unwrap();
        service.leagues.create(&mut session, league()).await.unwrap();
        let first = service.ensure_season(&mut session, 39, 2023).await.unwrap();
        let second = service.ensure_season(&mut session, 39, 2023).await.unwrap();
        assert_eq!(first.id, second.id);
    }
}
