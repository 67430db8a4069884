use crate::models::team::{Player, PlayerTeamSeason, PlayerTeamSeasonFilter, Team, Transfer};
use crate::repository::Repository;
use crate::service::entity::{EntityService, Pagination};
use crate::service::error::{ServiceError, ServiceResult};
use log::error;

#[derive(Clone, Copy)]
pub struct PlayerService {
    pub players: EntityService<Player>,
    pub registrations: EntityService<PlayerTeamSeason>,
    pub transfers: EntityService<Transfer>,
    teams: EntityService<Team>,
}

impl PlayerService {
    pub fn new(pagination: Pagination) -> Self {
        PlayerService {
            players: EntityService::new(pagination),
            registrations: EntityService::new(pagination),
            transfers: EntityService::new(pagination),
            teams: EntityService::new(pagination),
        }
    }

    /// The team the player is currently registered with, if any.
    pub async fn get_current_team<S>(&self, session: &mut S, player_id: i64) -> ServiceResult<Option<Team>>
    where
        S: Repository<Player> + Repository<PlayerTeamSeason> + Repository<Team>,
    {
        self.players.fetch(session, &player_id).await?;
        let filter = PlayerTeamSeasonFilter {
            player_id: Some(player_id),
            is_current: Some(true),
            ..Default::default()
        };
        let current = self.registrations.find(session, &filter).await?;
        match current.as_slice() {
            [] => Ok(None),
            [registration] => self.teams.get(session, &registration.team_id).await,
            rows => {
                error!(
                    "Player {} has {} current team registrations",
                    player_id,
                    rows.len()
                );
                Err(ServiceError::Integrity(format!(
                    "player {} has {} current team registrations",
                    player_id,
                    rows.len()
                )))
            }
        }
    }
}
