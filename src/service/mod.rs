pub mod entity;
pub mod error;
pub mod fixture;
pub mod league;
pub mod orchestrator;
pub mod player;
pub mod team;

use crate::models::fixture::Standing;
use entity::{EntityService, Pagination};
use fixture::FixtureService;
use league::LeagueService;
use player::PlayerService;
use team::TeamService;

pub use error::{ServiceError, ServiceResult};

/// Every business service, sharing one pagination policy.
#[derive(Clone, Copy)]
pub struct Services {
    pub pagination: Pagination,
    pub leagues: LeagueService,
    pub teams: TeamService,
    pub players: PlayerService,
    pub fixtures: FixtureService,
    pub standings: EntityService<Standing>,
}

impl Services {
    pub fn new(pagination: Pagination) -> Self {
        Services {
            pagination,
            leagues: LeagueService::new(pagination),
            teams: TeamService::new(pagination),
            players: PlayerService::new(pagination),
            fixtures: FixtureService::new(pagination),
            standings: EntityService::new(pagination),
        }
    }
}
