use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::PgPool;

use crate::auth::JwtService;
use crate::config::AppConfig;
use crate::domains::standings::{PointsTableStrategy, StandingsStrategy};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    config: Arc<AppConfig>,
    jwt_service: JwtService,
    standings: Arc<dyn StandingsStrategy>,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        let jwt_service = JwtService::new(&config);

        Self {
            db,
            config: Arc::new(config),
            jwt_service,
            standings: Arc::new(PointsTableStrategy::default()),
        }
    }

    /// Swap the ranking strategy used for group standings.
    pub fn with_standings_strategy(mut self, strategy: Arc<dyn StandingsStrategy>) -> Self {
        self.standings = strategy;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn standings(&self) -> &dyn StandingsStrategy {
        self.standings.as_ref()
    }

    /// Random source for a group draw. A configured seed makes draws reproducible.
    pub fn draw_rng(&self) -> StdRng {
        match self.config.group_shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_seed(rand::random()),
        }
    }
}
