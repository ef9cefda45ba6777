// Adapters layer: concrete implementations of the domain ports (HTTP sources, storage).

pub mod chadwick;
pub mod fangraphs;
pub mod http;
pub mod savant;
pub mod storage;

pub use chadwick::ChadwickRegister;
pub use fangraphs::FangraphsClient;
pub use http::HttpFetcher;
pub use savant::SavantClient;
pub use storage::LocalStorage;

use crate::config::toml_config::AppConfig;
use crate::utils::error::Result;

/// The three live data sources built from one configuration.
pub struct Sources {
    pub statcast: SavantClient,
    pub leaderboard: FangraphsClient,
    pub register: ChadwickRegister,
}

impl Sources {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.sources)?;
        Ok(Self {
            statcast: SavantClient::new(fetcher.clone(), &config.sources.savant_endpoint),
            leaderboard: FangraphsClient::new(fetcher.clone(), &config.sources.fangraphs_endpoint),
            register: ChadwickRegister::new(fetcher, &config.sources.register_endpoint),
        })
    }
}
