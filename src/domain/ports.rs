use crate::domain::model::{BattingSeason, Pitch, PlayerIdMapping};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
    /// 列出目錄下的檔案名稱與大小（位元組）
    fn list(
        &self,
        dir: &str,
    ) -> impl std::future::Future<Output = Result<Vec<(String, u64)>>> + Send;
    fn full_path(&self, path: &str) -> String;
}

/// Pitch-level Statcast search.
#[async_trait]
pub trait StatcastSource: Send + Sync {
    async fn batter_pitches(
        &self,
        player_id: u32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Pitch>>;
}

/// Season batting leaderboard, one row per player-season.
#[async_trait]
pub trait LeaderboardSource: Send + Sync {
    async fn batting_seasons(&self, start_year: i32, end_year: i32) -> Result<Vec<BattingSeason>>;
}

/// Cross-reference between leaderboard and Statcast player ids.
#[async_trait]
pub trait PlayerRegister: Send + Sync {
    async fn id_mappings(&self) -> Result<Vec<PlayerIdMapping>>;
}

/// Extract → transform → load, run by [`crate::core::etl::EtlEngine`].
#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send;

    fn name(&self) -> &str;
    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}

/// Record count used in engine progress logs.
pub trait Counted {
    fn count(&self) -> usize;
}

impl<T> Counted for Vec<T> {
    fn count(&self) -> usize {
        self.len()
    }
}
