use crate::config::toml_config::{layout, CollectionConfig};
use crate::core::records::{from_csv, read_records, to_csv, write_records};
use crate::domain::model::{FetchLogEntry, Pitch, TimelineEntry};
use crate::domain::ports::{Pipeline, StatcastSource, Storage};
use crate::features::timeline::filter_game_types;
use crate::utils::error::{PipelineError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Downloads each successful timeline player's pitches from debut to the Nth PA.
pub struct StatcastFetchPipeline<S, St> {
    statcast: S,
    storage: St,
    collection: CollectionConfig,
}

impl<S: StatcastSource, St: Storage> StatcastFetchPipeline<S, St> {
    pub fn new(statcast: S, storage: St, collection: CollectionConfig) -> Self {
        Self {
            statcast,
            storage,
            collection,
        }
    }

    pub async fn fetch_player_statcast(&self, entry: &TimelineEntry) -> FetchLogEntry {
        let path = layout::player_statcast(entry.player_id);
        let mut log = FetchLogEntry {
            player_id: entry.player_id,
            player_name: entry.player_name.clone(),
            debut_date: entry.debut_date,
            date_reached: entry.date_reached,
            success: false,
            already_exists: false,
            num_pitches: None,
            file_size_mb: None,
            file_path: None,
            error: None,
        };

        if self.storage.exists(&path).await {
            tracing::info!("  ⏭️ Already downloaded: {}", self.storage.full_path(&path));
            log.success = true;
            log.already_exists = true;
            log.file_path = Some(self.storage.full_path(&path));
            return log;
        }

        let (Some(start), Some(end)) = (entry.debut_date, entry.date_reached) else {
            log.error = Some("Missing debut or Nth-PA date".to_string());
            return log;
        };

        match self.download(entry.player_id, start, end, &path).await {
            Ok((num_pitches, bytes)) => {
                let size_mb = bytes as f64 / BYTES_PER_MB;
                tracing::info!("  ✓ {} pitches ({:.2} MB)", num_pitches, size_mb);
                log.success = true;
                log.num_pitches = Some(num_pitches);
                log.file_size_mb = Some(size_mb);
                log.file_path = Some(self.storage.full_path(&path));
            }
            Err(PipelineError::DataNotFoundError { message }) => {
                tracing::warn!("  ✗ {}", message);
                log.error = Some(message);
            }
            Err(e) => {
                tracing::warn!("  ✗ {}", e);
                log.error = Some(e.to_string());
            }
        }
        log
    }

    async fn download(
        &self,
        player_id: u32,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
        path: &str,
    ) -> Result<(usize, usize)> {
        let pitches = self.statcast.batter_pitches(player_id, start, end).await?;
        if pitches.is_empty() {
            return Err(PipelineError::DataNotFoundError {
                message: "No data returned".to_string(),
            });
        }

        let regular = filter_game_types(pitches, &self.collection.fetch_game_types);
        if regular.is_empty() {
            return Err(PipelineError::DataNotFoundError {
                message: "No regular season data".to_string(),
            });
        }

        let data = to_csv(&regular)?;
        self.storage.write_file(path, &data).await?;
        Ok((regular.len(), data.len()))
    }
}

#[async_trait]
impl<S: StatcastSource, St: Storage> Pipeline for StatcastFetchPipeline<S, St> {
    type Extracted = Vec<TimelineEntry>;
    type Transformed = Vec<FetchLogEntry>;

    fn name(&self) -> &str {
        "statcast-fetch"
    }

    async fn extract(&self) -> Result<Vec<TimelineEntry>> {
        let timeline: Vec<TimelineEntry> =
            read_records(&self.storage, layout::PLAYER_TIMELINE, "the player timeline stage").await?;
        Ok(timeline.into_iter().filter(|t| t.success).collect())
    }

    async fn transform(&self, players: Vec<TimelineEntry>) -> Result<Vec<FetchLogEntry>> {
        let mut log = Vec::with_capacity(players.len());
        for (i, entry) in players.iter().enumerate() {
            tracing::info!(
                "[{}/{}] {} ({} → {})",
                i + 1,
                players.len(),
                entry.player_name,
                entry.debut_date.map(|d| d.to_string()).unwrap_or_default(),
                entry.date_reached.map(|d| d.to_string()).unwrap_or_default()
            );
            let result = self.fetch_player_statcast(entry).await;

            // 只有實際下載後才需要等待
            let downloaded = !result.already_exists && result.num_pitches.is_some();
            log.push(result);
            if downloaded && i + 1 < players.len() && self.collection.fetch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.collection.fetch_delay_ms)).await;
            }
        }

        let successful = log.iter().filter(|l| l.success).count();
        let pitches: usize = log.iter().filter_map(|l| l.num_pitches).sum();
        let size_mb: f64 = log.iter().filter_map(|l| l.file_size_mb).sum();
        tracing::info!(
            "📦 {}/{} successful, {} pitches downloaded ({:.2} MB)",
            successful,
            log.len(),
            pitches,
            size_mb
        );
        Ok(log)
    }

    async fn load(&self, log: Vec<FetchLogEntry>) -> Result<String> {
        write_records(&self.storage, layout::FETCH_LOG, &log).await
    }
}

/// Reads one stored player's pitches.
pub async fn load_player_statcast<St: Storage>(storage: &St, player_id: u32) -> Result<Vec<Pitch>> {
    load_player_statcast_with_columns(storage, player_id)
        .await
        .map(|(pitches, _)| pitches)
}

/// Reads one stored player's pitches and the column names the file carries.
pub async fn load_player_statcast_with_columns<St: Storage>(
    storage: &St,
    player_id: u32,
) -> Result<(Vec<Pitch>, Vec<String>)> {
    let path = layout::player_statcast(player_id);
    if !storage.exists(&path).await {
        return Err(PipelineError::DataNotFoundError {
            message: format!("No Statcast data for player {}", player_id),
        });
    }
    let data = storage.read_file(&path).await?;
    let columns = csv::Reader::from_reader(data.as_slice())
        .headers()
        .map(|h| h.iter().map(str::to_string).collect())
        .unwrap_or_default();
    Ok((from_csv(&data)?, columns))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StorageSummary {
    pub num_files: usize,
    pub total_size_mb: f64,
    pub avg_size_mb: f64,
}

pub async fn storage_summary<St: Storage>(storage: &St) -> Result<StorageSummary> {
    let files: Vec<u64> = storage
        .list(layout::RAW_STATCAST_DIR)
        .await?
        .into_iter()
        .filter(|(name, _)| name.starts_with("player_") && name.ends_with(".csv"))
        .map(|(_, size)| size)
        .collect();

    if files.is_empty() {
        tracing::info!(
            "No Statcast files found in {}",
            storage.full_path(layout::RAW_STATCAST_DIR)
        );
        return Ok(StorageSummary::default());
    }

    let total_size_mb = files.iter().sum::<u64>() as f64 / BYTES_PER_MB;
    let summary = StorageSummary {
        num_files: files.len(),
        total_size_mb,
        avg_size_mb: total_size_mb / files.len() as f64,
    };
    tracing::info!(
        "🗂️ {} player files, {:.2} MB total, {:.2} MB average",
        summary.num_files,
        summary.total_size_mb,
        summary.avg_size_mb
    );
    Ok(summary)
}
