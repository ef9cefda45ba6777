use crate::app::pipelines::fetch::load_player_statcast_with_columns;
use crate::config::toml_config::layout;
use crate::core::records::read_records;
use crate::domain::model::TimelineEntry;
use crate::domain::ports::{Pipeline, Storage};
use crate::features::calculator::{BattingFeatures, StatcastFeatureCalculator, FEATURE_NAMES};
use crate::utils::error::{PipelineError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

const METADATA_COLUMNS: [&str; 7] = [
    "player_id",
    "player_name",
    "debut_date",
    "date_reached",
    "n_pa",
    "total_pitches",
    "total_pas",
];

/// One player's early-career feature row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub player_id: u32,
    pub player_name: String,
    pub debut_date: Option<NaiveDate>,
    pub date_reached: Option<NaiveDate>,
    pub n_pa: usize,
    pub total_pitches: usize,
    pub total_pas: usize,
    pub features: BattingFeatures,
}

impl FeatureRow {
    fn record(&self) -> Vec<String> {
        let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        let mut record = vec![
            self.player_id.to_string(),
            self.player_name.clone(),
            date(self.debut_date),
            date(self.date_reached),
            self.n_pa.to_string(),
            self.total_pitches.to_string(),
            self.total_pas.to_string(),
        ];
        record.extend(self.features.values().iter().map(|v| v.to_string()));
        record
    }
}

/// Metadata columns followed by the features under their display names.
pub fn feature_table_csv(rows: &[FeatureRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(METADATA_COLUMNS.iter().chain(FEATURE_NAMES.iter()))?;
    for row in rows {
        writer.write_record(row.record())?;
    }
    writer
        .into_inner()
        .map_err(|e| PipelineError::ProcessingError {
            message: format!("Failed to flush feature table: {}", e),
        })
}

/// Computes features for one stored player; `None` when there is nothing to compute.
pub async fn calculate_player_features<St: Storage>(
    storage: &St,
    player_id: u32,
) -> Result<Option<(BattingFeatures, usize, usize)>> {
    let (pitches, columns) = match load_player_statcast_with_columns(storage, player_id).await {
        Ok(loaded) => loaded,
        Err(PipelineError::DataNotFoundError { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };
    if pitches.is_empty() {
        return Ok(None);
    }

    let mut calculator = StatcastFeatureCalculator::new(&pitches);
    if !columns.iter().any(|c| c == "launch_speed_angle") {
        calculator = calculator.without_barrel_categories();
    }
    Ok(Some((
        calculator.calculate_all_features(),
        calculator.total_pitches(),
        calculator.total_pas(),
    )))
}

/// Early-career batting features for every player the timeline stage found.
pub struct FeaturePipeline<St> {
    storage: St,
}

impl<St: Storage> FeaturePipeline<St> {
    pub fn new(storage: St) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<St: Storage> Pipeline for FeaturePipeline<St> {
    type Extracted = Vec<TimelineEntry>;
    type Transformed = Vec<FeatureRow>;

    fn name(&self) -> &str {
        "early-career-features"
    }

    async fn extract(&self) -> Result<Vec<TimelineEntry>> {
        let timeline: Vec<TimelineEntry> =
            read_records(&self.storage, layout::PLAYER_TIMELINE, "download_data").await?;
        Ok(timeline.into_iter().filter(|t| t.success).collect())
    }

    async fn transform(&self, players: Vec<TimelineEntry>) -> Result<Vec<FeatureRow>> {
        let mut rows = Vec::with_capacity(players.len());
        for (i, entry) in players.iter().enumerate() {
            match calculate_player_features(&self.storage, entry.player_id).await {
                Ok(Some((features, total_pitches, total_pas))) => {
                    tracing::debug!(
                        "[{}/{}] {}: {} PAs, OPS {:.3}",
                        i + 1,
                        players.len(),
                        entry.player_name,
                        total_pas,
                        features.ops
                    );
                    rows.push(FeatureRow {
                        player_id: entry.player_id,
                        player_name: entry.player_name.clone(),
                        debut_date: entry.debut_date,
                        date_reached: entry.date_reached,
                        n_pa: entry.n_pa,
                        total_pitches,
                        total_pas,
                        features,
                    });
                }
                Ok(None) => tracing::warn!(
                    "[{}/{}] No Statcast data for {} ({}), skipping",
                    i + 1,
                    players.len(),
                    entry.player_name,
                    entry.player_id
                ),
                Err(e) => tracing::warn!(
                    "[{}/{}] Could not read Statcast data for {}: {}",
                    i + 1,
                    players.len(),
                    entry.player_name,
                    e
                ),
            }
        }
        tracing::info!("🧮 Features calculated for {}/{} players", rows.len(), players.len());
        Ok(rows)
    }

    async fn load(&self, rows: Vec<FeatureRow>) -> Result<String> {
        let data = feature_table_csv(&rows)?;
        self.storage
            .write_file(layout::EARLY_CAREER_STATS, &data)
            .await?;
        Ok(self.storage.full_path(layout::EARLY_CAREER_STATS))
    }
}
