use crate::adapters::{LocalStorage, Sources};
use crate::app::pipelines::fetch::storage_summary;
use crate::app::pipelines::{FeaturePipeline, StatcastFetchPipeline, TimelinePipeline, TrainingPipeline};
use crate::config::toml_config::{layout, AppConfig};
use crate::core::EtlEngine;
use crate::domain::ports::Storage;
use crate::utils::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Qualifying players, Nth-PA timeline and raw Statcast downloads.
    Download,
    /// Early-career features from the downloaded pitches.
    Features,
    /// Career-outcome model.
    Train,
    /// Download, features and train in order.
    All,
    /// Report what has been downloaded so far.
    Summary,
}

impl Stage {
    pub fn plan(&self) -> Vec<&'static str> {
        match self {
            Stage::Download => vec![
                "find qualifying players (leaderboard + register)",
                "find Nth-PA date per player",
                "download early-career Statcast pitches",
            ],
            Stage::Features => vec!["calculate early-career features"],
            Stage::Train => vec!["train career-outcome model"],
            Stage::All => {
                let mut plan = Stage::Download.plan();
                plan.extend(Stage::Features.plan());
                plan.extend(Stage::Train.plan());
                plan
            }
            Stage::Summary => vec!["summarize downloaded Statcast files"],
        }
    }
}

/// Runs one stage against the configured data directory and returns its main output path.
pub async fn run_stage(stage: Stage, config: &AppConfig, monitor: bool) -> Result<String> {
    let storage = LocalStorage::new(config.paths.data_dir.clone());
    match stage {
        Stage::Download => download(config, storage, monitor).await,
        Stage::Features => {
            EtlEngine::new_with_monitoring(FeaturePipeline::new(storage), monitor)
                .run()
                .await
        }
        Stage::Train => {
            EtlEngine::new_with_monitoring(
                TrainingPipeline::new(storage, config.model.clone()),
                monitor,
            )
            .run()
            .await
        }
        Stage::All => {
            download(config, storage.clone(), monitor).await?;
            EtlEngine::new_with_monitoring(FeaturePipeline::new(storage.clone()), monitor)
                .run()
                .await?;
            EtlEngine::new_with_monitoring(
                TrainingPipeline::new(storage, config.model.clone()),
                monitor,
            )
            .run()
            .await
        }
        Stage::Summary => {
            let summary = storage_summary(&storage).await?;
            println!("🗂️ Statcast storage summary:");
            println!("  Files: {}", summary.num_files);
            println!("  Total size: {:.2} MB", summary.total_size_mb);
            println!("  Average size: {:.2} MB", summary.avg_size_mb);
            Ok(storage.base_path().to_string())
        }
    }
}

async fn download(config: &AppConfig, storage: LocalStorage, monitor: bool) -> Result<String> {
    let sources = Sources::from_config(config)?;
    let timeline = TimelinePipeline::new(
        sources.leaderboard,
        sources.register,
        sources.statcast.clone(),
        storage.clone(),
        config.collection.clone(),
    );
    EtlEngine::new_with_monitoring(timeline, monitor).run().await?;

    let fetch = StatcastFetchPipeline::new(sources.statcast, storage.clone(), config.collection.clone());
    EtlEngine::new_with_monitoring(fetch, monitor).run().await?;

    storage_summary(&storage).await?;
    Ok(storage.full_path(layout::RAW_STATCAST_DIR))
}
