pub mod features;
pub mod fetch;
pub mod timeline;
pub mod training;

pub use features::{FeaturePipeline, FeatureRow};
pub use fetch::{StatcastFetchPipeline, StorageSummary};
pub use timeline::{TimelineOutput, TimelinePipeline};
pub use training::{TrainingOutcome, TrainingPipeline};
