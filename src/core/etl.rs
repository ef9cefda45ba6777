use crate::domain::ports::{Counted, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P> EtlEngine<P>
where
    P: Pipeline,
    P::Extracted: Counted,
    P::Transformed: Counted,
{
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        let stage = self.pipeline.name();
        tracing::info!("🚀 Starting stage '{}'", stage);

        tracing::info!("📥 {}: extracting...", stage);
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("📥 {}: extracted {} records", stage, raw_data.count());
        self.monitor.log_stats(stage, "extract");

        tracing::info!("🔧 {}: transforming...", stage);
        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!("🔧 {}: produced {} records", stage, transformed.count());
        self.monitor.log_stats(stage, "transform");

        tracing::info!("💾 {}: loading...", stage);
        let output_path = self.pipeline.load(transformed).await?;
        tracing::info!("💾 {}: output saved to {}", stage, output_path);
        self.monitor.log_final_stats(stage);

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::PipelineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPipeline {
        loads: AtomicUsize,
        fail_transform: bool,
    }

    #[async_trait::async_trait]
    impl Pipeline for CountingPipeline {
        type Extracted = Vec<u32>;
        type Transformed = Vec<u32>;

        fn name(&self) -> &str {
            "counting"
        }

        async fn extract(&self) -> Result<Vec<u32>> {
            Ok(vec![1, 2, 3])
        }

        async fn transform(&self, data: Vec<u32>) -> Result<Vec<u32>> {
            if self.fail_transform {
                return Err(PipelineError::ProcessingError {
                    message: "boom".to_string(),
                });
            }
            Ok(data.into_iter().map(|v| v * 2).collect())
        }

        async fn load(&self, result: Vec<u32>) -> Result<String> {
            self.loads.fetch_add(result.len(), Ordering::SeqCst);
            Ok("out/result.csv".to_string())
        }
    }

    #[tokio::test]
    async fn test_engine_runs_all_phases() {
        let engine = EtlEngine::new(CountingPipeline {
            loads: AtomicUsize::new(0),
            fail_transform: false,
        });

        let output = engine.run().await.unwrap();

        assert_eq!(output, "out/result.csv");
        assert_eq!(engine.pipeline().loads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_engine_stops_on_error() {
        let engine = EtlEngine::new_with_monitoring(
            CountingPipeline {
                loads: AtomicUsize::new(0),
                fail_transform: true,
            },
            true,
        );

        let result = engine.run().await;

        assert!(matches!(result, Err(PipelineError::ProcessingError { .. })));
        assert_eq!(engine.pipeline().loads.load(Ordering::SeqCst), 0);
    }
}
