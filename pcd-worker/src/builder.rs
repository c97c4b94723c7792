use std::sync::Arc;

use pcd_core::pointcloud::stats::StatsConfig;
use pcd_decoder::{DecodeMetrics, Decompressor, StagingHeap};
use serde::{Deserialize, Serialize};

use crate::runner::DecodePipeline;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub stats: StatsConfig,
}

pub struct PipelineBuilder {
    config: PipelineConfig,
    metrics: Option<Arc<DecodeMetrics>>,
    decompressor: Option<Box<dyn Decompressor + Send>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            metrics: None,
            decompressor: None,
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Share counters with other pipelines. A private instance is used otherwise.
    pub fn metrics(mut self, metrics: Arc<DecodeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Decode every request with this library instead of the one named by the request.
    pub fn decompressor(mut self, decompressor: Box<dyn Decompressor + Send>) -> Self {
        self.decompressor = Some(decompressor);
        self
    }

    pub fn build(self) -> DecodePipeline {
        DecodePipeline {
            config: self.config,
            metrics: self.metrics.unwrap_or_default(),
            heap: StagingHeap::new(),
            decompressor: self.decompressor,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_json_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"stats":{"elevation_bin_width":5.0}}"#).unwrap();
        assert_eq!(config.stats.elevation_bin_width, 5.0);
        assert_eq!(config.stats.elevation_key, "z");
        assert_eq!(config.stats.color_bin_width, 10.0);

        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_shared_metrics() {
        let metrics = Arc::new(DecodeMetrics::new());
        let pipeline = PipelineBuilder::new().metrics(metrics.clone()).build();
        assert!(Arc::ptr_eq(pipeline.metrics(), &metrics));
    }
}
