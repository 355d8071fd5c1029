use plapt::engine::config::RunConfig;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorSettings {
    pub endpoint: String,
    pub batch_size: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub run: RunConfig,
    pub predictor: PredictorSettings,
}
