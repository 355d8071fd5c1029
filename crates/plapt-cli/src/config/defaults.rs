use plapt::engine::config::{DEFAULT_LITERAL_LENGTH_THRESHOLD, DEFAULT_PRECISION};

pub struct DefaultsConfig {
    pub endpoint: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub literal_length_threshold: usize,
    pub warn_skipped_residues: bool,
    pub precision: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/predict".to_string(),
            batch_size: 4,
            timeout_secs: 300,
            literal_length_threshold: DEFAULT_LITERAL_LENGTH_THRESHOLD,
            warn_skipped_residues: true,
            precision: DEFAULT_PRECISION,
        }
    }
}
