use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Batch execution configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of items handed to each unit of work; zero means no batches run
    pub batch_size: usize,
    /// Wall-clock budget for the whole call, shared by every batch
    pub deadline: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            deadline: Duration::from_secs(300), // 5 minutes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BatchConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.deadline, Duration::from_secs(300));
    }

    #[test]
    fn test_config_from_json() {
        let config: BatchConfig = serde_json::from_str(
            r#"{"batch_size": 25, "deadline": {"secs": 2, "nanos": 500000000}}"#,
        )
        .expect("config should deserialize");

        assert_eq!(config.batch_size, 25);
        assert_eq!(config.deadline, Duration::from_millis(2500));
    }
}
