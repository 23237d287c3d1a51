use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub broker: MessageBrokerConfig,
    /// Number of worker tasks draining the handoff channel.
    pub worker_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageBrokerConfig {
    pub endpoint: String,
    pub topic: String,
    pub group_id: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            broker: MessageBrokerConfig {
                endpoint: std::env::var("MESSAGE_BROKER_ENDPOINT")
                    .unwrap_or_else(|_| "localhost:9094".to_string()),
                topic: std::env::var("MESSAGE_BROKER_TOPIC")
                    .unwrap_or_else(|_| "product-events".to_string()),
                group_id: std::env::var("CONSUMER_GROUP_ID")
                    .unwrap_or_else(|_| "notifications-group".to_string()),
            },
            worker_count: std::env::var("CONSUMER_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or_else(num_cpus::get),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        // Scoped to variables this test does not set; from_env falls back.
        let config = Config::from_env();
        assert!(!config.broker.topic.is_empty());
        assert!(!config.broker.group_id.is_empty());
        assert!(config.worker_count > 0);
    }
}
