use std::time::Duration;

use crate::reaper::TimeoutPolicy;

#[derive(Clone, Copy, Debug)]
pub struct ServerConfig {
    pub http_port: u16,
    pub reaper_interval: Duration,
    pub inactivity_threshold: Duration,
    pub timeout_policy: TimeoutPolicy,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let http_port = std::env::var("TTT_HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .expect("TTT_HTTP_PORT must be a valid u16");

        let reaper_interval_secs = std::env::var("TTT_REAPER_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .expect("TTT_REAPER_INTERVAL_SECS must be a valid u64");

        let inactivity_threshold_secs = std::env::var("TTT_INACTIVITY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .expect("TTT_INACTIVITY_TIMEOUT_SECS must be a valid u64");

        let timeout_policy = match std::env::var("TTT_TIMEOUT_POLICY") {
            Ok(raw) => TimeoutPolicy::parse(&raw)
                .expect("TTT_TIMEOUT_POLICY must be one of: request, move, either"),
            Err(_) => TimeoutPolicy::Either,
        };

        Self {
            http_port,
            reaper_interval: Duration::from_secs(reaper_interval_secs),
            inactivity_threshold: Duration::from_secs(inactivity_threshold_secs),
            timeout_policy,
        }
    }
}
