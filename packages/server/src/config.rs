use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeConfig {
    /// Buffered snapshots per leaderboard channel before slow subscribers
    /// start lagging. Default: 64.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LeaderboardConfig {
    /// Maximum sessions fetched per leaderboard read. Default: 100.
    #[serde(default = "default_leaderboard_limit")]
    pub limit: u64,
}

fn default_leaderboard_limit() -> u64 {
    100
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            limit: default_leaderboard_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("realtime.channel_capacity", 64_i64)?
            .set_default("leaderboard.limit", 100_i64)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., KEYRACE__DATABASE__URL)
            .add_source(Environment::with_prefix("KEYRACE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
