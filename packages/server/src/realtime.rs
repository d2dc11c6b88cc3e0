use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engine::leaderboard::RankedSession;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// The leaderboard state fanned out to subscribers after a finish commits.
#[derive(Clone, Debug, Serialize)]
pub struct LeaderboardSnapshot {
    pub contest_id: Uuid,
    /// First ten rows of the ranked projection.
    pub top: Vec<RankedSession>,
    /// Total finished sessions behind the projection.
    pub total: usize,
    pub generated_at: DateTime<Utc>,
}

/// Channel name for a contest's leaderboard stream.
pub fn leaderboard_channel(contest_id: Uuid) -> String {
    format!("contest:{contest_id}:leaderboard")
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Publish failed: {0}")]
    Backend(String),
}

/// Real-time fan-out seam.
///
/// Publishing happens strictly after the originating transaction commits and
/// is best-effort: a failure here is logged by the caller, never propagated.
#[async_trait]
pub trait SnapshotPublisher: Send + Sync {
    async fn publish(
        &self,
        channel: &str,
        snapshot: &LeaderboardSnapshot,
    ) -> Result<(), PublishError>;
}

/// In-process publisher over tokio broadcast channels, one per channel name.
/// Serves single-node deployments and the test harness.
pub struct BroadcastPublisher {
    capacity: usize,
    channels: Mutex<HashMap<String, broadcast::Sender<LeaderboardSnapshot>>>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to a channel, creating it if needed.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<LeaderboardSnapshot> {
        let mut channels = self.channels.lock().expect("channel map poisoned");
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }
}

#[async_trait]
impl SnapshotPublisher for BroadcastPublisher {
    async fn publish(
        &self,
        channel: &str,
        snapshot: &LeaderboardSnapshot,
    ) -> Result<(), PublishError> {
        let sender = {
            let channels = self.channels.lock().expect("channel map poisoned");
            channels.get(channel).cloned()
        };

        if let Some(sender) = sender {
            // A send error just means nobody is subscribed right now.
            let _ = sender.send(snapshot.clone());
        }
        Ok(())
    }
}
