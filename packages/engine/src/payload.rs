use serde::{Deserialize, Serialize};

use crate::stats::ReportedMetrics;

/// One keystroke event as submitted by the client.
///
/// Clients send arbitrary JSON objects here; only the fields below are
/// meaningful and unknown fields are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Milliseconds since the client-side start of the attempt.
    pub t: f64,
    /// The key value, usually a single character or a named key.
    pub k: String,
    /// Client-side correctness hint; never trusted, persisted as telemetry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
}

/// Untrusted client-side signals, passed through for operational telemetry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFlags {
    /// How many times the typing surface lost focus.
    #[serde(default)]
    pub defocus: u32,
    /// Whether the client blocked a paste attempt.
    #[serde(default)]
    pub paste_blocked: bool,
    /// Client-computed anomaly score, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_score: Option<f64>,
}

/// Body of a finish-session request.
///
/// The reported metrics are compared against the authoritative replay;
/// absent fields count as an automatic mismatch on that field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishPayload {
    #[serde(default)]
    pub cpm: Option<f64>,
    #[serde(default)]
    pub wpm: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
    /// Client-reported mistake count.
    #[serde(default)]
    pub errors: Option<i64>,
    #[serde(default)]
    pub keylog: Vec<KeyEvent>,
    #[serde(default)]
    pub client_flags: ClientFlags,
}

impl FinishPayload {
    /// The client-reported metric quadruple, for tolerance comparison.
    pub fn reported(&self) -> ReportedMetrics {
        ReportedMetrics {
            cpm: self.cpm,
            wpm: self.wpm,
            accuracy: self.accuracy,
            score: self.score,
        }
    }
}
