use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Authoritative metrics computed for one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypingStats {
    /// Correct characters per minute.
    pub cpm: f64,
    /// Words per minute (`cpm / 5`).
    pub wpm: f64,
    /// Fraction of correct keystrokes, in `[0, 1]`.
    pub accuracy: f64,
    /// `floor(cpm * accuracy² / 2)`.
    pub score: i32,
}

/// Metrics as reported by the client, field by field optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportedMetrics {
    pub cpm: Option<f64>,
    pub wpm: Option<f64>,
    pub accuracy: Option<f64>,
    pub score: Option<f64>,
}

impl ReportedMetrics {
    /// True when the client reported nothing at all, as a reconnecting
    /// client abandoning its attempt does.
    pub fn is_empty(&self) -> bool {
        self.cpm.is_none() && self.wpm.is_none() && self.accuracy.is_none() && self.score.is_none()
    }
}

/// Per-field absolute tolerances for the reported-vs-authoritative check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricTolerances {
    pub cpm: f64,
    pub wpm: f64,
    pub accuracy: f64,
    pub score: f64,
}

impl MetricTolerances {
    /// Strict defaults for offline comparison.
    pub const DEFAULT: MetricTolerances = MetricTolerances {
        cpm: 1.0,
        wpm: 1.0,
        accuracy: 0.02,
        score: 1.0,
    };

    /// Relaxed tolerances used when judging live finish requests, to forgive
    /// client-side clock skew and network jitter.
    pub const RELAXED: MetricTolerances = MetricTolerances {
        cpm: 1.5,
        wpm: 1.5,
        accuracy: 0.05,
        score: 2.0,
    };
}

/// Outcome of comparing reported metrics against the authoritative ones.
///
/// A missing or NaN reported field yields an infinite delta, so it can never
/// pass the tolerance check.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MetricComparison {
    pub ok: bool,
    pub cpm_delta: f64,
    pub wpm_delta: f64,
    pub accuracy_delta: f64,
    pub score_delta: f64,
}

/// Compute the authoritative metrics for an attempt.
///
/// `elapsed_ms <= 0` degenerates to zero speed with accuracy decided by the
/// mistake count alone. A non-finite `elapsed_ms` is a programmer error.
pub fn calculate_typing_stats(
    correct: u32,
    mistakes: u32,
    elapsed_ms: f64,
) -> Result<TypingStats, EngineError> {
    if !elapsed_ms.is_finite() {
        return Err(EngineError::InvalidArgument(format!(
            "elapsed_ms must be finite, got {elapsed_ms}"
        )));
    }

    if elapsed_ms <= 0.0 {
        return Ok(TypingStats {
            cpm: 0.0,
            wpm: 0.0,
            accuracy: if mistakes == 0 { 1.0 } else { 0.0 },
            score: 0,
        });
    }

    let total = u64::from(correct) + u64::from(mistakes);
    let accuracy = if total == 0 {
        1.0
    } else {
        f64::from(correct) / total as f64
    };

    let elapsed_minutes = elapsed_ms / 60_000.0;
    let cpm = f64::from(correct) / elapsed_minutes;
    let wpm = cpm / 5.0;
    let score = (cpm * accuracy * accuracy / 2.0).floor() as i32;

    Ok(TypingStats {
        cpm,
        wpm,
        accuracy,
        score,
    })
}

/// Compare reported metrics against authoritative ones under the given
/// tolerances, returning per-field absolute deltas.
pub fn compare_metrics(
    reported: &ReportedMetrics,
    authoritative: &TypingStats,
    tolerances: &MetricTolerances,
) -> MetricComparison {
    let cpm_delta = field_delta(reported.cpm, authoritative.cpm);
    let wpm_delta = field_delta(reported.wpm, authoritative.wpm);
    let accuracy_delta = field_delta(reported.accuracy, authoritative.accuracy);
    let score_delta = field_delta(reported.score, f64::from(authoritative.score));

    let ok = cpm_delta <= tolerances.cpm
        && wpm_delta <= tolerances.wpm
        && accuracy_delta <= tolerances.accuracy
        && score_delta <= tolerances.score;

    MetricComparison {
        ok,
        cpm_delta,
        wpm_delta,
        accuracy_delta,
        score_delta,
    }
}

fn field_delta(reported: Option<f64>, authoritative: f64) -> f64 {
    match reported {
        Some(value) if value.is_finite() => (value - authoritative).abs(),
        _ => f64::INFINITY,
    }
}
