use unicode_normalization::UnicodeNormalization;

use crate::issue::Issue;
use crate::payload::KeyEvent;

/// Hard cap on keystrokes considered per attempt.
pub const KEYLOG_LIMIT: usize = 2_000;

/// Key values treated as a backspace, covering the aliases different client
/// versions have emitted.
const BACKSPACE_ALIASES: &[&str] = &["Backspace", "BACKSPACE", "BackspaceKey", "KeyBackspace"];

/// Result of replaying a keylog against a typing target.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayOutcome {
    /// Final cursor position: count of correctly reproduced code points.
    pub correct: u32,
    pub mistakes: u32,
    /// True iff the cursor reached the end of the target (vacuously true for
    /// an empty target).
    pub completed: bool,
    /// `max(0, last_t - first_t)` over the sanitized timestamps.
    pub duration_ms: f64,
    pub issues: Vec<Issue>,
    /// Backspaces pressed while the contest forbids them.
    pub forbidden_backspace_count: u32,
    /// Number of submitted keylog entries, including skipped ones.
    pub processed: usize,
}

/// Summary statistics over inter-keystroke intervals.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct IntervalStats {
    pub mean: f64,
    pub stdev: f64,
    /// Coefficient of variation; `+inf` when the mean is zero.
    pub cv: f64,
    pub count: usize,
}

/// Replay a timestamped keystroke sequence against the target string.
///
/// The target is indexed as a sequence of NFC-normalized code points, so a
/// combining sequence the client submits decomposed still matches. Invalid
/// timestamps are skipped with an issue recorded; out-of-order timestamps
/// are clamped to the running maximum and flagged once.
pub fn replay_keylog(typing_target: &str, keylog: &[KeyEvent], allow_backspace: bool) -> ReplayOutcome {
    let target: Vec<char> = typing_target.nfc().collect();

    let mut issues = Vec::new();
    if keylog.len() > KEYLOG_LIMIT {
        note(&mut issues, Issue::KeyLimitExceeded);
    }

    let mut cursor: usize = 0;
    let mut mistakes: u32 = 0;
    let mut forbidden_backspace_count: u32 = 0;
    let mut first_time: Option<f64> = None;
    let mut last_time: Option<f64> = None;

    for event in keylog {
        if !event.t.is_finite() {
            note(&mut issues, Issue::InvalidTimestamp);
            continue;
        }
        if event.t < 0.0 {
            note(&mut issues, Issue::NegativeTimestamp);
            continue;
        }

        let t = match last_time {
            Some(previous) if event.t < previous => {
                note(&mut issues, Issue::TimestampNotSorted);
                previous
            }
            _ => event.t,
        };
        first_time.get_or_insert(t);
        last_time = Some(t);

        if is_backspace(&event.k) {
            if allow_backspace {
                cursor = cursor.saturating_sub(1);
            } else {
                mistakes += 1;
                forbidden_backspace_count += 1;
            }
        } else if cursor >= target.len() {
            // Typing past the end of the target.
            mistakes += 1;
        } else if key_matches(&event.k, target[cursor]) {
            cursor += 1;
        } else {
            mistakes += 1;
        }
    }

    let duration_ms = match (first_time, last_time) {
        (Some(first), Some(last)) => (last - first).max(0.0),
        _ => 0.0,
    };

    ReplayOutcome {
        correct: cursor as u32,
        mistakes,
        completed: cursor >= target.len(),
        duration_ms,
        issues,
        forbidden_backspace_count,
        processed: keylog.len(),
    }
}

/// Interval statistics over consecutive timestamp deltas.
///
/// Deltas are clamped non-negative; non-finite timestamps are ignored. With
/// fewer than two usable entries everything is zero and `count` reflects the
/// raw keylog length.
pub fn interval_stats(keylog: &[KeyEvent]) -> IntervalStats {
    let times: Vec<f64> = keylog.iter().map(|e| e.t).filter(|t| t.is_finite()).collect();

    if times.len() < 2 {
        return IntervalStats {
            count: keylog.len().saturating_sub(1),
            ..IntervalStats::default()
        };
    }

    let deltas: Vec<f64> = times.windows(2).map(|w| (w[1] - w[0]).max(0.0)).collect();
    let count = deltas.len();
    let mean = deltas.iter().sum::<f64>() / count as f64;
    let variance = deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / count as f64;
    let stdev = variance.sqrt();
    let cv = if mean == 0.0 { f64::INFINITY } else { stdev / mean };

    IntervalStats {
        mean,
        stdev,
        cv,
        count,
    }
}

fn is_backspace(key: &str) -> bool {
    BACKSPACE_ALIASES.contains(&key)
}

fn key_matches(key: &str, expected: char) -> bool {
    let mut normalized = key.nfc();
    normalized.next() == Some(expected) && normalized.next().is_none()
}

fn note(issues: &mut Vec<Issue>, issue: Issue) {
    if !issues.contains(&issue) {
        issues.push(issue);
    }
}
