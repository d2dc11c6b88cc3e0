use crate::error::EngineError;
use crate::issue::Issue;
use crate::payload::FinishPayload;
use crate::policy::EntrySnapshot;
use crate::replay::{self, IntervalStats};
use crate::stats::{self, MetricTolerances, TypingStats};
use crate::types::SessionStatus;

/// Reported error counts may be off by one keystroke either way before we
/// flag them; anything beyond that is a client bug or tampering.
const ERROR_COUNT_TOLERANCE: i64 = 1;

/// Grace added to the contest time limit to absorb network latency on the
/// final keystroke.
const TIME_LIMIT_SLACK_MS: f64 = 1_000.0;

/// Inter-keystroke cadence below this coefficient of variation, sustained
/// over more than this many intervals, reads as scripted input.
const LOW_VARIANCE_CV_THRESHOLD: f64 = 0.1;
const LOW_VARIANCE_MIN_INTERVALS: usize = 10;

/// What the evaluator needs to know about the contest and prompt.
#[derive(Clone, Copy, Debug)]
pub struct EvaluationContext<'a> {
    pub typing_target: &'a str,
    pub allow_backspace: bool,
    pub time_limit_sec: i32,
}

/// Client flags copied through to the session record. Telemetry only.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct SessionFlags {
    pub defocus: u32,
    pub paste_blocked: bool,
    pub anomaly_score: Option<f64>,
}

/// Full verdict over one finish request.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// `Finished`, `Expired` or `Dq`; never `Running`.
    pub status: SessionStatus,
    pub stats: TypingStats,
    pub correct: u32,
    pub mistakes: u32,
    pub duration_ms: f64,
    pub issues: Vec<Issue>,
    pub anomaly: IntervalStats,
    pub flags: SessionFlags,
}

/// Replay the keylog, recompute metrics, and decide the verdict.
///
/// Disqualification happens only on hard evidence (metric mismatch, key
/// flooding, forbidden backspace). Everything else is recorded as an issue
/// and left for review.
pub fn evaluate_session(
    ctx: &EvaluationContext<'_>,
    payload: &FinishPayload,
    entry: Option<&EntrySnapshot>,
) -> Result<Evaluation, EngineError> {
    let mut issues = Vec::new();

    if entry.is_none() {
        push_issue(&mut issues, Issue::EntryNotFound);
    }

    let replay = replay::replay_keylog(ctx.typing_target, &payload.keylog, ctx.allow_backspace);
    for issue in &replay.issues {
        push_issue(&mut issues, *issue);
    }

    let authoritative =
        stats::calculate_typing_stats(replay.correct, replay.mistakes, replay.duration_ms.max(1.0))?;

    // A wholly metric-less payload is an abandoned attempt, not a forged
    // one; the comparison only judges clients that claim numbers.
    let reported = payload.reported();
    if !reported.is_empty() {
        let comparison =
            stats::compare_metrics(&reported, &authoritative, &MetricTolerances::RELAXED);
        if !comparison.ok {
            push_issue(&mut issues, Issue::MetricMismatch);
        }
    }

    if let Some(reported_errors) = payload.errors
        && (reported_errors - i64::from(replay.mistakes)).abs() > ERROR_COUNT_TOLERANCE
    {
        push_issue(&mut issues, Issue::ErrorCountMismatch);
    }

    if !replay.completed && !ctx.typing_target.is_empty() {
        push_issue(&mut issues, Issue::PromptNotCompleted);
    }

    if replay.forbidden_backspace_count > 0 {
        push_issue(&mut issues, Issue::BackspaceForbidden);
    }

    if replay.duration_ms > f64::from(ctx.time_limit_sec) * 1_000.0 + TIME_LIMIT_SLACK_MS {
        push_issue(&mut issues, Issue::TimeLimitExceeded);
    }

    let anomaly = replay::interval_stats(&payload.keylog);
    if anomaly.cv != 0.0
        && anomaly.cv < LOW_VARIANCE_CV_THRESHOLD
        && anomaly.count > LOW_VARIANCE_MIN_INTERVALS
    {
        push_issue(&mut issues, Issue::LowVarianceTyping);
    }

    let status = if issues.iter().any(Issue::is_disqualifying) {
        SessionStatus::Dq
    } else if !replay.completed {
        SessionStatus::Expired
    } else {
        SessionStatus::Finished
    };

    Ok(Evaluation {
        status,
        stats: authoritative,
        correct: replay.correct,
        mistakes: replay.mistakes,
        duration_ms: replay.duration_ms,
        issues,
        anomaly,
        flags: SessionFlags {
            defocus: payload.client_flags.defocus,
            paste_blocked: payload.client_flags.paste_blocked,
            anomaly_score: payload.client_flags.anomaly_score,
        },
    })
}

fn push_issue(issues: &mut Vec<Issue>, issue: Issue) {
    if !issues.contains(&issue) {
        issues.push(issue);
    }
}
