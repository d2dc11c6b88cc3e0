use chrono::{Duration, Utc};
use engine::leaderboard::build_leaderboard;
use engine::types::SessionStatus;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use crate::common::{TestApp, honest_payload, now, romaji_run};
use server::entity::session;
use server::realtime::leaderboard_channel;

/// Insert a terminal session row directly, bypassing the store.
async fn seed_session(
    app: &TestApp,
    contest_id: Uuid,
    prompt_id: Uuid,
    user_id: Uuid,
    status: SessionStatus,
    score: i32,
    accuracy: f64,
    cpm: f64,
    ended_offset_min: i64,
) -> session::Model {
    let ended = Utc::now() - Duration::hours(2) + Duration::minutes(ended_offset_min);
    session::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        contest_id: Set(contest_id),
        prompt_id: Set(prompt_id),
        started_at: Set(ended - Duration::minutes(1)),
        ended_at: Set(Some(ended)),
        status: Set(status),
        cpm: Set(Some(cpm)),
        wpm: Set(Some(cpm / 5.0)),
        accuracy: Set(Some(accuracy)),
        errors: Set(Some(0)),
        score: Set(Some(score)),
        defocus_count: Set(0),
        paste_blocked: Set(false),
        ..Default::default()
    }
    .insert(&app.db)
    .await
    .expect("Failed to seed session")
}

#[tokio::test]
async fn orders_by_score_accuracy_cpm_and_finish_time() {
    let app = TestApp::spawn().await;
    let (contest, prompt) = app.contest_with_prompt("romaji").await;
    let u1 = app.create_user("u1").await;
    let u2 = app.create_user("u2").await;
    let u3 = app.create_user("u3").await;

    // u1 at 10:00, u2 at 09:50, u3 at 09:55 relative to one another.
    seed_session(&app, contest.id, prompt.id, u1.id, SessionStatus::Finished, 500, 0.95, 400.0, 10).await;
    seed_session(&app, contest.id, prompt.id, u2.id, SessionStatus::Finished, 520, 0.92, 390.0, 0).await;
    seed_session(&app, contest.id, prompt.id, u3.id, SessionStatus::Finished, 500, 0.97, 410.0, 5).await;

    let sessions = app.store.get_leaderboard(contest.id, 100).await.unwrap();
    let board = build_leaderboard(sessions);

    let order: Vec<Uuid> = board.ranked.iter().map(|r| r.session.user_id).collect();
    assert_eq!(order, vec![u2.id, u3.id, u1.id]);
    let ranks: Vec<u32> = board.ranked.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);

    let mine = engine::leaderboard::extract_personal_rank(&board.ranked, u3.id).unwrap();
    assert_eq!(mine.rank, 2);
}

#[tokio::test]
async fn excludes_non_finished_sessions() {
    let app = TestApp::spawn().await;
    let (contest, prompt) = app.contest_with_prompt("romaji").await;
    let finisher = app.create_user("finisher").await;
    let cheat = app.create_user("cheat").await;
    let quitter = app.create_user("quitter").await;

    seed_session(&app, contest.id, prompt.id, finisher.id, SessionStatus::Finished, 100, 0.9, 300.0, 0).await;
    seed_session(&app, contest.id, prompt.id, cheat.id, SessionStatus::Dq, 999, 1.0, 900.0, 1).await;
    seed_session(&app, contest.id, prompt.id, quitter.id, SessionStatus::Expired, 50, 0.5, 100.0, 2).await;

    let sessions = app.store.get_leaderboard(contest.id, 100).await.unwrap();

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].user_id, finisher.id);
    assert_eq!(sessions[0].score, 100);
}

#[tokio::test]
async fn respects_the_row_limit() {
    let app = TestApp::spawn().await;
    let (contest, prompt) = app.contest_with_prompt("romaji").await;

    for i in 0..5 {
        let user = app.create_user("bulk").await;
        seed_session(&app, contest.id, prompt.id, user.id, SessionStatus::Finished, 100 + i, 0.9, 300.0, i as i64).await;
    }

    let sessions = app.store.get_leaderboard(contest.id, 3).await.unwrap();
    assert_eq!(sessions.len(), 3);
    // Highest scores first.
    assert_eq!(sessions[0].score, 104);
}

#[tokio::test]
async fn joins_usernames() {
    let app = TestApp::spawn().await;
    let (contest, prompt) = app.contest_with_prompt("romaji").await;
    let user = app.create_user("visible").await;

    seed_session(&app, contest.id, prompt.id, user.id, SessionStatus::Finished, 100, 0.9, 300.0, 0).await;

    let sessions = app.store.get_leaderboard(contest.id, 100).await.unwrap();
    assert_eq!(sessions[0].username, user.username);
}

#[tokio::test]
async fn unknown_contest_is_not_found() {
    let app = TestApp::spawn().await;
    let err = app
        .store
        .get_leaderboard(Uuid::new_v4(), 100)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn finish_publishes_a_snapshot_after_commit() {
    let app = TestApp::spawn().await;
    let (contest, _) = app.contest_with_prompt("romaji").await;
    let user = app.create_user("alice").await;
    let principal = app.principal(&user);

    let mut rx = app.publisher.subscribe(&leaderboard_channel(contest.id));

    let started = app
        .service
        .start_session(contest.id, &principal, now())
        .await
        .unwrap();
    let payload = honest_payload(romaji_run(), "romaji", true);
    let result = app
        .service
        .finish_session(started.session_id, &principal, &payload, now())
        .await
        .unwrap();
    assert_eq!(result.status, SessionStatus::Finished);

    let snapshot = rx.recv().await.unwrap();
    assert_eq!(snapshot.contest_id, contest.id);
    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.top.len(), 1);
    assert_eq!(snapshot.top[0].session.user_id, user.id);
    assert_eq!(snapshot.top[0].session.score, 83);
}

#[tokio::test]
async fn dq_finish_still_publishes_but_stays_off_the_board() {
    let app = TestApp::spawn().await;
    let admin = app.create_user("admin").await;
    let contest = app
        .create_contest(admin.id, |req| req.allow_backspace = false)
        .await;
    let prompt = app.create_prompt("ab").await;
    app.contests
        .replace_contest_prompts(contest.id, vec![prompt.id])
        .await
        .unwrap();
    let user = app.create_user("alice").await;
    let principal = app.principal(&user);

    let mut rx = app.publisher.subscribe(&leaderboard_channel(contest.id));

    let started = app
        .service
        .start_session(contest.id, &principal, now())
        .await
        .unwrap();
    let events = crate::common::keylog(&[(0.0, "a"), (300.0, "Backspace"), (600.0, "a"), (900.0, "b")]);
    let payload = honest_payload(events, "ab", false);
    let result = app
        .service
        .finish_session(started.session_id, &principal, &payload, now())
        .await
        .unwrap();
    assert_eq!(result.status, SessionStatus::Dq);

    let snapshot = rx.recv().await.unwrap();
    assert_eq!(snapshot.total, 0);
    assert!(snapshot.top.is_empty());
}

#[tokio::test]
async fn leaderboard_view_extracts_the_callers_rank() {
    let app = TestApp::spawn().await;
    let (contest, prompt) = app.contest_with_prompt("romaji").await;
    let u1 = app.create_user("u1").await;
    let u2 = app.create_user("u2").await;

    seed_session(&app, contest.id, prompt.id, u1.id, SessionStatus::Finished, 200, 0.9, 300.0, 0).await;
    seed_session(&app, contest.id, prompt.id, u2.id, SessionStatus::Finished, 100, 0.8, 200.0, 1).await;

    let view = app
        .service
        .leaderboard_view(contest.id, Some(u2.id))
        .await
        .unwrap();

    assert_eq!(view.leaderboard.total, 2);
    assert_eq!(view.personal_rank.unwrap().rank, 2);

    let anonymous = app.service.leaderboard_view(contest.id, None).await.unwrap();
    assert!(anonymous.personal_rank.is_none());
}
