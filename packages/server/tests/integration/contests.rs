use chrono::Utc;
use engine::types::Visibility;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::common::{TestApp, base_contest_request, honest_payload, now, romaji_run};
use server::entity::{contest, contest_prompt, entry, keystroke, session};
use server::models::contest::{ContestResponse, UpdateContestRequest};

mod contest_creation {
    use super::*;

    #[tokio::test]
    async fn private_contest_gets_a_generated_join_code() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;

        let created = app
            .create_contest(admin.id, |req| {
                req.visibility = Visibility::Private;
                req.join_code = None;
            })
            .await;

        let code = created.join_code.expect("private contest must carry a join code");
        assert_eq!(code.len(), 8);
    }

    #[tokio::test]
    async fn explicit_join_code_is_kept() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;

        let created = app
            .create_contest(admin.id, |req| {
                req.visibility = Visibility::Private;
                req.join_code = Some("TYPEFAST".into());
            })
            .await;

        assert_eq!(created.join_code.as_deref(), Some("TYPEFAST"));
    }

    #[tokio::test]
    async fn public_contest_carries_no_join_code() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;

        let created = app
            .create_contest(admin.id, |req| {
                req.join_code = Some("IGNORED1".into());
            })
            .await;

        assert_eq!(created.join_code, None);
    }

    #[tokio::test]
    async fn response_mapping_carries_all_fields() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app
            .create_contest(admin.id, |req| req.max_attempts = Some(3))
            .await;

        let response = ContestResponse::from(created.clone());

        assert_eq!(response.id, created.id);
        assert_eq!(response.title, created.title);
        assert_eq!(response.max_attempts, Some(3));
        assert_eq!(response.created_by, admin.id);
        assert_eq!(response.time_limit_sec, created.time_limit_sec);
    }

    #[tokio::test]
    async fn rejects_inverted_time_window() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;

        let mut req = base_contest_request();
        std::mem::swap(&mut req.starts_at, &mut req.ends_at);
        let err = app
            .contests
            .create_contest(req, admin.id, Utc::now())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn rejects_out_of_range_time_limit() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;

        let mut req = base_contest_request();
        req.time_limit_sec = 5;
        let err = app
            .contests
            .create_contest(req, admin.id, Utc::now())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VALIDATION");
    }
}

mod contest_update {
    use super::*;

    #[tokio::test]
    async fn patches_only_provided_fields() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app.create_contest(admin.id, |_| {}).await;

        let updated = app
            .contests
            .update_contest(
                created.id,
                UpdateContestRequest {
                    title: Some("  Renamed  ".into()),
                    max_attempts: Some(Some(5)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.max_attempts, Some(5));
        assert_eq!(updated.time_limit_sec, created.time_limit_sec);
    }

    #[tokio::test]
    async fn cross_field_window_is_validated_against_stored_values() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app.create_contest(admin.id, |_| {}).await;

        // Moving only ends_at before the stored starts_at must fail.
        let err = app
            .contests
            .update_contest(
                created.id,
                UpdateContestRequest {
                    ends_at: Some(created.starts_at - chrono::Duration::minutes(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn clearing_the_join_code_of_a_private_contest_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app
            .create_contest(admin.id, |req| {
                req.visibility = Visibility::Private;
                req.join_code = Some("TYPEFAST".into());
            })
            .await;

        for cleared in [Some(None), Some(Some("   ".to_string()))] {
            let err = app
                .contests
                .update_contest(
                    created.id,
                    UpdateContestRequest {
                        join_code: cleared,
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err();
            assert_eq!(err.code(), "VALIDATION");
        }
    }

    #[tokio::test]
    async fn private_contest_can_rotate_its_join_code() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app
            .create_contest(admin.id, |req| {
                req.visibility = Visibility::Private;
                req.join_code = Some("TYPEFAST".into());
            })
            .await;

        let updated = app
            .contests
            .update_contest(
                created.id,
                UpdateContestRequest {
                    join_code: Some(Some("NEWCODE2".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.join_code.as_deref(), Some("NEWCODE2"));
    }

    #[tokio::test]
    async fn public_contest_cannot_gain_a_join_code() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app.create_contest(admin.id, |_| {}).await;

        let err = app
            .contests
            .update_contest(
                created.id,
                UpdateContestRequest {
                    join_code: Some(Some("SNEAKY11".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VALIDATION");
    }

    #[tokio::test]
    async fn empty_patch_returns_current_state() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app.create_contest(admin.id, |_| {}).await;

        let unchanged = app
            .contests
            .update_contest(created.id, UpdateContestRequest::default())
            .await
            .unwrap();

        assert_eq!(unchanged.title, created.title);
    }

    #[tokio::test]
    async fn unknown_contest_is_not_found() {
        let app = TestApp::spawn().await;
        let err = app
            .contests
            .update_contest(
                Uuid::new_v4(),
                UpdateContestRequest {
                    title: Some("x".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}

mod prompt_set {
    use super::*;

    #[tokio::test]
    async fn replace_assigns_order_by_position() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app.create_contest(admin.id, |_| {}).await;
        let a = app.create_prompt("aaa").await;
        let b = app.create_prompt("bbb").await;
        let c = app.create_prompt("ccc").await;

        app.contests
            .replace_contest_prompts(created.id, vec![b.id, c.id, a.id])
            .await
            .unwrap();

        let links = contest_prompt::Entity::find()
            .filter(contest_prompt::Column::ContestId.eq(created.id))
            .order_by_asc(contest_prompt::Column::OrderIndex)
            .all(&app.db)
            .await
            .unwrap();

        let ordered: Vec<Uuid> = links.iter().map(|l| l.prompt_id).collect();
        assert_eq!(ordered, vec![b.id, c.id, a.id]);
        assert_eq!(links[0].order_index, 0);
        assert_eq!(links[2].order_index, 2);
    }

    #[tokio::test]
    async fn replace_swaps_the_whole_set() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app.create_contest(admin.id, |_| {}).await;
        let a = app.create_prompt("aaa").await;
        let b = app.create_prompt("bbb").await;

        app.contests
            .replace_contest_prompts(created.id, vec![a.id])
            .await
            .unwrap();
        app.contests
            .replace_contest_prompts(created.id, vec![b.id])
            .await
            .unwrap();

        let links = contest_prompt::Entity::find()
            .filter(contest_prompt::Column::ContestId.eq(created.id))
            .all(&app.db)
            .await
            .unwrap();

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].prompt_id, b.id);
    }

    #[tokio::test]
    async fn unknown_prompt_ids_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app.create_contest(admin.id, |_| {}).await;
        let a = app.create_prompt("aaa").await;

        let err = app
            .contests
            .replace_contest_prompts(created.id, vec![a.id, Uuid::new_v4()])
            .await
            .unwrap_err();

        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn duplicate_prompt_ids_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app.create_contest(admin.id, |_| {}).await;
        let a = app.create_prompt("aaa").await;

        let err = app
            .contests
            .replace_contest_prompts(created.id, vec![a.id, a.id])
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VALIDATION");
    }
}

mod contest_deletion {
    use super::*;

    #[tokio::test]
    async fn cascades_to_sessions_entries_and_keystrokes() {
        let app = TestApp::spawn().await;
        let (created, _) = app.contest_with_prompt("romaji").await;
        let user = app.create_user("alice").await;
        let principal = app.principal(&user);

        let started = app
            .store
            .start_session(created.id, &principal, now())
            .await
            .unwrap();
        let payload = honest_payload(romaji_run(), "romaji", true);
        app.store
            .finish_session(started.session_id, &principal, &payload, now())
            .await
            .unwrap();

        app.contests.delete_contest(created.id).await.unwrap();

        assert!(
            contest::Entity::find_by_id(created.id)
                .one(&app.db)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(
            session::Entity::find()
                .filter(session::Column::ContestId.eq(created.id))
                .count(&app.db)
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            entry::Entity::find()
                .filter(entry::Column::ContestId.eq(created.id))
                .count(&app.db)
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            keystroke::Entity::find()
                .filter(keystroke::Column::SessionId.eq(started.session_id))
                .count(&app.db)
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            contest_prompt::Entity::find()
                .filter(contest_prompt::Column::ContestId.eq(created.id))
                .count(&app.db)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_user("admin").await;
        let created = app.create_contest(admin.id, |_| {}).await;

        app.contests.delete_contest(created.id).await.unwrap();
        let err = app.contests.delete_contest(created.id).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
