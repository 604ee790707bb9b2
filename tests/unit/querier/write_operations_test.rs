// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use crate::unit::helpers::fake_database::{FakeRow, Interaction, Scripted};
    use crate::unit::helpers::recording_builder::{
        ARCHIVE_WEBHOOK, CREATE_AUDIT_ENTRY, CREATE_WEBHOOK, UPDATE_WEBHOOK,
    };
    use crate::unit::helpers::{
        creation_input, sample_webhook, Harness, ACCOUNT_ID, FIXED_EXTERNAL_ID, FIXED_NOW, USER_ID,
    };
    use hookstore::domain::models::audit_log::FieldChangeSummary;
    use hookstore::domain::models::webhook::{WebhookCreationInput, WebhookUpdateInput};
    use hookstore::domain::repositories::webhook_repository::WebhookDataManager;
    use hookstore::utils::context::QueryContext;
    use hookstore::utils::errors::ErrorKind;
    use tokio_util::sync::CancellationToken;

    fn kinds(log: &[Interaction]) -> Vec<&'static str> {
        log.iter()
            .map(|i| match i {
                Interaction::Begin => "begin",
                Interaction::QueryRow { in_tx: true, .. } => "tx_query_row",
                Interaction::QueryRow { .. } => "query_row",
                Interaction::QueryRows { .. } => "query_rows",
                Interaction::Execute { in_tx: true, .. } => "tx_execute",
                Interaction::Execute { .. } => "execute",
                Interaction::CloseRows => "close",
                Interaction::Commit => "commit",
                Interaction::Rollback => "rollback",
            })
            .collect()
    }

    fn script_created_id(h: &Harness, id: i64) {
        h.db.script(CREATE_WEBHOOK, Scripted::Row(Some(FakeRow::scalar(id))));
    }

    #[tokio::test]
    async fn test_create_webhook_commits_insert_and_audit_together() {
        let h = Harness::new();
        script_created_id(&h, 77);
        let input = creation_input();

        let created = h
            .querier
            .create_webhook(&QueryContext::background(), Some(&input), USER_ID)
            .await
            .unwrap();

        assert_eq!(created.id, 77);
        assert_eq!(created.external_id, FIXED_EXTERNAL_ID);
        assert_eq!(created.created_on, FIXED_NOW);
        assert_eq!(created.events, input.events);
        assert_eq!(created.data_types, Vec::<String>::new());
        assert_eq!(created.topics, input.topics);
        assert_eq!(created.last_updated_on, None);

        assert_eq!(
            kinds(&h.db.interactions()),
            vec!["begin", "tx_query_row", "tx_execute", "commit"]
        );
        assert_eq!(h.db.executed_sql(), vec![CREATE_WEBHOOK, CREATE_AUDIT_ENTRY]);

        let stored = &h.builder.creations()[0];
        assert_eq!(stored.external_id, FIXED_EXTERNAL_ID);
        assert_eq!(stored.created_on, FIXED_NOW);

        let audit = &h.builder.audit_entries()[0];
        assert_eq!(audit.event_type, "webhook_created");
        assert_eq!(audit.context["webhook_id"], 77);
        assert_eq!(audit.context["performed_by"], USER_ID);
    }

    #[tokio::test]
    async fn test_create_webhook_rolls_back_when_audit_fails() {
        let h = Harness::new();
        script_created_id(&h, 77);
        h.db.script(CREATE_AUDIT_ENTRY, Scripted::Fail("audit table locked".into()));

        let err = h
            .querier
            .create_webhook(&QueryContext::background(), Some(&creation_input()), USER_ID)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Store);
        assert_eq!(
            kinds(&h.db.interactions()),
            vec!["begin", "tx_query_row", "tx_execute", "rollback"]
        );
        assert_eq!(h.db.count(&Interaction::Commit), 0);
    }

    #[tokio::test]
    async fn test_create_webhook_rolls_back_when_insert_fails() {
        let h = Harness::new();
        h.db.script(CREATE_WEBHOOK, Scripted::Fail("duplicate key".into()));

        let err = h
            .querier
            .create_webhook(&QueryContext::background(), Some(&creation_input()), USER_ID)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Store);
        assert_eq!(
            kinds(&h.db.interactions()),
            vec!["begin", "tx_query_row", "rollback"]
        );
        assert!(h.builder.audit_entries().is_empty());
    }

    #[tokio::test]
    async fn test_create_webhook_without_returned_id_is_internal_error() {
        let h = Harness::new();

        let err = h
            .querier
            .create_webhook(&QueryContext::background(), Some(&creation_input()), USER_ID)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(h.db.count(&Interaction::Rollback), 1);
    }

    #[tokio::test]
    async fn test_create_webhook_rejects_missing_or_invalid_input() {
        let h = Harness::new();
        let ctx = QueryContext::background();

        let err = h.querier.create_webhook(&ctx, None, USER_ID).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NilInput);

        let no_account = WebhookCreationInput {
            belongs_to_account: 0,
            ..creation_input()
        };
        let err = h
            .querier
            .create_webhook(&ctx, Some(&no_account), USER_ID)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidId);

        let bad_topic = WebhookCreationInput {
            topics: vec!["a;b".to_string()],
            ..creation_input()
        };
        let err = h
            .querier
            .create_webhook(&ctx, Some(&bad_topic), USER_ID)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert!(h.db.interactions().is_empty());
    }

    #[tokio::test]
    async fn test_begin_failure_is_transaction_error() {
        let h = Harness::new();
        h.db.fail_begin();

        let err = h
            .querier
            .create_webhook(&QueryContext::background(), Some(&creation_input()), USER_ID)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transaction);
        assert_eq!(kinds(&h.db.interactions()), vec!["begin"]);
    }

    #[tokio::test]
    async fn test_commit_failure_is_transaction_error() {
        let h = Harness::new();
        script_created_id(&h, 77);
        h.db.fail_commit();

        let err = h
            .querier
            .create_webhook(&QueryContext::background(), Some(&creation_input()), USER_ID)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transaction);
        assert!(err.to_string().starts_with("committing transaction"));
    }

    /// 回滚失败只记录日志，返回的仍是原始错误
    #[tokio::test]
    async fn test_rollback_failure_does_not_mask_original_error() {
        let h = Harness::new();
        script_created_id(&h, 77);
        h.db.script(CREATE_AUDIT_ENTRY, Scripted::Fail("audit insert failed".into()));
        h.db.fail_rollback();

        let err = h
            .querier
            .create_webhook(&QueryContext::background(), Some(&creation_input()), USER_ID)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Store);
        assert!(err.to_string().contains("audit insert failed"));
    }

    #[tokio::test]
    async fn test_cancellation_before_commit_rolls_back() {
        let h = Harness::new();
        script_created_id(&h, 77);
        let token = CancellationToken::new();
        h.db.cancel_on(CREATE_WEBHOOK, token.clone());
        let ctx = QueryContext::with_cancellation(token);

        let err = h
            .querier
            .create_webhook(&ctx, Some(&creation_input()), USER_ID)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(h.db.count(&Interaction::Rollback), 1);
        assert_eq!(h.db.count(&Interaction::Commit), 0);
    }

    #[tokio::test]
    async fn test_update_webhook_validation_order() {
        let h = Harness::new();
        let ctx = QueryContext::background();

        let err = h.querier.update_webhook(&ctx, None, USER_ID, &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NilInput);

        let webhook = sample_webhook(5);
        let err = h
            .querier
            .update_webhook(&ctx, Some(&webhook), 0, &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidId);

        assert!(h.db.interactions().is_empty());
    }

    #[tokio::test]
    async fn test_update_webhook_writes_changes_to_audit_log() {
        let h = Harness::new();
        let mut webhook = sample_webhook(5);
        let changes: Vec<FieldChangeSummary> = webhook.update(&WebhookUpdateInput {
            url: Some("https://example.com/v2".to_string()),
            ..WebhookUpdateInput::default()
        });

        h.querier
            .update_webhook(&QueryContext::background(), Some(&webhook), USER_ID, &changes)
            .await
            .unwrap();

        assert_eq!(
            kinds(&h.db.interactions()),
            vec!["begin", "tx_execute", "tx_execute", "commit"]
        );
        assert_eq!(h.db.executed_sql(), vec![UPDATE_WEBHOOK, CREATE_AUDIT_ENTRY]);
        assert_eq!(h.builder.updates()[0].url, "https://example.com/v2");

        let audit = &h.builder.audit_entries()[0];
        assert_eq!(audit.event_type, "webhook_updated");
        assert_eq!(audit.context["account_id"], ACCOUNT_ID);
        assert_eq!(audit.context["changes"][0]["field_name"], "url");
    }

    #[tokio::test]
    async fn test_update_webhook_rolls_back_on_failure() {
        let h = Harness::new();
        h.db.script(UPDATE_WEBHOOK, Scripted::Fail("deadlock".into()));

        let err = h
            .querier
            .update_webhook(&QueryContext::background(), Some(&sample_webhook(5)), USER_ID, &[])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Store);
        assert_eq!(
            kinds(&h.db.interactions()),
            vec!["begin", "tx_execute", "rollback"]
        );
    }

    #[tokio::test]
    async fn test_archive_webhook_requires_all_ids() {
        let h = Harness::new();
        let ctx = QueryContext::background();

        for (webhook_id, account_id, user_id) in [(0, 1, 1), (1, 0, 1), (1, 1, 0)] {
            let err = h
                .querier
                .archive_webhook(&ctx, webhook_id, account_id, user_id)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidId);
        }

        assert!(h.db.interactions().is_empty());
    }

    #[tokio::test]
    async fn test_archive_webhook_commits_with_audit_entry() {
        let h = Harness::new();

        h.querier
            .archive_webhook(&QueryContext::background(), 5, ACCOUNT_ID, USER_ID)
            .await
            .unwrap();

        assert_eq!(
            kinds(&h.db.interactions()),
            vec!["begin", "tx_execute", "tx_execute", "commit"]
        );
        assert_eq!(h.builder.calls_to(ARCHIVE_WEBHOOK)[0].ids, vec![5, ACCOUNT_ID]);

        let audit = &h.builder.audit_entries()[0];
        assert_eq!(audit.event_type, "webhook_archived");
        assert_eq!(audit.context["webhook_id"], 5);
    }

    #[tokio::test]
    async fn test_archive_webhook_audit_failure_rolls_back() {
        let h = Harness::new();
        h.db.script(CREATE_AUDIT_ENTRY, Scripted::Fail("no space left".into()));

        let err = h
            .querier
            .archive_webhook(&QueryContext::background(), 5, ACCOUNT_ID, USER_ID)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Store);
        assert_eq!(h.db.count(&Interaction::Rollback), 1);
        assert_eq!(h.db.count(&Interaction::Commit), 0);
    }
}
