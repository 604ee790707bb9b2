// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audit_log::{AuditLogEntry, FieldChangeSummary};
use crate::domain::models::webhook::{
    QueryFilter, Webhook, WebhookCreationInput, WebhookDatabaseCreationInput, WebhookList,
};
use crate::domain::repositories::webhook_repository::WebhookDataManager;
use crate::domain::services::audit::{
    build_webhook_archive_event_entry, build_webhook_creation_event_entry,
    build_webhook_update_event_entry,
};
use crate::infrastructure::database::store::{ResultIterator, RowReader};
use crate::infrastructure::querier::audit_log_entries::scan_audit_log_entries;
use crate::infrastructure::querier::{scan_rows, ColumnCursor, SqlQuerier};
use crate::infrastructure::querybuilding::{
    COUNT_COLUMNS, DATA_TYPES_SEPARATOR, EVENTS_SEPARATOR, TOPICS_SEPARATOR,
    WEBHOOKS_TABLE_COLUMNS,
};
use crate::utils::context::QueryContext;
use crate::utils::errors::QuerierError;
use crate::utils::telemetry::{
    attach_account_id_to_span, attach_query_filter_to_span, attach_requester_id_to_span,
    attach_webhook_id_to_span, prepare_error,
};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::field::Empty;
use tracing::Instrument;
use validator::Validate;

/// 扫描一行Webhook
///
/// 返回 `(webhook, filtered_count, total_count)`；`include_counts` 为假时两个计数为 0。
pub fn scan_webhook(
    row: &dyn RowReader,
    include_counts: bool,
) -> Result<(Webhook, u64, u64), QuerierError> {
    let mut columns = ColumnCursor::new(row, &WEBHOOKS_TABLE_COLUMNS, 0);

    let webhook = Webhook {
        id: columns.next_u64()?,
        external_id: columns.next_string()?,
        name: columns.next_string()?,
        content_type: columns.next_string()?,
        url: columns.next_string()?,
        method: columns.next_string()?,
        events: columns.next_delimited(EVENTS_SEPARATOR)?,
        data_types: columns.next_delimited(DATA_TYPES_SEPARATOR)?,
        topics: columns.next_delimited(TOPICS_SEPARATOR)?,
        created_on: columns.next_u64()?,
        last_updated_on: columns.next_optional_u64()?,
        archived_on: columns.next_optional_u64()?,
        belongs_to_account: columns.next_u64()?,
    };

    if !include_counts {
        return Ok((webhook, 0, 0));
    }

    let mut counts = ColumnCursor::new(row, &COUNT_COLUMNS, WEBHOOKS_TABLE_COLUMNS.len());
    let filtered_count = counts.next_u64()?;
    let total_count = counts.next_u64()?;

    Ok((webhook, filtered_count, total_count))
}

/// 扫描Webhook结果集
///
/// 计数取自第一行；结果集在所有路径上都会被关闭。
pub async fn scan_webhooks(
    rows: Box<dyn ResultIterator>,
    include_counts: bool,
) -> Result<(Vec<Webhook>, u64, u64), QuerierError> {
    let scanned = scan_rows(rows, |row| scan_webhook(row, include_counts)).await?;

    let (filtered_count, total_count) = scanned
        .first()
        .map(|(_, filtered, total)| (*filtered, *total))
        .unwrap_or_default();
    let webhooks = scanned.into_iter().map(|(webhook, _, _)| webhook).collect();

    Ok((webhooks, filtered_count, total_count))
}

impl SqlQuerier {
    /// 读取一个ID窗口内的Webhook并发送到通道
    ///
    /// 窗口为空时跳过；其他失败只记录日志。
    async fn stream_webhook_window(
        &self,
        ctx: QueryContext,
        begin_id: u64,
        end_id: u64,
        results: mpsc::Sender<Vec<Webhook>>,
    ) {
        let (sql, args) = self
            .builder
            .build_get_batch_of_webhooks_query(begin_id, end_id);

        let rows = match self
            .perform_read_query(&ctx, "webhooks batch", &sql, args)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(error = %e, begin_id, end_id, "querying for batch of webhooks");
                return;
            }
        };

        let webhooks = match scan_webhooks(rows, false).await {
            Ok((webhooks, _, _)) => webhooks,
            Err(e) => {
                tracing::error!(error = %e, begin_id, end_id, "scanning batch of webhooks");
                return;
            }
        };

        if webhooks.is_empty() {
            tracing::debug!(begin_id, end_id, "no webhooks in window");
            return;
        }

        let count = webhooks.len();
        match ctx.run(results.send(webhooks)).await {
            Ok(Ok(())) => tracing::debug!(begin_id, end_id, count, "batch of webhooks sent"),
            Ok(Err(_)) => tracing::warn!(begin_id, end_id, "batch receiver dropped"),
            Err(e) => tracing::warn!(error = %e, begin_id, end_id, "sending batch of webhooks"),
        }
    }
}

#[async_trait]
impl WebhookDataManager for SqlQuerier {
    #[tracing::instrument(skip_all, fields(account_id = Empty, webhook_id = Empty))]
    async fn get_webhook(
        &self,
        ctx: &QueryContext,
        webhook_id: u64,
        account_id: u64,
    ) -> Result<Webhook, QuerierError> {
        if webhook_id == 0 || account_id == 0 {
            return Err(prepare_error(QuerierError::InvalidId, "fetching webhook"));
        }
        attach_webhook_id_to_span(webhook_id);
        attach_account_id_to_span(account_id);

        let (sql, args) = self.builder.build_get_webhook_query(webhook_id, account_id);

        let row = self
            .get_one_row(ctx, "webhook", &sql, args)
            .await
            .map_err(|e| prepare_error(e, "fetching webhook"))?;

        let (webhook, _, _) =
            scan_webhook(row.as_ref(), false).map_err(|e| prepare_error(e, "scanning webhook"))?;

        tracing::debug!("webhook fetched");
        Ok(webhook)
    }

    #[tracing::instrument(skip_all)]
    async fn get_all_webhooks_count(&self, ctx: &QueryContext) -> Result<u64, QuerierError> {
        let (sql, args) = self.builder.build_get_all_webhooks_count_query();

        let count = self
            .perform_count_query(ctx, &sql, args)
            .await
            .map_err(|e| prepare_error(e, "fetching count of webhooks"))?;

        tracing::debug!(count, "webhooks counted");
        Ok(count)
    }

    #[tracing::instrument(skip_all, fields(account_id = Empty, query_filter = Empty))]
    async fn get_webhooks(
        &self,
        ctx: &QueryContext,
        account_id: u64,
        filter: Option<&QueryFilter>,
    ) -> Result<WebhookList, QuerierError> {
        if account_id == 0 {
            return Err(prepare_error(QuerierError::InvalidId, "fetching webhooks"));
        }
        if let Some(filter) = filter {
            filter.validate().map_err(|e| {
                prepare_error(QuerierError::InvalidInput(e.to_string()), "fetching webhooks")
            })?;
        }
        attach_account_id_to_span(account_id);
        attach_query_filter_to_span(filter);

        let (sql, args) = self.builder.build_get_webhooks_query(account_id, filter);

        let rows = self
            .perform_read_query(ctx, "webhooks", &sql, args)
            .await
            .map_err(|e| prepare_error(e, "fetching webhooks"))?;

        let (webhooks, filtered_count, total_count) = scan_webhooks(rows, true)
            .await
            .map_err(|e| prepare_error(e, "scanning webhooks"))?;

        let (page, limit) = filter.map(|f| (f.page, f.limit)).unwrap_or_default();

        tracing::debug!(count = webhooks.len(), filtered_count, total_count, "webhooks fetched");
        Ok(WebhookList {
            webhooks,
            page,
            limit,
            filtered_count,
            total_count,
        })
    }

    #[tracing::instrument(skip_all, fields(batch_size = Empty))]
    async fn get_all_webhooks(
        &self,
        ctx: &QueryContext,
        results: Option<mpsc::Sender<Vec<Webhook>>>,
        batch_size: u16,
    ) -> Result<(), QuerierError> {
        let Some(results) = results else {
            return Err(prepare_error(
                QuerierError::NilInput("results channel"),
                "fetching all webhooks",
            ));
        };

        let batch_size = self.effective_batch_size(batch_size);
        tracing::Span::current().record("batch_size", batch_size);

        let count = self.get_all_webhooks_count(ctx).await?;

        let mut begin_id = 1;
        let mut windows = 0u64;
        while begin_id <= count {
            let end_id = begin_id + batch_size;
            let querier = self.clone();
            let window_ctx = ctx.child();
            let results = results.clone();

            tokio::spawn(
                async move {
                    querier
                        .stream_webhook_window(window_ctx, begin_id, end_id, results)
                        .await
                }
                .in_current_span(),
            );

            windows += 1;
            begin_id = end_id;
        }

        tracing::debug!(count, windows, "webhook batch queries spawned");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(account_id = Empty, webhook_id = Empty, requester_id = Empty))]
    async fn create_webhook(
        &self,
        ctx: &QueryContext,
        input: Option<&WebhookCreationInput>,
        created_by_user: u64,
    ) -> Result<Webhook, QuerierError> {
        let Some(input) = input else {
            return Err(prepare_error(
                QuerierError::NilInput("webhook creation input"),
                "creating webhook",
            ));
        };
        input
            .validate_input()
            .map_err(|e| prepare_error(e, "creating webhook"))?;
        attach_account_id_to_span(input.belongs_to_account);
        attach_requester_id_to_span(created_by_user);

        let creation = WebhookDatabaseCreationInput::from_input(
            input,
            self.external_ids.new_external_id(),
            self.clock.now(),
        );
        let (sql, args) = self.builder.build_create_webhook_query(&creation);

        let tx = self
            .begin_transaction(ctx)
            .await
            .map_err(|e| prepare_error(e, "beginning transaction"))?;

        let id = match self
            .perform_write_query(ctx, tx.as_ref(), true, "webhook creation", &sql, args)
            .await
        {
            Ok(id) => id,
            Err(e) => return Err(self.abort_transaction(tx, e, "creating webhook").await),
        };
        attach_webhook_id_to_span(id);

        let webhook = creation.into_webhook(id);
        let entry = build_webhook_creation_event_entry(&webhook, created_by_user);
        if let Err(e) = self
            .create_audit_log_entry_in_transaction(ctx, tx.as_ref(), &entry)
            .await
        {
            return Err(self
                .abort_transaction(tx, e, "writing webhook creation audit log entry")
                .await);
        }

        self.commit_transaction(ctx, tx)
            .await
            .map_err(|e| prepare_error(e, "committing transaction"))?;

        tracing::debug!("webhook created");
        Ok(webhook)
    }

    #[tracing::instrument(skip_all, fields(account_id = Empty, webhook_id = Empty, requester_id = Empty))]
    async fn update_webhook(
        &self,
        ctx: &QueryContext,
        updated: Option<&Webhook>,
        changed_by_user: u64,
        changes: &[FieldChangeSummary],
    ) -> Result<(), QuerierError> {
        let Some(updated) = updated else {
            return Err(prepare_error(
                QuerierError::NilInput("updated webhook"),
                "updating webhook",
            ));
        };
        if changed_by_user == 0 {
            return Err(prepare_error(QuerierError::InvalidId, "updating webhook"));
        }
        updated
            .validate_for_storage()
            .map_err(|e| prepare_error(e, "updating webhook"))?;
        attach_webhook_id_to_span(updated.id);
        attach_account_id_to_span(updated.belongs_to_account);
        attach_requester_id_to_span(changed_by_user);

        let (sql, args) = self.builder.build_update_webhook_query(updated);

        let tx = self
            .begin_transaction(ctx)
            .await
            .map_err(|e| prepare_error(e, "beginning transaction"))?;

        if let Err(e) = self
            .perform_write_query_ignoring_return(ctx, tx.as_ref(), "webhook update", &sql, args)
            .await
        {
            return Err(self.abort_transaction(tx, e, "updating webhook").await);
        }

        let entry = build_webhook_update_event_entry(
            changed_by_user,
            updated.belongs_to_account,
            updated.id,
            changes,
        );
        if let Err(e) = self
            .create_audit_log_entry_in_transaction(ctx, tx.as_ref(), &entry)
            .await
        {
            return Err(self
                .abort_transaction(tx, e, "writing webhook update audit log entry")
                .await);
        }

        self.commit_transaction(ctx, tx)
            .await
            .map_err(|e| prepare_error(e, "committing transaction"))?;

        tracing::debug!(changes = changes.len(), "webhook updated");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(account_id = Empty, webhook_id = Empty, requester_id = Empty))]
    async fn archive_webhook(
        &self,
        ctx: &QueryContext,
        webhook_id: u64,
        account_id: u64,
        archived_by_user: u64,
    ) -> Result<(), QuerierError> {
        if webhook_id == 0 || account_id == 0 || archived_by_user == 0 {
            return Err(prepare_error(QuerierError::InvalidId, "archiving webhook"));
        }
        attach_webhook_id_to_span(webhook_id);
        attach_account_id_to_span(account_id);
        attach_requester_id_to_span(archived_by_user);

        let (sql, args) = self.builder.build_archive_webhook_query(webhook_id, account_id);

        let tx = self
            .begin_transaction(ctx)
            .await
            .map_err(|e| prepare_error(e, "beginning transaction"))?;

        if let Err(e) = self
            .perform_write_query_ignoring_return(ctx, tx.as_ref(), "webhook archive", &sql, args)
            .await
        {
            return Err(self.abort_transaction(tx, e, "archiving webhook").await);
        }

        let entry = build_webhook_archive_event_entry(archived_by_user, account_id, webhook_id);
        if let Err(e) = self
            .create_audit_log_entry_in_transaction(ctx, tx.as_ref(), &entry)
            .await
        {
            return Err(self
                .abort_transaction(tx, e, "writing webhook archive audit log entry")
                .await);
        }

        self.commit_transaction(ctx, tx)
            .await
            .map_err(|e| prepare_error(e, "committing transaction"))?;

        tracing::debug!("webhook archived");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(webhook_id = Empty))]
    async fn get_audit_log_entries_for_webhook(
        &self,
        ctx: &QueryContext,
        webhook_id: u64,
    ) -> Result<Vec<AuditLogEntry>, QuerierError> {
        if webhook_id == 0 {
            return Err(prepare_error(
                QuerierError::InvalidId,
                "fetching audit log entries for webhook",
            ));
        }
        attach_webhook_id_to_span(webhook_id);

        let (sql, args) = self
            .builder
            .build_get_audit_log_entries_for_webhook_query(webhook_id);

        let rows = self
            .perform_read_query(ctx, "audit log entries for webhook", &sql, args)
            .await
            .map_err(|e| prepare_error(e, "fetching audit log entries for webhook"))?;

        let entries = scan_audit_log_entries(rows)
            .await
            .map_err(|e| prepare_error(e, "scanning audit log entries"))?;

        tracing::debug!(count = entries.len(), "audit log entries fetched");
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "webhooks_test.rs"]
mod tests;
