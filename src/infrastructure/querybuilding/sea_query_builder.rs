// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Dialect;
use crate::domain::models::audit_log::{AuditLogEntryCreationInput, WEBHOOK_ID_KEY};
use crate::domain::models::webhook::{
    QueryFilter, SortDirection, Webhook, WebhookDatabaseCreationInput,
};
use crate::infrastructure::database::store::Args;
use crate::infrastructure::querybuilding::{
    AuditLogEntrySqlQueryBuilder, WebhookSqlQueryBuilder, DATA_TYPES_SEPARATOR, EVENTS_SEPARATOR,
    TOPICS_SEPARATOR,
};
use crate::utils::clock::{ExternalIdGenerator, UuidExternalIdGenerator};
use sea_orm::sea_query::{
    Alias, Expr, Func, Order, PostgresQueryBuilder, Query, QueryStatementWriter, SelectStatement,
    SimpleExpr, SqliteQueryBuilder, SubQueryStatement,
};
use sea_orm::DeriveIden;
use std::sync::Arc;

#[derive(DeriveIden, Clone, Copy)]
enum Webhooks {
    Table,
    Id,
    ExternalId,
    Name,
    ContentType,
    Url,
    Method,
    Events,
    DataTypes,
    Topics,
    CreatedOn,
    LastUpdatedOn,
    ArchivedOn,
    BelongsToAccount,
}

#[derive(DeriveIden, Clone, Copy)]
enum AuditLog {
    Table,
    Id,
    ExternalId,
    EventType,
    Context,
    CreatedOn,
}

// Must stay in step with WEBHOOKS_TABLE_COLUMNS.
const WEBHOOK_COLUMNS: [Webhooks; 13] = [
    Webhooks::Id,
    Webhooks::ExternalId,
    Webhooks::Name,
    Webhooks::ContentType,
    Webhooks::Url,
    Webhooks::Method,
    Webhooks::Events,
    Webhooks::DataTypes,
    Webhooks::Topics,
    Webhooks::CreatedOn,
    Webhooks::LastUpdatedOn,
    Webhooks::ArchivedOn,
    Webhooks::BelongsToAccount,
];

const AUDIT_LOG_COLUMNS: [AuditLog; 5] = [
    AuditLog::Id,
    AuditLog::ExternalId,
    AuditLog::EventType,
    AuditLog::Context,
    AuditLog::CreatedOn,
];

/// 基于 sea-query 的方言相关查询构建器
///
/// 所有 Webhook 读取路径都排除已归档记录；写路径按 `belongs_to_account` 限定范围。
/// `last_updated_on` 与 `archived_on` 取数据库时钟。
#[derive(Clone)]
pub struct SeaQueryBuilder {
    dialect: Dialect,
    external_ids: Arc<dyn ExternalIdGenerator>,
}

impl SeaQueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self::with_external_id_generator(dialect, Arc::new(UuidExternalIdGenerator))
    }

    /// 指定审计条目外部ID的生成器
    pub fn with_external_id_generator(
        dialect: Dialect,
        external_ids: Arc<dyn ExternalIdGenerator>,
    ) -> Self {
        Self {
            dialect,
            external_ids,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn render<S>(&self, stmt: &S) -> (String, Args)
    where
        S: QueryStatementWriter,
    {
        let (sql, values) = match self.dialect {
            Dialect::Postgres => stmt.build(PostgresQueryBuilder),
            Dialect::Sqlite => stmt.build(SqliteQueryBuilder),
        };
        (sql, values.0)
    }

    /// 当前 Unix 秒的数据库端表达式
    fn current_unix_time(&self) -> SimpleExpr {
        match self.dialect {
            Dialect::Postgres => Expr::cust("EXTRACT(EPOCH FROM NOW())::BIGINT"),
            Dialect::Sqlite => Expr::cust("CAST(strftime('%s', 'now') AS INTEGER)"),
        }
    }

    fn audit_context_matches_webhook(&self, webhook_id: u64) -> SimpleExpr {
        let id = db_int(webhook_id);
        match self.dialect {
            Dialect::Postgres => Expr::cust_with_values(
                format!(r#"("context"::jsonb ->> '{}')::BIGINT = $1"#, WEBHOOK_ID_KEY),
                [id],
            ),
            Dialect::Sqlite => Expr::cust_with_values(
                format!(
                    r#"CAST(json_extract("context", '$.{}') AS INTEGER) = ?"#,
                    WEBHOOK_ID_KEY
                ),
                [id],
            ),
        }
    }

    fn count_sub_select(&self, account_id: u64, filter: Option<&QueryFilter>) -> SimpleExpr {
        let mut sub = Query::select();
        sub.expr(Func::count(Expr::col(Webhooks::Id)))
            .from(Webhooks::Table)
            .and_where(Expr::col(Webhooks::ArchivedOn).is_null())
            .and_where(Expr::col(Webhooks::BelongsToAccount).eq(db_int(account_id)));

        if let Some(filter) = filter {
            apply_filter_conditions(&mut sub, filter);
        }

        SimpleExpr::SubQuery(None, Box::new(SubQueryStatement::SelectStatement(sub)))
    }
}

/// 数据库整数列均为有符号 64 位
fn db_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn apply_filter_conditions(stmt: &mut SelectStatement, filter: &QueryFilter) {
    if let Some(after) = filter.created_after {
        stmt.and_where(Expr::col(Webhooks::CreatedOn).gt(db_int(after)));
    }
    if let Some(before) = filter.created_before {
        stmt.and_where(Expr::col(Webhooks::CreatedOn).lt(db_int(before)));
    }
    if let Some(after) = filter.updated_after {
        stmt.and_where(Expr::col(Webhooks::LastUpdatedOn).gt(db_int(after)));
    }
    if let Some(before) = filter.updated_before {
        stmt.and_where(Expr::col(Webhooks::LastUpdatedOn).lt(db_int(before)));
    }
}

impl WebhookSqlQueryBuilder for SeaQueryBuilder {
    fn build_get_webhook_query(&self, webhook_id: u64, account_id: u64) -> (String, Args) {
        let stmt = Query::select()
            .columns(WEBHOOK_COLUMNS)
            .from(Webhooks::Table)
            .and_where(Expr::col(Webhooks::Id).eq(db_int(webhook_id)))
            .and_where(Expr::col(Webhooks::BelongsToAccount).eq(db_int(account_id)))
            .and_where(Expr::col(Webhooks::ArchivedOn).is_null())
            .to_owned();

        self.render(&stmt)
    }

    fn build_get_all_webhooks_count_query(&self) -> (String, Args) {
        let stmt = Query::select()
            .expr(Func::count(Expr::col(Webhooks::Id)))
            .from(Webhooks::Table)
            .and_where(Expr::col(Webhooks::ArchivedOn).is_null())
            .to_owned();

        self.render(&stmt)
    }

    fn build_get_webhooks_query(
        &self,
        account_id: u64,
        filter: Option<&QueryFilter>,
    ) -> (String, Args) {
        let defaults = QueryFilter::default();
        let effective = filter.unwrap_or(&defaults);

        let mut stmt = Query::select();
        stmt.columns(WEBHOOK_COLUMNS)
            .expr_as(
                self.count_sub_select(account_id, Some(effective)),
                Alias::new("filtered_count"),
            )
            .expr_as(
                self.count_sub_select(account_id, None),
                Alias::new("total_count"),
            )
            .from(Webhooks::Table)
            .and_where(Expr::col(Webhooks::ArchivedOn).is_null())
            .and_where(Expr::col(Webhooks::BelongsToAccount).eq(db_int(account_id)));

        apply_filter_conditions(&mut stmt, effective);

        let order = match effective.sort_by {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        stmt.order_by(Webhooks::Id, order)
            .limit(u64::from(effective.effective_limit()))
            .offset(effective.offset());

        self.render(&stmt)
    }

    fn build_get_batch_of_webhooks_query(&self, begin_id: u64, end_id: u64) -> (String, Args) {
        let stmt = Query::select()
            .columns(WEBHOOK_COLUMNS)
            .from(Webhooks::Table)
            .and_where(Expr::col(Webhooks::Id).gte(db_int(begin_id)))
            .and_where(Expr::col(Webhooks::Id).lt(db_int(end_id)))
            .and_where(Expr::col(Webhooks::ArchivedOn).is_null())
            .order_by(Webhooks::Id, Order::Asc)
            .to_owned();

        self.render(&stmt)
    }

    fn build_create_webhook_query(&self, input: &WebhookDatabaseCreationInput) -> (String, Args) {
        let stmt = Query::insert()
            .into_table(Webhooks::Table)
            .columns([
                Webhooks::ExternalId,
                Webhooks::Name,
                Webhooks::ContentType,
                Webhooks::Url,
                Webhooks::Method,
                Webhooks::Events,
                Webhooks::DataTypes,
                Webhooks::Topics,
                Webhooks::CreatedOn,
                Webhooks::BelongsToAccount,
            ])
            .values_panic([
                input.external_id.clone().into(),
                input.name.clone().into(),
                input.content_type.clone().into(),
                input.url.clone().into(),
                input.method.clone().into(),
                input.events.join(EVENTS_SEPARATOR).into(),
                input.data_types.join(DATA_TYPES_SEPARATOR).into(),
                input.topics.join(TOPICS_SEPARATOR).into(),
                db_int(input.created_on).into(),
                db_int(input.belongs_to_account).into(),
            ])
            .returning_col(Webhooks::Id)
            .to_owned();

        self.render(&stmt)
    }

    fn build_update_webhook_query(&self, webhook: &Webhook) -> (String, Args) {
        let stmt = Query::update()
            .table(Webhooks::Table)
            .value(Webhooks::Name, webhook.name.clone())
            .value(Webhooks::ContentType, webhook.content_type.clone())
            .value(Webhooks::Url, webhook.url.clone())
            .value(Webhooks::Method, webhook.method.clone())
            .value(Webhooks::Events, webhook.events.join(EVENTS_SEPARATOR))
            .value(
                Webhooks::DataTypes,
                webhook.data_types.join(DATA_TYPES_SEPARATOR),
            )
            .value(Webhooks::Topics, webhook.topics.join(TOPICS_SEPARATOR))
            .value(Webhooks::LastUpdatedOn, self.current_unix_time())
            .and_where(Expr::col(Webhooks::Id).eq(db_int(webhook.id)))
            .and_where(Expr::col(Webhooks::BelongsToAccount).eq(db_int(webhook.belongs_to_account)))
            .and_where(Expr::col(Webhooks::ArchivedOn).is_null())
            .to_owned();

        self.render(&stmt)
    }

    fn build_archive_webhook_query(&self, webhook_id: u64, account_id: u64) -> (String, Args) {
        let stmt = Query::update()
            .table(Webhooks::Table)
            .value(Webhooks::LastUpdatedOn, self.current_unix_time())
            .value(Webhooks::ArchivedOn, self.current_unix_time())
            .and_where(Expr::col(Webhooks::Id).eq(db_int(webhook_id)))
            .and_where(Expr::col(Webhooks::BelongsToAccount).eq(db_int(account_id)))
            .and_where(Expr::col(Webhooks::ArchivedOn).is_null())
            .to_owned();

        self.render(&stmt)
    }

    fn build_get_audit_log_entries_for_webhook_query(&self, webhook_id: u64) -> (String, Args) {
        let stmt = Query::select()
            .columns(AUDIT_LOG_COLUMNS)
            .from(AuditLog::Table)
            .and_where(self.audit_context_matches_webhook(webhook_id))
            .order_by(AuditLog::CreatedOn, Order::Desc)
            .order_by(AuditLog::Id, Order::Desc)
            .to_owned();

        self.render(&stmt)
    }
}

impl AuditLogEntrySqlQueryBuilder for SeaQueryBuilder {
    fn build_create_audit_log_entry_query(
        &self,
        input: &AuditLogEntryCreationInput,
    ) -> (String, Args) {
        let context = serde_json::to_string(&input.context).unwrap_or_else(|_| "{}".to_string());

        let stmt = Query::insert()
            .into_table(AuditLog::Table)
            .columns([
                AuditLog::ExternalId,
                AuditLog::EventType,
                AuditLog::Context,
                AuditLog::CreatedOn,
            ])
            .values_panic([
                self.external_ids.new_external_id().into(),
                input.event_type.clone().into(),
                context.into(),
                self.current_unix_time(),
            ])
            .to_owned();

        self.render(&stmt)
    }
}

#[cfg(test)]
#[path = "sea_query_builder_test.rs"]
mod tests;
