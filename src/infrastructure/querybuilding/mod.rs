// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 查询构建
//!
//! 把逻辑请求转换为方言相关的 SQL 文本和位置参数。
//! 读取路径的列顺序见 [`WEBHOOKS_TABLE_COLUMNS`]，它是构建器与扫描器之间的契约。

pub mod sea_query_builder;

use crate::domain::models::audit_log::AuditLogEntryCreationInput;
use crate::domain::models::webhook::{QueryFilter, Webhook, WebhookDatabaseCreationInput};
use crate::infrastructure::database::store::Args;

pub use crate::domain::models::webhook::{
    DATA_TYPES_SEPARATOR, EVENTS_SEPARATOR, TOPICS_SEPARATOR,
};
pub use sea_query_builder::SeaQueryBuilder;

/// webhooks 表在读取路径上的列顺序
pub const WEBHOOKS_TABLE_COLUMNS: [&str; 13] = [
    "id",
    "external_id",
    "name",
    "content_type",
    "url",
    "method",
    "events",
    "data_types",
    "topics",
    "created_on",
    "last_updated_on",
    "archived_on",
    "belongs_to_account",
];

/// 列表查询在实体列之后追加的计数列
pub const COUNT_COLUMNS: [&str; 2] = ["filtered_count", "total_count"];

/// audit_log 表在读取路径上的列顺序
pub const AUDIT_LOG_TABLE_COLUMNS: [&str; 5] =
    ["id", "external_id", "event_type", "context", "created_on"];

/// Webhook查询构建器
pub trait WebhookSqlQueryBuilder: Send + Sync {
    /// 按ID和所属账户读取未归档的Webhook
    fn build_get_webhook_query(&self, webhook_id: u64, account_id: u64) -> (String, Args);

    /// 统计所有未归档的Webhook
    fn build_get_all_webhooks_count_query(&self) -> (String, Args);

    /// 分页读取账户下的Webhook，附带 `filtered_count` 与 `total_count`
    fn build_get_webhooks_query(
        &self,
        account_id: u64,
        filter: Option<&QueryFilter>,
    ) -> (String, Args);

    /// 读取 `[begin_id, end_id)` 范围内的Webhook
    fn build_get_batch_of_webhooks_query(&self, begin_id: u64, end_id: u64) -> (String, Args);

    /// 插入Webhook并返回新ID
    fn build_create_webhook_query(&self, input: &WebhookDatabaseCreationInput) -> (String, Args);

    fn build_update_webhook_query(&self, webhook: &Webhook) -> (String, Args);

    fn build_archive_webhook_query(&self, webhook_id: u64, account_id: u64) -> (String, Args);

    fn build_get_audit_log_entries_for_webhook_query(&self, webhook_id: u64) -> (String, Args);
}

/// 审计日志查询构建器
pub trait AuditLogEntrySqlQueryBuilder: Send + Sync {
    fn build_create_audit_log_entry_query(
        &self,
        input: &AuditLogEntryCreationInput,
    ) -> (String, Args);
}

/// querier 使用的完整查询构建器
pub trait SqlQueryBuilder: WebhookSqlQueryBuilder + AuditLogEntrySqlQueryBuilder {}

impl<T> SqlQueryBuilder for T where T: WebhookSqlQueryBuilder + AuditLogEntrySqlQueryBuilder {}
