// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audit_log::{AuditLogEntry, FieldChangeSummary};
use crate::domain::models::webhook::{QueryFilter, Webhook, WebhookCreationInput, WebhookList};
use crate::utils::context::QueryContext;
use crate::utils::errors::QuerierError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Webhook数据管理特质
///
/// 定义Webhook及其审计日志的数据访问接口。所有写操作与对应的审计条目在同一事务中提交。
#[async_trait]
pub trait WebhookDataManager: Send + Sync {
    /// 根据ID和所属账户获取Webhook
    async fn get_webhook(
        &self,
        ctx: &QueryContext,
        webhook_id: u64,
        account_id: u64,
    ) -> Result<Webhook, QuerierError>;

    /// 获取所有未归档Webhook的数量
    async fn get_all_webhooks_count(&self, ctx: &QueryContext) -> Result<u64, QuerierError>;

    /// 分页获取账户下的Webhook
    async fn get_webhooks(
        &self,
        ctx: &QueryContext,
        account_id: u64,
        filter: Option<&QueryFilter>,
    ) -> Result<WebhookList, QuerierError>;

    /// 以批次形式把全部Webhook发送到 `results`
    ///
    /// 所有批次任务派发后立即返回，既不等待任务完成，也不主动关闭通道。
    /// 各批次之间没有顺序保证，单个批次失败只记录日志。
    /// `batch_size` 为 0 时使用配置的默认批大小。
    async fn get_all_webhooks(
        &self,
        ctx: &QueryContext,
        results: Option<mpsc::Sender<Vec<Webhook>>>,
        batch_size: u16,
    ) -> Result<(), QuerierError>;

    /// 创建Webhook并写入创建审计条目
    async fn create_webhook(
        &self,
        ctx: &QueryContext,
        input: Option<&WebhookCreationInput>,
        created_by_user: u64,
    ) -> Result<Webhook, QuerierError>;

    /// 更新Webhook并写入变更审计条目
    async fn update_webhook(
        &self,
        ctx: &QueryContext,
        updated: Option<&Webhook>,
        changed_by_user: u64,
        changes: &[FieldChangeSummary],
    ) -> Result<(), QuerierError>;

    /// 归档（软删除）Webhook并写入归档审计条目
    async fn archive_webhook(
        &self,
        ctx: &QueryContext,
        webhook_id: u64,
        account_id: u64,
        archived_by_user: u64,
    ) -> Result<(), QuerierError>;

    /// 获取与某个Webhook相关的审计日志
    async fn get_audit_log_entries_for_webhook(
        &self,
        ctx: &QueryContext,
        webhook_id: u64,
    ) -> Result<Vec<AuditLogEntry>, QuerierError>;
}
