// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 审计上下文中执行者ID的键
pub const PERFORMED_BY_KEY: &str = "performed_by";
/// 审计上下文中账户ID的键
pub const ACCOUNT_ID_KEY: &str = "account_id";
/// 审计上下文中Webhook ID的键
pub const WEBHOOK_ID_KEY: &str = "webhook_id";
/// 审计上下文中字段变更列表的键
pub const CHANGES_KEY: &str = "changes";
/// 审计上下文中新建对象快照的键
pub const CREATION_ASSIGNMENT_KEY: &str = "created";

/// 审计日志条目
///
/// 追加写入，从本模块的角度只读。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: u64,
    pub external_id: String,
    pub event_type: String,
    pub context: Map<String, Value>,
    pub created_on: u64,
}

/// 审计日志创建输入
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuditLogEntryCreationInput {
    pub event_type: String,
    pub context: Map<String, Value>,
}

/// 字段变更摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChangeSummary {
    pub field_name: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// 审计事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLogEventType {
    WebhookCreated,
    WebhookUpdated,
    WebhookArchived,
}

impl AuditLogEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLogEventType::WebhookCreated => "webhook_created",
            AuditLogEventType::WebhookUpdated => "webhook_updated",
            AuditLogEventType::WebhookArchived => "webhook_archived",
        }
    }
}

impl fmt::Display for AuditLogEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
