// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audit_log::{
    AuditLogEntryCreationInput, AuditLogEventType, FieldChangeSummary, ACCOUNT_ID_KEY,
    CHANGES_KEY, CREATION_ASSIGNMENT_KEY, PERFORMED_BY_KEY, WEBHOOK_ID_KEY,
};
use crate::domain::models::webhook::Webhook;
use serde_json::{json, Map, Value};

/// 构建Webhook创建事件的审计条目
pub fn build_webhook_creation_event_entry(
    webhook: &Webhook,
    created_by_user: u64,
) -> AuditLogEntryCreationInput {
    let mut context = base_context(created_by_user, webhook.belongs_to_account, webhook.id);
    context.insert(
        CREATION_ASSIGNMENT_KEY.to_string(),
        serde_json::to_value(webhook).unwrap_or(Value::Null),
    );

    AuditLogEntryCreationInput {
        event_type: AuditLogEventType::WebhookCreated.to_string(),
        context,
    }
}

/// 构建Webhook更新事件的审计条目
pub fn build_webhook_update_event_entry(
    changed_by_user: u64,
    account_id: u64,
    webhook_id: u64,
    changes: &[FieldChangeSummary],
) -> AuditLogEntryCreationInput {
    let mut context = base_context(changed_by_user, account_id, webhook_id);
    context.insert(
        CHANGES_KEY.to_string(),
        serde_json::to_value(changes).unwrap_or_else(|_| json!([])),
    );

    AuditLogEntryCreationInput {
        event_type: AuditLogEventType::WebhookUpdated.to_string(),
        context,
    }
}

/// 构建Webhook归档事件的审计条目
pub fn build_webhook_archive_event_entry(
    archived_by_user: u64,
    account_id: u64,
    webhook_id: u64,
) -> AuditLogEntryCreationInput {
    AuditLogEntryCreationInput {
        event_type: AuditLogEventType::WebhookArchived.to_string(),
        context: base_context(archived_by_user, account_id, webhook_id),
    }
}

fn base_context(performed_by: u64, account_id: u64, webhook_id: u64) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert(PERFORMED_BY_KEY.to_string(), json!(performed_by));
    context.insert(ACCOUNT_ID_KEY.to_string(), json!(account_id));
    context.insert(WEBHOOK_ID_KEY.to_string(), json!(webhook_id));
    context
}
