// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use hookstore::domain::models::audit_log::AuditLogEntryCreationInput;
use hookstore::domain::models::webhook::{QueryFilter, Webhook, WebhookDatabaseCreationInput};
use hookstore::infrastructure::database::store::Args;
use hookstore::infrastructure::querybuilding::{
    AuditLogEntrySqlQueryBuilder, WebhookSqlQueryBuilder,
};
use std::sync::Mutex;

pub const GET_WEBHOOK: &str = "get_webhook";
pub const COUNT_WEBHOOKS: &str = "count_webhooks";
pub const GET_WEBHOOKS: &str = "get_webhooks";
pub const GET_BATCH: &str = "get_batch_of_webhooks";
pub const CREATE_WEBHOOK: &str = "create_webhook";
pub const UPDATE_WEBHOOK: &str = "update_webhook";
pub const ARCHIVE_WEBHOOK: &str = "archive_webhook";
pub const GET_AUDIT_ENTRIES: &str = "get_audit_log_entries_for_webhook";
pub const CREATE_AUDIT_ENTRY: &str = "create_audit_log_entry";

/// 构建器调用记录
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderCall {
    pub query: &'static str,
    pub ids: Vec<u64>,
}

/// 返回查询名称作为 SQL 的构建器，并记录每次调用
#[derive(Default)]
pub struct RecordingQueryBuilder {
    calls: Mutex<Vec<BuilderCall>>,
    filters: Mutex<Vec<Option<QueryFilter>>>,
    creations: Mutex<Vec<WebhookDatabaseCreationInput>>,
    updates: Mutex<Vec<Webhook>>,
    audit_entries: Mutex<Vec<AuditLogEntryCreationInput>>,
}

impl RecordingQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, query: &'static str, ids: Vec<u64>) -> (String, Args) {
        let args: Args = ids.iter().map(|id| (*id as i64).into()).collect();
        self.calls.lock().unwrap().push(BuilderCall { query, ids });
        (query.to_string(), args)
    }

    pub fn calls(&self) -> Vec<BuilderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, query: &str) -> Vec<BuilderCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.query == query)
            .collect()
    }

    pub fn filters(&self) -> Vec<Option<QueryFilter>> {
        self.filters.lock().unwrap().clone()
    }

    pub fn creations(&self) -> Vec<WebhookDatabaseCreationInput> {
        self.creations.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<Webhook> {
        self.updates.lock().unwrap().clone()
    }

    pub fn audit_entries(&self) -> Vec<AuditLogEntryCreationInput> {
        self.audit_entries.lock().unwrap().clone()
    }
}

impl WebhookSqlQueryBuilder for RecordingQueryBuilder {
    fn build_get_webhook_query(&self, webhook_id: u64, account_id: u64) -> (String, Args) {
        self.record(GET_WEBHOOK, vec![webhook_id, account_id])
    }

    fn build_get_all_webhooks_count_query(&self) -> (String, Args) {
        self.record(COUNT_WEBHOOKS, vec![])
    }

    fn build_get_webhooks_query(
        &self,
        account_id: u64,
        filter: Option<&QueryFilter>,
    ) -> (String, Args) {
        self.filters.lock().unwrap().push(filter.cloned());
        self.record(GET_WEBHOOKS, vec![account_id])
    }

    fn build_get_batch_of_webhooks_query(&self, begin_id: u64, end_id: u64) -> (String, Args) {
        self.record(GET_BATCH, vec![begin_id, end_id])
    }

    fn build_create_webhook_query(&self, input: &WebhookDatabaseCreationInput) -> (String, Args) {
        self.creations.lock().unwrap().push(input.clone());
        self.record(CREATE_WEBHOOK, vec![input.belongs_to_account])
    }

    fn build_update_webhook_query(&self, webhook: &Webhook) -> (String, Args) {
        self.updates.lock().unwrap().push(webhook.clone());
        self.record(UPDATE_WEBHOOK, vec![webhook.id, webhook.belongs_to_account])
    }

    fn build_archive_webhook_query(&self, webhook_id: u64, account_id: u64) -> (String, Args) {
        self.record(ARCHIVE_WEBHOOK, vec![webhook_id, account_id])
    }

    fn build_get_audit_log_entries_for_webhook_query(&self, webhook_id: u64) -> (String, Args) {
        self.record(GET_AUDIT_ENTRIES, vec![webhook_id])
    }
}

impl AuditLogEntrySqlQueryBuilder for RecordingQueryBuilder {
    fn build_create_audit_log_entry_query(
        &self,
        input: &AuditLogEntryCreationInput,
    ) -> (String, Args) {
        self.audit_entries.lock().unwrap().push(input.clone());
        self.record(CREATE_AUDIT_ENTRY, vec![])
    }
}
