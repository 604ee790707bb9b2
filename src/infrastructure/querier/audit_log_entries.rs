// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audit_log::{AuditLogEntry, AuditLogEntryCreationInput};
use crate::infrastructure::database::store::{ResultIterator, RowReader, Transaction};
use crate::infrastructure::querier::{scan_rows, ColumnCursor, SqlQuerier};
use crate::infrastructure::querybuilding::AUDIT_LOG_TABLE_COLUMNS;
use crate::utils::context::QueryContext;
use crate::utils::errors::QuerierError;
use sea_orm::DbErr;
use serde_json::{Map, Value};

/// 扫描一行审计日志
pub fn scan_audit_log_entry(row: &dyn RowReader) -> Result<AuditLogEntry, QuerierError> {
    let mut columns = ColumnCursor::new(row, &AUDIT_LOG_TABLE_COLUMNS, 0);

    let id = columns.next_u64()?;
    let external_id = columns.next_string()?;
    let event_type = columns.next_string()?;
    let raw_context = columns.next_string()?;
    let created_on = columns.next_u64()?;

    let context: Map<String, Value> =
        serde_json::from_str(&raw_context).map_err(|e| QuerierError::Scan {
            column: "context",
            source: DbErr::Json(e.to_string()),
        })?;

    Ok(AuditLogEntry {
        id,
        external_id,
        event_type,
        context,
        created_on,
    })
}

pub async fn scan_audit_log_entries(
    rows: Box<dyn ResultIterator>,
) -> Result<Vec<AuditLogEntry>, QuerierError> {
    scan_rows(rows, scan_audit_log_entry).await
}

impl SqlQuerier {
    /// 在事务内写入审计条目
    ///
    /// 失败时由调用方回滚整个事务。
    pub(crate) async fn create_audit_log_entry_in_transaction(
        &self,
        ctx: &QueryContext,
        tx: &dyn Transaction,
        input: &AuditLogEntryCreationInput,
    ) -> Result<(), QuerierError> {
        let (sql, args) = self.builder.build_create_audit_log_entry_query(input);

        self.perform_write_query_ignoring_return(ctx, tx, "audit log entry creation", &sql, args)
            .await?;

        tracing::debug!(event_type = %input.event_type, "audit log entry written");
        Ok(())
    }
}
