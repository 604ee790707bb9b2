// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 数据访问层
//!
//! [`SqlQuerier`] 组合存储连接、查询构建器、时钟和外部ID生成器，
//! 实现 [`WebhookDataManager`](crate::domain::repositories::webhook_repository::WebhookDataManager)。
//!
//! 所有存储调用都经过 [`QueryContext::run`]，所有错误在返回前都经过
//! [`prepare_error`](crate::utils::telemetry::prepare_error) 记录并包装。

pub mod audit_log_entries;
pub mod webhooks;

use crate::config::settings::{QuerierSettings, Settings};
use crate::domain::models::webhook::Webhook;
use crate::infrastructure::database::sea_orm_store::SeaOrmDatabase;
use crate::infrastructure::database::store::{
    Args, Database, ExecOutcome, ResultIterator, RowReader, Transaction,
};
use crate::infrastructure::querybuilding::{SeaQueryBuilder, SqlQueryBuilder};
use crate::utils::clock::{Clock, ExternalIdGenerator, SystemClock, UuidExternalIdGenerator};
use crate::utils::context::QueryContext;
use crate::utils::errors::QuerierError;
use crate::utils::telemetry::prepare_error;
use sea_orm::DbErr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// 未配置批大小时的默认值
pub const DEFAULT_BATCH_SIZE: u16 = 250;

/// 基于SQL的数据访问实现
#[derive(Clone)]
pub struct SqlQuerier {
    db: Arc<dyn Database>,
    builder: Arc<dyn SqlQueryBuilder>,
    clock: Arc<dyn Clock>,
    external_ids: Arc<dyn ExternalIdGenerator>,
    settings: QuerierSettings,
}

impl SqlQuerier {
    /// 创建新的数据访问实例，使用系统时钟和 UUID 外部ID
    pub fn new(
        db: Arc<dyn Database>,
        builder: Arc<dyn SqlQueryBuilder>,
        settings: QuerierSettings,
    ) -> Self {
        Self {
            db,
            builder,
            clock: Arc::new(SystemClock),
            external_ids: Arc::new(UuidExternalIdGenerator),
            settings,
        }
    }

    /// 按配置连接数据库并创建对应方言的查询构建器
    pub async fn connect(settings: &Settings) -> Result<Self, QuerierError> {
        let db = SeaOrmDatabase::connect(&settings.database)
            .await
            .map_err(|e| prepare_error(e.into(), "connecting to database"))?;

        tracing::info!(dialect = ?settings.querier.dialect, "database connected");

        Ok(Self::new(
            Arc::new(db),
            Arc::new(SeaQueryBuilder::new(settings.querier.dialect)),
            settings.querier.clone(),
        ))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_external_id_generator(mut self, external_ids: Arc<dyn ExternalIdGenerator>) -> Self {
        self.external_ids = external_ids;
        self
    }

    pub fn settings(&self) -> &QuerierSettings {
        &self.settings
    }

    /// 按配置的缓冲区大小创建批量读取使用的通道
    pub fn batch_channel(&self) -> (mpsc::Sender<Vec<Webhook>>, mpsc::Receiver<Vec<Webhook>>) {
        mpsc::channel(self.settings.channel_buffer.max(1))
    }

    fn effective_batch_size(&self, requested: u16) -> u64 {
        let size = match (requested, self.settings.default_batch_size) {
            (0, 0) => DEFAULT_BATCH_SIZE,
            (0, configured) => configured,
            (requested, _) => requested,
        };
        u64::from(size)
    }

    /// 读取单行，没有数据时返回 [`QuerierError::NotFound`]
    async fn get_one_row(
        &self,
        ctx: &QueryContext,
        label: &'static str,
        sql: &str,
        args: Args,
    ) -> Result<Box<dyn RowReader>, QuerierError> {
        tracing::trace!(query = label, sql, "fetching single row");

        ctx.run(self.db.query_row(sql, args))
            .await??
            .ok_or(QuerierError::NotFound)
    }

    /// 执行计数查询；没有返回行属于内部错误
    async fn perform_count_query(
        &self,
        ctx: &QueryContext,
        sql: &str,
        args: Args,
    ) -> Result<u64, QuerierError> {
        let row = ctx
            .run(self.db.query_row(sql, args))
            .await??
            .ok_or_else(|| QuerierError::Internal("count query returned no rows".to_string()))?;

        ColumnCursor::new(row.as_ref(), &["count"], 0).next_u64()
    }

    async fn perform_read_query(
        &self,
        ctx: &QueryContext,
        label: &'static str,
        sql: &str,
        args: Args,
    ) -> Result<Box<dyn ResultIterator>, QuerierError> {
        tracing::trace!(query = label, sql, "performing read query");

        Ok(ctx.run(self.db.query_rows(sql, args)).await??)
    }

    /// 在事务内执行写语句并返回新记录ID
    ///
    /// `returning` 为真时从语句返回的第一行读取ID，否则使用驱动报告的最后插入ID；
    /// 不报告插入ID的驱动（Postgres）必须走 `returning`。
    async fn perform_write_query(
        &self,
        ctx: &QueryContext,
        tx: &dyn Transaction,
        returning: bool,
        label: &'static str,
        sql: &str,
        args: Args,
    ) -> Result<u64, QuerierError> {
        tracing::trace!(query = label, sql, "performing write query");

        if returning {
            let row = ctx.run(tx.query_row(sql, args)).await??.ok_or_else(|| {
                QuerierError::Internal(format!("{} returned no id", label))
            })?;
            return ColumnCursor::new(row.as_ref(), &["id"], 0).next_u64();
        }

        let outcome = ctx.run(tx.execute(sql, args)).await??;
        inserted_id(&outcome, label)
    }

    async fn perform_write_query_ignoring_return(
        &self,
        ctx: &QueryContext,
        tx: &dyn Transaction,
        label: &'static str,
        sql: &str,
        args: Args,
    ) -> Result<(), QuerierError> {
        tracing::trace!(query = label, sql, "performing write query");

        ctx.run(tx.execute(sql, args)).await??;
        Ok(())
    }

    async fn begin_transaction(
        &self,
        ctx: &QueryContext,
    ) -> Result<Box<dyn Transaction>, QuerierError> {
        ctx.run(self.db.begin())
            .await?
            .map_err(|source| QuerierError::Transaction {
                action: "beginning",
                source,
            })
    }

    /// 提交事务
    ///
    /// 上下文已取消时回滚并返回 [`QuerierError::Cancelled`]。
    async fn commit_transaction(
        &self,
        ctx: &QueryContext,
        tx: Box<dyn Transaction>,
    ) -> Result<(), QuerierError> {
        if ctx.is_cancelled() {
            self.rollback_transaction(tx).await;
            return Err(QuerierError::Cancelled);
        }

        tx.commit()
            .await
            .map_err(|source| QuerierError::Transaction {
                action: "committing",
                source,
            })
    }

    /// 回滚事务，失败只记录日志
    async fn rollback_transaction(&self, tx: Box<dyn Transaction>) {
        tracing::debug!("rolling back transaction");

        if let Err(e) = tx.rollback().await {
            tracing::error!(error = %e, "rolling back transaction");
        }
    }

    /// 回滚事务并记录、包装导致回滚的错误
    async fn abort_transaction(
        &self,
        tx: Box<dyn Transaction>,
        err: QuerierError,
        description: &str,
    ) -> QuerierError {
        self.rollback_transaction(tx).await;
        prepare_error(err, description)
    }
}

/// 驱动报告的插入ID，0 表示驱动没有提供
fn inserted_id(outcome: &ExecOutcome, label: &str) -> Result<u64, QuerierError> {
    match outcome.last_insert_id {
        0 => Err(QuerierError::Internal(format!(
            "{} reported no inserted id",
            label
        ))),
        id => Ok(id),
    }
}

/// 关闭结果集，关闭失败视为迭代错误
async fn check_rows_for_error_and_close(rows: Box<dyn ResultIterator>) -> Result<(), QuerierError> {
    rows.close().await.map_err(QuerierError::Iteration)
}

/// 逐行扫描结果集
///
/// 无论成功与否都会关闭结果集；扫描错误优先于关闭错误返回。
async fn scan_rows<T, F>(mut rows: Box<dyn ResultIterator>, mut scan: F) -> Result<Vec<T>, QuerierError>
where
    F: FnMut(&dyn RowReader) -> Result<T, QuerierError>,
{
    let mut scanned = Vec::new();
    let outcome = drain_rows(&mut rows, &mut scanned, &mut scan).await;
    let closed = check_rows_for_error_and_close(rows).await;

    outcome?;
    closed?;
    Ok(scanned)
}

async fn drain_rows<T, F>(
    rows: &mut Box<dyn ResultIterator>,
    scanned: &mut Vec<T>,
    scan: &mut F,
) -> Result<(), QuerierError>
where
    F: FnMut(&dyn RowReader) -> Result<T, QuerierError>,
{
    while let Some(row) = rows.next_row().await.map_err(QuerierError::Iteration)? {
        scanned.push(scan(row.as_ref())?);
    }
    Ok(())
}

/// 按固定列顺序读取一行
///
/// 列名只用于错误信息，读取完全依赖下标。
pub(crate) struct ColumnCursor<'a> {
    row: &'a dyn RowReader,
    columns: &'static [&'static str],
    offset: usize,
    position: usize,
}

impl<'a> ColumnCursor<'a> {
    pub(crate) fn new(
        row: &'a dyn RowReader,
        columns: &'static [&'static str],
        offset: usize,
    ) -> Self {
        Self {
            row,
            columns,
            offset,
            position: 0,
        }
    }

    fn advance(&mut self) -> (usize, &'static str) {
        let column = self.columns.get(self.position).copied().unwrap_or("?");
        let index = self.offset + self.position;
        self.position += 1;
        (index, column)
    }

    pub(crate) fn next_optional_u64(&mut self) -> Result<Option<u64>, QuerierError> {
        let (index, column) = self.advance();
        let value = self
            .row
            .try_get_i64(index)
            .map_err(|source| QuerierError::Scan { column, source })?;

        value
            .map(|v| {
                u64::try_from(v).map_err(|_| QuerierError::Scan {
                    column,
                    source: DbErr::Type(format!("negative value {} for unsigned column", v)),
                })
            })
            .transpose()
    }

    pub(crate) fn next_u64(&mut self) -> Result<u64, QuerierError> {
        let column = self.columns.get(self.position).copied().unwrap_or("?");
        self.next_optional_u64()?.ok_or_else(|| unexpected_null(column))
    }

    pub(crate) fn next_string(&mut self) -> Result<String, QuerierError> {
        let (index, column) = self.advance();
        self.row
            .try_get_string(index)
            .map_err(|source| QuerierError::Scan { column, source })?
            .ok_or_else(|| unexpected_null(column))
    }

    /// 读取分隔符拼接的多值列
    pub(crate) fn next_delimited(&mut self, separator: &str) -> Result<Vec<String>, QuerierError> {
        Ok(split_column(&self.next_string()?, separator))
    }
}

fn unexpected_null(column: &'static str) -> QuerierError {
    QuerierError::Scan {
        column,
        source: DbErr::Type("unexpected NULL in non-nullable column".to_string()),
    }
}

/// 拆分多值列；空字符串解码为空列表
pub(crate) fn split_column(raw: &str, separator: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(separator).map(str::to_string).collect()
}

#[cfg(test)]
#[path = "querier_test.rs"]
mod tests;
