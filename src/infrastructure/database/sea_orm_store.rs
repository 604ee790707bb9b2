// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DatabaseSettings;
use crate::infrastructure::database::connection;
use crate::infrastructure::database::store::{
    Args, Database, ExecOutcome, QueryExecutor, ResultIterator, RowReader, Transaction,
};
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, QueryResult,
    Statement, StreamTrait, TransactionTrait,
};
use std::pin::Pin;
use std::sync::Arc;

/// 基于SeaORM连接池的存储实现
#[derive(Clone)]
pub struct SeaOrmDatabase {
    conn: Arc<DatabaseConnection>,
}

impl SeaOrmDatabase {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self { conn }
    }

    /// 按配置创建连接池
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, DbErr> {
        let conn = connection::create_pool(settings).await?;
        Ok(Self::new(Arc::new(conn)))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        self.conn.as_ref()
    }

    pub fn backend(&self) -> DbBackend {
        self.conn.get_database_backend()
    }
}

/// SeaORM事务
pub struct SeaOrmTransaction {
    txn: DatabaseTransaction,
}

struct SeaOrmRow(QueryResult);

impl RowReader for SeaOrmRow {
    fn try_get_i64(&self, index: usize) -> Result<Option<i64>, DbErr> {
        self.0.try_get_by_index::<Option<i64>>(index)
    }

    fn try_get_string(&self, index: usize) -> Result<Option<String>, DbErr> {
        self.0.try_get_by_index::<Option<String>>(index)
    }
}

type RowStream = Pin<Box<dyn Stream<Item = Result<QueryResult, DbErr>> + Send>>;

/// 逐行拉取的结果集
///
/// 流持有一个池连接，`close` 释放流并归还连接。
struct SeaOrmRowStream {
    stream: Option<RowStream>,
}

#[async_trait]
impl ResultIterator for SeaOrmRowStream {
    async fn next_row(&mut self) -> Result<Option<Box<dyn RowReader>>, DbErr> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };

        match stream.next().await {
            Some(row) => Ok(Some(Box::new(SeaOrmRow(row?)) as Box<dyn RowReader>)),
            None => {
                self.stream = None;
                Ok(None)
            }
        }
    }

    async fn close(mut self: Box<Self>) -> Result<(), DbErr> {
        self.stream.take();
        Ok(())
    }
}

/// 事务内的结果集
///
/// 事务流借用事务句柄，无法装入 `'static` 的迭代器，因此一次读完。
struct SeaOrmRows {
    rows: std::vec::IntoIter<QueryResult>,
}

#[async_trait]
impl ResultIterator for SeaOrmRows {
    async fn next_row(&mut self) -> Result<Option<Box<dyn RowReader>>, DbErr> {
        Ok(self
            .rows
            .next()
            .map(|row| Box::new(SeaOrmRow(row)) as Box<dyn RowReader>))
    }

    async fn close(self: Box<Self>) -> Result<(), DbErr> {
        Ok(())
    }
}

async fn query_row_on<C>(conn: &C, sql: &str, args: Args) -> Result<Option<Box<dyn RowReader>>, DbErr>
where
    C: ConnectionTrait,
{
    let stmt = Statement::from_sql_and_values(conn.get_database_backend(), sql, args);
    let row = conn.query_one(stmt).await?;

    Ok(row.map(|row| Box::new(SeaOrmRow(row)) as Box<dyn RowReader>))
}

async fn query_rows_on<C>(conn: &C, sql: &str, args: Args) -> Result<Box<dyn ResultIterator>, DbErr>
where
    C: ConnectionTrait,
{
    let stmt = Statement::from_sql_and_values(conn.get_database_backend(), sql, args);
    let rows = conn.query_all(stmt).await?;

    Ok(Box::new(SeaOrmRows {
        rows: rows.into_iter(),
    }))
}

async fn execute_on<C>(conn: &C, sql: &str, args: Args) -> Result<ExecOutcome, DbErr>
where
    C: ConnectionTrait,
{
    let backend = conn.get_database_backend();
    let stmt = Statement::from_sql_and_values(backend, sql, args);
    let result = conn.execute(stmt).await?;

    // Postgres has no last-insert-id; inserts there use RETURNING instead.
    let last_insert_id = match backend {
        DbBackend::Postgres => 0,
        _ => result.last_insert_id(),
    };

    Ok(ExecOutcome {
        rows_affected: result.rows_affected(),
        last_insert_id,
    })
}

#[async_trait]
impl QueryExecutor for SeaOrmDatabase {
    async fn query_row(&self, sql: &str, args: Args) -> Result<Option<Box<dyn RowReader>>, DbErr> {
        query_row_on(self.conn.as_ref(), sql, args).await
    }

    async fn query_rows(&self, sql: &str, args: Args) -> Result<Box<dyn ResultIterator>, DbErr> {
        let stmt = Statement::from_sql_and_values(self.backend(), sql, args);
        let stream = self.conn.as_ref().stream(stmt).await?;

        Ok(Box::new(SeaOrmRowStream {
            stream: Some(Box::pin(stream)),
        }))
    }

    async fn execute(&self, sql: &str, args: Args) -> Result<ExecOutcome, DbErr> {
        execute_on(self.conn.as_ref(), sql, args).await
    }
}

#[async_trait]
impl Database for SeaOrmDatabase {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DbErr> {
        let txn = self.conn.begin().await?;
        Ok(Box::new(SeaOrmTransaction { txn }))
    }
}

#[async_trait]
impl QueryExecutor for SeaOrmTransaction {
    async fn query_row(&self, sql: &str, args: Args) -> Result<Option<Box<dyn RowReader>>, DbErr> {
        query_row_on(&self.txn, sql, args).await
    }

    async fn query_rows(&self, sql: &str, args: Args) -> Result<Box<dyn ResultIterator>, DbErr> {
        query_rows_on(&self.txn, sql, args).await
    }

    async fn execute(&self, sql: &str, args: Args) -> Result<ExecOutcome, DbErr> {
        execute_on(&self.txn, sql, args).await
    }
}

#[async_trait]
impl Transaction for SeaOrmTransaction {
    async fn commit(self: Box<Self>) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}
