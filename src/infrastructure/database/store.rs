// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 存储抽象
//!
//! querier 只通过这里的特质访问数据库：单行读取器、结果集迭代器、
//! 语句执行器、连接和事务。具体驱动绑定见 `sea_orm_store`，测试使用内存假实现。

use async_trait::async_trait;
use sea_orm::{DbErr, Value};

/// 位置参数列表
pub type Args = Vec<Value>;

/// 定位在某一行上的读取器
///
/// 列按下标访问。`Ok(None)` 表示该列为 NULL。
pub trait RowReader: Send {
    fn try_get_i64(&self, index: usize) -> Result<Option<i64>, DbErr>;

    fn try_get_string(&self, index: usize) -> Result<Option<String>, DbErr>;
}

/// 结果集迭代器
///
/// 调用方必须在所有退出路径上调用 [`ResultIterator::close`]。
#[async_trait]
pub trait ResultIterator: Send {
    /// 前进到下一行；迭代结束返回 `Ok(None)`
    async fn next_row(&mut self) -> Result<Option<Box<dyn RowReader>>, DbErr>;

    async fn close(self: Box<Self>) -> Result<(), DbErr>;
}

/// 写语句的执行结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

/// 语句执行器，连接与事务共同实现
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// 执行查询并返回第一行
    async fn query_row(&self, sql: &str, args: Args) -> Result<Option<Box<dyn RowReader>>, DbErr>;

    /// 执行查询并返回结果集
    async fn query_rows(&self, sql: &str, args: Args) -> Result<Box<dyn ResultIterator>, DbErr>;

    /// 执行写语句
    async fn execute(&self, sql: &str, args: Args) -> Result<ExecOutcome, DbErr>;
}

/// 数据库连接（池）
#[async_trait]
pub trait Database: QueryExecutor {
    async fn begin(&self) -> Result<Box<dyn Transaction>, DbErr>;
}

/// 打开的事务
///
/// 事务句柄不得在任务之间共享。
#[async_trait]
pub trait Transaction: QueryExecutor {
    async fn commit(self: Box<Self>) -> Result<(), DbErr>;

    async fn rollback(self: Box<Self>) -> Result<(), DbErr>;
}
