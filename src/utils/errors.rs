// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::DbErr;
use thiserror::Error;

/// 数据访问层错误类型
///
/// 每个变体对应一种错误分类，并尽可能保留底层原因。
/// 操作层通过 [`QuerierError::wrap`] 附加操作名称，
/// 调用方应使用 [`QuerierError::kind`] 判断错误类别，而不是匹配错误文本。
#[derive(Error, Debug)]
pub enum QuerierError {
    /// 必填的标识符为 0
    #[error("invalid ID provided")]
    InvalidId,

    /// 必填的输入为空
    #[error("required input `{0}` was not provided")]
    NilInput(&'static str),

    /// 输入未通过校验
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 单行查询没有返回任何数据
    #[error("no rows found")]
    NotFound,

    /// 列绑定或多值列解码失败
    #[error("scanning column `{column}`: {source}")]
    Scan {
        column: &'static str,
        #[source]
        source: DbErr,
    },

    /// 结果集迭代或关闭失败
    #[error("iterating rows: {0}")]
    Iteration(#[source] DbErr),

    /// 事务开始或提交失败
    #[error("{action} transaction: {source}")]
    Transaction {
        action: &'static str,
        #[source]
        source: DbErr,
    },

    /// 其他数据库错误
    #[error("database error: {0}")]
    Store(#[from] DbErr),

    /// 内部不变量被破坏
    #[error("internal error: {0}")]
    Internal(String),

    /// 调用上下文已取消或超时
    #[error("operation cancelled")]
    Cancelled,

    /// 附加了上下文描述的错误
    #[error("{context}: {source}")]
    Wrapped {
        context: String,
        #[source]
        source: Box<QuerierError>,
    },
}

/// 错误类别标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidId,
    NilInput,
    InvalidInput,
    NotFound,
    Scan,
    Iteration,
    Transaction,
    Store,
    Internal,
    Cancelled,
}

impl QuerierError {
    /// 用描述包装错误，保留原始错误作为来源
    pub fn wrap(self, context: impl Into<String>) -> Self {
        QuerierError::Wrapped {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// 返回最内层（未包装）的错误
    pub fn root(&self) -> &QuerierError {
        match self {
            QuerierError::Wrapped { source, .. } => source.root(),
            other => other,
        }
    }

    /// 返回最内层错误的类别
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            QuerierError::InvalidId => ErrorKind::InvalidId,
            QuerierError::NilInput(_) => ErrorKind::NilInput,
            QuerierError::InvalidInput(_) => ErrorKind::InvalidInput,
            QuerierError::NotFound => ErrorKind::NotFound,
            QuerierError::Scan { .. } => ErrorKind::Scan,
            QuerierError::Iteration(_) => ErrorKind::Iteration,
            QuerierError::Transaction { .. } => ErrorKind::Transaction,
            QuerierError::Store(_) => ErrorKind::Store,
            QuerierError::Internal(_) => ErrorKind::Internal,
            QuerierError::Cancelled => ErrorKind::Cancelled,
            QuerierError::Wrapped { .. } => unreachable!("root() never returns a wrapper"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
