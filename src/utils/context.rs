// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::QuerierError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// 查询上下文
///
/// 作为每个数据层操作的第一个参数显式传递，携带取消信号和可选的截止时间。
/// 所有存储调用都通过 [`QueryContext::run`] 执行。
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl QueryContext {
    /// 不会被取消、没有截止时间的上下文
    pub fn background() -> Self {
        Self::default()
    }

    /// 使用外部取消令牌创建上下文
    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            deadline: None,
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// 设置截止时间，已有更早的截止时间时保留较早者
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// 派生子上下文：父上下文取消时子上下文随之取消
    pub fn child(&self) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// 在上下文约束下执行一个存储调用
    ///
    /// 上下文已取消、执行过程中被取消或超过截止时间时返回 [`QuerierError::Cancelled`]。
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, QuerierError>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(QuerierError::Cancelled);
        }

        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => Err(QuerierError::Cancelled),
                res = tokio::time::timeout_at(deadline, fut) => res.map_err(|_| QuerierError::Cancelled),
            },
            None => tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => Err(QuerierError::Cancelled),
                out = fut => Ok(out),
            },
        }
    }
}
