// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::webhook::QueryFilter;
use crate::utils::errors::{ErrorKind, QuerierError};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化日志与追踪
///
/// `RUST_LOG` 未设置时使用 `info,hookstore=debug`；设置 `HOOKSTORE_LOG_JSON=1` 输出 JSON 格式。
/// 重复调用不会 panic。
pub fn init_telemetry() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,hookstore=debug".into());

    let json = std::env::var("HOOKSTORE_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!("telemetry already initialized: {}", e);
    }
}

// The span-attach helpers record into fields declared by `#[tracing::instrument]`
// on the querier operations; recording an undeclared field is a no-op.

pub fn attach_account_id_to_span(account_id: u64) {
    Span::current().record("account_id", account_id);
}

pub fn attach_webhook_id_to_span(webhook_id: u64) {
    Span::current().record("webhook_id", webhook_id);
}

pub fn attach_requester_id_to_span(requester_id: u64) {
    Span::current().record("requester_id", requester_id);
}

pub fn attach_query_filter_to_span(filter: Option<&QueryFilter>) {
    match filter {
        Some(filter) => Span::current().record(
            "query_filter",
            tracing::field::display(format!("page={} limit={}", filter.page, filter.limit)),
        ),
        None => Span::current().record("query_filter", "none"),
    };
}

/// 记录错误并附加描述
///
/// 调用方错误（无效 ID、空输入等）和取消以较低级别记录，其余以 error 级别记录。
pub fn prepare_error(err: QuerierError, description: &str) -> QuerierError {
    match err.kind() {
        ErrorKind::InvalidId
        | ErrorKind::NilInput
        | ErrorKind::InvalidInput
        | ErrorKind::NotFound => {
            tracing::debug!(error = %err, "{}", description);
        }
        ErrorKind::Cancelled => {
            tracing::warn!(error = %err, "{}", description);
        }
        _ => {
            tracing::error!(error = %err, "{}", description);
        }
    }

    err.wrap(description)
}

#[cfg(test)]
#[path = "telemetry_test.rs"]
mod tests;
