// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::audit_log::FieldChangeSummary;
use crate::utils::errors::QuerierError;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// `events` 列的元素分隔符
pub const EVENTS_SEPARATOR: &str = ",";
/// `data_types` 列的元素分隔符
pub const DATA_TYPES_SEPARATOR: &str = "|";
/// `topics` 列的元素分隔符
pub const TOPICS_SEPARATOR: &str = ";";

/// 单页最大条数
pub const MAX_QUERY_LIMIT: u8 = 250;
/// 默认每页条数
pub const DEFAULT_QUERY_LIMIT: u8 = 20;

/// Webhook实体
///
/// 表示一个账户下的 Webhook 订阅：事件发生时向 `url` 以 `method` 发送通知。
/// `archived_on` 有值的记录视为已软删除，不会出现在任何读取路径中。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Webhook {
    /// 自增主键，0 表示未指定
    pub id: u64,
    /// 存储层分配的对外标识符
    pub external_id: String,
    pub name: String,
    /// 发送通知时使用的媒体类型
    pub content_type: String,
    pub url: String,
    /// 发送通知时使用的 HTTP 方法
    pub method: String,
    pub events: Vec<String>,
    pub data_types: Vec<String>,
    pub topics: Vec<String>,
    /// 创建时间（Unix 秒）
    pub created_on: u64,
    pub last_updated_on: Option<u64>,
    pub archived_on: Option<u64>,
    /// 所属账户ID
    pub belongs_to_account: u64,
}

impl Webhook {
    /// 根据更新输入修改可变字段
    ///
    /// 返回实际发生变化的字段列表，用于写入审计日志。
    /// `id`、`external_id`、`created_on`、`belongs_to_account` 不会被修改。
    pub fn update(&mut self, input: &WebhookUpdateInput) -> Vec<FieldChangeSummary> {
        let mut changes = Vec::new();

        update_field(&mut changes, "name", &mut self.name, &input.name);
        update_field(
            &mut changes,
            "content_type",
            &mut self.content_type,
            &input.content_type,
        );
        update_field(&mut changes, "url", &mut self.url, &input.url);
        update_field(&mut changes, "method", &mut self.method, &input.method);
        update_field(&mut changes, "events", &mut self.events, &input.events);
        update_field(
            &mut changes,
            "data_types",
            &mut self.data_types,
            &input.data_types,
        );
        update_field(&mut changes, "topics", &mut self.topics, &input.topics);

        changes
    }

    /// 写入前校验：多值字段的元素非空且不含该列的分隔符
    pub fn validate_for_storage(&self) -> Result<(), QuerierError> {
        check_elements("events", &self.events, EVENTS_SEPARATOR)?;
        check_elements("data_types", &self.data_types, DATA_TYPES_SEPARATOR)?;
        check_elements("topics", &self.topics, TOPICS_SEPARATOR)
    }
}

fn update_field<T>(
    changes: &mut Vec<FieldChangeSummary>,
    field_name: &str,
    current: &mut T,
    desired: &Option<T>,
) where
    T: Clone + PartialEq + Serialize,
{
    if let Some(desired) = desired {
        if desired != current {
            changes.push(FieldChangeSummary {
                field_name: field_name.to_string(),
                old_value: serde_json::to_value(&*current).unwrap_or_default(),
                new_value: serde_json::to_value(desired).unwrap_or_default(),
            });
            *current = desired.clone();
        }
    }
}

/// 多值列元素必须非空且不含该列的分隔符
fn check_elements(field: &str, values: &[String], separator: &str) -> Result<(), QuerierError> {
    if values.iter().any(String::is_empty) {
        return Err(QuerierError::InvalidInput(format!(
            "{} contains an empty element",
            field
        )));
    }
    if let Some(bad) = values.iter().find(|v| v.contains(separator)) {
        return Err(QuerierError::InvalidInput(format!(
            "{} element {:?} contains reserved separator {:?}",
            field, bad, separator
        )));
    }
    Ok(())
}

/// Webhook创建输入
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Validate)]
pub struct WebhookCreationInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(min = 1))]
    pub content_type: String,
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 1))]
    pub method: String,
    pub events: Vec<String>,
    pub data_types: Vec<String>,
    pub topics: Vec<String>,
    pub belongs_to_account: u64,
}

impl WebhookCreationInput {
    /// 校验创建输入
    ///
    /// * 所属账户为 0 时返回 [`QuerierError::InvalidId`]
    /// * 字段规则、空元素或分隔符检查失败时返回 [`QuerierError::InvalidInput`]
    pub fn validate_input(&self) -> Result<(), QuerierError> {
        if self.belongs_to_account == 0 {
            return Err(QuerierError::InvalidId);
        }

        self.validate()
            .map_err(|e| QuerierError::InvalidInput(e.to_string()))?;

        check_elements("events", &self.events, EVENTS_SEPARATOR)?;
        check_elements("data_types", &self.data_types, DATA_TYPES_SEPARATOR)?;
        check_elements("topics", &self.topics, TOPICS_SEPARATOR)
    }
}

/// 传给查询构建器的创建输入
///
/// 在 [`WebhookCreationInput`] 基础上附加数据层分配的外部ID和创建时间，
/// 使返回给调用方的 Webhook 与落库记录一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookDatabaseCreationInput {
    pub external_id: String,
    pub created_on: u64,
    pub name: String,
    pub content_type: String,
    pub url: String,
    pub method: String,
    pub events: Vec<String>,
    pub data_types: Vec<String>,
    pub topics: Vec<String>,
    pub belongs_to_account: u64,
}

impl WebhookDatabaseCreationInput {
    pub fn from_input(input: &WebhookCreationInput, external_id: String, created_on: u64) -> Self {
        Self {
            external_id,
            created_on,
            name: input.name.clone(),
            content_type: input.content_type.clone(),
            url: input.url.clone(),
            method: input.method.clone(),
            events: input.events.clone(),
            data_types: input.data_types.clone(),
            topics: input.topics.clone(),
            belongs_to_account: input.belongs_to_account,
        }
    }

    /// 以分配到的主键构造 Webhook
    pub fn into_webhook(self, id: u64) -> Webhook {
        Webhook {
            id,
            external_id: self.external_id,
            name: self.name,
            content_type: self.content_type,
            url: self.url,
            method: self.method,
            events: self.events,
            data_types: self.data_types,
            topics: self.topics,
            created_on: self.created_on,
            last_updated_on: None,
            archived_on: None,
            belongs_to_account: self.belongs_to_account,
        }
    }
}

/// Webhook更新输入，`None` 表示保持不变
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebhookUpdateInput {
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub url: Option<String>,
    pub method: Option<String>,
    pub events: Option<Vec<String>>,
    pub data_types: Option<Vec<String>>,
    pub topics: Option<Vec<String>>,
}

/// Webhook列表查询结果
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebhookList {
    pub webhooks: Vec<Webhook>,
    /// 未提供过滤条件时为 0
    pub page: u64,
    /// 未提供过滤条件时为 0
    pub limit: u8,
    pub filtered_count: u64,
    pub total_count: u64,
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// 分页与过滤条件
///
/// 时间范围均为 Unix 秒，开区间。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct QueryFilter {
    #[validate(range(min = 1))]
    pub page: u64,
    #[validate(range(min = 1, max = 250))]
    pub limit: u8,
    pub created_after: Option<u64>,
    pub created_before: Option<u64>,
    pub updated_after: Option<u64>,
    pub updated_before: Option<u64>,
    pub sort_by: SortDirection,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_QUERY_LIMIT,
            created_after: None,
            created_before: None,
            updated_after: None,
            updated_before: None,
            sort_by: SortDirection::Asc,
        }
    }
}

impl QueryFilter {
    /// 实际使用的每页条数，限制在 `1..=250`
    pub fn effective_limit(&self) -> u8 {
        self.limit.clamp(1, MAX_QUERY_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * u64::from(self.effective_limit())
    }
}

#[cfg(test)]
#[path = "webhook_test.rs"]
mod tests;
