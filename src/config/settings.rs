// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库和数据访问层的配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 数据访问层配置
    pub querier: QuerierSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
    /// 是否记录每条SQL语句
    #[serde(default)]
    pub log_statements: bool,
}

/// SQL方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Sqlite,
}

/// 数据访问层配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct QuerierSettings {
    /// 查询构建器使用的SQL方言
    pub dialect: Dialect,
    /// 全量批量读取的默认批大小
    pub default_batch_size: u16,
    /// 批量读取结果通道的建议缓冲区大小
    pub channel_buffer: usize,
}

impl Default for QuerierSettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::Postgres,
            default_batch_size: 250,
            channel_buffer: 16,
        }
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和 `HOOKSTORE__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("HOOKSTORE").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 只包含默认值的配置构建器
    pub fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            // Default DB pool settings
            .set_default("database.url", "postgres://localhost:5432/hookstore")?
            .set_default("database.max_connections", 100)?
            .set_default("database.min_connections", 10)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("database.log_statements", false)?
            // Default querier settings
            .set_default("querier.dialect", "postgres")?
            .set_default("querier.default_batch_size", 250)?
            .set_default("querier.channel_buffer", 16)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
