// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理数据库连接和数据访问层的配置设置
pub mod config;

/// 领域模块
///
/// 包含Webhook与审计日志实体、审计条目构建和数据访问接口
pub mod domain;

/// 基础设施模块
///
/// 提供存储绑定、查询构建和数据访问实现
pub mod infrastructure;

/// 工具模块
///
/// 提供错误类型、日志追踪、时钟和调用上下文
pub mod utils;
