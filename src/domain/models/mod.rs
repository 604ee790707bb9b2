// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 包含Webhook实体、输入与查询条件，以及审计日志相关类型
pub mod audit_log;
pub mod webhook;
