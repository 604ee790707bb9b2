// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 审计条目构建（audit）：为Webhook的创建、更新和归档生成审计日志负载
pub mod audit;
