// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含数据访问的技术实现细节。
///
/// 包含的子模块：
/// - 数据库（database）：存储抽象、连接池和基于SeaORM的实现
/// - 查询构建（querybuilding）：方言相关的SQL生成
/// - 数据访问（querier）：扫描、事务和Webhook操作
///
/// 基础设施层依赖于领域层的抽象接口，领域层不感知具体的存储实现。
pub mod database;
pub mod querier;
pub mod querybuilding;
