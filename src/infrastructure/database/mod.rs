// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库模块
///
/// 提供数据库连接、存储抽象以及基于SeaORM的实现
pub mod connection;
pub mod sea_orm_store;
pub mod store;
