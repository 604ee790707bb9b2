// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use uuid::Uuid;

/// 时间源
///
/// 数据层写入 `created_on` 时读取的时钟，测试中可替换为固定时间。
pub trait Clock: Send + Sync {
    /// 当前时间（自 Unix 纪元起的秒数）
    fn now(&self) -> u64;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        u64::try_from(Utc::now().timestamp()).unwrap_or_default()
    }
}

/// 固定时钟，始终返回同一时间
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// 外部标识符生成器
pub trait ExternalIdGenerator: Send + Sync {
    fn new_external_id(&self) -> String;
}

/// 基于 UUID v4 的外部标识符生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidExternalIdGenerator;

impl ExternalIdGenerator for UuidExternalIdGenerator {
    fn new_external_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
