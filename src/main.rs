// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use hookstore::config::settings::Settings;
use hookstore::domain::repositories::webhook_repository::WebhookDataManager;
use hookstore::infrastructure::querier::SqlQuerier;
use hookstore::utils::context::QueryContext;
use hookstore::utils::telemetry;
use tracing::info;

/// 主函数
///
/// 以 JSON Lines 格式把所有未归档的Webhook导出到标准输出
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();

    // 2. Load configuration
    let settings = Settings::new()?;
    info!(dialect = ?settings.querier.dialect, "Configuration loaded");

    // 3. Connect to database
    let querier = SqlQuerier::connect(&settings).await?;

    // 4. Stream every webhook in batches
    let ctx = QueryContext::background();
    let (tx, mut rx) = querier.batch_channel();
    querier
        .get_all_webhooks(&ctx, Some(tx), settings.querier.default_batch_size)
        .await?;

    let mut exported = 0usize;
    while let Some(batch) = rx.recv().await {
        for webhook in batch {
            println!("{}", serde_json::to_string(&webhook)?);
            exported += 1;
        }
    }

    info!(exported, "Export finished");
    Ok(())
}
