use chrono::Local;
use serde::Deserialize;

use super::{JobContext, JobReport, log::write_job_log};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const RESTOCK_MUTATION: &str = r#"
mutation {
    updateLowStockProducts {
        updatedProducts {
            name
            stock
        }
        message
    }
}
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestockData {
    update_low_stock_products: RestockPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestockPayload {
    updated_products: Vec<RestockedProduct>,
}

#[derive(Debug, Deserialize)]
struct RestockedProduct {
    name: String,
    stock: i32,
}

/// Triggers the restock mutation and logs each product's new stock level.
pub async fn run(ctx: &JobContext) -> JobReport {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

    let mut error = None;
    let lines = match ctx.client.execute::<RestockData>(RESTOCK_MUTATION, None).await {
        Ok(data) => {
            let products = data.update_low_stock_products.updated_products;
            if products.is_empty() {
                vec![format!("{timestamp} - No low-stock products found.")]
            } else {
                products
                    .into_iter()
                    .map(|p| format!("{timestamp} - Product: {}, New stock: {}", p.name, p.stock))
                    .collect()
            }
        }
        Err(err) => {
            tracing::error!(job = "low-stock", error = %err, "restock failed");
            let line = format!("{timestamp} - ERROR updating low stock: {err}");
            error = Some(err.to_string());
            vec![line]
        }
    };

    let lines = write_job_log("low-stock", &ctx.config.low_stock_log, lines).await;
    JobReport { lines, error }
}
