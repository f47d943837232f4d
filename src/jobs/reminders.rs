use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::{JobContext, JobReport, log::write_job_log};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";
const LOOKBACK_DAYS: i64 = 7;
const RECENT_ORDERS_QUERY: &str = r#"
query RecentOrders($startDate: DateTime!) {
    orders(filter: { orderDateGte: $startDate }) {
        id
        orderDate
        customer {
            email
        }
    }
}
"#;

#[derive(Debug, Deserialize)]
struct RecentOrders {
    orders: Vec<RecentOrder>,
}

#[derive(Debug, Deserialize)]
struct RecentOrder {
    id: String,
    customer: Option<OrderCustomer>,
}

#[derive(Debug, Deserialize)]
struct OrderCustomer {
    email: Option<String>,
}

/// Midnight (UTC) of the day `LOOKBACK_DAYS` before `now`.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    (now - Duration::days(LOOKBACK_DAYS))
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Logs the id and customer email of every order placed in the last week.
pub async fn run(ctx: &JobContext) -> JobReport {
    let start = window_start(Utc::now());
    let variables = json!({ "startDate": start.to_rfc3339() });

    let result = ctx
        .client
        .execute::<RecentOrders>(RECENT_ORDERS_QUERY, Some(variables))
        .await;

    let stamp = || Local::now().format(TIMESTAMP_FORMAT).to_string();
    let mut error = None;
    let lines = match result {
        Ok(data) if data.orders.is_empty() => {
            vec![format!("{} - No recent orders found.", stamp())]
        }
        Ok(data) => data
            .orders
            .into_iter()
            .map(|order| {
                let email = order
                    .customer
                    .and_then(|c| c.email)
                    .unwrap_or_else(|| "None".to_string());
                format!("{} - Order ID: {} | Customer Email: {}", stamp(), order.id, email)
            })
            .collect(),
        Err(err) => {
            tracing::error!(job = "order-reminders", error = %err, "order reminders failed");
            let line = format!("{} - Error processing order reminders: {err}", stamp());
            error = Some(err.to_string());
            vec![line]
        }
    };

    let lines = write_job_log("order-reminders", &ctx.config.reminders_log, lines).await;
    JobReport { lines, error }
}

/// Console summary printed after a one-shot run.
pub fn completion_message(report: &JobReport) -> String {
    match &report.error {
        Some(err) => format!("Error: {err}"),
        None => "Order reminders processed!".to_string(),
    }
}
