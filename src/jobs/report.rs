use chrono::Local;
use rust_decimal::Decimal;
use serde::{Deserialize, de::IgnoredAny};

use super::{JobContext, JobReport, log::write_job_log};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const REPORT_QUERY: &str = r#"
query {
    customers {
        id
    }
    orders {
        id
        totalAmount
    }
}
"#;

#[derive(Debug, Deserialize)]
struct ReportData {
    customers: Vec<IgnoredAny>,
    orders: Vec<ReportOrder>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportOrder {
    total_amount: Decimal,
}

/// Summary of the CRM at the time the report ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub customers: usize,
    pub orders: usize,
    pub revenue: Decimal,
}

fn summarize(data: ReportData) -> ReportSummary {
    ReportSummary {
        customers: data.customers.len(),
        orders: data.orders.len(),
        revenue: data.orders.iter().map(|o| o.total_amount).sum(),
    }
}

/// Appends one summary line with customer, order and revenue totals.
pub async fn run(ctx: &JobContext) -> JobReport {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT);

    let mut error = None;
    let line = match ctx.client.execute::<ReportData>(REPORT_QUERY, None).await {
        Ok(data) => {
            let summary = summarize(data);
            tracing::info!(
                job = "report",
                customers = summary.customers,
                orders = summary.orders,
                revenue = %summary.revenue,
                "weekly report generated"
            );
            format!(
                "{timestamp} - Report: {} customers, {} orders, {} revenue",
                summary.customers, summary.orders, summary.revenue
            )
        }
        Err(err) => {
            tracing::error!(job = "report", error = %err, "report generation failed");
            let line = format!("{timestamp} - ERROR generating report: {err}");
            error = Some(err.to_string());
            line
        }
    };

    let lines = write_job_log("report", &ctx.config.report_log, vec![line]).await;
    JobReport { lines, error }
}
