//! Scheduled jobs. Each one is a short-lived GraphQL client that appends its
//! outcome to a log file; failures end up in the log, never in the caller.

use std::time::Duration;

use clap::ValueEnum;
use reqwest::Client;

use crate::config::JobsConfig;

pub mod client;
pub mod heartbeat;
pub mod log;
pub mod low_stock;
pub mod reminders;
pub mod report;
pub mod schedule;

pub use client::{GraphqlClient, GraphqlClientError};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a job needs to run.
#[derive(Clone)]
pub struct JobContext {
    pub client: GraphqlClient,
    pub config: JobsConfig,
}

impl JobContext {
    pub fn new(config: JobsConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let client = GraphqlClient::new(config.graphql_url.clone(), config.retries, http);
        Ok(Self { client, config })
    }
}

/// Lines a run appended, plus the failure it logged, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub lines: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JobKind {
    Heartbeat,
    LowStock,
    Report,
    OrderReminders,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::LowStock => "low-stock",
            Self::Report => "report",
            Self::OrderReminders => "order-reminders",
        }
    }

    /// Runs the job once. Failures are logged and reported, never raised.
    pub async fn run(self, ctx: &JobContext) -> JobReport {
        tracing::debug!(job = self.as_str(), endpoint = %ctx.client.endpoint(), "job started");
        let report = match self {
            Self::Heartbeat => heartbeat::run(ctx).await,
            Self::LowStock => low_stock::run(ctx).await,
            Self::Report => report::run(ctx).await,
            Self::OrderReminders => reminders::run(ctx).await,
        };
        tracing::info!(
            job = self.as_str(),
            lines = report.lines.len(),
            failed = report.error.is_some(),
            "job finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::path::Path;
    use url::Url;

    fn context(server: &MockServer, dir: &Path) -> JobContext {
        let config = JobsConfig {
            graphql_url: Url::parse(&server.url("/graphql")).expect("url"),
            retries: 0,
            heartbeat_log: dir.join("heartbeat.txt"),
            low_stock_log: dir.join("low_stock.txt"),
            report_log: dir.join("report.txt"),
            reminders_log: dir.join("reminders.txt"),
        };
        JobContext::new(config).expect("context")
    }

    async fn read(path: &Path) -> String {
        tokio::fs::read_to_string(path).await.expect("log written")
    }

    #[tokio::test]
    async fn heartbeat_logs_hello() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql").body_contains("hello");
                then.status(200)
                    .json_body(json!({ "data": { "hello": "Hello, GraphQL!" } }));
            })
            .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&server, dir.path());

        JobKind::Heartbeat.run(&ctx).await;
        JobKind::Heartbeat.run(&ctx).await;

        let content = read(&ctx.config.heartbeat_log).await;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2, "heartbeat appends rather than overwrites");
        assert!(lines[0].ends_with(" CRM is alive | GraphQL says: Hello, GraphQL!"));
    }

    #[tokio::test]
    async fn heartbeat_logs_failure_reason() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(500).body("boom");
            })
            .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&server, dir.path());

        let lines = JobKind::Heartbeat.run(&ctx).await.lines;

        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("CRM is alive | GraphQL check failed: unexpected status 500"));
        assert_eq!(read(&ctx.config.heartbeat_log).await.lines().count(), 1);
    }

    #[tokio::test]
    async fn low_stock_logs_each_product() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql").body_contains("updateLowStockProducts");
                then.status(200).json_body(json!({
                    "data": {
                        "updateLowStockProducts": {
                            "updatedProducts": [
                                { "name": "Laptop", "stock": 15 },
                                { "name": "Phone", "stock": 12 }
                            ],
                            "message": "Restocked 2 low-stock products."
                        }
                    }
                }));
            })
            .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&server, dir.path());

        let lines = JobKind::LowStock.run(&ctx).await.lines;

        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - Product: Laptop, New stock: 15"));
        assert!(lines[1].ends_with(" - Product: Phone, New stock: 12"));
    }

    #[tokio::test]
    async fn report_logs_totals() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200).json_body(json!({
                    "data": {
                        "customers": [{ "id": "c1" }, { "id": "c2" }, { "id": "c3" }],
                        "orders": [
                            { "id": "o1", "totalAmount": "10.00" },
                            { "id": "o2", "totalAmount": "15.00" }
                        ]
                    }
                }));
            })
            .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&server, dir.path());

        JobKind::Report.run(&ctx).await;

        let content = read(&ctx.config.report_log).await;
        assert!(
            content.trim_end().ends_with(" - Report: 3 customers, 2 orders, 25.00 revenue"),
            "unexpected report line: {content}"
        );
    }

    #[tokio::test]
    async fn report_failure_is_logged_not_raised() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200)
                    .json_body(json!({ "data": null, "errors": [{ "message": "db down" }] }));
            })
            .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&server, dir.path());

        let lines = JobKind::Report.run(&ctx).await.lines;

        assert!(lines[0].ends_with(" - ERROR generating report: GraphQL errors: db down"));
    }

    #[tokio::test]
    async fn reminders_log_order_and_email() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql").body_contains("startDate");
                then.status(200).json_body(json!({
                    "data": {
                        "orders": [
                            {
                                "id": "8f0c",
                                "orderDate": "2025-03-09T10:00:00+00:00",
                                "customer": { "email": "alice@example.com" }
                            }
                        ]
                    }
                }));
            })
            .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&server, dir.path());

        let lines = JobKind::OrderReminders.run(&ctx).await.lines;

        mock.assert_async().await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" - Order ID: 8f0c | Customer Email: alice@example.com"));
    }

    #[tokio::test]
    async fn reminders_without_orders_log_info_line() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200).json_body(json!({ "data": { "orders": [] } }));
            })
            .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&server, dir.path());

        let report = JobKind::OrderReminders.run(&ctx).await;

        assert_eq!(report.error, None);
        assert_eq!(report.lines.len(), 1);
        assert!(report.lines[0].ends_with(" - No recent orders found."));
        assert_eq!(reminders::completion_message(&report), "Order reminders processed!");
    }

    #[tokio::test]
    async fn reminders_failure_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200)
                    .json_body(json!({ "data": null, "errors": [{ "message": "db down" }] }));
            })
            .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&server, dir.path());

        let report = JobKind::OrderReminders.run(&ctx).await;

        assert_eq!(report.error.as_deref(), Some("GraphQL errors: db down"));
        assert!(report.lines[0].ends_with(" - Error processing order reminders: GraphQL errors: db down"));
        assert_eq!(
            reminders::completion_message(&report),
            "Error: GraphQL errors: db down"
        );
    }
}
