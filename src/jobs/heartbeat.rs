use chrono::Local;
use serde::Deserialize;

use super::{JobContext, JobReport, log::write_job_log};

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y-%H:%M:%S";
const HELLO_QUERY: &str = "query { hello }";

#[derive(Debug, Deserialize)]
struct HelloData {
    hello: Option<String>,
}

/// Appends an "alive" line, annotated with the result of a `hello` probe.
pub async fn run(ctx: &JobContext) -> JobReport {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT);
    let mut message = format!("{timestamp} CRM is alive");
    let mut error = None;

    match ctx.client.execute::<HelloData>(HELLO_QUERY, None).await {
        Ok(data) => {
            let hello = data
                .hello
                .unwrap_or_else(|| "No response from GraphQL.".to_string());
            message.push_str(&format!(" | GraphQL says: {hello}"));
        }
        Err(err) => {
            tracing::warn!(job = "heartbeat", error = %err, "graphql health check failed");
            message.push_str(&format!(" | GraphQL check failed: {err}"));
            error = Some(err.to_string());
        }
    }

    let lines = write_job_log("heartbeat", &ctx.config.heartbeat_log, vec![message]).await;
    JobReport { lines, error }
}
