use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crm_graphql::{
    config::JobsConfig,
    jobs::{
        JobContext, JobKind, reminders,
        schedule::{JobRunner, crontab_lines},
    },
};

#[derive(Debug, Parser)]
#[command(name = "crm-jobs", about = "Scheduled maintenance jobs for the CRM GraphQL API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a single job once and exit.
    Run {
        #[arg(value_enum)]
        job: JobKind,
    },
    /// Run every job on its declared schedule until interrupted.
    Schedule,
    /// Print crontab entries for the declared schedule.
    Crontab {
        /// Program path written into each entry.
        #[arg(long, default_value = "crm-jobs")]
        program: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,crm_graphql=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Crontab { program } => {
            for line in crontab_lines(&program) {
                println!("{line}");
            }
        }
        Command::Run { job } => {
            let ctx = JobContext::new(JobsConfig::from_env()?)?;
            let report = job.run(&ctx).await;
            if job == JobKind::OrderReminders {
                println!("{}", reminders::completion_message(&report));
            }
        }
        Command::Schedule => {
            let ctx = JobContext::new(JobsConfig::from_env()?)?;
            let handles = JobRunner::new(ctx).spawn_all();
            tracing::info!(jobs = handles.len(), "scheduler started");
            tokio::signal::ctrl_c().await?;
            tracing::info!("shutting down scheduler");
            for handle in handles {
                handle.abort();
            }
        }
    }

    Ok(())
}
