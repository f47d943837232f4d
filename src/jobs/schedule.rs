use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use super::{JobContext, JobKind};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// A declared schedule entry. `cron` is what goes into a crontab; `every` is
/// the period used by the in-process runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledJob {
    pub cron: &'static str,
    pub job: JobKind,
    pub every: Duration,
}

pub const SCHEDULE: [ScheduledJob; 4] = [
    ScheduledJob {
        cron: "*/5 * * * *",
        job: JobKind::Heartbeat,
        every: Duration::from_secs(5 * MINUTE),
    },
    ScheduledJob {
        cron: "0 */12 * * *",
        job: JobKind::LowStock,
        every: Duration::from_secs(12 * HOUR),
    },
    ScheduledJob {
        cron: "0 6 * * 1",
        job: JobKind::Report,
        every: Duration::from_secs(7 * DAY),
    },
    ScheduledJob {
        cron: "0 9 * * *",
        job: JobKind::OrderReminders,
        every: Duration::from_secs(DAY),
    },
];

/// Renders the schedule as crontab lines invoking `program run <job>`.
pub fn crontab_lines(program: &str) -> Vec<String> {
    SCHEDULE
        .iter()
        .map(|entry| format!("{} {} run {}", entry.cron, program, entry.job.as_str()))
        .collect()
}

/// Periodic runner for the declared schedule. Each entry fires once at
/// startup and then every `every`; runs of different jobs do not interact.
pub struct JobRunner {
    ctx: JobContext,
}

impl JobRunner {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx }
    }

    pub fn spawn_all(self) -> Vec<JoinHandle<()>> {
        SCHEDULE
            .iter()
            .copied()
            .map(|entry| {
                let ctx = self.ctx.clone();
                tokio::spawn(async move { run_every(ctx, entry).await })
            })
            .collect()
    }
}

async fn run_every(ctx: JobContext, entry: ScheduledJob) {
    tracing::info!(
        job = entry.job.as_str(),
        cron = entry.cron,
        every_secs = entry.every.as_secs(),
        "job scheduled"
    );
    let mut ticker = interval(entry.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        entry.job.run(&ctx).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_job_is_scheduled_once() {
        for job in [
            JobKind::Heartbeat,
            JobKind::LowStock,
            JobKind::Report,
            JobKind::OrderReminders,
        ] {
            assert_eq!(SCHEDULE.iter().filter(|e| e.job == job).count(), 1);
        }
    }

    #[test]
    fn heartbeat_runs_every_five_minutes() {
        let heartbeat = SCHEDULE
            .iter()
            .find(|e| e.job == JobKind::Heartbeat)
            .expect("heartbeat scheduled");
        assert_eq!(heartbeat.cron, "*/5 * * * *");
        assert_eq!(heartbeat.every, Duration::from_secs(300));
    }

    #[test]
    fn crontab_invokes_run_subcommand() {
        let lines = crontab_lines("/usr/local/bin/crm-jobs");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "*/5 * * * * /usr/local/bin/crm-jobs run heartbeat");
        assert_eq!(lines[1], "0 */12 * * * /usr/local/bin/crm-jobs run low-stock");
    }
}
