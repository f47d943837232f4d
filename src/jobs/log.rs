use std::path::Path;

use tokio::{fs::OpenOptions, io::AsyncWriteExt};

/// Appends each line to the file, creating it if needed. Writes are not
/// coordinated with other processes.
pub async fn append_lines(path: &Path, lines: &[String]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    for line in lines {
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
    }
    file.flush().await?;
    Ok(())
}

/// Job variant: a failed write is logged, never returned.
pub async fn write_job_log(job: &'static str, path: &Path, lines: Vec<String>) -> Vec<String> {
    if let Err(err) = append_lines(path, &lines).await {
        tracing::error!(job, path = %path.display(), error = %err, "failed to append job log");
    }
    lines
}
