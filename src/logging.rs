use std::env;
use std::error::Error;
use std::path::Path;

use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

const LOG_FILE_PREFIX: &str = "devrating";
const MAX_LOG_FILES: usize = 5;

// Logs go to rotated files under the data directory so the dashboard's
// alternate screen stays clean; show_std mirrors log lines to stdout for
// plain CLI runs when requested.
pub fn init_logging(
    data_dir: &Path,
    log_filter: Option<&str>,
    show_std: bool,
) -> Result<(), Box<dyn Error>> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(data_dir.join("logs"))?;

    let stdout = std::io::stdout.with_filter(move |_| show_std);

    let level = log_filter
        .map(str::to_string)
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME")
        )))
        .with_writer(stdout.and(appender))
        .with_ansi(false)
        .init();

    Ok(())
}
