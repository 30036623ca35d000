use anyhow::Result;
use chrono::Local;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct LocalTime;

impl tracing_subscriber::fmt::time::FormatTime for LocalTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

pub fn init_logging(service_name: &str) -> Result<()> {
    let file_name = format!("{}.log", service_name);
    let file_appender = tracing_appender::rolling::daily("logs", file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the appender on drop; the subscriber is global, so
    // keep the guard alive for the process lifetime.
    std::mem::forget(guard);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_timer(LocalTime),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(LocalTime),
        )
        .init();

    Ok(())
}
