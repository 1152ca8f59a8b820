//! Output formatting and logging utilities

use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let total_seconds = StdSystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        // HH:MM:SS
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Setup output logging to file or stdout
pub fn setup_output(output_path: Option<&String>) -> Result<()> {
    match output_path {
        Some(path) => {
            let log = File::create(path)
                .wrap_err_with(|| format!("Could not create output file: {}", path))?;
            let file_layer = layer()
                .with_writer(log)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(false);
            Registry::default()
                .with(file_layer)
                .try_init()
                .wrap_err("Failed to install the log subscriber")?;
            info!("Output will be written to: {}", path);
        }
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default()
                .with(stdout_layer)
                .try_init()
                .wrap_err("Failed to install the log subscriber")?;
            info!("Output will be printed to stdout");
        }
    }
    Ok(())
}

/// Serialize `value` as pretty JSON into `path`
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let file = File::create(path).wrap_err_with(|| format!("Unable to create results file: {}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .wrap_err_with(|| format!("Failed to write results to {}", path))?;
    info!("Results written to: {}", path);
    Ok(())
}
