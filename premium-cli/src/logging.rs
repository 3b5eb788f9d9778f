//! Log output for the `premium` binary.
//!
//! Records go to stderr so stdout carries only command output, and are
//! appended to `logging.file` when one is configured. A non-empty
//! `RUST_LOG` replaces the configured level.

use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::{self, FmtContext};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// One record per line: `<clock> <LEVEL> <target>: <message> <fields>`.
struct PremiumFormat {
    clock: &'static str,
}

impl PremiumFormat {
    const TERMINAL: Self = Self {
        clock: "%H:%M:%S%.3f",
    };
    const FILE: Self = Self {
        clock: "%Y-%m-%d %H:%M:%S%.3f",
    };
}

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[31m",
        Level::WARN => "\x1b[33m",
        Level::INFO => "\x1b[32m",
        Level::DEBUG => "\x1b[34m",
        Level::TRACE => "\x1b[35m",
    }
}

impl<S, N> FormatEvent<S, N> for PremiumFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let clock = Local::now().format(self.clock);

        if writer.has_ansi_escapes() {
            write!(
                writer,
                "\x1b[2m{clock}\x1b[0m {}{:>5}\x1b[0m \x1b[2m{}:\x1b[0m ",
                level_color(meta.level()),
                meta.level(),
                meta.target()
            )?;
        } else {
            write!(writer, "{clock} {:>5} {}: ", meta.level(), meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Filter from `env` (the value of `RUST_LOG`) when it is non-empty,
/// otherwise from the configured level or directive.
fn build_filter(
    configured: &str,
    env: Option<&str>,
) -> Result<EnvFilter> {
    match env.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid {} '{directive}'", EnvFilter::DEFAULT_ENV)),
        None => EnvFilter::try_new(configured)
            .with_context(|| format!("invalid log level '{configured}'")),
    }
}

fn open_log_file(path: &Path) -> Result<File> {
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))
}

/// Installs the global subscriber. Call once, after configuration is
/// resolved.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(&config.level, env.as_deref())?;

    let terminal = fmt::layer()
        .event_format(PremiumFormat::TERMINAL)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let file = match &config.file {
        Some(path) => Some(
            fmt::layer()
                .event_format(PremiumFormat::FILE)
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(terminal)
        .with(file)
        .try_init()
        .context("logging is already initialized")
}
