use serde::{Deserialize, Serialize};
use slog::{o, Drain, Level, Logger};
use slog_async::AsyncGuard;
use std::io;

/// Represents the required log level defined in the `LoggerConfig`.
//
// `slog::Level` does not implement `Deserialize`, so a remote derive is used.
// The command line accepts the same names as the config file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(remote = "Level")]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum LevelDef {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
}

impl From<LevelDef> for Level {
    fn from(level: LevelDef) -> Self {
        match level {
            LevelDef::Critical => Level::Critical,
            LevelDef::Error => Level::Error,
            LevelDef::Warning => Level::Warning,
            LevelDef::Info => Level::Info,
            LevelDef::Debug => Level::Debug,
            LevelDef::Trace => Level::Trace,
        }
    }
}

/// The format of emitted log lines
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum LogFormat {
    TextFull,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTarget {
    Stdout,
    Stderr,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    #[serde(with = "LevelDef")]
    pub level: Level,
    pub format: LogFormat,
    pub target: LogTarget,
    /// If set to `false`, the logging thread will _not_ block even if the
    /// queue is full.
    pub block_on_overflow: bool,
    pub chan_size: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            format: LogFormat::Json,
            target: LogTarget::Stdout,
            block_on_overflow: true,
            chan_size: 8192,
        }
    }
}

/// Builds the root logger. Log messages are written by a background thread;
/// the returned guard flushes it on drop and must outlive every logger clone.
pub fn new_logger(config: &LoggerConfig) -> (Logger, AsyncGuard) {
    match config.target {
        LogTarget::Stdout => build(config, io::stdout),
        LogTarget::Stderr => build(config, io::stderr),
    }
}

fn build<W, F>(config: &LoggerConfig, writer: F) -> (Logger, AsyncGuard)
where
    W: io::Write + Send + 'static,
    F: Fn() -> W,
{
    let drain: Box<dyn Drain<Ok = (), Err = slog::Never> + Send> = match config.format {
        LogFormat::TextFull => {
            let decorator = slog_term::PlainDecorator::new(writer());
            Box::new(slog_term::FullFormat::new(decorator).build().fuse())
        }
        LogFormat::Json => Box::new(
            slog_json::Json::new(writer())
                .add_default_keys()
                .build()
                .fuse(),
        ),
    };
    let drain = drain.filter_level(config.level).fuse();
    let overflow = if config.block_on_overflow {
        slog_async::OverflowStrategy::Block
    } else {
        slog_async::OverflowStrategy::DropAndReport
    };
    let (drain, guard) = slog_async::Async::new(drain)
        .chan_size(config.chan_size)
        .overflow_strategy(overflow)
        .thread_name("bitcoind-exporter-log".to_string())
        .build_with_guard();
    (Logger::root(drain.fuse(), o!()), guard)
}
