//! Structured logging.
//!
//! One env_logger instance writes JSON lines to stdout. It is created once at
//! startup and handed to components explicitly as a [`SharedLogger`]; the same
//! sink is also installed behind the `log` facade so actix's access log ends
//! up in the same stream.

use chrono::Local;
use env_logger::{Env, Target};
use log::{Level, Log, Metadata, Record};
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::config::LoggingConfig;

pub type SharedLogger = Arc<dyn Log>;

pub fn build_json_logger(default_level: &str) -> env_logger::Logger {
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .build()
}

/// Builds the process logger and installs a forwarder for the `log` facade.
pub fn init(config: &LoggingConfig) -> SharedLogger {
    let logger = build_json_logger(&config.level);
    let max_level = logger.filter();
    let shared: SharedLogger = Arc::new(logger);

    if log::set_boxed_logger(Box::new(Forward(shared.clone()))).is_ok() {
        log::set_max_level(max_level);
    }
    shared
}

struct Forward(SharedLogger);

impl Log for Forward {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.0.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.0.log(record)
    }

    fn flush(&self) {
        self.0.flush()
    }
}

/// A sink bound to a fixed target, owned by the component that logs through it.
#[derive(Clone)]
pub struct ComponentLogger {
    sink: SharedLogger,
    target: &'static str,
}

impl ComponentLogger {
    pub fn new(sink: SharedLogger, target: &'static str) -> Self {
        Self { sink, target }
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Info, args)
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.emit(Level::Error, args)
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder().level(level).target(self.target).build();
        if self.sink.enabled(&metadata) {
            self.sink
                .log(&Record::builder().metadata(metadata).args(args).build());
        }
    }
}
