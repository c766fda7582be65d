use std::time::{Duration, Instant};

use log::LevelFilter;

/// Controls statement logging on a connection.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub statements_level: LevelFilter,
    pub slow_statements_level: LevelFilter,
    pub slow_statements_duration: Duration,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            statements_level: LevelFilter::Debug,
            slow_statements_level: LevelFilter::Warn,
            slow_statements_duration: Duration::from_secs(1),
        }
    }
}

impl LogSettings {
    pub fn log_statements(&mut self, level: LevelFilter) {
        self.statements_level = level;
    }

    pub fn log_slow_statements(&mut self, level: LevelFilter, duration: Duration) {
        self.slow_statements_level = level;
        self.slow_statements_duration = duration;
    }
}

pub(crate) struct QueryLogger {
    sql: String,
    rows_returned: u64,
    rows_affected: u64,
    start: Instant,
    settings: LogSettings,
}

impl QueryLogger {
    pub(crate) fn new(sql: impl Into<String>, settings: LogSettings) -> Self {
        Self { sql: sql.into(), rows_returned: 0, rows_affected: 0, start: Instant::now(), settings }
    }

    pub(crate) fn increment_rows_returned(&mut self) {
        self.rows_returned += 1;
    }

    pub(crate) fn increase_rows_affected(&mut self, n: u64) {
        self.rows_affected += n;
    }

    pub(crate) fn finish(&self) {
        let elapsed = self.start.elapsed();

        let lvl = if elapsed >= self.settings.slow_statements_duration {
            self.settings.slow_statements_level
        } else {
            self.settings.statements_level
        };

        if let Some(lvl) = lvl
            .to_level()
            .filter(|lvl| log::log_enabled!(target: "sqlite_mapper::query", *lvl))
        {
            log::logger().log(
                &log::Record::builder()
                    .args(format_args!(
                        "{}; rows affected: {}, rows returned: {}, elapsed: {:.3?}",
                        summarize(&self.sql),
                        self.rows_affected,
                        self.rows_returned,
                        elapsed
                    ))
                    .level(lvl)
                    .module_path_static(Some("sqlite_mapper::query"))
                    .target("sqlite_mapper::query")
                    .build(),
            );
        }
    }
}

impl Drop for QueryLogger {
    fn drop(&mut self) {
        self.finish();
    }
}

fn summarize(sql: &str) -> String {
    // the first few words identify the statement well enough for a log line
    let mut summary = sql.split_whitespace().take(6).collect::<Vec<&str>>().join(" ");

    if summary.len() < sql.trim().len() {
        summary.push_str(" …");
    }

    summary
}
