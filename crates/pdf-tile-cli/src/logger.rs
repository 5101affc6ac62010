use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Metadata, Record};
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub message: String,
}

/// Logger that prints to stderr and keeps a bounded history for the run summary
#[derive(Clone)]
pub struct CliLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    max_entries: usize,
    level: LevelFilter,
}

impl CliLogger {
    pub fn new(max_entries: usize, level: LevelFilter) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            max_entries,
            level,
        }
    }

    /// Level for `-v`/`-q` flags: warnings by default, each `-v` one step more
    pub fn level_from_flags(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::Error;
        }
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }

    /// Number of recorded entries at `level` or more severe
    pub fn count_at_least(&self, level: Level) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.iter().filter(|e| e.level <= level).count())
            .unwrap_or(0)
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl log::Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry {
            timestamp: Local::now(),
            level: record.level(),
            message: format!("{}", record.args()),
        };

        let _ = writeln!(
            std::io::stderr(),
            "{} {:<5} {}",
            entry.timestamp.format("%H:%M:%S%.3f"),
            entry.level,
            entry.message
        );

        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);

            // Keep only the most recent entries
            if entries.len() > self.max_entries {
                let excess = entries.len() - self.max_entries;
                entries.drain(0..excess);
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    fn record(logger: &CliLogger, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .args(format_args!("{}", message))
                .build(),
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let logger = CliLogger::new(3, LevelFilter::Trace);
        for i in 0..5 {
            record(&logger, Level::Info, &format!("message {i}"));
        }

        let entries = logger.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "message 2");
        assert_eq!(entries[2].message, "message 4");
    }

    #[test]
    fn test_filtered_entries_not_recorded() {
        let logger = CliLogger::new(10, LevelFilter::Warn);
        record(&logger, Level::Debug, "hidden");
        record(&logger, Level::Warn, "shown");
        record(&logger, Level::Error, "failed");

        assert_eq!(logger.entries().len(), 2);
        assert_eq!(logger.count_at_least(Level::Warn), 2);
        assert_eq!(logger.count_at_least(Level::Error), 1);
    }

    #[test]
    fn test_level_from_flags() {
        assert_eq!(CliLogger::level_from_flags(0, false), LevelFilter::Warn);
        assert_eq!(CliLogger::level_from_flags(2, false), LevelFilter::Debug);
        assert_eq!(CliLogger::level_from_flags(3, true), LevelFilter::Error);
    }
}
