//! Logging setup on top of `log4rs`.
//!
//! Console output goes to stderr so that query results printed on stdout stay clean.
//! Per-operation summaries are logged on the `plp_bookstore::audit` target. With a log
//! directory they go to their own rolling file only; without one they reach the
//! console at debug level and above.

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

pub const AUDIT_TARGET: &str = "plp_bookstore::audit";

pub const LOG_LEVEL_ENV: &str = "PLP_BOOKSTORE_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "PLP_BOOKSTORE_LOG_DIR";

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;
const ROLL_KEEP: u32 = 7;

/// error|warn|info|debug|trace|off; anything else falls back to info.
#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Build the log4rs config: stderr console, plus `{dir}/plp_bookstore.log` and
/// `{dir}/plp_bookstore_audit.log` when `dir` is given.
///
/// # Errors
/// Returns an error if the directory cannot be created or an appender fails to build.
pub fn build_config(
    dir: Option<&Path>,
    level: LevelFilter,
) -> Result<Config, Box<dyn std::error::Error>> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();
    let mut builder =
        Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut appenders = vec!["console"];

    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)?;
        builder = builder
            .appender(Appender::builder().build("file", Box::new(rolling(dir, "plp_bookstore")?)))
            .appender(
                Appender::builder().build("audit", Box::new(rolling(dir, "plp_bookstore_audit")?)),
            )
            .logger(
                Logger::builder()
                    .appender("audit")
                    .additive(false)
                    .build(AUDIT_TARGET, LevelFilter::Info),
            );
        appenders.push("file");
    } else {
        let audit_level = if level >= LevelFilter::Debug { level } else { LevelFilter::Warn };
        builder = builder.logger(Logger::builder().build(AUDIT_TARGET, audit_level));
    }

    // The driver's own logging is noisy at debug.
    builder = builder.logger(Logger::builder().build("mongodb", LevelFilter::Warn));

    let root = appenders.iter().fold(Root::builder(), |r, a| r.appender(*a));
    Ok(builder.build(root.build(level))?)
}

fn rolling(dir: &Path, stem: &str) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", dir.join(format!("{stem}.{{}}.log")).display()), ROLL_KEEP)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(dir.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Install the global logger. A second call in the same process is a no-op.
pub fn configure_logging(dir: Option<&Path>, level: Option<&str>) {
    match build_config(dir, parse_level(level)) {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                log::debug!("logger already installed: {e}");
            }
        }
        Err(e) => eprintln!("logging disabled: {e}"),
    }
}

/// Configure from `PLP_BOOKSTORE_LOG_LEVEL` and `PLP_BOOKSTORE_LOG_DIR`.
pub fn configure_from_env() {
    let dir = std::env::var(LOG_DIR_ENV).ok().map(std::path::PathBuf::from);
    let level = std::env::var(LOG_LEVEL_ENV).ok();
    configure_logging(dir.as_deref(), level.as_deref());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing() {
        assert_eq!(parse_level(None), LevelFilter::Info);
        assert_eq!(parse_level(Some("DEBUG")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("off")), LevelFilter::Off);
        assert_eq!(parse_level(Some("bogus")), LevelFilter::Info);
    }

    #[test]
    fn file_appender_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let cfg = build_config(Some(&logs), LevelFilter::Info).unwrap();
        assert!(logs.is_dir());
        assert_eq!(cfg.appenders().len(), 3);
        assert_eq!(cfg.root().appenders(), ["console", "file"]);
    }

    #[test]
    fn audit_lines_get_their_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = build_config(Some(dir.path()), LevelFilter::Info).unwrap();
        let audit = cfg.loggers().iter().find(|l| l.name() == AUDIT_TARGET).unwrap();
        assert!(!audit.additive());
        assert_eq!(audit.appenders(), ["audit"]);
        assert_eq!(audit.level(), LevelFilter::Info);
    }

    #[test]
    fn audit_lines_stay_off_the_console_at_info() {
        let audit_level = |level| {
            let cfg = build_config(None, level).unwrap();
            cfg.loggers().iter().find(|l| l.name() == AUDIT_TARGET).unwrap().level()
        };
        assert!(audit_level(LevelFilter::Info) < LevelFilter::Info);
        assert_eq!(audit_level(LevelFilter::Debug), LevelFilter::Debug);
    }

    #[test]
    fn console_only_without_dir() {
        let cfg = build_config(None, LevelFilter::Warn).unwrap();
        assert_eq!(cfg.appenders().len(), 1);
        assert_eq!(cfg.root().level(), LevelFilter::Warn);
    }
}
