use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
enum LogFile {
    Error,
    Game,
    Movement,
}

impl LogFile {
    const ALL: [(LogFile, &'static str); 3] = [
        (LogFile::Error, "error.log"),
        (LogFile::Game, "game.log"),
        (LogFile::Movement, "movement.log"),
    ];
}

struct Logger {
    files: Mutex<BTreeMap<LogFile, File>>,
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

const SESSION_RULE: &str = "-------------------------------------------------------------------------------";

/// Opens `<root>/log/*.log` for appending. Until this runs every `log_*`
/// call is a no-op, so library code and tests may log unconditionally.
pub fn init(root: &Path) -> Result<(), String> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let log_dir = root.join("log");
    std::fs::create_dir_all(&log_dir)
        .map_err(|err| format!("log directory create failed: {}", err))?;

    let mut files = BTreeMap::new();
    for (log_file, name) in LogFile::ALL {
        let path = log_dir.join(name);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| format!("open log {} failed: {}", name, err))?;
        writeln!(file, "{SESSION_RULE}")
            .and_then(|_| writeln!(file, "{name} - started {}", format_timestamp(unix_timestamp())))
            .map_err(|err| format!("header write failed: {}", err))?;
        files.insert(log_file, file);
    }

    LOGGER
        .set(Logger {
            files: Mutex::new(files),
        })
        .map_err(|_| "log system already initialized".to_string())?;
    Ok(())
}

pub fn log_game(message: &str) {
    log_timestamped(LogFile::Game, message);
}

pub fn log_movement(message: &str) {
    log_timestamped(LogFile::Movement, message);
}

pub fn log_error(message: &str) {
    log_timestamped(LogFile::Error, message);
}

fn log_timestamped(log_file: LogFile, message: &str) {
    if let Some(logger) = LOGGER.get() {
        let line = format!("{} (0): {message}\n", format_timestamp(unix_timestamp()));
        let _ = write_line(logger, log_file, &line);
    }
}

fn write_line(logger: &Logger, log_file: LogFile, line: &str) -> std::io::Result<()> {
    let mut files = logger
        .files
        .lock()
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "log lock poisoned"))?;
    if let Some(file) = files.get_mut(&log_file) {
        file.write_all(line.as_bytes())?;
        file.flush()?;
    }
    Ok(())
}

fn unix_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// `DD.MM.YYYY HH:MM:SS` in UTC.
fn format_timestamp(ts: i64) -> String {
    let secs = ts.max(0);
    let (year, month, day) = civil_from_days(secs / 86_400);
    let seconds_of_day = secs % 86_400;
    format!(
        "{:02}.{:02}.{} {:02}:{:02}:{:02}",
        day,
        month,
        year,
        seconds_of_day / 3_600,
        (seconds_of_day % 3_600) / 60,
        seconds_of_day % 60
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let shifted = days + 719_468;
    let era = shifted.div_euclid(146_097);
    let day_of_era = shifted.rem_euclid(146_097);
    let year_of_era =
        (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let month_index = (5 * day_of_year + 2) / 153;
    let day = (day_of_year - (153 * month_index + 2) / 5 + 1) as u32;
    let month = if month_index < 10 {
        (month_index + 3) as u32
    } else {
        (month_index - 9) as u32
    };
    let year = year_of_era + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_epoch() {
        assert_eq!(format_timestamp(0), "01.01.1970 00:00:00");
    }

    #[test]
    fn formats_leap_day() {
        // 2024-02-29 13:45:10 UTC
        assert_eq!(format_timestamp(1_709_214_310), "29.02.2024 13:45:10");
    }

    #[test]
    fn logging_before_init_is_silent() {
        log_error("nothing is listening yet");
        log_movement("nor here");
    }
}
