//! Date formatting for the `date` tag.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Utc};

/// Format used when a `date` tag gives none.
pub const DEFAULT_DATE_FORMAT: &str = "%c";

/// Renders the current date for templates.
pub trait DateFormatter: Send {
    /// `timezone` is a whole number of hours; `format` is strftime syntax.
    fn format(&self, locale: Option<&str>, timezone: Option<&str>, format: &str) -> String;
}

/// chrono-backed formatter.
///
/// A timezone is read as hours *behind* UTC (`5` is UTC-05:00), the POSIX
/// `TZ` sign convention; without one, local time is used. Locales are not
/// supported and are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoDateFormatter;

impl ChronoDateFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Format a fixed instant. Returns `""` for an invalid format or timezone.
    pub fn format_at(&self, instant: DateTime<Utc>, timezone: Option<&str>, format: &str) -> String {
        let format = if format.trim().is_empty() {
            DEFAULT_DATE_FORMAT
        } else {
            format
        };
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            log::warn!("Invalid date format: {:?}", format);
            return String::new();
        }

        match timezone.map(str::trim).filter(|tz| !tz.is_empty()) {
            None => instant.with_timezone(&Local).format(format).to_string(),
            Some(tz) => match tz
                .parse::<i32>()
                .ok()
                .and_then(|hours| hours.checked_mul(-3600))
                .and_then(FixedOffset::east_opt)
            {
                Some(offset) => instant.with_timezone(&offset).format(format).to_string(),
                None => {
                    log::warn!("Invalid timezone: {:?}", tz);
                    String::new()
                }
            },
        }
    }
}

impl DateFormatter for ChronoDateFormatter {
    fn format(&self, locale: Option<&str>, timezone: Option<&str>, format: &str) -> String {
        if let Some(locale) = locale {
            log::debug!("Ignoring date locale {:?}", locale);
        }
        self.format_at(Utc::now(), timezone, format)
    }
}
