use chrono::{DateTime, NaiveDate, Utc};
use hourglass_rs::SafeTimeProvider;
use std::fmt::Write;

use crate::errors::{ReviewError, Result};

/// request-scoped values every engine call receives explicitly
pub struct RequestContext<'a> {
    /// acting user, recorded on snapshots and events
    pub user: String,
    pub locale: String,
    /// chrono format string used by views, checked by `with_locale`
    date_format: String,
    pub time: &'a SafeTimeProvider,
}

impl<'a> RequestContext<'a> {
    pub fn new(user: impl Into<String>, time: &'a SafeTimeProvider) -> Self {
        Self {
            user: user.into(),
            locale: "en-US".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            time,
        }
    }

    /// switch locale and date format
    ///
    /// The format must render a plain date, so time or unknown specifiers
    /// are rejected here rather than when a view is built.
    pub fn with_locale(mut self, locale: impl Into<String>, date_format: impl Into<String>) -> Result<Self> {
        let date_format = date_format.into();
        let mut rendered = String::new();
        if write!(rendered, "{}", NaiveDate::MIN.format(&date_format)).is_err() {
            return Err(ReviewError::InvalidConfiguration {
                message: format!("date format {:?} cannot render a date", date_format),
            });
        }
        self.locale = locale.into();
        self.date_format = date_format;
        Ok(self)
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time.now()
    }

    pub fn format_date(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        match write!(out, "{}", date.format(&self.date_format)) {
            Ok(()) => out,
            Err(_) => date.to_string(),
        }
    }
}
