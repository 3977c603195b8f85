pub mod backup;
pub mod checklist;
pub mod config;
pub mod contact;
pub mod context;
pub mod focus;
pub mod goal;
pub mod habit;
pub mod inbox;
pub mod journal;
pub mod note;
pub mod scaffold;
pub mod task;
pub mod timelog;
pub mod win;

use chrono::{DateTime, Local, NaiveDate, Utc};
use lifekit_core::dates;

/// Local wall-clock rendering of a stored UTC timestamp.
pub fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn opt_date(input: Option<&str>) -> anyhow::Result<Option<NaiveDate>> {
    Ok(input.map(dates::parse_date).transpose()?)
}
