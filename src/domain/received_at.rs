use std::fmt;

use chrono::{Local, NaiveDateTime};

/// Server-local wall-clock time at which a submission arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedAt(NaiveDateTime);

impl ReceivedAt {
    pub fn now() -> Self {
        Self(Local::now().naive_local())
    }
}

impl From<NaiveDateTime> for ReceivedAt {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

// "Jan 5, 2024, 03:42 PM"
impl fmt::Display for ReceivedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%b %-d, %Y, %I:%M %p"))
    }
}
