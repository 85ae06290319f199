use chrono::prelude::{DateTime, Utc};

pub fn iso8601(dt: DateTime<Utc>) -> String {
    dt.format("%+").to_string()
}
