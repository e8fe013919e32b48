use chrono::{SecondsFormat, Utc};

/// Current UTC time as an ISO-8601 string, the format every HTTP response
/// and persisted timestamp uses.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_timestamp_parses_back() {
        let ts = utc_timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
