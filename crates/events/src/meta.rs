use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope data stamped on every event when it is emitted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    pub event_id: Uuid,
    /// Run the event belongs to; unset for events raised outside a run
    /// (the pacing gate, a bare sender).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub source: EventSource,
}

impl EventMeta {
    #[must_use]
    pub fn new(level: EventLevel, source: EventSource) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            run_id: None,
            timestamp: Utc::now(),
            level,
            source,
        }
    }

    /// Tie the event to a verification run
    #[must_use]
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }
}

/// Severity of an event, used to pick a rendering style
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Subsystem that raised an event
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    General,
    Run,
    Verification,
    Pacing,
}

impl EventSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Run => "run",
            Self::Verification => "verification",
            Self::Pacing => "pacing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_id_is_omitted_until_attached() {
        let meta = EventMeta::new(EventLevel::Info, EventSource::Pacing);
        let value = serde_json::to_value(&meta).unwrap();
        assert!(value.get("runId").is_none());
        assert_eq!(value["source"], json!("pacing"));
        assert_eq!(value["level"], json!("info"));

        let run_id = Uuid::new_v4();
        let meta = meta.with_run_id(run_id);
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["runId"], json!(run_id.to_string()));
    }

    #[test]
    fn source_names_match_serialized_form() {
        for source in [
            EventSource::General,
            EventSource::Run,
            EventSource::Verification,
            EventSource::Pacing,
        ] {
            assert_eq!(serde_json::to_value(source).unwrap(), json!(source.as_str()));
        }
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(EventLevel::Debug < EventLevel::Info);
        assert!(EventLevel::Info < EventLevel::Warn);
        assert!(EventLevel::Warn < EventLevel::Error);
    }
}
