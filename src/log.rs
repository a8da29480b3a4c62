use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

/// One operational log record, written as a single JSON line on stderr.
#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    pub timestamp_ms: u64,
    pub level: &'static str,
    pub event: &'static str,
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "levelName", skip_serializing_if = "Option::is_none")]
    pub level_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    pub details: Value,
}

pub fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

pub fn log_line(
    level: &'static str,
    event: &'static str,
    run_id: &str,
    level_name: Option<&str>,
    tick: Option<u64>,
    details: Value,
) -> StructuredLogLine {
    StructuredLogLine {
        timestamp_ms: now_ms(),
        level,
        event,
        run_id: run_id.to_string(),
        level_name: level_name.map(str::to_string),
        tick,
        details,
    }
}

pub fn emit_log(
    level: &'static str,
    event: &'static str,
    run_id: &str,
    level_name: Option<&str>,
    tick: Option<u64>,
    details: Value,
) {
    let line = log_line(level, event, run_id, level_name, tick, details);
    match serde_json::to_string(&line) {
        Ok(text) => eprintln!("{text}"),
        Err(error) => eprintln!("failed to encode log line {event}: {error}"),
    }
}
