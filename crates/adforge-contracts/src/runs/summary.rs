use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub product_name: String,
    pub started_at: String,
    pub finished_at: String,
    pub verdict: Option<String>,
    pub starting_budget_bdt: Option<f64>,
    pub total_pieces: u64,
    pub images_generated: u64,
}

pub fn write_summary(
    path: &Path,
    summary: &SessionSummary,
    extra: Option<&Map<String, Value>>,
) -> anyhow::Result<()> {
    let mut payload = Map::new();
    payload.insert(
        "session_id".to_string(),
        Value::String(summary.session_id.clone()),
    );
    payload.insert(
        "product_name".to_string(),
        Value::String(summary.product_name.clone()),
    );
    payload.insert(
        "started_at".to_string(),
        Value::String(summary.started_at.clone()),
    );
    payload.insert(
        "finished_at".to_string(),
        Value::String(summary.finished_at.clone()),
    );
    payload.insert(
        "verdict".to_string(),
        summary
            .verdict
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
    );
    payload.insert(
        "starting_budget_bdt".to_string(),
        summary
            .starting_budget_bdt
            .and_then(|value| serde_json::Number::from_f64(value).map(Value::Number))
            .unwrap_or(Value::Null),
    );
    payload.insert(
        "total_pieces".to_string(),
        Value::Number(summary.total_pieces.into()),
    );
    payload.insert(
        "images_generated".to_string(),
        Value::Number(summary.images_generated.into()),
    );
    payload.insert("ts".to_string(), Value::String(now_utc_iso()));
    if let Some(extra) = extra {
        for (key, value) in extra {
            payload.insert(key.clone(), value.clone());
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&Value::Object(payload))?)?;
    Ok(())
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::{write_summary, SessionSummary};

    #[test]
    fn write_summary_generates_expected_payload() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("summary.json");

        let summary = SessionSummary {
            session_id: "session-123".to_string(),
            product_name: "Organic Honey".to_string(),
            started_at: "2026-08-07T00:00:00+00:00".to_string(),
            finished_at: "2026-08-07T00:02:00+00:00".to_string(),
            verdict: Some("TEST".to_string()),
            starting_budget_bdt: Some(15000.0),
            total_pieces: 6,
            images_generated: 2,
        };
        let mut extra = Map::new();
        extra.insert(
            "contract_warnings".to_string(),
            Value::Number(0u64.into()),
        );
        write_summary(&path, &summary, Some(&extra))?;

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        assert_eq!(parsed["session_id"], json!("session-123"));
        assert_eq!(parsed["product_name"], json!("Organic Honey"));
        assert_eq!(parsed["verdict"], json!("TEST"));
        assert_eq!(parsed["starting_budget_bdt"], json!(15000.0));
        assert_eq!(parsed["total_pieces"], json!(6));
        assert_eq!(parsed["images_generated"], json!(2));
        assert_eq!(parsed["contract_warnings"], json!(0));
        assert!(parsed.get("ts").and_then(Value::as_str).is_some());
        Ok(())
    }

    #[test]
    fn missing_verdict_serializes_as_null() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("summary.json");

        let summary = SessionSummary {
            session_id: "session-456".to_string(),
            product_name: "Clay Cookware".to_string(),
            started_at: "2026-08-07T00:00:00+00:00".to_string(),
            finished_at: "2026-08-07T00:00:05+00:00".to_string(),
            verdict: None,
            starting_budget_bdt: None,
            total_pieces: 0,
            images_generated: 0,
        };
        write_summary(&path, &summary, None)?;

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        assert_eq!(parsed["verdict"], Value::Null);
        assert_eq!(parsed["starting_budget_bdt"], Value::Null);
        Ok(())
    }
}
