use serde_json::json;

use crate::core::{HistoryDay, Report, SnapshotOutcome, SnapshotWarning};
use crate::pricing::PricingTable;

fn to_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn output_report_json(report: &Report) -> String {
    let value = serde_json::to_value(report).unwrap_or_else(|_| json!({}));
    to_json(&value)
}

pub(crate) fn output_snapshot_json(outcome: &SnapshotOutcome) -> String {
    let s = &outcome.snapshot;
    to_json(&json!({
        "date": s.day_key(),
        "path": outcome.path.display().to_string(),
        "replaced": outcome.replaced,
        "model": s.model,
        "inputTokens": s.input_tokens,
        "outputTokens": s.output_tokens,
        "totalTokens": s.total_tokens,
        "sessions": s.sessions.len(),
    }))
}

pub(crate) fn output_history_json(days: &[HistoryDay], warnings: &[SnapshotWarning]) -> String {
    to_json(&json!({
        "days": days,
        "warnings": warnings,
    }))
}

pub(crate) fn output_pricing_json(pricing: &PricingTable) -> String {
    let models: Vec<_> = pricing
        .entries()
        .iter()
        .map(|e| {
            json!({
                "model": e.model,
                "displayName": e.display_name,
                "inputRate": e.input_rate,
                "outputRate": e.output_rate,
            })
        })
        .collect();
    to_json(&json!({
        "version": pricing.version(),
        "models": models,
    }))
}
