//! Channel payload builders.
//!
//! Pure functions from a [`Notification`] to the JSON body each channel
//! expects. `now` is passed in so payloads are reproducible in tests.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::notifier::Notification;

const FOOTER: &str = "ASM Security Scanner";

/// Render a detail value the way a human reads it: strings without quotes.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Slack incoming-webhook attachment.
pub fn slack(n: &Notification, now: DateTime<Utc>) -> Value {
    let mut attachment = json!({
        "color": n.severity.slack_color(),
        "title": n.title,
        "text": n.message,
        "footer": FOOTER,
        "ts": now.timestamp(),
    });

    if !n.details.is_empty() {
        let fields: Vec<Value> = n
            .details
            .iter()
            .map(|(k, v)| json!({"title": k, "value": display_value(v), "short": true}))
            .collect();
        attachment["fields"] = Value::Array(fields);
    }

    json!({ "attachments": [attachment] })
}

/// Microsoft Teams MessageCard.
pub fn teams(n: &Notification, _now: DateTime<Utc>) -> Value {
    let mut section = json!({
        "activityTitle": n.title,
        "activitySubtitle": format!("Severity: {}", n.severity.as_str().to_uppercase()),
        "text": n.message,
        "markdown": true,
    });

    if !n.details.is_empty() {
        let facts: Vec<Value> = n
            .details
            .iter()
            .map(|(k, v)| json!({"name": k, "value": display_value(v)}))
            .collect();
        section["facts"] = Value::Array(facts);
    }

    json!({
        "@type": "MessageCard",
        "@context": "http://schema.org/extensions",
        "themeColor": n.severity.teams_color(),
        "summary": n.title,
        "sections": [section],
    })
}

/// Discord webhook embed.
pub fn discord(n: &Notification, now: DateTime<Utc>) -> Value {
    let mut embed = json!({
        "title": n.title,
        "description": n.message,
        "color": n.severity.discord_color(),
        "timestamp": now.to_rfc3339(),
        "footer": {"text": FOOTER},
    });

    if !n.details.is_empty() {
        let fields: Vec<Value> = n
            .details
            .iter()
            .map(|(k, v)| json!({"name": k, "value": display_value(v), "inline": true}))
            .collect();
        embed["fields"] = Value::Array(fields);
    }

    json!({ "embeds": [embed] })
}

/// Generic JSON webhook body.
pub fn generic(n: &Notification, now: DateTime<Utc>) -> Value {
    json!({
        "title": n.title,
        "message": n.message,
        "severity": n.severity,
        "details": n.details,
        "timestamp": now.to_rfc3339(),
    })
}

/// Email subject line.
pub fn email_subject(n: &Notification) -> String {
    format!("[ASM Alert] {}", n.title)
}

/// Plain-text email body: the message, then severity, time and details.
pub fn email_body(n: &Notification, now: DateTime<Utc>) -> String {
    let mut body = format!(
        "{}\n\nSeverity: {}\nTime: {}\n",
        n.message,
        n.severity.as_str().to_uppercase(),
        now.to_rfc3339()
    );
    for (k, v) in &n.details {
        body.push_str(&format!("{k}: {}\n", display_value(v)));
    }
    body.push_str(&format!("\n-- \n{FOOTER}\n"));
    body
}
