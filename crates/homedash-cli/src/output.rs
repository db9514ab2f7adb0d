//! Output renderers for dispatch outcomes and resolved targets.

use anyhow::anyhow;
use homedash_dispatch::{Outcome, ResolvedTarget};
use serde_json::{Value, json};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn render_outcome(outcome: &Outcome, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_pretty_json(outcome),
        OutputFormat::Table => {
            let mut lines = vec![format!("status: {}", outcome.kind())];
            match outcome {
                Outcome::Success { payload } => payload_rows(payload, &mut lines),
                Outcome::Failure { reason, code } => {
                    if let Some(code) = code {
                        lines.push(format!("code: {code}"));
                    }
                    lines.push(format!("reason: {reason}"));
                }
            }
            Ok(lines.join("\n"))
        }
    }
}

pub(crate) fn render_target(target: &ResolvedTarget, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_pretty_json(&json!({ "target": target.as_str() })),
        OutputFormat::Table => Ok(target.to_string()),
    }
}

fn payload_rows(payload: &Value, lines: &mut Vec<String>) {
    match payload {
        Value::Object(fields) => {
            lines.push(format!("{:<24} VALUE", "FIELD"));
            for (key, value) in fields {
                lines.push(format!("{key:<24} {}", scalar_text(value)));
            }
        }
        Value::Array(items) => {
            lines.push(format!("{:<6} VALUE", "INDEX"));
            for (index, value) in items.iter().enumerate() {
                lines.push(format!("{index:<6} {}", scalar_text(value)));
            }
        }
        other => lines.push(format!("payload: {}", scalar_text(other))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use homedash_dispatch::RequestDescriptor;

    #[test]
    fn table_lists_object_fields() {
        let outcome = Outcome::Success {
            payload: json!({"id": 12, "state": "on", "room": null}),
        };
        let text = render_outcome(&outcome, OutputFormat::Table).expect("render");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "status: success");
        assert!(lines.iter().any(|line| line.starts_with("id") && line.ends_with(" 12")));
        assert!(lines.iter().any(|line| line.starts_with("state") && line.ends_with(" on")));
        assert!(lines.iter().any(|line| line.starts_with("room") && line.ends_with(" -")));
    }

    #[test]
    fn table_lists_array_items_and_scalars() {
        let list = Outcome::Success {
            payload: json!(["kitchen", "hall"]),
        };
        let text = render_outcome(&list, OutputFormat::Table).expect("render");
        assert!(text.contains("0      kitchen"));
        assert!(text.contains("1      hall"));

        let scalar = Outcome::Success {
            payload: json!(true),
        };
        let text = render_outcome(&scalar, OutputFormat::Table).expect("render");
        assert!(text.ends_with("payload: true"));
    }

    #[test]
    fn table_shows_failure_code_and_reason() {
        let outcome = Outcome::Failure {
            reason: "endpoint answered with an error status".to_string(),
            code: Some(503),
        };
        let text = render_outcome(&outcome, OutputFormat::Table).expect("render");
        assert_eq!(
            text,
            "status: failure\ncode: 503\nreason: endpoint answered with an error status"
        );
    }

    #[test]
    fn json_output_is_tagged() {
        let outcome = Outcome::Failure {
            reason: "unreachable".to_string(),
            code: None,
        };
        let text = render_outcome(&outcome, OutputFormat::Json).expect("render");
        let value: Value = serde_json::from_str(&text).expect("valid JSON");
        assert_eq!(value, json!({"status": "failure", "reason": "unreachable"}));
    }

    #[test]
    fn target_renders_in_both_formats() {
        let target = RequestDescriptor::new("/api/scene", "s", "e")
            .with_parameter("movie night")
            .resolve()
            .expect("resolvable");
        assert_eq!(
            render_target(&target, OutputFormat::Table).expect("render"),
            "/api/scene/movie%20night"
        );
        let value: Value =
            serde_json::from_str(&render_target(&target, OutputFormat::Json).expect("render"))
                .expect("valid JSON");
        assert_eq!(value, json!({"target": "/api/scene/movie%20night"}));
    }
}
