use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n?(\{.*?\})\s*```").expect("valid fenced json regex")
});

/// Model reply split into display text and the raw `updates` payload, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedReply {
    pub reply: String,
    pub updates: Option<Result<Value, String>>,
}

/// Pulls the last fenced `{"updates": {...}}` block out of a chat reply.
///
/// A block that parses but has no `updates` key is treated as prose and left
/// in place. A block that mentions `updates` but is not valid JSON, or whose
/// `updates` is not an object, yields an error so the caller can refuse it.
/// An empty `updates` object means no change was proposed.
pub fn split_reply(raw: &str) -> ExtractedReply {
    let Some(found) = FENCED_JSON
        .captures_iter(raw)
        .filter(|caps| caps[1].contains("\"updates\""))
        .last()
    else {
        return ExtractedReply {
            reply: raw.trim().to_string(),
            updates: None,
        };
    };

    let whole = found.get(0).map(|m| m.range()).unwrap_or(0..0);
    let mut reply = String::with_capacity(raw.len());
    reply.push_str(&raw[..whole.start]);
    reply.push_str(&raw[whole.end..]);
    let reply = reply.trim().to_string();

    let updates = match serde_json::from_str::<Value>(&found[1]) {
        Ok(Value::Object(mut map)) => match map.remove("updates") {
            Some(Value::Object(updates)) if updates.is_empty() => None,
            Some(value @ Value::Object(_)) => Some(Ok(value)),
            Some(other) => Some(Err(format!(
                "updates must be an object, got {}",
                type_name(&other)
            ))),
            None => None,
        },
        Ok(other) => Some(Err(format!(
            "update block must be an object, got {}",
            type_name(&other)
        ))),
        Err(e) => Some(Err(format!("update block is not valid JSON: {}", e))),
    };

    ExtractedReply { reply, updates }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
