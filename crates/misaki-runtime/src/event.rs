//! Inbound event boundary
//!
//! Extracts the user prompt from a function-invocation payload. The fields
//! may sit at the top level or inside a JSON-string `body` (proxy
//! integrations wrap them). Accepted shapes, in precedence order: `input`
//! (string), `conversation` (string or list of strings), `messages` (list of
//! `{role?, content}` objects).

use serde_json::Value;

/// A payload the boundary refuses. Maps to a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("Invalid JSON body")]
    InvalidBody,
    #[error("Event body must be a JSON object")]
    NotAnObject,
    #[error("Missing 'input' field in request body")]
    MissingInput,
    #[error("{0}")]
    InvalidField(&'static str),
}

/// Extract the prompt text from an incoming invocation `event`.
pub fn parse_event(event: &Value) -> Result<String, EventError> {
    let unwrapped;
    let payload: &Value = match event.get("body") {
        Some(Value::String(raw)) => {
            let raw = if raw.trim().is_empty() { "{}" } else { raw };
            unwrapped = serde_json::from_str(raw).map_err(|_| EventError::InvalidBody)?;
            &unwrapped
        }
        Some(other) => other,
        None => event,
    };

    let map = payload.as_object().ok_or(EventError::NotAnObject)?;

    if let Some(input) = map.get("input") {
        return match input.as_str() {
            Some(text) => Ok(text.to_string()),
            None => Err(EventError::InvalidField("'input' must be a string")),
        };
    }

    if let Some(conversation) = map.get("conversation") {
        return match conversation {
            Value::String(text) => Ok(text.clone()),
            Value::Array(items) => {
                let mut lines = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(line) => lines.push(line),
                        None => {
                            return Err(EventError::InvalidField(
                                "'conversation' must be a string or list of strings",
                            ));
                        }
                    }
                }
                Ok(lines.join("\n"))
            }
            _ => Err(EventError::InvalidField(
                "'conversation' must be a string or list of strings",
            )),
        };
    }

    if let Some(messages) = map.get("messages") {
        let items = messages
            .as_array()
            .ok_or(EventError::InvalidField("'messages' must be a list"))?;

        let mut lines = Vec::with_capacity(items.len());
        for message in items {
            let object = message
                .as_object()
                .ok_or(EventError::InvalidField("each message must be an object"))?;
            let content = object.get("content").and_then(Value::as_str).ok_or(
                EventError::InvalidField("each message requires a string 'content'"),
            )?;
            match object
                .get("role")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|role| !role.is_empty())
            {
                Some(role) => lines.push(format!("{role}: {content}")),
                None => lines.push(content.to_string()),
            }
        }

        if lines.is_empty() {
            return Err(EventError::InvalidField(
                "'messages' must contain at least one item",
            ));
        }
        return Ok(lines.join("\n"));
    }

    Err(EventError::MissingInput)
}
