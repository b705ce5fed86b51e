//! Maps raw backend/provider failures onto the small set of messages the app
//! is allowed to show a user.
//!
//! The table is an ordered linear scan and must stay one: first match wins,
//! and more specific needles are declared ahead of more general ones (e.g.
//! `refresh token not found` before `not found`, `statement timeout` before
//! `timeout`). Reordering or replacing the list with a map changes observable
//! behavior.

use serde_json::Value;

/// One matcher: case-insensitive substring needle plus the message shown when
/// it fires. Needles are stored lowercase.
pub struct Rule {
    pub needle: &'static str,
    pub message: &'static str,
}

pub const DEFAULT_MESSAGE: &str = "Something went wrong. Please try again.";

pub const RULES: &[Rule] = &[
    // Auth
    Rule { needle: "refresh token not found", message: "Your session has expired. Please sign in again." },
    Rule { needle: "jwt expired", message: "Your session has expired. Please sign in again." },
    Rule { needle: "token has expired", message: "Your session has expired. Please sign in again." },
    Rule { needle: "invalid login credentials", message: "Incorrect email or password." },
    Rule { needle: "email not confirmed", message: "Please confirm your email address before signing in." },
    Rule { needle: "user already registered", message: "An account with this email already exists." },
    Rule { needle: "unauthenticated", message: "Please sign in to continue." },
    Rule { needle: "unauthorized", message: "Please sign in to continue." },
    // Community
    Rule { needle: "invite code expired", message: "That invite code has expired. Ask your group leader for a new one." },
    Rule { needle: "invalid invite code", message: "That invite code isn't valid. Double-check it and try again." },
    Rule { needle: "already a member", message: "You're already a member of this group." },
    Rule { needle: "group is full", message: "This group is full. Ask the leader about opening more seats." },
    // Permission
    Rule { needle: "row-level security", message: "You don't have permission to do that." },
    Rule { needle: "permission denied", message: "You don't have permission to do that." },
    Rule { needle: "insufficient privilege", message: "You don't have permission to do that." },
    Rule { needle: "forbidden", message: "You don't have permission to do that." },
    // Validation
    Rule { needle: "duplicate key", message: "That already exists. Try a different name." },
    Rule { needle: "violates foreign key", message: "That record is linked to other data and can't be removed." },
    Rule { needle: "null value", message: "A required field is missing." },
    Rule { needle: "value too long", message: "One of the fields is too long." },
    Rule { needle: "invalid input syntax", message: "Some of that input isn't valid." },
    // Database
    Rule { needle: "statement timeout", message: "The server took too long. Please try again." },
    Rule { needle: "deadlock detected", message: "The server is busy right now. Please try again." },
    Rule { needle: "too many connections", message: "The service is at capacity. Please try again shortly." },
    // Network
    Rule { needle: "connection refused", message: "Can't reach the server. Check your connection and try again." },
    Rule { needle: "connection reset", message: "Can't reach the server. Check your connection and try again." },
    Rule { needle: "failed to fetch", message: "Can't reach the server. Check your connection and try again." },
    Rule { needle: "network", message: "Can't reach the server. Check your connection and try again." },
    Rule { needle: "timed out", message: "The request timed out. Please try again." },
    Rule { needle: "timeout", message: "The request timed out. Please try again." },
    // Generic fallthroughs
    Rule { needle: "not found", message: "We couldn't find what you were looking for." },
];

/// Classify an already-normalized error string. Total: any input yields a
/// non-empty message.
pub fn classify_str(raw: &str) -> &'static str {
    let haystack = raw.to_lowercase();
    for rule in RULES {
        if haystack.contains(rule.needle) {
            return rule.message;
        }
    }
    DEFAULT_MESSAGE
}

/// Classify a structured failure payload. Strings are used as-is; objects
/// contribute their `message` field; anything else is stringified
/// conservatively before matching.
pub fn classify_value(raw: &Value) -> &'static str {
    match raw {
        Value::String(s) => classify_str(s),
        Value::Object(map) => match map.get("message").and_then(|m| m.as_str()) {
            Some(msg) => classify_str(msg),
            None => classify_str(&raw.to_string()),
        },
        other => classify_str(&other.to_string()),
    }
}

/// Classify an error chain, including context added along the way.
pub fn friendly_message(err: &anyhow::Error) -> &'static str {
    classify_str(&format!("{err:#}"))
}
