// src/events/ids.rs

//! Identifier generation for messages, parts, steps and events.
//!
//! Part and step ids are built from a short message-id prefix, a millisecond
//! timestamp and a counter shared by every context forked from one root, so
//! they are unique for the lifetime of a run. Their length is capped by
//! [`EventConfig::part_id_max_len`].

use chrono::Utc;
use uuid::Uuid;

use crate::config::EventConfig;

const SHORT_PREFIX_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct IdGenerator {
    message_prefix: String,
    max_len: usize,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(&EventConfig::default())
    }
}

impl IdGenerator {
    pub fn new(config: &EventConfig) -> Self {
        Self {
            message_prefix: config.message_id_prefix.clone(),
            max_len: config.part_id_max_len,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn message_id(&self) -> String {
        let raw = Uuid::new_v4().simple().to_string();
        format!("{}_{}", self.message_prefix, &raw[..24])
    }

    pub fn run_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    pub fn event_id(&self) -> String {
        format!("evt_{}", Uuid::new_v4().simple())
    }

    pub fn part_id(&self, message_id: &str, counter: u64) -> String {
        self.compose("prt", message_id, counter)
    }

    pub fn step_id(&self, message_id: &str, counter: u64) -> String {
        self.compose("stp", message_id, counter)
    }

    fn compose(&self, tag: &str, message_id: &str, counter: u64) -> String {
        let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let suffix = format!("{}{}", base36(millis), base36(counter));

        let short = short_prefix(message_id);
        let budget = self.max_len.saturating_sub(tag.len() + 1 + suffix.len());
        let short = &short[short.len().saturating_sub(budget)..];

        let body = format!("{short}{suffix}");
        let room = self.max_len.saturating_sub(tag.len() + 1);
        // The counter sits at the end, so the right-most characters are the
        // ones that keep ids distinct.
        let body = &body[body.len().saturating_sub(room)..];
        format!("{tag}_{body}")
    }
}

/// Trailing alphanumeric characters of a message id.
fn short_prefix(message_id: &str) -> String {
    let mut tail: Vec<char> = message_id
        .chars()
        .rev()
        .filter(char::is_ascii_alphanumeric)
        .take(SHORT_PREFIX_LEN)
        .collect();
    tail.reverse();
    tail.into_iter().collect()
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
