use chrono::{DateTime, Utc};
use serde::Serialize;

const CONTEXT_LINE_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// In-memory conversation log; never persisted.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
    last_address: Option<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, text: &str) {
        self.turns.push(Turn {
            role,
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_address(&self) -> Option<&str> {
        self.last_address.as_deref()
    }

    pub fn remember_address(&mut self, address: &str) {
        self.last_address = Some(address.to_string());
    }

    /// The last `n` turns as `User:`/`Assistant:` lines for LLM prompts.
    pub fn recent_context(&self, n: usize) -> String {
        if self.turns.len() < 2 {
            return "No recent conversation.".to_string();
        }

        let start = self.turns.len().saturating_sub(n);
        self.turns[start..]
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                };
                format!("{}: {}", speaker, truncate(&turn.text, CONTEXT_LINE_LIMIT))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let head: String = text.chars().take(limit).collect();
        format!("{}...", head)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub messages: u64,
    pub commands_processed: u64,
    pub addresses_validated: u64,
    pub transfers_simulated: u64,
    pub alerts_created: u64,
    pub started_at: DateTime<Utc>,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            messages: 0,
            commands_processed: 0,
            addresses_validated: 0,
            transfers_simulated: 0,
            alerts_created: 0,
            started_at: Utc::now(),
        }
    }
}

impl SessionStats {
    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    /// `1h 02m 03s` style rendering of the uptime.
    pub fn uptime_display(&self) -> String {
        let secs = self.uptime().num_seconds().max(0);
        format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
