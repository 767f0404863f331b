use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one request/response cycle and the transcript entry it writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip)]
    session: Option<SessionId>,
    #[serde(skip)]
    open: bool,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            session: None,
            open: false,
        }
    }

    /// A finished assistant entry, such as an error or a notice.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            session: None,
            open: false,
        }
    }

    fn streaming(session: SessionId, content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            session: Some(session),
            open: true,
        }
    }

    /// Open entries still receive streamed text; sealed ones never change again.
    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// Conversation in display order.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    entries: Vec<Message>,
    generation: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bumped by every `clear`, so readers can tell a refilled transcript from the old one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn append(&mut self, message: Message) {
        self.entries.push(message);
    }

    pub fn last_entry(&self) -> Option<&Message> {
        self.entries.last()
    }

    /// Replaces the content of the last entry if it is still open.
    pub fn replace_last_content(&mut self, text: impl Into<String>) -> bool {
        match self.entries.last_mut() {
            Some(last) if last.open => {
                last.content = text.into();
                true
            }
            _ => false,
        }
    }

    pub fn open_entry(&self, session: SessionId) -> Option<&Message> {
        self.entries
            .iter()
            .rev()
            .find(|m| m.open && m.session == Some(session))
    }

    /// Routes streamed text to the open entry tagged with `session`, creating it on first
    /// write. Returns true when a new entry was appended.
    pub fn write_session(&mut self, session: SessionId, text: &str) -> bool {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .rev()
            .find(|m| m.open && m.session == Some(session))
        {
            entry.content.clear();
            entry.content.push_str(text);
            return false;
        }

        debug_assert!(
            self.entries.iter().all(|m| !m.open),
            "another session still has an open entry"
        );
        self.entries.push(Message::streaming(session, text));
        true
    }

    pub fn seal(&mut self, session: SessionId) {
        for entry in self.entries.iter_mut().filter(|m| m.session == Some(session)) {
            entry.open = false;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }
}
