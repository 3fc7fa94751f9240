//! Shared Data Set
//!
//! The single aggregate every mutation operates on: users, chat threads and
//! messages, each keyed by id. The storage layer enforces no foreign keys;
//! referential integrity is checked by the transforms that edit the set.
//!
//! The aggregate is always loaded and stored whole.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::shared::error::SharedError;

/// Longest accepted message body, in bytes
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Longest accepted username or display name, in bytes
pub const MAX_NAME_LENGTH: usize = 100;

/// Longest accepted thread title, in bytes
pub const MAX_TITLE_LENGTH: usize = 200;

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    /// Unique handle, compared case-insensitively
    pub username: String,
    /// Name shown in chat lists
    pub display_name: String,
    /// When the user was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh id
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            display_name: display_name.into(),
            created_at: Utc::now(),
        }
    }

    /// Check a username before it is stored
    pub fn validate_username(username: &str) -> Result<(), SharedError> {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(SharedError::empty("username"));
        }
        if trimmed.len() > MAX_NAME_LENGTH {
            return Err(SharedError::too_long("username", MAX_NAME_LENGTH));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(SharedError::malformed("username", "cannot contain whitespace"));
        }
        Ok(())
    }
}

/// A conversation between two or more users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatThread {
    /// Unique thread ID
    pub id: Uuid,
    /// Optional title (group chats)
    pub title: Option<String>,
    /// Participant user IDs, in the order they were added
    pub participants: Vec<Uuid>,
    /// User who opened the thread
    pub created_by: Uuid,
    /// When the thread was created
    pub created_at: DateTime<Utc>,
    /// Last time anything in the thread changed
    pub updated_at: DateTime<Utc>,
    /// Timestamp of the newest message, if any
    pub last_message_at: Option<DateTime<Utc>>,
}

impl ChatThread {
    /// Create a new thread opened by `created_by`
    ///
    /// The creator is always a participant; duplicate ids are dropped.
    pub fn new(created_by: Uuid, participants: Vec<Uuid>, title: Option<String>) -> Self {
        let now = Utc::now();
        let mut members = vec![created_by];
        for id in participants {
            if !members.contains(&id) {
                members.push(id);
            }
        }
        Self {
            id: Uuid::new_v4(),
            title,
            participants: members,
            created_by,
            created_at: now,
            updated_at: now,
            last_message_at: None,
        }
    }

    /// Check if user is a participant
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    /// Record that a message landed in this thread
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.last_message_at = Some(at);
    }
}

/// A message posted to a thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,
    /// Thread this message belongs to
    pub thread_id: Uuid,
    /// User who sent the message
    pub sender_id: Uuid,
    /// Message text
    pub body: String,
    /// When the message was sent
    pub created_at: DateTime<Utc>,
    /// Last edit, if the body was changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    /// Soft-delete flag; deleted messages keep their slot with an empty body
    #[serde(default)]
    pub deleted: bool,
}

impl Message {
    /// Create a new message with the current timestamp
    pub fn new(thread_id: Uuid, sender_id: Uuid, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            thread_id,
            sender_id,
            body: body.into(),
            created_at: Utc::now(),
            edited_at: None,
            deleted: false,
        }
    }

    /// Check a message body before it is stored
    pub fn validate_body(body: &str) -> Result<(), SharedError> {
        if body.trim().is_empty() {
            return Err(SharedError::empty("body"));
        }
        if body.len() > MAX_MESSAGE_LENGTH {
            return Err(SharedError::too_long("body", MAX_MESSAGE_LENGTH));
        }
        Ok(())
    }
}

/// The shared data set: every user, thread and message
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataSet {
    #[serde(default)]
    pub users: BTreeMap<Uuid, User>,
    #[serde(default)]
    pub threads: BTreeMap<Uuid, ChatThread>,
    #[serde(default)]
    pub messages: BTreeMap<Uuid, Message>,
}

impl DataSet {
    /// Create an empty data set
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no records of any kind exist
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.threads.is_empty() && self.messages.is_empty()
    }

    /// Find a user by username (case-insensitive)
    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users
            .values()
            .find(|user| user.username.eq_ignore_ascii_case(username))
    }

    /// Messages of one thread, oldest first
    pub fn thread_messages(&self, thread_id: Uuid) -> Vec<&Message> {
        let mut messages: Vec<&Message> = self
            .messages
            .values()
            .filter(|message| message.thread_id == thread_id)
            .collect();
        messages.sort_by_key(|message| message.created_at);
        messages
    }

    /// Threads a user participates in, most recently active first
    pub fn threads_for_user(&self, user_id: Uuid) -> Vec<&ChatThread> {
        let mut threads: Vec<&ChatThread> = self
            .threads
            .values()
            .filter(|thread| thread.has_participant(user_id))
            .collect();
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        threads
    }
}
