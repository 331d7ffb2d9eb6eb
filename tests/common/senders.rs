//! Recording game senders and chat users.

use linkbridge::state::{ChatUser, GameSender, Permission};
use parking_lot::Mutex;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Default)]
struct Inbox {
    messages: Mutex<Vec<String>>,
}

impl Inbox {
    fn push(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock())
    }
}

/// An in-game player that records every message sent to it.
pub struct RecordingPlayer {
    pub id: Uuid,
    pub name: String,
    permissions: HashSet<Permission>,
    inbox: Inbox,
}

#[allow(dead_code)]
impl RecordingPlayer {
    /// A player holding only the self-service permissions.
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            permissions: [Permission::Link, Permission::Linked].into_iter().collect(),
            inbox: Inbox::default(),
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.insert(permission);
        self
    }

    pub fn without_permission(mut self, permission: Permission) -> Self {
        self.permissions.remove(&permission);
        self
    }

    pub fn take_messages(&self) -> Vec<String> {
        self.inbox.take()
    }
}

impl GameSender for RecordingPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn player_id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    fn send_message(&self, message: &str) {
        self.inbox.push(message);
    }
}

/// The server console: every permission, no game account.
#[derive(Default)]
pub struct RecordingConsole {
    inbox: Inbox,
}

#[allow(dead_code)]
impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_messages(&self) -> Vec<String> {
        self.inbox.take()
    }
}

impl GameSender for RecordingConsole {
    fn name(&self) -> &str {
        "CONSOLE"
    }

    fn player_id(&self) -> Option<Uuid> {
        None
    }

    fn has_permission(&self, _permission: Permission) -> bool {
        true
    }

    fn send_message(&self, message: &str) {
        self.inbox.push(message);
    }
}

/// A chat-network user that records interaction replies.
pub struct RecordingChatUser {
    pub id: u64,
    pub name: String,
    permissions: HashSet<Permission>,
    inbox: Inbox,
}

#[allow(dead_code)]
impl RecordingChatUser {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            permissions: [Permission::Link, Permission::Linked].into_iter().collect(),
            inbox: Inbox::default(),
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.insert(permission);
        self
    }

    pub fn without_permission(mut self, permission: Permission) -> Self {
        self.permissions.remove(&permission);
        self
    }

    pub fn take_messages(&self) -> Vec<String> {
        self.inbox.take()
    }
}

impl ChatUser for RecordingChatUser {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    fn send_message(&self, message: &str) {
        self.inbox.push(message);
    }
}
