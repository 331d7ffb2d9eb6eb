//! Online player registry.
//!
//! Adapters report joins and quits; argument resolution uses the registry to
//! turn a typed player name into a game account id.

use dashmap::DashMap;
use uuid::Uuid;

/// A player currently connected to the game server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlinePlayer {
    pub id: Uuid,
    pub name: String,
}

/// Name lookup over whoever is online.
pub trait PlayerDirectory: Send + Sync {
    /// Case-insensitive exact name match.
    fn find_by_name(&self, name: &str) -> Option<OnlinePlayer>;

    fn find_by_id(&self, id: &Uuid) -> Option<OnlinePlayer>;
}

/// Concurrent [`PlayerDirectory`] fed by join/quit events.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    by_id: DashMap<Uuid, OnlinePlayer>,
    /// Lowercased name -> id.
    by_name: DashMap<String, Uuid>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a join. A rejoin under a new name replaces the old name entry.
    pub fn join(&self, id: Uuid, name: impl Into<String>) {
        let player = OnlinePlayer {
            id,
            name: name.into(),
        };
        if let Some(previous) = self.by_id.insert(id, player.clone()) {
            self.by_name
                .remove_if(&previous.name.to_lowercase(), |_, owner| *owner == id);
        }
        self.by_name.insert(player.name.to_lowercase(), id);
    }

    pub fn quit(&self, id: &Uuid) -> Option<OnlinePlayer> {
        let (_, player) = self.by_id.remove(id)?;
        self.by_name
            .remove_if(&player.name.to_lowercase(), |_, owner| owner == id);
        Some(player)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl PlayerDirectory for PlayerRegistry {
    fn find_by_name(&self, name: &str) -> Option<OnlinePlayer> {
        let id = *self.by_name.get(&name.to_lowercase())?;
        self.find_by_id(&id)
    }

    fn find_by_id(&self, id: &Uuid) -> Option<OnlinePlayer> {
        self.by_id.get(id).map(|p| p.clone())
    }
}
