//! Runtime identity state.
//!
//! Contains the collaborator contracts for the two invocation surfaces
//! and the online-player registry used by argument resolution.

mod identity;
mod permission;
mod players;

pub use identity::{ChatUser, GameSender};
pub use permission::Permission;
pub use players::{OnlinePlayer, PlayerDirectory, PlayerRegistry};
