//! linkbridge - game server <-> chat network identity linking.
//!
//! Pairs game accounts with chat accounts, drives the player-initiated
//! linking flow, and serves combined commands that behave the same on the
//! game surface and the chat surface.

pub mod bridge;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod http;
pub mod linking;
pub mod metrics;
pub mod security;
pub mod state;
pub mod telemetry;
