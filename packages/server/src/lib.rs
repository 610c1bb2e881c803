//! Pairroom real-time interview room coordinator.
//!
//! Layers:
//! - `domain`: value objects, entities, room events and the traits the other layers implement
//! - `usecase`: one use case per inbound event / request
//! - `infrastructure`: persistence backends and gateway, message pusher, wire DTOs
//! - `ui`: axum router, WebSocket / HTTP handlers

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
