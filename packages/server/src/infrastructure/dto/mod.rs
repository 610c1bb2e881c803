//! Data Transfer Objects (DTOs) for the coordinator.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket event frames (`{"event": ..., "data": ...}`)
//! - `http`: HTTP API request / response bodies

pub mod conversion;
pub mod http;
pub mod websocket;
