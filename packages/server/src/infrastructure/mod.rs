//! Infrastructure layer.
//!
//! Domain 層の trait（Repository, MessagePusher）の具体的な実装と、
//! ワイヤーフォーマット（DTO）を提供します。

pub mod dto;
pub mod message_pusher;
pub mod repository;
