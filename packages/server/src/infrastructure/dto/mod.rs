//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs
//! - `http`: HTTP API DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
