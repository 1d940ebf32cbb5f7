//! `MessagePusher` implementations.
//!
//! - `websocket`: WebSocket connections fed through unbounded channels

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
