//! WebSocket layer: event streaming and topic subscriptions.
//!
//! The endpoint at `/ws` pushes every [`crate::domain::PitrEvent`] as an
//! `event` envelope. Clients may narrow the stream by topic.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
