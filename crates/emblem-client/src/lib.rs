//! # emblem-client
//!
//! The platform surface the bot drives: a typed REST client for lookups
//! and mutations, a WebSocket gateway client that fans events out over a
//! broadcast channel, the platform model types the bot reads, and the
//! permission bitfield it checks before serving anyone.

pub mod error;
pub mod gateway;
pub mod permissions;
pub mod rest;
pub mod types;

pub use error::{ClientError, Result};
pub use gateway::{GatewayClient, GatewayEvent};
pub use permissions::Permissions;
pub use rest::RestClient;
pub use types::*;
