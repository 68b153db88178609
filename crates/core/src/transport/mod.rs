//! The `Transport` capability interface
//!
//! One method per API operation. Implemented by the wire transport in
//! `storectl-infra` and by every decorator in [`crate::auth`].

pub mod ports;

pub use ports::Transport;
