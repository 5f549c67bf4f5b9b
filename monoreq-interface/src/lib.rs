//! Interface definitions for monoreq connection backends.
//!
//! This crate provides the contract that backends must implement to be usable by the
//! monoreq request facade. It defines the platform connection object the facade drives,
//! the factory that produces connections, and the transport configuration handed to the
//! factory on every open.
//!
//! ## Connection lifecycle
//!
//! The facade creates a connection lazily through the registered [`ConnectionFactory`],
//! applies the accumulated request configuration (method, headers, timeouts, body length
//! mode), then asks for the outgoing body channel via [`Connection::open_body`]. Once the
//! body channel has been closed, the facade switches to the response side: status line,
//! header map, and one of the two input channels.
//!
//! ## Factory registration
//!
//! Exactly one factory can be registered per process, via
//! [`register_connection_factory`]. Registration is first-come and permanent; a second
//! registration panics.
//!
//! All fallible interface methods return [`std::io::Result`]. Translation into the
//! facade's error type happens on the facade side.

#![deny(missing_docs)]

mod any;
mod config;
mod connection;
pub mod register;

pub use any::AnyConnectionFactory;
pub use config::{Proxy, TransportConfig};
pub use connection::{BodyWriter, Connection, ConnectionFactory};
pub use register::{connection_factory, register_connection_factory};
