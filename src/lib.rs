//! A fluent builder for single-shot blocking HTTP requests.
//!
//! ## Overview
//!
//! Monoreq drives one HTTP exchange end to end: build a request with chained
//! setters, stream a body into it, then read the status, headers and body back.
//! The wire work is done by whatever platform connection backend has been
//! registered through [`monoreq-interface`], so applications pick the HTTP stack
//! and this crate supplies the request lifecycle on top of it.
//!
//! A [`Request`] is strictly single use. It creates its connection lazily on the
//! first operation that needs one, keeps the outgoing body channel open across
//! any number of writes, and closes that channel the moment the first response
//! accessor runs. Once closed, the body never reopens.
//!
//! ## Backends
//!
//! Before sending anything, register a backend. A backend crate implements the
//! connection traits of [`monoreq-interface`] and installs itself process wide;
//! the in-memory backend in this repository does so for tests through its
//! `install` function. Without a registered backend, every operation that needs
//! a connection fails with [`Error::NoConnectionFactory`].
//!
//! ## Usage
//!
//! A simple GET:
//!
//! ```no_run
//! # fn main() -> Result<(), monoreq::Error> {
//! let mut request = monoreq::Request::get("https://example.com")?;
//! if request.ok()? {
//!     println!("{}", request.body()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Posting a form and checking the outcome:
//!
//! ```no_run
//! use monoreq::Request;
//!
//! # fn main() -> Result<(), monoreq::Error> {
//! let mut request = Request::post("https://example.com/login")?
//!     .form("user", "alice")?
//!     .form("token", "0xdecafbad")?;
//! assert!(request.ok()?);
//! # Ok(())
//! # }
//! ```
//!
//! Streaming a file as one part of a multipart upload, with progress reporting:
//!
//! ```no_run
//! use monoreq::{Part, Request};
//!
//! # fn main() -> Result<(), monoreq::Error> {
//! let mut request = Request::post("https://example.com/upload")?
//!     .progress(|uploaded: u64, total: Option<u64>| eprintln!("{uploaded}/{total:?}"))
//!     .part(Part::text("caption", "holiday picture"))?
//!     .part(Part::file("photo", "/tmp/photo.jpg").filename("photo.jpg"))?;
//! println!("{}", request.code()?);
//! # Ok(())
//! # }
//! ```
//!
//! Body writes commit the request to one body mode. The first plain, form or
//! multipart write decides; mixing modes afterwards fails with
//! [`Error::ModeConflict`] rather than producing an ill-framed body.
//!
//! [`monoreq-interface`]: monoreq_interface

#![forbid(missing_docs)]

mod body;
mod copy;
mod error;
pub mod header;
mod method;
mod op;
mod params;
mod progress;
mod request;
mod response;
mod sink;
mod status;

pub use body::{BodyMode, Part};
pub use error::{Error, Result};
pub use method::Method;
pub use monoreq_interface::{Proxy, TransportConfig};
pub use progress::{NoopProgress, UploadProgress};
pub use request::Request;
pub use response::ResponseReader;
pub use sink::Charset;
pub use status::StatusCode;
