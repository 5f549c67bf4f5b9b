//! Type-erased connection factory trait.
//!
//! The registry stores a single factory without knowing its concrete connection type.
//! The trait in this module is automatically implemented for types that implement
//! [`ConnectionFactory`], so backend developers don't need to implement it directly.

use std::io;

use url::Url;

use crate::config::TransportConfig;
use crate::connection::{Connection, ConnectionFactory};

/// Trait for type-erased connection factories.
///
/// Automatically implemented for types implementing [`ConnectionFactory`].
pub trait AnyConnectionFactory: Send + Sync + 'static {
    /// Opens a connection for the given URL, boxed behind the object-safe
    /// [`Connection`] trait.
    fn open_boxed(&self, url: &Url, config: &TransportConfig)
        -> io::Result<Box<dyn Connection>>;
}

impl<F> AnyConnectionFactory for F
where
    F: ConnectionFactory,
{
    fn open_boxed(
        &self,
        url: &Url,
        config: &TransportConfig,
    ) -> io::Result<Box<dyn Connection>> {
        Ok(Box::new(self.open(url, config)?))
    }
}
