//! Process-global connection factory registry.

use std::sync::OnceLock;

use crate::any::AnyConnectionFactory;

/// The registered factory slot.
pub static FACTORY: OnceLock<Box<dyn AnyConnectionFactory>> = OnceLock::new();

/// Registers the process-wide connection factory.
///
/// # Panics
///
/// Panics if a factory has already been registered.
pub fn register_connection_factory(factory: impl AnyConnectionFactory) {
    if FACTORY.set(Box::new(factory)).is_err() {
        panic!("Connection factory already registered");
    }
}

/// Returns the registered connection factory, if any.
pub fn connection_factory() -> Option<&'static dyn AnyConnectionFactory> {
    FACTORY.get().map(|factory| &**factory)
}
