//! Modules shipped with the runtime binary.

use crate::loader::{BuiltinModule, BuiltinRegistry};

/// Name of the echo module.
pub const ECHO_MODULE: &str = "invoker.Echo";

#[derive(Debug, Default)]
struct Echo;

/// Registry holding the runtime's own modules.
///
/// `invoker.Echo::handler` returns its params unchanged, which makes it a
/// smoke test for a freshly started container.
#[must_use]
pub fn registry() -> BuiltinRegistry {
    let mut registry = BuiltinRegistry::new();
    registry.register(
        BuiltinModule::<Echo>::new(ECHO_MODULE)
            .with_default()
            .unary("handler", |_, params| Ok(params)),
    );
    registry
}
