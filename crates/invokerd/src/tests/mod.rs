//! Test suites for the invocation runtime.

mod invocation_behaviour;
pub(crate) mod support;
