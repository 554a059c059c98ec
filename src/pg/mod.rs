pub mod executor;
pub mod introspect;
pub mod sqlgen;

pub use executor::{CommandExecutor, ExecutorConfig, Invocation, SystemExecutor, Tool};
pub use introspect::{introspect_databases, introspect_roles, introspect_state, Discovery};
