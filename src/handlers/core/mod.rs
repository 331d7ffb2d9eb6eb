//! Core command infrastructure.
//!
//! - [`ExecutionContext`]: one invocation, normalized across surfaces.
//! - [`CommandSchema`]: the single declaration both front ends render.
//! - [`CombinedCommand`]: the shared execution body.
//! - [`CommandRegistry`]: owns the commands and adapts each surface's
//!   native invocation into an [`ExecutionContext`].

pub mod context;
pub mod registry;
pub mod schema;
pub mod traits;

pub use context::{ChatInvocation, ExecutionContext, GameInvocation, Surface};
pub use registry::CommandRegistry;
pub use schema::{
    ChatCommandDefinition, ChatOptionDefinition, ChatOptionType, CommandSchema, GameForm,
    OptionKind, OptionSpec,
};
pub use traits::CombinedCommand;
