//! The combined command contract.

use super::context::ExecutionContext;
use super::schema::CommandSchema;
use crate::error::CommandResult;
use async_trait::async_trait;

/// Command logic shared by the game and chat front ends.
///
/// Implementations reply through [`ExecutionContext::send`] on success and
/// return `Err` for everything else; the registry renders the error reply.
/// Privileged branches must re-check permissions themselves, since the chat
/// surface has no registration gate.
#[async_trait]
pub trait CombinedCommand: Send + Sync {
    fn schema(&self) -> &CommandSchema;

    async fn execute(&self, ctx: &ExecutionContext) -> CommandResult;
}
