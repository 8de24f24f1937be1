use {async_trait::async_trait, commbot_common::types::{Update, UpdateKind}};

use crate::Result;

/// A unit of bot behavior selected by the router.
///
/// The router offers an update to a handler only when [`accepted_kinds`]
/// contains the update's kind, then asks [`can_handle`]. The first handler
/// answering yes runs [`handle`]; later handlers never see the update.
///
/// Handlers are shared across concurrently dispatched updates, so any mutable
/// state they own must be synchronized internally.
///
/// [`accepted_kinds`]: UpdateHandler::accepted_kinds
/// [`can_handle`]: UpdateHandler::can_handle
/// [`handle`]: UpdateHandler::handle
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Update kinds this handler is ever interested in.
    fn accepted_kinds(&self) -> &[UpdateKind];

    /// Relevance predicate. Must be cheap and free of side effects.
    fn can_handle(&self, update: &Update) -> bool;

    /// Act on the update. Errors are logged by the router and never retried.
    async fn handle(&self, update: &Update) -> Result<()>;
}
