use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use {
    commbot_common::types::Update,
    futures::FutureExt,
    tracing::{debug, error},
};

use crate::{Error, handler::UpdateHandler};

/// What happened to one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The named handler ran to completion.
    Handled { handler: String },
    /// The named handler was selected but failed; the update is not retried.
    Failed { handler: String, reason: String },
    /// No registered handler accepted the update.
    Unhandled,
}

/// Ordered collection of handlers; the first accepting handler wins.
///
/// The handler list is fixed once built, so a router can be shared behind an
/// `Arc` and dispatch many updates concurrently without locking.
pub struct UpdateRouter {
    handlers: Vec<Arc<dyn UpdateHandler>>,
}

/// Collects handlers in registration order.
#[derive(Default)]
pub struct UpdateRouterBuilder {
    handlers: Vec<Arc<dyn UpdateHandler>>,
}

impl UpdateRouterBuilder {
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn UpdateHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn build(self) -> UpdateRouter {
        UpdateRouter {
            handlers: self.handlers,
        }
    }
}

impl UpdateRouter {
    pub fn builder() -> UpdateRouterBuilder {
        UpdateRouterBuilder::default()
    }

    /// Handler names in registration order.
    pub fn list(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Find the first handler for `update`, without running it.
    pub fn select(&self, update: &Update) -> Option<&dyn UpdateHandler> {
        self.handlers
            .iter()
            .find(|h| h.accepted_kinds().contains(&update.kind) && h.can_handle(update))
            .map(|h| h.as_ref())
    }

    /// Run the first accepting handler for `update`.
    ///
    /// Handler errors and panics are contained here: they are logged and
    /// reported as [`DispatchOutcome::Failed`], never propagated.
    pub async fn dispatch(&self, update: &Update) -> DispatchOutcome {
        let Some(handler) = self.select(update) else {
            debug!(update_id = update.id, kind = ?update.kind, "no handler accepted update");
            return DispatchOutcome::Unhandled;
        };
        let name = handler.name().to_string();
        debug!(update_id = update.id, handler = %name, "dispatching update");

        let result = match AssertUnwindSafe(handler.handle(update))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => Err(Error::Panicked {
                message: panic_message(payload.as_ref()),
            }),
        };

        match result {
            Ok(()) => DispatchOutcome::Handled { handler: name },
            Err(e) => {
                error!(update_id = update.id, handler = %name, error = %e, "handler failed");
                DispatchOutcome::Failed {
                    handler: name,
                    reason: e.to_string(),
                }
            },
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
