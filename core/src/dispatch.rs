//! The emitter seam between the request driver and whatever consumes its actions.
//!
//! The driver never assumes a global bus: it is handed a [`Dispatcher`] and
//! awaits each dispatch before moving on, so consumers observe actions in
//! emission order.

use crate::action::RequestAction;
use futures::future::BoxFuture;

/// Receives lifecycle actions
///
/// Implemented for plain closures, so a test can collect actions with
/// `|action| actions.lock().unwrap().push(action)`.
pub trait Dispatcher: Send + Sync {
    /// Deliver one action
    ///
    /// The returned future completes once the action has been handled.
    fn dispatch(&self, action: RequestAction) -> BoxFuture<'_, ()>;
}

impl<F> Dispatcher for F
where
    F: Fn(RequestAction) + Send + Sync,
{
    fn dispatch(&self, action: RequestAction) -> BoxFuture<'_, ()> {
        self(action);
        Box::pin(futures::future::ready(()))
    }
}
