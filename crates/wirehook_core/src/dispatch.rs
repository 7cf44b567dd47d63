//! Hook dispatch around an original method.
//!
//! For every call the [`Dispatcher`]:
//!
//! 1. builds a [`HookEvent`] from the call's arguments and subject,
//! 2. runs the before-hooks in priority order, stopping as soon as one of
//!    them sets the replace flag,
//! 3. returns the event's return value right away if the call was replaced,
//! 4. otherwise invokes the original method with the (possibly rewritten)
//!    arguments and stores its result,
//! 5. runs every after-hook in priority order,
//! 6. returns the final return value.
//!
//! Hook failures (returned errors and, by default, panics) are logged and
//! skipped. With a [`CallShape`], writes of a hook that leave a value of the
//! wrong type are undone as well. Errors of the original method are returned
//! unchanged and skip the after-phase.

use core::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

use crate::args::Arguments;
use crate::error::{HookExecutionError, HookFault};
use crate::event::HookEvent;
use crate::registry::{HookRegistration, HookRegistry, Phase};
use crate::shape::CallShape;

/// Runs hooks from a [`HookRegistry`] around original method calls.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<HookRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher reading hooks from `registry`.
    #[must_use]
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry hooks are read from.
    #[must_use]
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    /// Dispatches one call of `selector` on `subject`.
    ///
    /// Both phase lists are snapshotted before the first hook runs, so hooks
    /// registered during this call only apply to later calls.
    ///
    /// # Errors
    ///
    /// Returns the error of `original` unchanged. Hook failures never surface
    /// here.
    pub fn dispatch<S, E, F>(
        &self,
        selector: &str,
        subject: &S,
        args: Arguments,
        original: F,
    ) -> Result<Value, E>
    where
        S: Any + Send + Sync,
        F: FnOnce(&S, &Arguments) -> Result<Value, E>,
    {
        self.dispatch_checked(selector, subject, args, None, original)
    }

    /// Like [`dispatch`](Self::dispatch), checking the event against `shape`
    /// after every hook.
    ///
    /// A hook that leaves an argument (before-phase) or the return value
    /// (after-phase, or a replaced call) that `shape` rejects has all of its
    /// writes undone, and the rejection is logged like any other hook fault.
    ///
    /// # Errors
    ///
    /// Returns the error of `original` unchanged.
    pub fn dispatch_checked<S, E, F>(
        &self,
        selector: &str,
        subject: &S,
        args: Arguments,
        shape: Option<&dyn CallShape>,
        original: F,
    ) -> Result<Value, E>
    where
        S: Any + Send + Sync,
        F: FnOnce(&S, &Arguments) -> Result<Value, E>,
    {
        let before = self.registry.lookup(Phase::Before, selector);
        let after = self.registry.lookup(Phase::After, selector);

        tracing::trace!(
            selector,
            before = before.len(),
            after = after.len(),
            arity = args.len(),
            checked = shape.is_some(),
            "Dispatching hookable call"
        );

        let mut event = HookEvent::new(selector, subject, args);

        for hook in &before {
            if event.is_replaced() {
                break;
            }
            self.run_hook(hook, &mut event, shape);
        }

        if event.is_replaced() {
            tracing::debug!(selector, "Call replaced by before-hook");
            return Ok(event.into_return());
        }

        let value = original(subject, event.args())?;
        event.store_return(value);

        for hook in &after {
            self.run_hook(hook, &mut event, shape);
        }

        Ok(event.into_return())
    }

    /// Runs one hook, logging and swallowing its failure.
    fn run_hook(
        &self,
        hook: &HookRegistration,
        event: &mut HookEvent<'_>,
        shape: Option<&dyn CallShape>,
    ) {
        let saved = shape.map(|_| event.save());

        let outcome = if self.registry.config().isolate_panics {
            match panic::catch_unwind(AssertUnwindSafe(|| hook.invoke(event))) {
                Ok(result) => result.map_err(HookFault::Failed),
                Err(payload) => Err(HookFault::Panicked(panic_message(payload.as_ref()))),
            }
        } else {
            hook.invoke(event).map_err(HookFault::Failed)
        };

        if let Err(fault) = outcome {
            report(hook, event, fault);
        }

        if let (Some(shape), Some(saved)) = (shape, saved)
            && let Err(fault) = check_event(shape, hook.phase(), event)
        {
            event.restore(saved);
            report(hook, event, fault);
        }
    }
}

/// Checks the values a hook of `phase` may have written.
fn check_event(
    shape: &dyn CallShape,
    phase: Phase,
    event: &HookEvent<'_>,
) -> Result<(), HookFault> {
    if phase == Phase::Before {
        shape
            .check_args(event.args())
            .map_err(HookFault::RejectedArgument)?;
    }
    if phase == Phase::After || event.is_replaced() {
        shape
            .check_return(event.return_value())
            .map_err(HookFault::RejectedReturn)?;
    }
    Ok(())
}

fn report(hook: &HookRegistration, event: &HookEvent<'_>, fault: HookFault) {
    let snapshot = event.snapshot();
    let error = HookExecutionError {
        phase: hook.phase(),
        selector: snapshot.selector.clone(),
        hook: hook.id(),
        fault,
    };

    match &error.fault {
        HookFault::Panicked(_) => tracing::error!(
            phase = %error.phase,
            selector = %error.selector,
            hook = %error.hook,
            priority = hook.priority(),
            event = %snapshot,
            error = %error,
            "Hook panicked; continuing with next hook"
        ),
        HookFault::RejectedArgument(_) | HookFault::RejectedReturn(_) => tracing::warn!(
            phase = %error.phase,
            selector = %error.selector,
            hook = %error.hook,
            priority = hook.priority(),
            event = %snapshot,
            error = %error,
            "Hook wrote a value of the wrong type; its changes were undone"
        ),
        HookFault::Failed(_) => tracing::warn!(
            phase = %error.phase,
            selector = %error.selector,
            hook = %error.hook,
            priority = hook.priority(),
            event = %snapshot,
            error = %error,
            "Hook failed; continuing with next hook"
        ),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
