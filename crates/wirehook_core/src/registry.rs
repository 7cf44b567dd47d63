//! Hook registry keyed by phase and selector.
//!
//! The [`HookRegistry`] stores [`HookRegistration`]s in buckets identified by
//! a [`Phase`] and a selector string (`"TypeName::method"`). Each bucket is
//! kept sorted by ascending priority; registrations with equal priority keep
//! their registration order.
//!
//! # Example
//!
//! ```
//! use wirehook_core::{HookEvent, HookRegistry};
//!
//! let hooks = HookRegistry::new();
//!
//! hooks.register_before("HelloWorld::greet", |event: &mut HookEvent<'_>| {
//!     event.set_arg(0, "hallo")?;
//!     Ok::<_, wirehook_core::HookError>(())
//! });
//!
//! hooks.register_after_with_priority("HelloWorld::greet", 10, |event: &mut HookEvent<'_>| {
//!     event.set_return("hi universe");
//! });
//!
//! assert_eq!(hooks.len(), 2);
//! ```
//!
//! Registrations live as long as the registry; there is no removal.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::HookError;
use crate::event::HookEvent;

/// Priority given to registrations that do not specify one.
pub const DEFAULT_PRIORITY: i32 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Phase
// ─────────────────────────────────────────────────────────────────────────────

/// When a hook runs relative to the original method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the original method; may rewrite arguments or replace the call.
    Before,
    /// After the original method; may rewrite the return value.
    After,
}

impl Phase {
    /// Returns the lowercase name of the phase.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookId / HookOutcome
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a registration, unique within its registry.
///
/// Ids are handed out in registration order, so they double as the insertion
/// sequence number used to keep equal priorities stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HookId(u64);

impl HookId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the insertion sequence number.
    #[must_use]
    pub fn sequence(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Return types accepted from hook callbacks.
///
/// Hooks that cannot fail return `()`; fallible hooks return
/// `Result<(), E>` for any error convertible into [`HookError`].
pub trait HookOutcome {
    /// Converts the callback's return value into a uniform result.
    fn into_hook_result(self) -> Result<(), HookError>;
}

impl HookOutcome for () {
    fn into_hook_result(self) -> Result<(), HookError> {
        Ok(())
    }
}

impl<E: Into<HookError>> HookOutcome for Result<(), E> {
    fn into_hook_result(self) -> Result<(), HookError> {
        self.map_err(Into::into)
    }
}

type HookFn = Box<dyn Fn(&mut HookEvent<'_>) -> Result<(), HookError> + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// HookRegistration
// ─────────────────────────────────────────────────────────────────────────────

/// A single registered hook. Immutable once created.
pub struct HookRegistration {
    id: HookId,
    selector: Arc<str>,
    phase: Phase,
    priority: i32,
    callback: HookFn,
}

impl HookRegistration {
    /// Identity and insertion sequence of this registration.
    #[must_use]
    pub fn id(&self) -> HookId {
        self.id
    }

    /// Selector the hook is bound to.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Phase the hook runs in.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Priority; lower values run first.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Runs the callback against `event`.
    ///
    /// Errors are returned as-is and panics are not caught here; fault
    /// isolation belongs to the dispatcher.
    pub fn invoke(&self, event: &mut HookEvent<'_>) -> Result<(), HookError> {
        (self.callback)(event)
    }
}

impl fmt::Debug for HookRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistration")
            .field("id", &self.id)
            .field("selector", &self.selector)
            .field("phase", &self.phase)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RegistryConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Behavior settings of a [`HookRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Priority used by `register_before`/`register_after`.
    pub default_priority: i32,
    /// Whether the dispatcher catches panics raised by hooks.
    ///
    /// When disabled, a panicking hook unwinds through the adapted call.
    pub isolate_panics: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_priority: DEFAULT_PRIORITY,
            isolate_panics: true,
        }
    }
}

impl RegistryConfig {
    /// Sets the priority used when none is given.
    #[must_use]
    pub fn with_default_priority(mut self, priority: i32) -> Self {
        self.default_priority = priority;
        self
    }

    /// Enables or disables panic isolation for hooks.
    #[must_use]
    pub fn with_isolate_panics(mut self, enabled: bool) -> Self {
        self.isolate_panics = enabled;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Both phase buckets of one selector.
#[derive(Default)]
struct SelectorHooks {
    before: Vec<Arc<HookRegistration>>,
    after: Vec<Arc<HookRegistration>>,
}

impl SelectorHooks {
    fn phase(&self, phase: Phase) -> &Vec<Arc<HookRegistration>> {
        match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
        }
    }

    fn phase_mut(&mut self, phase: Phase) -> &mut Vec<Arc<HookRegistration>> {
        match phase {
            Phase::Before => &mut self.before,
            Phase::After => &mut self.after,
        }
    }
}

/// Ordered store of before and after hooks.
///
/// # Thread Safety
///
/// Mutations are serialized by a [`RwLock`]. [`lookup`](Self::lookup) copies
/// the bucket's `Arc` handles and releases the lock before returning, so a
/// hook may register further hooks (or re-enter the dispatcher) without
/// deadlocking, and new registrations never join a dispatch already in flight.
#[derive(Default)]
pub struct HookRegistry {
    /// Maps a selector to its registrations, each phase sorted by priority.
    hooks: RwLock<HashMap<Arc<str>, SelectorHooks>>,
    next_id: AtomicU64,
    config: RegistryConfig,
}

impl HookRegistry {
    /// Creates an empty registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the registry's configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers a before-hook with the default priority.
    pub fn register_before<F, R>(&self, selector: impl AsRef<str>, callback: F) -> HookId
    where
        F: Fn(&mut HookEvent<'_>) -> R + Send + Sync + 'static,
        R: HookOutcome,
    {
        self.register(
            Phase::Before,
            selector,
            self.config.default_priority,
            callback,
        )
    }

    /// Registers a before-hook with an explicit priority (lower runs first).
    pub fn register_before_with_priority<F, R>(
        &self,
        selector: impl AsRef<str>,
        priority: i32,
        callback: F,
    ) -> HookId
    where
        F: Fn(&mut HookEvent<'_>) -> R + Send + Sync + 'static,
        R: HookOutcome,
    {
        self.register(Phase::Before, selector, priority, callback)
    }

    /// Registers an after-hook with the default priority.
    pub fn register_after<F, R>(&self, selector: impl AsRef<str>, callback: F) -> HookId
    where
        F: Fn(&mut HookEvent<'_>) -> R + Send + Sync + 'static,
        R: HookOutcome,
    {
        self.register(
            Phase::After,
            selector,
            self.config.default_priority,
            callback,
        )
    }

    /// Registers an after-hook with an explicit priority (lower runs first).
    pub fn register_after_with_priority<F, R>(
        &self,
        selector: impl AsRef<str>,
        priority: i32,
        callback: F,
    ) -> HookId
    where
        F: Fn(&mut HookEvent<'_>) -> R + Send + Sync + 'static,
        R: HookOutcome,
    {
        self.register(Phase::After, selector, priority, callback)
    }

    /// Registers a hook for `phase` on `selector`.
    ///
    /// The selector does not have to belong to an adapted type yet; hooks on
    /// selectors nobody calls simply never fire.
    pub fn register<F, R>(
        &self,
        phase: Phase,
        selector: impl AsRef<str>,
        priority: i32,
        callback: F,
    ) -> HookId
    where
        F: Fn(&mut HookEvent<'_>) -> R + Send + Sync + 'static,
        R: HookOutcome,
    {
        let selector: Arc<str> = Arc::from(selector.as_ref());
        let id = HookId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        let registration = Arc::new(HookRegistration {
            id,
            selector: Arc::clone(&selector),
            phase,
            priority,
            callback: Box::new(move |event| callback(event).into_hook_result()),
        });

        {
            let mut hooks = self.hooks.write();
            let entries = hooks
                .entry(Arc::clone(&selector))
                .or_default()
                .phase_mut(phase);
            entries.push(registration);
            // sort_by_key is stable, so equal priorities keep registration order
            entries.sort_by_key(|entry| entry.priority);
        }

        tracing::debug!(
            hook = %id,
            phase = %phase,
            selector = %selector,
            priority,
            "Hook registered"
        );
        id
    }

    /// Returns the registrations for `phase` on `selector` in execution order.
    ///
    /// The returned list is a snapshot; later registrations do not affect it.
    #[must_use]
    pub fn lookup(&self, phase: Phase, selector: &str) -> Vec<Arc<HookRegistration>> {
        let hooks = self.hooks.read();
        hooks
            .get(selector)
            .map(|entries| entries.phase(phase).clone())
            .unwrap_or_default()
    }

    /// Returns the number of hooks registered for `phase` on `selector`.
    #[must_use]
    pub fn hook_count(&self, phase: Phase, selector: &str) -> usize {
        let hooks = self.hooks.read();
        hooks
            .get(selector)
            .map_or(0, |entries| entries.phase(phase).len())
    }

    /// Returns `true` if any hook, in either phase, is bound to `selector`.
    #[must_use]
    pub fn has_hooks(&self, selector: &str) -> bool {
        let hooks = self.hooks.read();
        hooks
            .get(selector)
            .is_some_and(|entries| !entries.before.is_empty() || !entries.after.is_empty())
    }

    /// Returns every selector with at least one hook, sorted.
    #[must_use]
    pub fn selectors(&self) -> Vec<String> {
        let hooks = self.hooks.read();
        let mut selectors: Vec<String> = hooks.keys().map(ToString::to_string).collect();
        selectors.sort();
        selectors
    }

    /// Total number of registrations across all phases and selectors.
    #[must_use]
    pub fn len(&self) -> usize {
        let hooks = self.hooks.read();
        hooks
            .values()
            .map(|entries| entries.before.len() + entries.after.len())
            .sum()
    }

    /// Returns `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("selectors", &self.selectors())
            .field("hooks", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn noop(_: &mut HookEvent<'_>) {}

    fn priorities(registry: &HookRegistry, phase: Phase, selector: &str) -> Vec<i32> {
        registry
            .lookup(phase, selector)
            .iter()
            .map(|entry| entry.priority())
            .collect()
    }

    #[test]
    fn register_increments_count() {
        let registry = HookRegistry::new();

        registry.register_after("PrioDemo::greet", noop);
        assert_eq!(registry.hook_count(Phase::After, "PrioDemo::greet"), 1);

        registry.register_after("PrioDemo::greet", noop);
        assert_eq!(registry.hook_count(Phase::After, "PrioDemo::greet"), 2);
        assert_eq!(registry.hook_count(Phase::Before, "PrioDemo::greet"), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn lookup_orders_by_priority() {
        let registry = HookRegistry::new();
        let a = registry.register_after_with_priority("PrioDemo::greet", 20, noop);
        let b = registry.register_after_with_priority("PrioDemo::greet", 10, noop);
        let c = registry.register_after_with_priority("PrioDemo::greet", 30, noop);

        let ids: Vec<HookId> = registry
            .lookup(Phase::After, "PrioDemo::greet")
            .iter()
            .map(|entry| entry.id())
            .collect();
        assert_eq!(ids, vec![b, a, c]);
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let registry = HookRegistry::new();
        let first = registry.register_before("Cart::total", noop);
        let second = registry.register_before("Cart::total", noop);
        let early = registry.register_before_with_priority("Cart::total", 5, noop);
        let third = registry.register_before("Cart::total", noop);

        let ids: Vec<HookId> = registry
            .lookup(Phase::Before, "Cart::total")
            .iter()
            .map(|entry| entry.id())
            .collect();
        assert_eq!(ids, vec![early, first, second, third]);
    }

    #[test]
    fn default_priority_comes_from_config() {
        let config = RegistryConfig::default().with_default_priority(7);
        let registry = HookRegistry::with_config(config);
        registry.register_before("Cart::total", noop);
        assert_eq!(priorities(&registry, Phase::Before, "Cart::total"), vec![7]);

        let registry = HookRegistry::new();
        registry.register_before("Cart::total", noop);
        assert_eq!(
            priorities(&registry, Phase::Before, "Cart::total"),
            vec![DEFAULT_PRIORITY]
        );
    }

    #[test]
    fn lookup_unknown_selector_is_empty() {
        let registry = HookRegistry::new();
        assert!(registry.lookup(Phase::Before, "Nobody::home").is_empty());
        assert!(!registry.has_hooks("Nobody::home"));
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_returns_snapshot() {
        let registry = HookRegistry::new();
        registry.register_before("Cart::total", noop);
        let snapshot = registry.lookup(Phase::Before, "Cart::total");

        registry.register_before("Cart::total", noop);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.hook_count(Phase::Before, "Cart::total"), 2);
    }

    #[test]
    fn phases_are_separate_buckets() {
        let registry = HookRegistry::new();
        let before = registry.register_before("Cart::total", noop);
        let after = registry.register_after("Cart::total", noop);

        let looked_up = registry.lookup(Phase::Before, "Cart::total");
        assert_eq!(looked_up.len(), 1);
        assert_eq!(looked_up[0].id(), before);
        assert_eq!(looked_up[0].phase(), Phase::Before);
        assert_eq!(registry.lookup(Phase::After, "Cart::total")[0].id(), after);
        assert!(registry.has_hooks("Cart::total"));
    }

    #[test]
    fn selectors_lists_each_selector_once() {
        let registry = HookRegistry::new();
        registry.register_before("B::m", noop);
        registry.register_after("B::m", noop);
        registry.register_after("A::m", noop);

        assert_eq!(registry.selectors(), vec!["A::m", "B::m"]);
    }

    #[test]
    fn registration_exposes_metadata() {
        let registry = HookRegistry::new();
        let id = registry.register_after_with_priority("Cart::total", -3, noop);
        let entry = &registry.lookup(Phase::After, "Cart::total")[0];

        assert_eq!(entry.id(), id);
        assert_eq!(entry.selector(), "Cart::total");
        assert_eq!(entry.priority(), -3);
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn fallible_callbacks_report_errors() {
        let registry = HookRegistry::new();
        registry.register_before(
            "Cart::total",
            |_: &mut HookEvent<'_>| -> Result<(), HookError> { Err(HookError::msg("nope")) },
        );

        let subject = ();
        let mut event = HookEvent::new("Cart::total", &subject, crate::Arguments::empty());
        let entry = &registry.lookup(Phase::Before, "Cart::total")[0];
        let err = entry.invoke(&mut event).unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    proptest! {
        #[test]
        fn lookup_is_sorted_and_stable(prios in proptest::collection::vec(-5i32..5, 0..32)) {
            let registry = HookRegistry::new();
            for priority in &prios {
                registry.register_after_with_priority("Prop::m", *priority, noop);
            }

            let entries = registry.lookup(Phase::After, "Prop::m");
            prop_assert_eq!(entries.len(), prios.len());
            for pair in entries.windows(2) {
                prop_assert!(
                    (pair[0].priority(), pair[0].id()) < (pair[1].priority(), pair[1].id()),
                    "entries must be ordered by priority, then by registration"
                );
            }
        }
    }
}
