//! Hook scenarios shown by the `greet` binary.
//!
//! Each scenario returns the lines it would print, so the binary and the
//! tests share one implementation.

use std::sync::Arc;

use parking_lot::Mutex;
use wirehook::BoxError;
use wirehook::prelude::*;

/// Greets whoever it is asked to.
pub struct HelloWorld;

#[hookable]
impl HelloWorld {
    /// Joins the salutation and the addressee.
    pub fn ___greet(
        &self,
        #[default("hello")] salut: String,
        #[default("world")] what: String,
    ) -> String {
        format!("{salut} {what}")
    }
}

/// Greets with a fixed message; used to show hook ordering.
pub struct PrioDemo;

#[hookable]
impl PrioDemo {
    /// Always `"hello world"`.
    pub fn ___greet(&self) -> String {
        "hello world".to_owned()
    }
}

/// Shared line buffer that hooks can write to.
type Lines = Arc<Mutex<Vec<String>>>;

fn take(lines: &Lines) -> Vec<String> {
    std::mem::take(&mut *lines.lock())
}

/// Default arguments, a rewriting before-hook and an overriding after-hook.
pub fn hello_world(hooks: &Arc<HookRegistry>) -> Result<Vec<String>, BoxError> {
    let hello = hooks.adapt(HelloWorld)?;
    let lines: Lines = Arc::default();

    lines.lock().push(hello.greet(None, None)?);
    lines
        .lock()
        .push(hello.greet(Some("hi".into()), Some("there".into()))?);

    hooks.register_before("HelloWorld::greet", |event: &mut HookEvent<'_>| {
        event.set_arg(0, "hallo")?;
        event.set_arg(1, "welt")?;
        Ok::<_, HookError>(())
    });

    lines.lock().push(hello.greet(None, None)?);
    lines
        .lock()
        .push(hello.greet(Some("servas".into()), Some("oida".into()))?);

    let seen = Arc::clone(&lines);
    hooks.register_after("HelloWorld::greet", move |event: &mut HookEvent<'_>| {
        let args = wirehook::serde_json::to_string(event.args())?;
        seen.lock().push(args);
        event.set_return("hi universe");
        Ok::<_, HookError>(())
    });

    let greeting = hello.greet(None, None)?;
    lines.lock().push(greeting);

    Ok(take(&lines))
}

/// After-hooks registered as 20, 10, 30 run as 10, 20, 30.
pub fn priorities(hooks: &Arc<HookRegistry>) -> Result<Vec<String>, BoxError> {
    let prio = hooks.adapt(PrioDemo)?;
    let lines: Lines = Arc::default();

    for (label, priority) in [("second", 20), ("first", 10), ("third", 30)] {
        let lines = Arc::clone(&lines);
        hooks.register_after_with_priority(
            "PrioDemo::greet",
            priority,
            move |_: &mut HookEvent<'_>| lines.lock().push(label.to_owned()),
        );
    }

    let greeting = prio.greet()?;
    lines.lock().push(greeting);

    Ok(take(&lines))
}

/// A before-hook answers from a cache and skips the original method.
pub fn replacement(hooks: &Arc<HookRegistry>) -> Result<Vec<String>, BoxError> {
    let hello = hooks.adapt_named(HelloWorld, "CachedHello")?;
    let cache = wirehook::serde_json::json!({ "hello world": "cached greeting" });

    hooks.register_before("CachedHello::greet", move |event: &mut HookEvent<'_>| {
        let key = format!(
            "{} {}",
            event.arg_as::<String>(0)?,
            event.arg_as::<String>(1)?
        );
        if let Some(hit) = cache.get(&key) {
            event.replace_with(hit.clone());
        }
        Ok::<_, HookError>(())
    });

    Ok(vec![
        hello.greet(None, None)?,
        hello.greet(Some("hi".into()), None)?,
        hello.call("greet", [])?.to_string(),
    ])
}
