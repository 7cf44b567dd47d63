use std::sync::Arc;

use wirehook_core::{CallError, HookRegistry, hookable};

#[derive(Debug)]
struct Broken;

impl std::fmt::Display for Broken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("lamp is broken")
    }
}

impl std::error::Error for Broken {}

struct Lamp;

#[hookable]
impl Lamp {
    fn ___toggle(&self) {}

    fn ___brightness(&self, level: u8) -> Result<u8, Broken> {
        if level > 100 { Err(Broken) } else { Ok(level) }
    }
}

fn main() {
    let hooks = Arc::new(HookRegistry::new());
    let lamp = hooks.adapt(Lamp).unwrap();

    let toggled: Result<(), CallError> = lamp.toggle();
    toggled.unwrap();

    let level: Result<u8, CallError<Broken>> = lamp.brightness(40);
    assert_eq!(level.unwrap(), 40);
    assert!(lamp.brightness(200).unwrap_err().is_method_error());
}
