use std::sync::Arc;

use wirehook_core::serde_json::json;
use wirehook_core::{HookEvent, HookRegistry, hookable};

struct Inventory;

#[hookable]
impl Inventory {
    fn ___lookup(&self, skus: Vec<String>, limit: Option<usize>) -> Vec<(String, u32)> {
        skus.into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|sku| (sku, 1))
            .collect()
    }
}

fn main() {
    let hooks = Arc::new(HookRegistry::new());
    let inventory = hooks.adapt(Inventory).unwrap();
    hooks.register_after("Inventory::lookup", |event: &mut HookEvent<'_>| {
        event.set_return(json!([["override", 9]]));
    });

    let found = inventory
        .lookup(vec!["a".to_owned(), "b".to_owned()], Some(1))
        .unwrap();
    assert_eq!(found, vec![("override".to_owned(), 9)]);
}
