use std::sync::Arc;

use wirehook_core::{HookError, HookEvent, HookRegistry, hookable};

/// A shop cart.
pub struct Cart {
    prices: Vec<u64>,
}

#[hookable(name = "Basket", hooks_trait = "BasketHooks")]
impl Cart {
    /// Sum of all prices minus an optional discount.
    pub fn ___total(&self, #[default(0)] discount: u64) -> u64 {
        self.prices.iter().sum::<u64>().saturating_sub(discount)
    }

    /// Number of items; not hookable.
    pub fn len(&self) -> usize {
        self.prices.len()
    }
}

fn main() {
    let hooks = Arc::new(HookRegistry::new());
    let prices = vec![5, 10];
    let cart = hooks.adapt(Cart { prices }).unwrap();
    hooks.register_before("Basket::total", |event: &mut HookEvent<'_>| {
        event.set_arg(0, 1)?;
        Ok::<_, HookError>(())
    });

    assert_eq!(<_ as BasketHooks>::total(&cart, None).unwrap(), 14);
    assert_eq!(cart.len(), 2);
}
