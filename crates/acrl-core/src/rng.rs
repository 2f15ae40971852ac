// Every piece of randomness that is not drawn by the tensor backend goes through this rng, so a
// single call to `seed` makes rollouts and replay sampling reproducible.

use rand::{SeedableRng, rngs::StdRng};
use std::cell::RefCell;

thread_local! {
    pub static RNG: RefCell<StdRng> = RefCell::new(StdRng::seed_from_u64(0));
}

pub fn seed(seed: u64) {
    RNG.with_borrow_mut(|rng| *rng = StdRng::seed_from_u64(seed));
}
