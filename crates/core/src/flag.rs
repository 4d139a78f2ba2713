use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(feature = "synchronized"))]
const STORE_ORDER: Ordering = Ordering::Relaxed;
#[cfg(not(feature = "synchronized"))]
const LOAD_ORDER: Ordering = Ordering::Relaxed;

#[cfg(feature = "synchronized")]
const STORE_ORDER: Ordering = Ordering::Release;
#[cfg(feature = "synchronized")]
const LOAD_ORDER: Ordering = Ordering::Acquire;

/// Single-writer, single-reader "corruption has started" flag.
///
/// The worker raises it exactly once; the reporter polls it from the other
/// execution context. Both sides default to `Relaxed`, i.e. no visibility
/// contract beyond the bare store and load -- the race is the exhibit, not
/// an oversight. The `synchronized` feature swaps in Release/Acquire as a
/// separately built variant.
pub struct ClobberFlag(AtomicBool);

/// Process-wide flag instance shared by the two execution contexts.
pub static CLOBBER_ACTIVE: ClobberFlag = ClobberFlag::new();

impl ClobberFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn raise(&self) {
        self.0.store(true, STORE_ORDER);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(LOAD_ORDER)
    }
}

impl Default for ClobberFlag {
    fn default() -> Self {
        Self::new()
    }
}
