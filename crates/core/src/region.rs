use core::sync::atomic::{AtomicU8, Ordering};

/// Length of the reserved region, fixed by the demo.
pub const REGION_LEN: usize = 256;

/// An index-addressable fixed-size byte container for the corrupting worker.
///
/// Offsets are `u8`, so the wraparound at `REGION_LEN` is built into the
/// index type itself.
pub trait ScratchRegion {
    /// Read-increment-write one byte, with 8-bit wraparound arithmetic.
    fn bump(&self, offset: u8);

    /// Copy of the current contents, for out-of-band inspection only. The
    /// in-band program logic never reads the region.
    fn snapshot(&self) -> [u8; REGION_LEN];
}

/// The shared corruption buffer.
///
/// Every access is `Relaxed`: no ordering is promised between the writer
/// context and anything else observing the region. The bump is a split
/// load-then-store rather than a fetch_add, so the read-modify-write itself
/// is not atomic either; thumbv6m has no atomic RMW instructions anyway.
///
/// Const-constructible so the firmware can park one instance in a linker
/// section. On the host it starts zeroed; on target the section is NOLOAD
/// and the initial contents are whatever the SRAM held.
pub struct AtomicScratch([AtomicU8; REGION_LEN]);

impl AtomicScratch {
    pub const fn new() -> Self {
        Self([const { AtomicU8::new(0) }; REGION_LEN])
    }
}

impl Default for AtomicScratch {
    fn default() -> Self {
        Self::new()
    }
}

impl ScratchRegion for AtomicScratch {
    fn bump(&self, offset: u8) {
        let cell = &self.0[offset as usize];
        cell.store(
            cell.load(Ordering::Relaxed).wrapping_add(1),
            Ordering::Relaxed,
        );
    }

    fn snapshot(&self) -> [u8; REGION_LEN] {
        let mut out = [0u8; REGION_LEN];
        for (dst, cell) in out.iter_mut().zip(self.0.iter()) {
            *dst = cell.load(Ordering::Relaxed);
        }
        out
    }
}
