use crate::flag::ClobberFlag;
use crate::region::ScratchRegion;

/// Entry logic for the second execution context.
///
/// Raises the corruption flag once, then increments bytes of the scratch
/// region forever, wrapping the offset at the region length. Nothing guards
/// the region accesses; that hazard is what the demo exists to show.
#[derive(Debug, Default)]
pub struct ClobberWorker {
    offset: u8,
}

impl ClobberWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(&self) -> u8 {
        self.offset
    }

    /// One mutation step: bump the byte at the current offset, advance the
    /// offset with wraparound.
    pub fn step(&mut self, region: &impl ScratchRegion) {
        region.bump(self.offset);
        self.offset = self.offset.wrapping_add(1);
    }

    /// The flag store happens before the first mutation, unconditionally.
    /// `shutdown` is probed once per iteration so a harness can stop the
    /// loop; the on-target build passes `|| false` and never returns.
    pub fn run(
        &mut self,
        region: &impl ScratchRegion,
        flag: &ClobberFlag,
        mut shutdown: impl FnMut() -> bool,
    ) {
        flag.raise();
        loop {
            self.step(region);
            if shutdown() {
                return;
            }
        }
    }
}
