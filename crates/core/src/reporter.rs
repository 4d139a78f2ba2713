use crate::flag::ClobberFlag;
use crate::hex::print_hex;

/// Byte-oriented, write-only serial sink.
///
/// Fire-and-forget: there is no error channel. Whatever the underlying
/// transport does with a lost byte is its own business.
pub trait SerialSink {
    fn write_byte(&mut self, byte: u8);

    fn write_str(&mut self, s: &str) {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
    }
}

/// Collects bytes in memory; the sink the harness and tests observe.
#[cfg(feature = "std")]
impl SerialSink for Vec<u8> {
    fn write_byte(&mut self, byte: u8) {
        self.push(byte);
    }
}

/// Fixed pieces of the status line.
pub const LABEL_COUNTER: &str = "Loop counter!  i: 0x";
pub const LABEL_CORE: &str = "  Core: ";
pub const NOTICE_CLOBBERING: &str = "  Memory is being clobbered";
pub const LINE_END: &str = "\r\n";

/// Emits the repeating status line on the first execution context.
#[derive(Debug, Default)]
pub struct Reporter {
    counter: u32,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an arbitrary counter value.
    pub fn with_counter(counter: u32) -> Self {
        Self { counter }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// One status line: label, hex counter, core digit, and the corruption
    /// notice whenever the flag currently reads raised. Bumps the counter
    /// afterwards, wrapping at 32 bits.
    pub fn emit_line(&mut self, sink: &mut impl SerialSink, flag: &ClobberFlag, core_id: u8) {
        sink.write_str(LABEL_COUNTER);
        print_hex(sink, self.counter);
        sink.write_str(LABEL_CORE);
        sink.write_byte(b'0' + core_id);
        if flag.is_raised() {
            sink.write_str(NOTICE_CLOBBERING);
        }
        sink.write_str(LINE_END);
        self.counter = self.counter.wrapping_add(1);
    }

    /// Main loop of the first execution context. The context id is read
    /// fresh every iteration rather than cached. `shutdown` is probed once
    /// per line so a harness can stop the loop; the on-target build passes
    /// `|| false` and never returns.
    pub fn run(
        &mut self,
        sink: &mut impl SerialSink,
        flag: &ClobberFlag,
        core_id: impl Fn() -> u8,
        mut shutdown: impl FnMut() -> bool,
    ) {
        loop {
            self.emit_line(sink, flag, core_id());
            if shutdown() {
                return;
            }
        }
    }
}
