use crate::reporter::SerialSink;

const DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Minimal-width lower-case hex, streamed to the sink digit by digit.
///
/// Most-significant nibble first, leading zero nibbles suppressed; an input
/// of zero renders as the single character `0`. Total over all inputs, so
/// the output is always 1 to 8 characters.
pub fn print_hex(sink: &mut impl SerialSink, value: u32) {
    let mut seen = false;
    for position in (0..8u32).rev() {
        let digit = ((value >> (position * 4)) & 0xF) as usize;
        if !seen && digit == 0 {
            if position == 0 {
                sink.write_byte(b'0');
            }
            continue;
        }
        seen = true;
        sink.write_byte(DIGITS[digit]);
    }
}
