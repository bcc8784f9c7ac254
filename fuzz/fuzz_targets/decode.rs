#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode to something or fail cleanly, never panic.
    let _ = tamp::decompress(data);
});
