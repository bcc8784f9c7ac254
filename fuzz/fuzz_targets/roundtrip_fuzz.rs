#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let compressed = tamp::compress(data);
    let decompressed = tamp::decompress(&compressed).expect("own output must decode");
    assert_eq!(decompressed, data);
});
