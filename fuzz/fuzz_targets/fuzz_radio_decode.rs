//! Fuzz the radio command decoder: arbitrary bytes must either parse into
//! a known command or yield a protocol error — never panic — and every
//! successful parse must re-encode to the original payload.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((command, value)) = gardenlink::link::decode(data) {
        let mut buf = [0u8; 256];
        if data.len() <= buf.len() {
            let n = gardenlink::link::encode(command, value, &mut buf)
                .expect("decoded frame must re-encode");
            assert_eq!(&buf[..n], data);
        }
    }
});
