#![no_main]

use ffs_tunnel::{Frame, ModRing};
use libfuzzer_sys::fuzz_target;
use num_bigint::BigUint;

fuzz_target!(|data: &[u8]| {
    let ring = ModRing::new(BigUint::from(999_985_999_949u64)).unwrap();
    if let Ok(frame) = Frame::decode(&ring, data) {
        assert_eq!(frame.encode(&ring).ok().as_deref(), Some(data));
    }
});
