#![no_main]

use ffs_tunnel::channel::{decode_record, encode_record};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((sealed, used)) = decode_record(data, 4096) {
        assert_eq!(encode_record(&sealed).unwrap(), &data[..used]);
    }
});
