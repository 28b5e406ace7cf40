//! Fuzz target: store file loader
//!
//! Feeds arbitrary bytes through the same path `FileEeprom::open` takes
//! (lossy UTF-8, line parse, capacity filter, forward-only fold) and checks:
//! - No panics
//! - Accepted addresses are strictly ascending
//! - Rewriting the accepted bytes into an image and parsing it again is stable
//!
//! cargo fuzz run fuzz_store_text

#![no_main]

use hamclock_shim::nvram::text_format::{accept_forward_only, parse_lines, write_image};
use libfuzzer_sys::fuzz_target;

const IMAGE: usize = 4096;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let in_range = parse_lines(&text)
        .into_iter()
        .filter(|&(addr, _)| (addr as usize) < IMAGE);
    let kept = accept_forward_only(in_range);
    assert!(kept.windows(2).all(|w| w[0].0 < w[1].0));

    let mut image = vec![0u8; IMAGE];
    for &(addr, value) in &kept {
        image[addr as usize] = value;
    }

    let mut out = Vec::new();
    write_image(&image, &mut out).expect("write to Vec");
    let reparsed = accept_forward_only(parse_lines(&String::from_utf8_lossy(&out)));
    assert_eq!(reparsed.len(), IMAGE);
    assert!(reparsed.iter().all(|&(a, v)| image[a as usize] == v));
});
