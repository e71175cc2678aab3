//! Shared test fixtures
//!
//! Wire fixtures throughout this crate's test modules are written as hex
//! strings with optional whitespace/colon/period separators for
//! readability, e.g. `"ff:ff:ff:ff 0013 04"`.

// SPDX-License-Identifier: AGPL-3.0-or-later

use bytes::{BufMut, BytesMut};

fn convert_one_hex_digit(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex digit: {}", c as char),
    }
}

/// Parse a hex string into bytes, skipping ` \t\n\r:.` separators.
pub fn hex_to_bytes(hex: &str) -> BytesMut {
    let mut buf = BytesMut::new();
    let mut high = None;
    for &c in hex.as_bytes() {
        if matches!(c, b' ' | b'\t' | b'\n' | b'\r' | b':' | b'.') {
            continue;
        }
        match high.take() {
            None => high = Some(convert_one_hex_digit(c)),
            Some(h) => buf.put_u8((h << 4) | convert_one_hex_digit(c)),
        }
    }
    assert!(high.is_none(), "odd number of hex digits in {hex:?}");
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_bytes() {
        assert_eq!(hex_to_bytes("ff:00 01.02"), BytesMut::from(&[0xff, 0x00, 0x01, 0x02][..]));
    }
}
