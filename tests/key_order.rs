// Copyright 2026 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

//! Canonical map key order: first byte, then encoded length, then bytewise.

use canon_cbor::{Backend, CborError, DecodeOptions, Value, cmp_encoded_keys};
use hex_literal::hex;
use std::cmp::Ordering;

fn bytes(b: &[u8]) -> Value {
    Value::from(b)
}

fn assert_order(value: Value, expected: &[u8]) {
    for backend in [Backend::Tree, Backend::Streaming] {
        assert_eq!(backend.encode(&value).unwrap(), expected, "{backend:?}");
        let (decoded, consumed) = backend
            .decode_with(expected, &DecodeOptions::strict())
            .unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, expected.len());
    }
}

#[test]
fn test_mixed_major_types() {
    assert_order(
        Value::map([
            (Value::from("3"), 0),
            (bytes(b"2"), 0),
            (Value::from(1), 0),
        ]),
        &hex!("a3 01 00 41 32 00 61 33 00"),
    );
}

#[test]
fn test_first_byte_beats_length() {
    // 256 needs a 3-byte header but its first byte 0x19 is still the lowest.
    assert_order(
        Value::map([
            (Value::from("3"), 0),
            (bytes(b""), 0),
            (Value::from(256), 0),
        ]),
        &hex!("a3 190100 00 40 00 61 33 00"),
    );
}

#[test]
fn test_length_before_content() {
    assert_order(
        Value::map([(bytes(b"22"), 0), (bytes(b"3"), 0), (bytes(b"111"), 0)]),
        &hex!("a3 4133 00 423232 00 43313131 00"),
    );
}

#[test]
fn test_bytewise_last() {
    assert_order(
        Value::map([(bytes(b"003"), 0), (bytes(b"001"), 0), (bytes(b"002"), 0)]),
        &hex!("a3 43303031 00 43303032 00 43303033 00"),
    );
}

#[test]
fn test_bool_keys() {
    assert_order(
        Value::map([(Value::from(true), 0), (Value::from(false), 0)]),
        &hex!("a2 f4 00 f5 00"),
    );
}

#[test]
fn test_negative_after_unsigned() {
    assert_order(
        Value::map([(Value::from(-1), 0), (Value::from(1000), 0), (Value::from(0), 0)]),
        &hex!("a3 00 00 1903e8 00 20 00"),
    );
}

#[test]
fn test_comparator() {
    assert_eq!(cmp_encoded_keys(&hex!("190100"), &hex!("40")), Ordering::Less);
    assert_eq!(cmp_encoded_keys(&hex!("4133"), &hex!("423232")), Ordering::Less);
    assert_eq!(cmp_encoded_keys(&hex!("43303033"), &hex!("43303031")), Ordering::Greater);
    assert_eq!(cmp_encoded_keys(&hex!("f5"), &hex!("f5")), Ordering::Equal);
    assert_eq!(cmp_encoded_keys(&[], &hex!("00")), Ordering::Less);
}

#[test]
fn test_unsorted_input_accepted_by_default() {
    let unsorted = hex!("a3 61 33 00 41 32 00 01 00");
    for backend in [Backend::Tree, Backend::Streaming] {
        let (value, _) = backend
            .decode_with(&unsorted, &DecodeOptions::default())
            .unwrap();
        // Re-encoding restores the canonical order.
        assert_eq!(
            backend.encode(&value).unwrap(),
            hex!("a3 01 00 41 32 00 61 33 00")
        );

        let err = backend
            .decode_with(&unsorted, &DecodeOptions::strict())
            .unwrap_err();
        assert!(matches!(err, CborError::NonCanonical), "{backend:?}: {err}");
    }
}
