// Copyright 2026 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Newtype structs around hash maps must serialize as the map itself, and the
// map must come out in canonical key order whatever order the HashMap
// iterates in.

use std::collections::HashMap;

use canon_cbor::{Value, decode};
use hex_literal::hex;
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

#[test]
fn test_newtype_hashmap_is_canonical_map() {
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TimeStamp(pub HashMap<String, ByteBuf>);

    let mut map = HashMap::new();
    map.insert("key2".to_string(), ByteBuf::from(vec![4, 5, 6]));
    map.insert("k".to_string(), ByteBuf::from(vec![]));
    map.insert("key1".to_string(), ByteBuf::from(vec![1, 2, 3]));

    let timestamp = TimeStamp(map);
    let cbor_bytes = canon_cbor::to_vec(&timestamp).expect("serialize");

    // "k" is shortest so it sorts first, then "key1" < "key2" bytewise.
    assert_eq!(
        cbor_bytes,
        hex!(
            "a3"
            "616b 40"
            "646b657931 43010203"
            "646b657932 43040506"
        )
    );

    let deserialized: TimeStamp = canon_cbor::from_slice(&cbor_bytes).expect("deserialize");
    assert_eq!(timestamp, deserialized);
}

#[test]
fn test_insertion_order_does_not_matter() {
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Metadata(pub HashMap<String, String>);

    let entries = [
        ("author", "Alice"),
        ("title", "Test Document"),
        ("a", "b"),
        ("zzzzzzzzzz", ""),
    ];

    let forward: HashMap<_, _> = entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let backward: HashMap<_, _> = entries
        .iter()
        .rev()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let first = canon_cbor::to_vec(&Metadata(forward)).expect("serialize");
    let second = canon_cbor::to_vec(&Metadata(backward)).expect("serialize");
    assert_eq!(first, second);

    // The untyped encoding of the same entries matches byte for byte.
    let value = Value::map(entries);
    assert_eq!(canon_cbor::encode(&value).unwrap(), first);
    assert_eq!(decode(&first).unwrap(), value);
}

#[test]
fn test_newtype_vec_transparent() {
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Items(pub Vec<String>);

    let items = Items(vec!["item1".to_string(), "item2".to_string()]);
    let cbor_bytes = canon_cbor::to_vec(&items).expect("serialize");

    // 0x82 is a 2-element array, not a 1-element array wrapping another.
    assert_eq!(
        cbor_bytes[0], 0x82,
        "Expected 2-element array (0x82), got 0x{:02x}",
        cbor_bytes[0]
    );

    let deserialized: Items = canon_cbor::from_slice(&cbor_bytes).expect("deserialize");
    assert_eq!(items, deserialized);
}

#[test]
fn test_regular_struct_with_hashmap_field() {
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Container {
        data: HashMap<String, u16>,
    }

    let mut map = HashMap::new();
    map.insert("bb".to_string(), 300);
    map.insert("a".to_string(), 1);

    let container = Container { data: map };
    let cbor_bytes = canon_cbor::to_vec(&container).expect("serialize");
    assert_eq!(
        cbor_bytes,
        hex!("a1 6464617461 a2 6161 01 626262 19012c")
    );

    let deserialized: Container = canon_cbor::from_slice(&cbor_bytes).expect("deserialize");
    assert_eq!(container, deserialized);
}

#[test]
fn test_explicitly_transparent_newtype() {
    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(transparent)]
    struct TransparentMap(pub HashMap<u64, bool>);

    let transparent = TransparentMap(HashMap::from([(1000, true), (1, false)]));
    let cbor_bytes = canon_cbor::to_vec(&transparent).expect("serialize");
    assert_eq!(cbor_bytes, hex!("a2 01 f4 1903e8 f5"));

    let deserialized: TransparentMap = canon_cbor::from_slice(&cbor_bytes).expect("deserialize");
    assert_eq!(transparent, deserialized);
}
