//! The tree backend: encodes and decodes [`Value`] by walking the value
//! directly. This is the reference codec the streaming backend is checked
//! against.

use std::collections::BTreeMap;

use crate::canonical::{KeyOrder, sort_entries};
use crate::header::{Header, Item, Reader};
use crate::{
    CborError, DecodeOptions, DuplicateKeys, FALSE, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP,
    MAJOR_SIMPLE, MAJOR_TEXT, Result, TRUE, Value,
};

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_into(value, &mut out)?;
    Ok(out)
}

fn encode_into(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Bool(b) => out.push((MAJOR_SIMPLE << 5) | if *b { TRUE } else { FALSE }),
        Value::Integer(i) => out.extend_from_slice(Header::integer(*i)?.as_bytes()),
        Value::Bytes(b) => {
            out.extend_from_slice(Header::new(MAJOR_BYTES, b.len() as u64).as_bytes());
            out.extend_from_slice(b);
        }
        Value::Text(s) => {
            out.extend_from_slice(Header::new(MAJOR_TEXT, s.len() as u64).as_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        Value::Array(items) => {
            out.extend_from_slice(Header::new(MAJOR_ARRAY, items.len() as u64).as_bytes());
            for item in items {
                encode_into(item, out)?;
            }
        }
        Value::Map(map) => {
            let mut entries = map
                .iter()
                .map(|(k, v)| Ok((encode(k)?, encode(v)?)))
                .collect::<Result<Vec<_>>>()?;
            sort_entries(&mut entries);

            out.extend_from_slice(Header::new(MAJOR_MAP, entries.len() as u64).as_bytes());
            for (k, v) in entries {
                out.extend_from_slice(&k);
                out.extend_from_slice(&v);
            }
        }
    }
    Ok(())
}

/// Decodes one item from the start of `data`, returning it with the number
/// of bytes consumed.
pub fn decode(data: &[u8], options: &DecodeOptions) -> Result<(Value, usize)> {
    let mut reader = Reader::new(data, *options);
    let value = decode_item(&mut reader)?;
    let consumed = reader.finish()?;
    Ok((value, consumed))
}

fn decode_item(reader: &mut Reader<'_>) -> Result<Value> {
    Ok(match reader.next_item()? {
        Item::Unsigned(n) => Value::Integer(n as i128),
        Item::Negative(n) => Value::Integer(-1 - n as i128),
        Item::Bytes(b) => Value::Bytes(b.to_vec()),
        Item::Text(s) => Value::Text(s.to_owned()),
        Item::Bool(b) => Value::Bool(b),
        Item::Array(count) => {
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_item(reader)?);
            }
            reader.leave();
            Value::Array(items)
        }
        Item::Map(count) => {
            let map = decode_entries(reader, count)?;
            reader.leave();
            Value::Map(map)
        }
    })
}

fn decode_entries(reader: &mut Reader<'_>, count: usize) -> Result<BTreeMap<Value, Value>> {
    let mut order = KeyOrder::new(reader.options());
    let mut map = BTreeMap::new();
    for _ in 0..count {
        let start = reader.position();
        let key = decode_item(reader)?;
        order.check(reader.since(start))?;
        if map.contains_key(&key) {
            match reader.options().duplicate_keys {
                DuplicateKeys::Reject => return Err(CborError::DuplicateKey),
                DuplicateKeys::LastWins => {
                    tracing::trace!(%key, "duplicate map key, keeping last value")
                }
            }
        }
        let value = decode_item(reader)?;
        map.insert(key, value);
    }
    Ok(map)
}
