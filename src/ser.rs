//! Streaming serializer.
//!
//! Scalars and sized sequences are written straight to the underlying writer.
//! Maps (and structs, which are maps on the wire) are buffered one level at a
//! time: each key and value is encoded into its own buffer, and the entries
//! are written in canonical order when the map ends.

use serde::Serialize;
use serde::ser;
use std::io::Write;

use crate::canonical::sort_entries;
use crate::header::Header;
use crate::{
    CborError, FALSE, MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_SIMPLE, MAJOR_TEXT, Result, TRUE,
};

pub struct Encoder<W: Write> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Encoder { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_type_value(&mut self, major: u8, value: u64) -> Result<()> {
        self.writer.write_all(Header::new(major, value).as_bytes())?;
        Ok(())
    }

    fn write_integer(&mut self, value: i128) -> Result<()> {
        self.writer.write_all(Header::integer(value)?.as_bytes())?;
        Ok(())
    }

    pub fn encode<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self)
    }
}

fn encode_to_vec<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    Encoder::new(&mut buf).encode(value)?;
    Ok(buf)
}

fn unsupported(what: impl Into<String>) -> CborError {
    CborError::UnsupportedType(what.into())
}

impl<'a, W: Write> serde::Serializer for &'a mut Encoder<W> {
    type Ok = ();
    type Error = CborError;
    type SerializeSeq = SeqEncoder<'a, W>;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = MapEncoder<'a, W>;
    type SerializeStruct = MapEncoder<'a, W>;
    type SerializeStructVariant = MapEncoder<'a, W>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<()> {
        let val = if v { TRUE } else { FALSE };
        self.writer.write_all(&[(MAJOR_SIMPLE << 5) | val])?;
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.write_integer(v as i128)
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.write_integer(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_u64(v as u64)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.write_integer(v as i128)
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        match i128::try_from(v) {
            Ok(v) => self.write_integer(v),
            Err(_) => Err(unsupported(format!(
                "integer {v} is outside the 64-bit CBOR range"
            ))),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        Err(unsupported(format!("floating-point value {v}")))
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        Err(unsupported(format!("floating-point value {v}")))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.serialize_str(v.encode_utf8(&mut [0u8; 4]))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.write_type_value(MAJOR_TEXT, v.len() as u64)?;
        self.writer.write_all(v.as_bytes())?;
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.write_type_value(MAJOR_BYTES, v.len() as u64)?;
        self.writer.write_all(v)?;
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        Err(unsupported("null"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(unsupported("unit"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<()> {
        Err(unsupported(format!("unit struct {name}")))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        self.write_type_value(MAJOR_MAP, 1)?;
        variant.serialize(&mut *self)?;
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let buffered = match len {
            Some(len) => {
                self.write_type_value(MAJOR_ARRAY, len as u64)?;
                None
            }
            None => Some((Vec::new(), 0)),
        };
        Ok(SeqEncoder {
            encoder: self,
            buffered,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.write_type_value(MAJOR_ARRAY, len as u64)?;
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_tuple(len)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.write_type_value(MAJOR_MAP, 1)?;
        variant.serialize(&mut *self)?;
        self.serialize_tuple(len)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(MapEncoder::new(self))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(MapEncoder::new(self))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.write_type_value(MAJOR_MAP, 1)?;
        variant.serialize(&mut *self)?;
        Ok(MapEncoder::new(self))
    }
}

/// Array serializer. Sequences of unknown length are collected first so the
/// header can carry the real count.
pub struct SeqEncoder<'a, W: Write> {
    encoder: &'a mut Encoder<W>,
    buffered: Option<(Vec<u8>, u64)>,
}

impl<'a, W: Write> ser::SerializeSeq for SeqEncoder<'a, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        match &mut self.buffered {
            Some((buf, count)) => {
                Encoder::new(&mut *buf).encode(value)?;
                *count += 1;
                Ok(())
            }
            None => value.serialize(&mut *self.encoder),
        }
    }

    fn end(self) -> Result<()> {
        if let Some((buf, count)) = self.buffered {
            self.encoder.write_type_value(MAJOR_ARRAY, count)?;
            self.encoder.writer.write_all(&buf)?;
        }
        Ok(())
    }
}

impl<'a, W: Write> ser::SerializeTuple for &'a mut Encoder<W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, W: Write> ser::SerializeTupleStruct for &'a mut Encoder<W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, W: Write> ser::SerializeTupleVariant for &'a mut Encoder<W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Map and struct serializer. Entries are written sorted in `end`.
pub struct MapEncoder<'a, W: Write> {
    encoder: &'a mut Encoder<W>,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    pending_key: Option<Vec<u8>>,
}

impl<'a, W: Write> MapEncoder<'a, W> {
    fn new(encoder: &'a mut Encoder<W>) -> Self {
        MapEncoder {
            encoder,
            entries: Vec::new(),
            pending_key: None,
        }
    }

    fn push<K, V>(&mut self, key: &K, value: &V) -> Result<()>
    where
        K: ?Sized + Serialize,
        V: ?Sized + Serialize,
    {
        self.entries.push((encode_to_vec(key)?, encode_to_vec(value)?));
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        sort_entries(&mut self.entries);
        self.encoder
            .write_type_value(MAJOR_MAP, self.entries.len() as u64)?;
        for (key, value) in &self.entries {
            self.encoder.writer.write_all(key)?;
            self.encoder.writer.write_all(value)?;
        }
        Ok(())
    }
}

impl<'a, W: Write> ser::SerializeMap for MapEncoder<'a, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        self.pending_key = Some(encode_to_vec(key)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| CborError::Serde("map value without a key".to_string()))?;
        self.entries.push((key, encode_to_vec(value)?));
        Ok(())
    }

    fn serialize_entry<K, V>(&mut self, key: &K, value: &V) -> Result<()>
    where
        K: ?Sized + Serialize,
        V: ?Sized + Serialize,
    {
        self.push(key, value)
    }

    fn end(self) -> Result<()> {
        if self.pending_key.is_some() {
            return Err(CborError::Serde("map key without a value".to_string()));
        }
        self.finish()
    }
}

impl<'a, W: Write> ser::SerializeStruct for MapEncoder<'a, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.push(key, value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl<'a, W: Write> ser::SerializeStructVariant for MapEncoder<'a, W> {
    type Ok = ();
    type Error = CborError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.push(key, value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use serde_bytes::ByteBuf;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Serialize)]
    struct Descriptor {
        #[serde(rename = "type")]
        kind: String,
        #[serde(with = "serde_bytes")]
        id: Vec<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        transports: Option<Vec<String>>,
    }

    #[test]
    fn test_struct_fields_are_sorted() {
        let descriptor = Descriptor {
            kind: "public-key".to_string(),
            id: vec![1, 2, 3, 4],
            transports: None,
        };
        let bytes = encode_to_vec(&descriptor).unwrap();
        // {"id": h'01020304', "type": "public-key"}, "id" sorts first (shorter).
        assert_eq!(
            bytes,
            hex!("a2 626964 4401020304 6474797065 6a7075626c69632d6b6579")
        );
    }

    #[test]
    fn test_hashmap_is_deterministic() {
        let mut forward = HashMap::new();
        let mut backward = HashMap::new();
        for i in 0..32u32 {
            forward.insert(format!("k{i}"), i);
            backward.insert(format!("k{}", 31 - i), 31 - i);
        }
        assert_eq!(encode_to_vec(&forward).unwrap(), encode_to_vec(&backward).unwrap());
    }

    #[test]
    fn test_mixed_key_types() {
        let mut map = BTreeMap::new();
        map.insert(crate::Value::from("3"), 0);
        map.insert(crate::Value::from(&b"2"[..]), 0);
        map.insert(crate::Value::from(1), 0);
        assert_eq!(encode_to_vec(&map).unwrap(), hex!("a3 01 00 41 32 00 61 33 00"));
    }

    #[test]
    fn test_unknown_length_sequence() {
        struct Evens;

        impl Serialize for Evens {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_seq((0..30).filter(|i| i % 2 == 0))
            }
        }

        // Filter hides the length from serde, so the encoder buffers.
        let bytes = encode_to_vec(&Evens).unwrap();
        assert_eq!(&bytes[..2], &hex!("8f 00"));
        assert_eq!(bytes.len(), 19);
    }

    #[test]
    fn test_enum_representations() {
        #[derive(Serialize)]
        enum Command {
            Reset,
            Select(u8),
            Pin { retries: u8 },
            Pair(u8, u8),
        }

        assert_eq!(encode_to_vec(&Command::Reset).unwrap(), hex!("65 5265736574"));
        assert_eq!(
            encode_to_vec(&Command::Select(7)).unwrap(),
            hex!("a1 6653656c656374 07")
        );
        assert_eq!(
            encode_to_vec(&Command::Pin { retries: 8 }).unwrap(),
            hex!("a1 6350696e a1 67726574726965 73 08")
        );
        assert_eq!(
            encode_to_vec(&Command::Pair(1, 2)).unwrap(),
            hex!("a1 6450616972 82 01 02")
        );
    }

    #[test]
    fn test_unsupported_values() {
        assert!(matches!(encode_to_vec(&1.5f64), Err(CborError::UnsupportedType(_))));
        assert!(matches!(encode_to_vec(&None::<u8>), Err(CborError::UnsupportedType(_))));
        assert!(matches!(encode_to_vec(&()), Err(CborError::UnsupportedType(_))));
        assert!(matches!(
            encode_to_vec(&vec![Some(1), None]),
            Err(CborError::UnsupportedType(_))
        ));
        assert!(matches!(
            encode_to_vec(&u128::MAX),
            Err(CborError::UnsupportedType(_))
        ));
        assert_eq!(encode_to_vec(&Some(42u8)).unwrap(), hex!("18 2a"));
        assert_eq!(encode_to_vec(&'水').unwrap(), hex!("63 e6b0b4"));
    }

    #[test]
    fn test_byte_buf_is_byte_string() {
        let data = ByteBuf::from(vec![0x42, 0xFF, 0x00, 0xAA, 0x55]);
        let encoded = encode_to_vec(&data).unwrap();
        assert_eq!(encoded[0], (MAJOR_BYTES << 5) | 5);
        assert_eq!(&encoded[1..], &[0x42, 0xFF, 0x00, 0xAA, 0x55]);

        // Without serde_bytes a Vec<u8> is an array of integers.
        let encoded = encode_to_vec(&vec![1u8, 2, 3]).unwrap();
        assert_eq!(encoded, hex!("83 01 02 03"));
    }

    #[test]
    fn test_map_key_without_value() {
        use serde::Serializer;
        use serde::ser::SerializeMap;

        let mut buf = Vec::new();
        let mut encoder = Encoder::new(&mut buf);
        let mut map = (&mut encoder).serialize_map(None).unwrap();
        map.serialize_entry("a", &1).unwrap();
        map.serialize_key("b").unwrap();
        assert!(matches!(map.end(), Err(CborError::Serde(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_writer_error_surfaces_as_io() {
        let mut buf = [0u8; 2];
        let mut encoder = Encoder::new(&mut buf[..]);
        assert!(matches!(encoder.encode("long text"), Err(CborError::Io(_))));
    }
}
