//! Streaming deserializer over a byte slice.

use serde::Deserialize;
use serde::de::{self, IntoDeserializer};
use std::collections::BTreeSet;

use crate::canonical::KeyOrder;
use crate::header::{Item, Reader};
use crate::{CborError, DecodeOptions, DuplicateKeys, Result, Value};

pub struct Decoder<'de> {
    reader: Reader<'de>,
}

impl<'de> Decoder<'de> {
    pub fn new(input: &'de [u8]) -> Self {
        Self::with_options(input, DecodeOptions::default())
    }

    pub fn with_options(input: &'de [u8], options: DecodeOptions) -> Self {
        Decoder {
            reader: Reader::new(input, options),
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    pub fn decode<T: Deserialize<'de>>(&mut self) -> Result<T> {
        T::deserialize(&mut *self)
    }

    /// Applies the trailing-bytes policy and returns the consumed length.
    pub fn end(&self) -> Result<usize> {
        self.reader.finish()
    }
}

impl<'de> de::Deserializer<'de> for &mut Decoder<'de> {
    type Error = CborError;

    fn deserialize_any<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.reader.next_item()? {
            Item::Unsigned(n) => visitor.visit_u64(n),
            Item::Negative(n) => match i64::try_from(n) {
                Ok(n) => visitor.visit_i64(-1 - n),
                Err(_) => visitor.visit_i128(-1 - n as i128),
            },
            Item::Bytes(b) => visitor.visit_borrowed_bytes(b),
            Item::Text(s) => visitor.visit_borrowed_str(s),
            Item::Bool(b) => visitor.visit_bool(b),
            Item::Array(count) => {
                let mut access = SeqAccess {
                    de: &mut *self,
                    remaining: count,
                };
                let value = visitor.visit_seq(&mut access)?;
                if access.remaining != 0 {
                    return Err(CborError::Serde(format!(
                        "{} array elements left unread",
                        access.remaining
                    )));
                }
                self.reader.leave();
                Ok(value)
            }
            Item::Map(count) => {
                let mut access = MapAccess::new(&mut *self, count);
                let value = visitor.visit_map(&mut access)?;
                if access.remaining != 0 {
                    return Err(CborError::Serde(format!(
                        "{} map entries left unread",
                        access.remaining
                    )));
                }
                self.reader.leave();
                Ok(value)
            }
        }
    }

    // Null is not part of the format, so a present value is always `Some`.
    fn deserialize_option<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.reader.next_item()? {
            Item::Text(variant) => visitor.visit_enum(variant.into_deserializer()),
            Item::Map(1) => {
                let value = visitor.visit_enum(VariantAccess { de: &mut *self })?;
                self.reader.leave();
                Ok(value)
            }
            _ => Err(CborError::Serde(
                "expected a variant name or a single-entry map".to_string(),
            )),
        }
    }

    fn is_human_readable(&self) -> bool {
        false
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqAccess<'a, 'de> {
    de: &'a mut Decoder<'de>,
    remaining: usize,
}

impl<'de, 'a> de::SeqAccess<'de> for SeqAccess<'a, 'de> {
    type Error = CborError;

    fn next_element_seed<T: de::DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        seed.deserialize(&mut *self.de).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

struct MapAccess<'a, 'de> {
    de: &'a mut Decoder<'de>,
    remaining: usize,
    order: KeyOrder<'de>,
    // Only populated when duplicate keys are rejected.
    seen: Option<BTreeSet<Value>>,
}

impl<'a, 'de> MapAccess<'a, 'de> {
    fn new(de: &'a mut Decoder<'de>, remaining: usize) -> Self {
        let options = *de.reader.options();
        MapAccess {
            de,
            remaining,
            order: KeyOrder::new(&options),
            seen: (options.duplicate_keys == DuplicateKeys::Reject).then(BTreeSet::new),
        }
    }

    fn check_key(&mut self, key: &'de [u8]) -> Result<()> {
        self.order.check(key)?;
        if let Some(seen) = &mut self.seen {
            // The key has already been validated, so the tree decoder sees
            // the same bytes under the same options.
            let (key, _) = crate::tree::decode(key, self.de.reader.options())?;
            if !seen.insert(key) {
                return Err(CborError::DuplicateKey);
            }
        }
        Ok(())
    }
}

impl<'de, 'a> de::MapAccess<'de> for MapAccess<'a, 'de> {
    type Error = CborError;

    fn next_key_seed<K: de::DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let start = self.de.reader.position();
        let key = seed.deserialize(&mut *self.de)?;
        let raw = self.de.reader.since(start);
        self.check_key(raw)?;
        Ok(Some(key))
    }

    fn next_value_seed<V: de::DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        seed.deserialize(&mut *self.de)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

/// Enum in map form: `{variant: payload}`.
struct VariantAccess<'a, 'de> {
    de: &'a mut Decoder<'de>,
}

impl<'de, 'a> de::EnumAccess<'de> for VariantAccess<'a, 'de> {
    type Error = CborError;
    type Variant = Self;

    fn variant_seed<V: de::DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self)> {
        let variant = seed.deserialize(&mut *self.de)?;
        Ok((variant, self))
    }
}

impl<'de, 'a> de::VariantAccess<'de> for VariantAccess<'a, 'de> {
    type Error = CborError;

    fn unit_variant(self) -> Result<()> {
        Err(CborError::Serde(
            "unit variants are encoded as text, not as a map".to_string(),
        ))
    }

    fn newtype_variant_seed<T: de::DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(&mut *self.de)
    }

    fn tuple_variant<V: de::Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_any(&mut *self.de, visitor)
    }

    fn struct_variant<V: de::Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_any(&mut *self.de, visitor)
    }
}
