//! # Canonical Encoding
//!
//! Deterministic byte form of anything the ledger hashes. Two values with
//! the same logical content always encode to the same bytes, no matter in
//! which order their map keys were inserted.
//!
//! ## Format
//!
//! The value is lowered to a [`serde_json::Value`] and every object in the
//! tree is rebuilt with its keys in lexicographic order (this holds whether
//! or not `serde_json`'s `preserve_order` feature is on). The tree is then
//! written as JSON with:
//!
//! ```text
//! item separator  ", "
//! key separator   ": "
//! non-ASCII       \uXXXX, lowercase hex, UTF-16 surrogate pairs above the BMP
//! DEL (0x7f)      \u007f
//! ```
//!
//! A value that lowers to a bare string is already canonical and comes back
//! as its UTF-8 bytes, unquoted.
//!
//! NaN, infinities and non-string map keys have no canonical form and are
//! refused before anything is written.
//!
//! This byte layout is the hash commitment. Changing any of it orphans
//! every existing block hash.

use std::{fmt, io};

use serde::ser::{self, Impossible, Serialize};
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::config::{ITEM_SEPARATOR, KEY_SEPARATOR};
use crate::error::{LedgerError, Result};

/// Encode `value` into its canonical byte form.
///
/// # Errors
///
/// Returns [`LedgerError::Encoding`] when the value cannot be represented:
/// a NaN or infinite float, or a map key that is not a string. Both would
/// otherwise be silently coerced (to `null`, or to a quoted number) and
/// collide with a different value's content id.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use tally_ledger::codec::encode;
///
/// let mut tx = BTreeMap::new();
/// tx.insert("Tom", -1);
/// tx.insert("Medium", 1);
/// assert_eq!(encode(&tx).unwrap(), br#"{"Medium": 1, "Tom": -1}"#);
/// assert_eq!(encode("already canonical").unwrap(), b"already canonical");
/// ```
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    value
        .serialize(Guard)
        .map_err(|e| LedgerError::Encoding(e.0))?;
    let lowered = serde_json::to_value(value)?;
    if let Value::String(text) = lowered {
        return Ok(text.into_bytes());
    }
    encode_value(lowered)
}

/// Write an already-lowered JSON tree in canonical form.
pub fn encode_value(value: Value) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(128);
    let mut serializer = Serializer::with_formatter(&mut out, CanonicalFormatter);
    sort_keys(value)
        .serialize(&mut serializer)
        .map_err(|e| LedgerError::Encoding(e.to_string()))?;
    Ok(out)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Formatter
// ---------------------------------------------------------------------------

/// `serde_json` formatter producing the canonical separators and ASCII-only
/// string bodies.
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(ITEM_SEPARATOR)
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(ITEM_SEPARATOR)
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(KEY_SEPARATOR)
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        // Quotes, backslashes and C0 controls never reach this point; the
        // serializer routes them through `write_char_escape`.
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Why [`Guard`] refused a value.
#[derive(Debug, Error)]
#[error("{0}")]
struct Rejected(String);

impl ser::Error for Rejected {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Rejected(msg.to_string())
    }
}

fn finite(value: f64) -> Result<(), Rejected> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Rejected(format!("non-finite number {} has no canonical form", value)))
    }
}

/// Serializer that writes nothing and only walks the value, failing on
/// what JSON cannot carry faithfully.
struct Guard;

impl ser::Serializer for Guard {
    type Ok = ();
    type Error = Rejected;
    type SerializeSeq = Guard;
    type SerializeTuple = Guard;
    type SerializeTupleStruct = Guard;
    type SerializeTupleVariant = Guard;
    type SerializeMap = Guard;
    type SerializeStruct = Guard;
    type SerializeStructVariant = Guard;

    fn serialize_bool(self, _: bool) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_i8(self, _: i8) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_i16(self, _: i16) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_i32(self, _: i32) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_i64(self, _: i64) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_i128(self, _: i128) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_u8(self, _: u8) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_u16(self, _: u16) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_u32(self, _: u32) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_u64(self, _: u64) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_u128(self, _: u128) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_f32(self, v: f32) -> Result<(), Rejected> {
        finite(f64::from(v))
    }
    fn serialize_f64(self, v: f64) -> Result<(), Rejected> {
        finite(v)
    }
    fn serialize_char(self, _: char) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_str(self, _: &str) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_none(self) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), Rejected> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Rejected> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Result<(), Rejected> {
        value.serialize(self)
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Guard, Rejected> {
        Ok(Guard)
    }
    fn serialize_tuple(self, _: usize) -> Result<Guard, Rejected> {
        Ok(Guard)
    }
    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Guard, Rejected> {
        Ok(Guard)
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Guard, Rejected> {
        Ok(Guard)
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Guard, Rejected> {
        Ok(Guard)
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Guard, Rejected> {
        Ok(Guard)
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Guard, Rejected> {
        Ok(Guard)
    }
}

impl ser::SerializeSeq for Guard {
    type Ok = ();
    type Error = Rejected;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Rejected> {
        value.serialize(Guard)
    }
    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl ser::SerializeTuple for Guard {
    type Ok = ();
    type Error = Rejected;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Rejected> {
        value.serialize(Guard)
    }
    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for Guard {
    type Ok = ();
    type Error = Rejected;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Rejected> {
        value.serialize(Guard)
    }
    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for Guard {
    type Ok = ();
    type Error = Rejected;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Rejected> {
        value.serialize(Guard)
    }
    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl ser::SerializeMap for Guard {
    type Ok = ();
    type Error = Rejected;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Rejected> {
        key.serialize(KeyGuard)
    }
    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Rejected> {
        value.serialize(Guard)
    }
    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl ser::SerializeStruct for Guard {
    type Ok = ();
    type Error = Rejected;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Rejected> {
        value.serialize(Guard)
    }
    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for Guard {
    type Ok = ();
    type Error = Rejected;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Rejected> {
        value.serialize(Guard)
    }
    fn end(self) -> Result<(), Rejected> {
        Ok(())
    }
}

fn non_string_key(kind: &str) -> Rejected {
    Rejected(format!("map key must be a string, found {}", kind))
}

macro_rules! reject_key {
    ($($method:ident($($arg:ty),*) -> $ok:ty, $kind:expr;)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<$ok, Rejected> {
                Err(non_string_key($kind))
            }
        )*
    };
}

/// Accepts only map keys that are strings: `str`, `char`, and unit enum
/// variants (which JSON writes by name).
struct KeyGuard;

impl ser::Serializer for KeyGuard {
    type Ok = ();
    type Error = Rejected;
    type SerializeSeq = Impossible<(), Rejected>;
    type SerializeTuple = Impossible<(), Rejected>;
    type SerializeTupleStruct = Impossible<(), Rejected>;
    type SerializeTupleVariant = Impossible<(), Rejected>;
    type SerializeMap = Impossible<(), Rejected>;
    type SerializeStruct = Impossible<(), Rejected>;
    type SerializeStructVariant = Impossible<(), Rejected>;

    reject_key! {
        serialize_bool(bool) -> (), "a boolean";
        serialize_i8(i8) -> (), "an integer";
        serialize_i16(i16) -> (), "an integer";
        serialize_i32(i32) -> (), "an integer";
        serialize_i64(i64) -> (), "an integer";
        serialize_i128(i128) -> (), "an integer";
        serialize_u8(u8) -> (), "an integer";
        serialize_u16(u16) -> (), "an integer";
        serialize_u32(u32) -> (), "an integer";
        serialize_u64(u64) -> (), "an integer";
        serialize_u128(u128) -> (), "an integer";
        serialize_f32(f32) -> (), "a float";
        serialize_f64(f64) -> (), "a float";
        serialize_bytes(&[u8]) -> (), "bytes";
        serialize_none() -> (), "an option";
        serialize_unit() -> (), "a unit";
        serialize_unit_struct(&'static str) -> (), "a unit struct";
        serialize_seq(Option<usize>) -> Impossible<(), Rejected>, "a sequence";
        serialize_tuple(usize) -> Impossible<(), Rejected>, "a tuple";
        serialize_tuple_struct(&'static str, usize) -> Impossible<(), Rejected>, "a tuple";
        serialize_tuple_variant(&'static str, u32, &'static str, usize)
            -> Impossible<(), Rejected>, "a tuple variant";
        serialize_map(Option<usize>) -> Impossible<(), Rejected>, "a map";
        serialize_struct(&'static str, usize) -> Impossible<(), Rejected>, "a struct";
        serialize_struct_variant(&'static str, u32, &'static str, usize)
            -> Impossible<(), Rejected>, "a struct variant";
    }

    fn serialize_char(self, _: char) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_str(self, _: &str) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<(), Rejected> {
        Ok(())
    }
    fn serialize_some<T: ?Sized + Serialize>(self, _: &T) -> Result<(), Rejected> {
        Err(non_string_key("an option"))
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Rejected> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<(), Rejected> {
        Err(non_string_key("a newtype variant"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).expect("canonical output is ASCII")
    }

    #[test]
    fn sorts_keys_regardless_of_insertion_order() {
        let mut a = HashMap::new();
        a.insert("Tom", -1);
        a.insert("Medium", 1);
        let mut b = HashMap::new();
        b.insert("Medium", 1);
        b.insert("Tom", -1);

        assert_eq!(encode(&a).unwrap(), encode(&b).unwrap());
        assert_eq!(text(encode(&a).unwrap()), r#"{"Medium": 1, "Tom": -1}"#);
    }

    #[test]
    fn strings_pass_through_unchanged() {
        assert_eq!(encode("abc").unwrap(), b"abc");
        assert_eq!(encode(&"with \"quotes\"".to_string()).unwrap(), b"with \"quotes\"");
    }

    #[test]
    fn nested_structures_use_canonical_separators() {
        let value = json!({
            "transactions": [{"Tom": 10}],
            "block_number": 0,
            "parent_hash": null,
            "transaction_count": 1,
        });
        assert_eq!(
            text(encode(&value).unwrap()),
            r#"{"block_number": 0, "parent_hash": null, "transaction_count": 1, "transactions": [{"Tom": 10}]}"#
        );
        assert_eq!(text(encode(&json!([1, [2, 3], {}])).unwrap()), "[1, [2, 3], {}]");
    }

    #[test]
    fn empty_map_encodes_as_braces() {
        let empty: BTreeMap<String, i64> = BTreeMap::new();
        assert_eq!(encode(&empty).unwrap(), b"{}");
    }

    #[test]
    fn non_ascii_is_escaped_as_utf16() {
        let value = json!({"Zoë": 1, "é": -1, "x\u{7f}": 0, "😀": 2});
        assert_eq!(
            text(encode(&value).unwrap()),
            r#"{"Zo\u00eb": 1, "x\u007f": 0, "\u00e9": -1, "\ud83d\ude00": 2}"#
        );
    }

    #[test]
    fn control_characters_keep_short_escapes() {
        let value = json!({"a\nb": 1, "tab\there": 2});
        assert_eq!(
            text(encode(&value).unwrap()),
            r#"{"a\nb": 1, "tab\there": 2}"#
        );
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                matches!(encode(&value), Err(LedgerError::Encoding(_))),
                "{} should not encode",
                value
            );
        }
        assert!(matches!(encode(&f32::NAN), Err(LedgerError::Encoding(_))));
    }

    #[test]
    fn nested_non_finite_numbers_are_rejected() {
        let mut nested = BTreeMap::new();
        nested.insert("Tom", vec![1.0, f64::INFINITY]);
        assert!(matches!(encode(&nested), Err(LedgerError::Encoding(_))));
        assert!(matches!(encode(&Some(f64::NAN)), Err(LedgerError::Encoding(_))));
    }

    #[test]
    fn non_finite_numbers_do_not_collide_with_null() {
        assert_eq!(encode(&None::<i64>).unwrap(), b"null");
        assert!(encode(&f64::INFINITY).is_err());
        assert_eq!(encode(&1.5f64).unwrap(), b"1.5");
    }

    #[test]
    fn integer_keys_are_rejected() {
        let mut numeric: BTreeMap<i64, i64> = BTreeMap::new();
        numeric.insert(1, 5);

        match encode(&numeric) {
            Err(LedgerError::Encoding(msg)) => assert!(msg.contains("string"), "{}", msg),
            other => panic!("expected Encoding, got {:?}", other),
        }

        let mut textual = BTreeMap::new();
        textual.insert("1", 5);
        assert_eq!(encode(&textual).unwrap(), br#"{"1": 5}"#);
    }

    #[test]
    fn non_string_keys_are_rejected() {
        let mut bad: BTreeMap<Vec<u8>, i64> = BTreeMap::new();
        bad.insert(vec![1, 2], 5);

        match encode(&bad) {
            Err(LedgerError::Encoding(_)) => {}
            other => panic!("expected Encoding, got {:?}", other),
        }
    }
}
