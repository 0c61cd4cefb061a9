/***************************************************************************************************
 * Copyright (c) 2020-2023 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all copies or
 * substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * CBOR Encoder
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949), decoding to owned
 * values with support for shared values, string references and deterministic encoding.
 **************************************************************************************************/
//! # CBOR encoding
//!
//! A [`CBOREncoder`] emits CBOR onto any [`std::io::Write`] sink. Values are encoded either
//! from the owned [`CBOR`] model via [`CBOREncoder::encode`], or from arbitrary native types
//! via [`CBOREncoder::encode_any`], which consults a user registry keyed by [`TypeId`]
//! (exact type match only), then the built-in encodings, then the `default` fallback.
//!
//! ## Example
//!
//! ```
//! use fullcbor::encoder::to_vec;
//! use fullcbor::types::CBOR;
//!
//! let bytes = to_vec(&CBOR::Array(vec![CBOR::UInt(1), CBOR::UInt(2), CBOR::UInt(3)])).unwrap();
//! assert_eq!(bytes, vec![0x83, 0x01, 0x02, 0x03]);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::io::Write;
use std::net::IpAddr;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use half::f16;
use ipnetwork::IpNetwork;
use log::debug;
use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use regex::Regex;
use uuid::Uuid;

use crate::ast::{CBOR, CBORMap, CBORSet};
use crate::constants::*;
use crate::error::{CBORError, Result};
use crate::tag;

/// Encoder configuration. All options default to off; [`EncodeOptions::validate`] rejects
/// meaningless combinations before any bytes move.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Encode timezone-aware datetimes as tag 1 numeric epoch instead of tag 0 text.
    pub datetime_as_timestamp: bool,
    /// Default zone applied to datetimes without offset; absent, such values are an error.
    pub timezone: Option<FixedOffset>,
    /// Enable shared value emission (tags 28/29).
    pub value_sharing: bool,
    /// Enforce RFC 8949 deterministic encoding.
    pub canonical: bool,
    /// Promote dates to midnight datetimes before encoding.
    pub date_as_datetime: bool,
    /// Enable string reference compression (tags 25/256).
    pub string_referencing: bool,
    /// Emit indefinite length containers for streaming consumers.
    pub indefinite_containers: bool,
}

impl EncodeOptions {
    /// Construct the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode datetimes as tag 1 numeric epoch values.
    pub fn datetime_as_timestamp(mut self, on: bool) -> Self {
        self.datetime_as_timestamp = on;
        self
    }

    /// Default timezone for datetimes without offset.
    pub fn timezone(mut self, tz: FixedOffset) -> Self {
        self.timezone = Some(tz);
        self
    }

    /// Enable shared value emission (tags 28/29).
    pub fn value_sharing(mut self, on: bool) -> Self {
        self.value_sharing = on;
        self
    }

    /// Enforce RFC 8949 deterministic encoding.
    pub fn canonical(mut self, on: bool) -> Self {
        self.canonical = on;
        self
    }

    /// Promote dates to midnight datetimes before encoding.
    pub fn date_as_datetime(mut self, on: bool) -> Self {
        self.date_as_datetime = on;
        self
    }

    /// Enable string reference compression (tags 25/256).
    pub fn string_referencing(mut self, on: bool) -> Self {
        self.string_referencing = on;
        self
    }

    /// Emit indefinite length containers.
    pub fn indefinite_containers(mut self, on: bool) -> Self {
        self.indefinite_containers = on;
        self
    }

    /// Reject option combinations with contradictory meanings.
    pub fn validate(&self) -> Result<()> {
        if self.canonical && self.indefinite_containers {
            return Err(CBORError::InvalidOptions(
                "canonical encoding is always definite length",
            ));
        }
        Ok(())
    }
}

/// One string reference namespace: content-keyed index tables for text and byte strings.
/// Indices are assigned from a shared counter so they match the single ordered table the
/// decoder maintains.
#[derive(Default)]
struct Namespace {
    text: HashMap<String, u64>,
    bytes: HashMap<Vec<u8>, u64>,
    next: usize,
}

type AnyEncoder<W> = Rc<dyn Fn(&mut CBOREncoder<W>, &dyn Any) -> Result<()>>;

/// An encoder over any byte sink.
///
/// Each call to [`CBOREncoder::encode`] / [`CBOREncoder::encode_any`] emits one top-level
/// item; shareable and string reference state is reset at the start of each call.
pub struct CBOREncoder<W: Write> {
    sink: W,
    options: EncodeOptions,
    shareable_count: u64,
    shared_ids: HashMap<usize, u64>,
    stringrefs: Vec<Namespace>,
    registry: HashMap<TypeId, AnyEncoder<W>>,
    default_hook: Option<AnyEncoder<W>>,
}

/// Encode a single item to a vector with default options.
pub fn to_vec(value: &CBOR) -> Result<Vec<u8>> {
    to_vec_with(value, EncodeOptions::default())
}

/// Encode a single item to a vector with the supplied options.
pub fn to_vec_with(value: &CBOR, options: EncodeOptions) -> Result<Vec<u8>> {
    let mut enc = CBOREncoder::new(Vec::new(), options)?;
    enc.encode(value)?;
    Ok(enc.into_inner())
}

impl<W: Write> CBOREncoder<W> {
    /// Construct an encoder over `sink`, rejecting invalid option combinations.
    pub fn new(sink: W, options: EncodeOptions) -> Result<Self> {
        options.validate()?;
        Ok(CBOREncoder {
            sink,
            options,
            shareable_count: 0,
            shared_ids: HashMap::new(),
            stringrefs: Vec::new(),
            registry: HashMap::new(),
            default_hook: None,
        })
    }

    /// Consume the encoder, returning the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Borrow the active options.
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encode one top-level item from the owned value model.
    pub fn encode(&mut self, value: &CBOR) -> Result<()> {
        self.reset();
        self.with_root_namespace(|enc| enc.insert(value))
    }

    /// Encode one top-level item of any native type, via the dispatch registry.
    pub fn encode_any(&mut self, value: &dyn Any) -> Result<()> {
        self.reset();
        self.with_root_namespace(|enc| enc.insert_any(value))
    }

    /// Register an encoder for native type `T`, consulted before the built-in encodings.
    /// Lookup is by exact type only; there is no fallback along type relationships.
    pub fn register<T: Any>(&mut self, f: impl Fn(&mut Self, &T) -> Result<()> + 'static) {
        self.registry.insert(
            TypeId::of::<T>(),
            Rc::new(move |enc, any| match any.downcast_ref::<T>() {
                Some(v) => f(enc, v),
                None => Err(CBORError::UnsupportedType("type registry mismatch")),
            }),
        );
    }

    /// Install the fallback consulted when no encoder matches. The callback is expected to
    /// re-enter the encoder to emit exactly one item.
    pub fn set_default(&mut self, f: impl Fn(&mut Self, &dyn Any) -> Result<()> + 'static) {
        self.default_hook = Some(Rc::new(f));
    }

    fn reset(&mut self) {
        self.shareable_count = 0;
        self.shared_ids.clear();
        self.stringrefs.clear();
    }

    /// String referencing implies an outer namespace tag wrapping the root item.
    fn with_root_namespace(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        if self.options.string_referencing {
            self.write_head(MT_TAG, tags::STRING_REF_NAMESPACE)?;
            self.stringrefs.push(Namespace::default());
            let result = f(self);
            self.stringrefs.pop();
            result
        } else {
            f(self)
        }
    }

    /***********************************************************************************************
     * Dynamic dispatch
     **********************************************************************************************/

    /// Insert a single item of any native type at the current position: the user registry is
    /// consulted first, then the built-in encodings, then the `default` fallback. Custom
    /// encoders re-enter the engine through this method.
    pub fn insert_any(&mut self, value: &dyn Any) -> Result<()> {
        if let Some(f) = self.registry.get(&value.type_id()).cloned() {
            return f(self, value);
        }
        if let Some(item) = builtin_to_cbor(value) {
            return self.insert(&item);
        }
        if let Some(f) = self.default_hook.clone() {
            debug!("no encoder matches; invoking default fallback");
            return f(self, value);
        }
        Err(CBORError::UnsupportedType("no encoder registered"))
    }

    /***********************************************************************************************
     * Item encoding
     **********************************************************************************************/

    /// Insert a single item from the owned value model at the current position, without
    /// resetting per-operation state. Custom encoders and hooks re-enter the engine here.
    pub fn insert(&mut self, value: &CBOR) -> Result<()> {
        match value {
            CBOR::UInt(n) => self.write_head(MT_UINT, *n),
            CBOR::NInt(n) => self.write_head(MT_NINT, *n),
            CBOR::BigInt(v) => tag::encode_bigint(self, v),
            CBOR::Bstr(b) => self.encode_bytes(b),
            CBOR::Tstr(s) => self.encode_text(s),
            CBOR::Array(items) => self.encode_array(items),
            CBOR::Map(map) => self.encode_map(map),
            CBOR::Tag(t, child) => {
                self.write_head(MT_TAG, *t)?;
                self.insert(child)
            }
            CBOR::Simple(v) => match v {
                0..=19 => self.write_byte(MT_SIMPLE | v),
                // 20..=31 are reserved for the literals, floats and break
                20..=31 => Err(CBORError::MalformedEncoding),
                _ => self.write_all(&[MT_SIMPLE | PAYLOAD_ONE_BYTE, *v]),
            },
            CBOR::Float(f) => self.encode_float(*f),
            CBOR::False => self.write_byte(MT_SIMPLE | 20),
            CBOR::True => self.write_byte(MT_SIMPLE | 21),
            CBOR::Null => self.write_byte(MT_SIMPLE | 22),
            CBOR::Undefined => self.write_byte(MT_SIMPLE | 23),
            CBOR::Break => self.write_byte(BREAK),
            CBOR::DateTime(dt) => tag::encode_datetime(self, dt),
            CBOR::NaiveDateTime(ndt) => tag::encode_naive_datetime(self, ndt),
            CBOR::Date(d) => tag::encode_date(self, d),
            CBOR::Decimal { exponent, mantissa } => {
                tag::encode_exponent_pair(self, tags::DECIMAL_FRACTION, *exponent, mantissa)
            }
            CBOR::Bigfloat { exponent, mantissa } => {
                tag::encode_exponent_pair(self, tags::BIGFLOAT, *exponent, mantissa)
            }
            CBOR::Rational(r) => tag::encode_rational(self, r),
            CBOR::Regexp(re) => {
                self.write_head(MT_TAG, tags::REGEXP)?;
                self.encode_text(re.as_str())
            }
            CBOR::Mime(s) => {
                self.write_head(MT_TAG, tags::MIME_MESSAGE)?;
                self.encode_text(s)
            }
            CBOR::Uuid(u) => tag::encode_uuid(self, u),
            CBOR::IpAddr(a) => tag::encode_ipaddr(self, a),
            CBOR::IpNetwork(n) => tag::encode_ipnetwork(self, n),
            CBOR::Set(set) => self.encode_set(set),
            CBOR::Complex(z) => tag::encode_complex(self, z),
            CBOR::Shareable(inner) => self.encode_shareable(inner),
            CBOR::SharedRef(k) => self.encode_shared_ref(*k),
        }
    }

    /***********************************************************************************************
     * Strings
     **********************************************************************************************/

    fn encode_bytes(&mut self, b: &[u8]) -> Result<()> {
        if let Some(index) = self.stringref_for_bytes(b) {
            return self.write_string_ref(index);
        }
        if self.options.indefinite_containers {
            self.write_byte(MT_BSTR | PAYLOAD_INDEFINITE)?;
            self.write_head(MT_BSTR, b.len() as u64)?;
            self.write_all(b)?;
            self.write_byte(BREAK)
        } else {
            self.write_head(MT_BSTR, b.len() as u64)?;
            self.write_all(b)
        }
    }

    fn encode_text(&mut self, s: &str) -> Result<()> {
        if let Some(index) = self.stringref_for_text(s) {
            return self.write_string_ref(index);
        }
        if self.options.indefinite_containers {
            self.write_byte(MT_TSTR | PAYLOAD_INDEFINITE)?;
            self.write_head(MT_TSTR, s.len() as u64)?;
            self.write_all(s.as_bytes())?;
            self.write_byte(BREAK)
        } else {
            self.write_head(MT_TSTR, s.len() as u64)?;
            self.write_all(s.as_bytes())
        }
    }

    fn write_string_ref(&mut self, index: u64) -> Result<()> {
        self.write_head(MT_TAG, tags::STRING_REF)?;
        self.write_head(MT_UINT, index)
    }

    /// Resolve or assign a reference for a text string. Returns the index to reference, or
    /// `None` when the string itself must be emitted (registering it when worthwhile, so the
    /// decoder's table stays in step).
    fn stringref_for_text(&mut self, s: &str) -> Option<u64> {
        let ns = self.stringrefs.last_mut()?;
        if let Some(&index) = ns.text.get(s) {
            return Some(index);
        }
        if stringref_assignable(ns.next, s.len()) {
            ns.text.insert(s.to_owned(), ns.next as u64);
            ns.next += 1;
        }
        None
    }

    fn stringref_for_bytes(&mut self, b: &[u8]) -> Option<u64> {
        let ns = self.stringrefs.last_mut()?;
        if let Some(&index) = ns.bytes.get(b) {
            return Some(index);
        }
        if stringref_assignable(ns.next, b.len()) {
            ns.bytes.insert(b.to_vec(), ns.next as u64);
            ns.next += 1;
        }
        None
    }

    /***********************************************************************************************
     * Containers
     **********************************************************************************************/

    fn encode_array(&mut self, items: &[CBOR]) -> Result<()> {
        if self.options.indefinite_containers {
            self.write_byte(MT_ARRAY | PAYLOAD_INDEFINITE)?;
            for item in items {
                self.insert(item)?;
            }
            self.write_byte(BREAK)
        } else {
            self.write_head(MT_ARRAY, items.len() as u64)?;
            for item in items {
                self.insert(item)?;
            }
            Ok(())
        }
    }

    fn encode_map(&mut self, map: &CBORMap) -> Result<()> {
        if self.options.canonical {
            return self.encode_map_canonical(map);
        }
        if self.options.indefinite_containers {
            self.write_byte(MT_MAP | PAYLOAD_INDEFINITE)?;
            for (k, v) in map.iter() {
                self.insert(k)?;
                self.insert(v)?;
            }
            self.write_byte(BREAK)
        } else {
            self.write_head(MT_MAP, map.len() as u64)?;
            for (k, v) in map.iter() {
                self.insert(k)?;
                self.insert(v)?;
            }
            Ok(())
        }
    }

    /// Deterministic maps sort by the byte-lexicographic order of each key's canonical
    /// encoding. Sorting uses plain scratch encodings so it is independent of the string
    /// reference and sharing state; emission then runs through the real encoder in order.
    fn encode_map_canonical(&mut self, map: &CBORMap) -> Result<()> {
        let mut pairs: Vec<(Vec<u8>, &(CBOR, CBOR))> = Vec::with_capacity(map.len());
        for entry in map.iter() {
            pairs.push((self.plain_canonical_bytes(&entry.0)?, entry));
        }
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        for pair in pairs.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(CBORError::DuplicateMapKey);
            }
        }
        self.write_head(MT_MAP, pairs.len() as u64)?;
        for (_, (k, v)) in pairs {
            self.insert(k)?;
            self.insert(v)?;
        }
        Ok(())
    }

    /// Sets (tag 258) sort their members like map keys in deterministic mode, so set
    /// encodings are bit-stable regardless of construction order.
    fn encode_set(&mut self, set: &CBORSet) -> Result<()> {
        self.write_head(MT_TAG, tags::SET)?;
        if self.options.canonical {
            let mut members: Vec<(Vec<u8>, &CBOR)> = Vec::with_capacity(set.len());
            for item in set.iter() {
                members.push((self.plain_canonical_bytes(item)?, item));
            }
            members.sort_by(|a, b| a.0.cmp(&b.0));
            self.write_head(MT_ARRAY, members.len() as u64)?;
            for (_, item) in members {
                self.insert(item)?;
            }
            Ok(())
        } else if self.options.indefinite_containers {
            self.write_byte(MT_ARRAY | PAYLOAD_INDEFINITE)?;
            for item in set.iter() {
                self.insert(item)?;
            }
            self.write_byte(BREAK)
        } else {
            self.write_head(MT_ARRAY, set.len() as u64)?;
            for item in set.iter() {
                self.insert(item)?;
            }
            Ok(())
        }
    }

    /// Canonical bytes of an item with referencing and sharing stripped, used as a sort key.
    fn plain_canonical_bytes(&self, item: &CBOR) -> Result<Vec<u8>> {
        let mut options = self.options.clone();
        options.canonical = true;
        options.string_referencing = false;
        options.value_sharing = false;
        options.indefinite_containers = false;
        let mut scratch = CBOREncoder::new(Vec::new(), options)?;
        scratch.insert(item)?;
        Ok(scratch.into_inner())
    }

    /***********************************************************************************************
     * Shared values
     **********************************************************************************************/

    /// A shareable mark assigns its index before the child encodes, so references inside the
    /// child subtree resolve to it.
    fn encode_shareable(&mut self, inner: &CBOR) -> Result<()> {
        if self.options.value_sharing {
            self.shareable_count += 1;
            self.write_head(MT_TAG, tags::SHAREABLE)?;
        }
        self.insert(inner)
    }

    fn encode_shared_ref(&mut self, index: u64) -> Result<()> {
        if !self.options.value_sharing {
            return Err(CBORError::CyclicStructure);
        }
        if index >= self.shareable_count {
            return Err(CBORError::ValueError(
                "shared reference to an unstarted shareable",
            ));
        }
        self.write_head(MT_TAG, tags::SHARED_REF)?;
        self.write_head(MT_UINT, index)
    }

    /***********************************************************************************************
     * Primitive emission
     **********************************************************************************************/

    /// Emit a float. In deterministic mode the value takes the narrowest width that
    /// round-trips; NaN collapses to the canonical half quiet NaN. Otherwise floats emit as
    /// doubles.
    fn encode_float(&mut self, f: f64) -> Result<()> {
        if self.options.canonical {
            if f.is_nan() {
                return self.write_all(&[MT_FLOAT | PAYLOAD_TWO_BYTES, 0x7e, 0x00]);
            }
            let h = f16::from_f64(f);
            if f64::from(h) == f {
                let b = h.to_be_bytes();
                self.write_all(&[MT_FLOAT | PAYLOAD_TWO_BYTES, b[0], b[1]])
            } else if (f as f32) as f64 == f {
                self.write_byte(MT_FLOAT | PAYLOAD_FOUR_BYTES)?;
                self.write_all(&(f as f32).to_be_bytes())
            } else {
                self.write_byte(MT_FLOAT | PAYLOAD_EIGHT_BYTES)?;
                self.write_all(&f.to_be_bytes())
            }
        } else {
            self.write_byte(MT_FLOAT | PAYLOAD_EIGHT_BYTES)?;
            self.write_all(&f.to_be_bytes())
        }
    }

    /// Emit a head: major type plus argument in preferred (shortest) serialization. This is
    /// the low level seam for custom encoders that emit their own container or tag heads
    /// before re-entering via [`CBOREncoder::insert`] / [`CBOREncoder::insert_any`].
    pub fn write_head(&mut self, mt: u8, v: u64) -> Result<()> {
        let vs = v.to_be_bytes();
        if v < PAYLOAD_ONE_BYTE as u64 {
            self.write_byte(mt | v as u8)
        } else if v <= u8::MAX as u64 {
            self.write_all(&[mt | PAYLOAD_ONE_BYTE, vs[7]])
        } else if v <= u16::MAX as u64 {
            self.write_all(&[mt | PAYLOAD_TWO_BYTES, vs[6], vs[7]])
        } else if v <= u32::MAX as u64 {
            self.write_all(&[mt | PAYLOAD_FOUR_BYTES, vs[4], vs[5], vs[6], vs[7]])
        } else {
            self.write_byte(mt | PAYLOAD_EIGHT_BYTES)?;
            self.write_all(&vs)
        }
    }

    #[inline]
    fn write_byte(&mut self, b: u8) -> Result<()> {
        self.write_all(&[b])
    }

    #[inline]
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink.write_all(bytes)?;
        Ok(())
    }
}

/// Wrap an encoder callback with shareable bookkeeping: the first emission of an object
/// (by data pointer identity, so `Rc`-shared values qualify) writes tag 28 and the payload,
/// later emissions write tag 29 and the assigned index. With sharing disabled the callback
/// runs unwrapped.
pub fn make_shareable<W: Write, T: Any>(
    f: impl Fn(&mut CBOREncoder<W>, &T) -> Result<()> + 'static,
) -> impl Fn(&mut CBOREncoder<W>, &T) -> Result<()> + 'static {
    move |enc, value| {
        if !enc.options.value_sharing {
            return f(enc, value);
        }
        let identity = value as *const T as usize;
        if let Some(&index) = enc.shared_ids.get(&identity) {
            enc.write_head(MT_TAG, tags::SHARED_REF)?;
            return enc.write_head(MT_UINT, index);
        }
        let index = enc.shareable_count;
        enc.shareable_count += 1;
        enc.shared_ids.insert(identity, index);
        enc.write_head(MT_TAG, tags::SHAREABLE)?;
        f(enc, value)
    }
}

/// Built-in native type encodings: exact-type downcasts onto the value model. Subtypes and
/// wrappers do not inherit an encoding; they go through the registry or `default`.
fn builtin_to_cbor(value: &dyn Any) -> Option<CBOR> {
    if let Some(v) = value.downcast_ref::<CBOR>() {
        Some(v.clone())
    } else if let Some(v) = value.downcast_ref::<bool>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<u8>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<u16>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<u32>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<u64>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<i8>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<i16>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<i32>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<i64>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<i128>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<f32>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<f64>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<&str>() {
        Some(CBOR::from(*v))
    } else if let Some(v) = value.downcast_ref::<String>() {
        Some(CBOR::from(v.as_str()))
    } else if let Some(v) = value.downcast_ref::<Vec<u8>>() {
        Some(CBOR::Bstr(v.clone()))
    } else if let Some(v) = value.downcast_ref::<Vec<CBOR>>() {
        Some(CBOR::Array(v.clone()))
    } else if let Some(v) = value.downcast_ref::<CBORMap>() {
        Some(CBOR::Map(v.clone()))
    } else if let Some(v) = value.downcast_ref::<CBORSet>() {
        Some(CBOR::Set(v.clone()))
    } else if let Some(v) = value.downcast_ref::<BigInt>() {
        Some(CBOR::from_bigint(v.clone()))
    } else if let Some(v) = value.downcast_ref::<BigRational>() {
        Some(CBOR::Rational(v.clone()))
    } else if let Some(v) = value.downcast_ref::<Complex64>() {
        Some(CBOR::Complex(*v))
    } else if let Some(v) = value.downcast_ref::<DateTime<FixedOffset>>() {
        Some(CBOR::DateTime(*v))
    } else if let Some(v) = value.downcast_ref::<NaiveDateTime>() {
        Some(CBOR::NaiveDateTime(*v))
    } else if let Some(v) = value.downcast_ref::<NaiveDate>() {
        Some(CBOR::Date(*v))
    } else if let Some(v) = value.downcast_ref::<Uuid>() {
        Some(CBOR::Uuid(*v))
    } else if let Some(v) = value.downcast_ref::<Regex>() {
        Some(CBOR::Regexp(v.clone().into()))
    } else if let Some(v) = value.downcast_ref::<IpAddr>() {
        Some(CBOR::IpAddr(*v))
    } else {
        value
            .downcast_ref::<IpNetwork>()
            .map(|v| CBOR::IpNetwork(*v))
    }
}
