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
 * CBOR Abstract Syntax Tree
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949), decoding to owned
 * values with support for shared values, string references and deterministic encoding.
 **************************************************************************************************/
use std::convert::TryFrom;
use std::net::IpAddr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use ipnetwork::IpNetwork;
use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive};
use regex::Regex;
use uuid::Uuid;

use crate::error::CBORError;

/// The data type for CBOR Items. All payloads are owned, so a decoded item is independent of
/// the buffer or stream it was read from.
///
/// CBOR item representations are as follows:
///
/// - Positive and negative integers are stored as a u64 with enum tags used to distinguish
///   positive (UInt) and negative (NInt) numbers. A NInt `n` represents the value `-1 - n`.
/// - Integers outside the 64 bit ranges (semantic tags 2 and 3 on the wire) are carried as a
///   [`BigInt`].
/// - The bstr and tstr types are owned byte and string buffers.
/// - Arrays are a vector of items; maps preserve insertion order of first key appearance.
/// - All float widths collapse to `Float(f64)`; the encoder re-derives the shortest width in
///   deterministic mode.
/// - `Simple` carries the unassigned simple values (0..=19 and 32..=255).
/// - `Break` is the encodable break sentinel for hand-rolled indefinite streams. The decoder
///   never yields it.
/// - The remaining variants materialize the registered semantic tags the codec understands
///   (dates, bignums, decimals, rationals, regexps, UUIDs, addresses, sets, complex numbers).
/// - `Shareable`/`SharedRef` carry the shared-value marks of tags 28/29, which is how cyclic
///   object graphs are represented as owned values.
#[derive(Debug, Clone, PartialEq)]
pub enum CBOR {
    UInt(u64),
    NInt(u64),
    BigInt(BigInt),
    Bstr(Vec<u8>),
    Tstr(String),
    Array(Vec<CBOR>),
    Map(CBORMap),
    Tag(u64, Box<CBOR>),
    Simple(u8),
    Float(f64),
    False,
    True,
    Null,
    Undefined,
    Break,
    // Materialized semantic tags
    DateTime(DateTime<FixedOffset>),
    NaiveDateTime(NaiveDateTime),
    Date(NaiveDate),
    Decimal { exponent: i64, mantissa: BigInt },
    Bigfloat { exponent: i64, mantissa: BigInt },
    Rational(BigRational),
    Regexp(CBORRegex),
    Mime(String),
    Uuid(Uuid),
    IpAddr(IpAddr),
    IpNetwork(IpNetwork),
    Set(CBORSet),
    Complex(Complex64),
    // Shared value marks (tags 28/29)
    Shareable(Box<CBOR>),
    SharedRef(u64),
}

impl CBOR {
    /// Construct a normalized integer item from a [`BigInt`]: values fitting the 64 bit CBOR
    /// integer ranges become `UInt`/`NInt`, everything else stays a bignum.
    pub fn from_bigint(v: BigInt) -> Self {
        if v.is_negative() {
            // NInt holds -1 - n, so the magnitude to test is -1 - v
            let m = -&v - 1u8;
            match m.to_u64() {
                Some(n) => CBOR::NInt(n),
                None => CBOR::BigInt(v),
            }
        } else {
            match v.to_u64() {
                Some(n) => CBOR::UInt(n),
                None => CBOR::BigInt(v),
            }
        }
    }

    /// `true` for the container variants that may hold other items.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            CBOR::Array(_) | CBOR::Map(_) | CBOR::Set(_) | CBOR::Shareable(_)
        )
    }
}

/***************************************************************************************************
 * Maps, sets and regular expressions
 **************************************************************************************************/

/// An insertion-ordered CBOR map.
///
/// Keys may be any CBOR item. Inserting a key equal to an existing one replaces the value in
/// place ("last one wins"), while the position of the first appearance is kept. Equality is
/// order-insensitive, as for a native mapping.
#[derive(Debug, Clone, Default)]
pub struct CBORMap {
    entries: Vec<(CBOR, CBOR)>,
}

impl CBORMap {
    /// Construct an empty map.
    pub fn new() -> Self {
        CBORMap {
            entries: Vec::new(),
        }
    }

    /// Number of key/value pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the map has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a pair. A key equal to an existing one replaces that entry's value in place.
    pub fn insert(&mut self, key: CBOR, value: CBOR) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Look up a value by key.
    pub fn get(&self, key: &CBOR) -> Option<&CBOR> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterate pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(CBOR, CBOR)> {
        self.entries.iter()
    }

    /// Borrow the pair list in insertion order.
    pub fn entries(&self) -> &[(CBOR, CBOR)] {
        &self.entries
    }
}

impl PartialEq for CBORMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|w| w == v))
    }
}

impl From<Vec<(CBOR, CBOR)>> for CBORMap {
    fn from(pairs: Vec<(CBOR, CBOR)>) -> Self {
        let mut map = CBORMap::new();
        for (k, v) in pairs {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for CBORMap {
    type Item = (CBOR, CBOR);
    type IntoIter = std::vec::IntoIter<(CBOR, CBOR)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A CBOR set (semantic tag 258). Membership is by item equality; insertion order is kept for
/// stable non-deterministic encoding, and equality is order-insensitive.
#[derive(Debug, Clone, Default)]
pub struct CBORSet {
    items: Vec<CBOR>,
}

impl CBORSet {
    /// Construct an empty set.
    pub fn new() -> Self {
        CBORSet { items: Vec::new() }
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if the set has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert an item unless an equal one is already present.
    pub fn insert(&mut self, item: CBOR) {
        if !self.contains(&item) {
            self.items.push(item);
        }
    }

    /// Membership test.
    pub fn contains(&self, item: &CBOR) -> bool {
        self.items.iter().any(|m| m == item)
    }

    /// Iterate members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &CBOR> {
        self.items.iter()
    }
}

impl PartialEq for CBORSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.items.iter().all(|m| other.contains(m))
    }
}

impl From<Vec<CBOR>> for CBORSet {
    fn from(items: Vec<CBOR>) -> Self {
        let mut set = CBORSet::new();
        for item in items {
            set.insert(item);
        }
        set
    }
}

/// A compiled regular expression (semantic tag 35). Equality is by pattern text, since
/// compiled automata have no useful notion of equality.
#[derive(Debug, Clone)]
pub struct CBORRegex(Regex);

impl CBORRegex {
    /// Compile a pattern.
    pub fn new(pattern: &str) -> Result<Self, CBORError> {
        Regex::new(pattern)
            .map(CBORRegex)
            .map_err(|_| CBORError::TagPayload(crate::constants::tags::REGEXP))
    }

    /// The source pattern text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Borrow the compiled expression.
    pub fn as_regex(&self) -> &Regex {
        &self.0
    }
}

impl PartialEq for CBORRegex {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl From<Regex> for CBORRegex {
    fn from(re: Regex) -> Self {
        CBORRegex(re)
    }
}

/***************************************************************************************************
 * Standard Trait Implementations: From value to CBOR. Always succeeds
 **************************************************************************************************/

/// Convert a bool into CBOR
impl From<bool> for CBOR {
    #[inline(always)]
    fn from(v: bool) -> Self {
        if v {
            Self::True
        } else {
            Self::False
        }
    }
}

/// Convert a u8 into CBOR
impl From<u8> for CBOR {
    #[inline(always)]
    fn from(v: u8) -> Self {
        Self::UInt(v as u64)
    }
}

/// Convert a u16 into CBOR
impl From<u16> for CBOR {
    #[inline(always)]
    fn from(v: u16) -> Self {
        Self::UInt(v as u64)
    }
}

/// Convert a u32 into CBOR
impl From<u32> for CBOR {
    #[inline(always)]
    fn from(v: u32) -> Self {
        Self::UInt(v as u64)
    }
}

/// Convert a u64 into CBOR
impl From<u64> for CBOR {
    #[inline(always)]
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

/// Convert an i8 into CBOR
impl From<i8> for CBOR {
    #[inline]
    fn from(v: i8) -> Self {
        Self::from(v as i64)
    }
}

/// Convert an i16 into CBOR
impl From<i16> for CBOR {
    #[inline]
    fn from(v: i16) -> Self {
        Self::from(v as i64)
    }
}

/// Convert an i32 into CBOR
impl From<i32> for CBOR {
    #[inline]
    fn from(v: i32) -> Self {
        Self::from(v as i64)
    }
}

/// Convert an i64 into CBOR
impl From<i64> for CBOR {
    #[inline]
    fn from(v: i64) -> Self {
        if v < 0 {
            // -1 - v is the bitwise complement in two's complement form, which also holds
            // for i64::MIN where the naive subtraction would overflow
            Self::NInt(!(v as u64))
        } else {
            Self::UInt(v as u64)
        }
    }
}

/// Convert an i128 into CBOR.
///
/// Values beyond the 64 bit CBOR integer ranges become bignums, which serialize with
/// semantic tags 2/3.
impl From<i128> for CBOR {
    fn from(v: i128) -> Self {
        if v >= 0 && v <= u64::MAX as i128 {
            Self::UInt(v as u64)
        } else if v < 0 && -1 - v <= u64::MAX as i128 {
            Self::NInt((-1 - v) as u64)
        } else {
            Self::BigInt(BigInt::from(v))
        }
    }
}

/// Convert an f64 into CBOR
impl From<f64> for CBOR {
    #[inline(always)]
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Convert an f32 into CBOR
impl From<f32> for CBOR {
    #[inline(always)]
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

/// Convert an &str into CBOR. The text is copied.
impl From<&str> for CBOR {
    #[inline]
    fn from(v: &str) -> Self {
        Self::Tstr(v.to_owned())
    }
}

/// Convert a String into CBOR
impl From<String> for CBOR {
    #[inline]
    fn from(v: String) -> Self {
        Self::Tstr(v)
    }
}

/// Convert an &[u8] into CBOR. The bytes are copied.
impl From<&[u8]> for CBOR {
    #[inline]
    fn from(v: &[u8]) -> Self {
        Self::Bstr(v.to_vec())
    }
}

/// Convert a Vec<u8> into CBOR
impl From<Vec<u8>> for CBOR {
    #[inline]
    fn from(v: Vec<u8>) -> Self {
        Self::Bstr(v)
    }
}

/// Convert a vector of items into a CBOR array
impl From<Vec<CBOR>> for CBOR {
    #[inline]
    fn from(v: Vec<CBOR>) -> Self {
        Self::Array(v)
    }
}

impl From<CBORMap> for CBOR {
    #[inline]
    fn from(v: CBORMap) -> Self {
        Self::Map(v)
    }
}

impl From<CBORSet> for CBOR {
    #[inline]
    fn from(v: CBORSet) -> Self {
        Self::Set(v)
    }
}

impl From<BigInt> for CBOR {
    #[inline]
    fn from(v: BigInt) -> Self {
        Self::from_bigint(v)
    }
}

impl From<DateTime<FixedOffset>> for CBOR {
    #[inline]
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::DateTime(v)
    }
}

impl From<NaiveDateTime> for CBOR {
    #[inline]
    fn from(v: NaiveDateTime) -> Self {
        Self::NaiveDateTime(v)
    }
}

impl From<NaiveDate> for CBOR {
    #[inline]
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<BigRational> for CBOR {
    #[inline]
    fn from(v: BigRational) -> Self {
        Self::Rational(v)
    }
}

impl From<Complex64> for CBOR {
    #[inline]
    fn from(v: Complex64) -> Self {
        Self::Complex(v)
    }
}

impl From<Uuid> for CBOR {
    #[inline]
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<Regex> for CBOR {
    #[inline]
    fn from(v: Regex) -> Self {
        Self::Regexp(CBORRegex::from(v))
    }
}

impl From<IpAddr> for CBOR {
    #[inline]
    fn from(v: IpAddr) -> Self {
        Self::IpAddr(v)
    }
}

impl From<IpNetwork> for CBOR {
    #[inline]
    fn from(v: IpNetwork) -> Self {
        Self::IpNetwork(v)
    }
}

/***************************************************************************************************
 * Standard Trait Implementations: Try to convert CBOR into a value. Always fallible
 **************************************************************************************************/

/// Attempt to convert CBOR into bool
impl TryFrom<CBOR> for bool {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::True => Ok(true),
            CBOR::False => Ok(false),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into u8
impl TryFrom<CBOR> for u8 {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        if let CBOR::UInt(v) = value {
            if v <= u8::MAX as u64 {
                Ok(v as u8)
            } else {
                Err(CBORError::OutOfRange)
            }
        } else {
            Err(CBORError::IncompatibleType)
        }
    }
}

/// Attempt to convert CBOR into u16
impl TryFrom<CBOR> for u16 {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        if let CBOR::UInt(v) = value {
            if v <= u16::MAX as u64 {
                Ok(v as u16)
            } else {
                Err(CBORError::OutOfRange)
            }
        } else {
            Err(CBORError::IncompatibleType)
        }
    }
}

/// Attempt to convert CBOR into u32
impl TryFrom<CBOR> for u32 {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        if let CBOR::UInt(v) = value {
            if v <= u32::MAX as u64 {
                Ok(v as u32)
            } else {
                Err(CBORError::OutOfRange)
            }
        } else {
            Err(CBORError::IncompatibleType)
        }
    }
}

/// Attempt to convert CBOR into u64
impl TryFrom<CBOR> for u64 {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        if let CBOR::UInt(v) = value {
            Ok(v)
        } else {
            Err(CBORError::IncompatibleType)
        }
    }
}

/// Attempt to convert CBOR into i8.
///
/// This will fail, for unsigned values, if n > i8::MAX.
/// This will fail, for signed values, if n < i8::MIN.
impl TryFrom<CBOR> for i8 {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        i64::try_from(value)?
            .try_into()
            .map_err(|_| CBORError::OutOfRange)
    }
}

/// Attempt to convert CBOR into i16
impl TryFrom<CBOR> for i16 {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        i64::try_from(value)?
            .try_into()
            .map_err(|_| CBORError::OutOfRange)
    }
}

/// Attempt to convert CBOR into i32
impl TryFrom<CBOR> for i32 {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        i64::try_from(value)?
            .try_into()
            .map_err(|_| CBORError::OutOfRange)
    }
}

/// Attempt to convert CBOR into i64.
///
/// For positive values it is sufficient to check the MSB of the stored u64 is not set. For
/// negative values the stored magnitude `n` represents `-1 - n`, so the same MSB test bounds
/// the result at i64::MIN.
impl TryFrom<CBOR> for i64 {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) => {
                if v & (1 << 63) == 0 {
                    Ok(v as i64)
                } else {
                    Err(CBORError::OutOfRange)
                }
            }
            CBOR::NInt(v) => {
                if v & (1 << 63) == 0 {
                    // -1 - v, computed as the bitwise complement
                    Ok(!v as i64)
                } else {
                    Err(CBORError::OutOfRange)
                }
            }
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into i128.
///
/// Succeeds for every `UInt`/`NInt` and for bignums that fit 128 bits.
impl TryFrom<CBOR> for i128 {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) => Ok(v as i128),
            CBOR::NInt(v) => Ok(-1 - (v as i128)),
            CBOR::BigInt(v) => v.to_i128().ok_or(CBORError::OutOfRange),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert any CBOR integer representation into a BigInt
impl TryFrom<CBOR> for BigInt {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::UInt(v) => Ok(BigInt::from(v)),
            CBOR::NInt(v) => Ok(-1 - BigInt::from(v)),
            CBOR::BigInt(v) => Ok(v),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert CBOR into f64
impl TryFrom<CBOR> for f64 {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::Float(v) => Ok(v),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert a CBOR item into an owned String
impl TryFrom<CBOR> for String {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::Tstr(s) => Ok(s),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert a CBOR item into an owned byte vector
impl TryFrom<CBOR> for Vec<u8> {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::Bstr(bytes) => Ok(bytes),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert a CBOR array into a vector of items
impl TryFrom<CBOR> for Vec<CBOR> {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::Array(items) => Ok(items),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

/// Attempt to convert a CBOR item into a map
impl TryFrom<CBOR> for CBORMap {
    type Error = CBORError;

    fn try_from(value: CBOR) -> Result<Self, Self::Error> {
        match value {
            CBOR::Map(map) => Ok(map),
            _ => Err(CBORError::IncompatibleType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_last_wins_keeps_first_position() {
        let mut map = CBORMap::new();
        map.insert(CBOR::from("a"), CBOR::from(1u64));
        map.insert(CBOR::from("b"), CBOR::from(2u64));
        map.insert(CBOR::from("a"), CBOR::from(3u64));
        assert_eq!(map.len(), 2);
        assert_eq!(map.entries()[0], (CBOR::from("a"), CBOR::from(3u64)));
        assert_eq!(map.get(&CBOR::from("a")), Some(&CBOR::from(3u64)));
    }

    #[test]
    fn map_equality_ignores_order() {
        let m1 = CBORMap::from(vec![
            (CBOR::from(1u64), CBOR::True),
            (CBOR::from(2u64), CBOR::False),
        ]);
        let m2 = CBORMap::from(vec![
            (CBOR::from(2u64), CBOR::False),
            (CBOR::from(1u64), CBOR::True),
        ]);
        assert_eq!(m1, m2);
    }

    #[test]
    fn negative_integer_conversions() {
        assert_eq!(CBOR::from(-1i64), CBOR::NInt(0));
        assert_eq!(CBOR::from(i64::MIN), CBOR::NInt(i64::MAX as u64));
        assert_eq!(i64::try_from(CBOR::NInt(0)).unwrap(), -1);
        assert!(i64::try_from(CBOR::NInt(u64::MAX)).is_err());
        assert_eq!(
            i128::try_from(CBOR::NInt(u64::MAX)).unwrap(),
            -18446744073709551616
        );
    }

    #[test]
    fn bigint_normalization() {
        assert_eq!(CBOR::from(BigInt::from(7)), CBOR::UInt(7));
        assert_eq!(CBOR::from(BigInt::from(-8)), CBOR::NInt(7));
        let big: BigInt = BigInt::from(u64::MAX) + 1;
        assert_eq!(CBOR::from(big.clone()), CBOR::BigInt(big));
    }
}
