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
 * fullcbor CBOR constants
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949), decoding to owned
 * values with support for shared values, string references and deterministic encoding.
 **************************************************************************************************/
/// Additional Information bitmask
pub const AI_MASK: u8 = 0b000_11111;

/// Major Type 0 (Positive integers)
pub const MT_UINT: u8 = 0b000_00000;
/// Major Type 1 (Negative integers)
pub const MT_NINT: u8 = 0b001_00000;
/// Major Type 2 (Byte Strings)
pub const MT_BSTR: u8 = 0b010_00000;
/// Major Type 3 (Text Strings)
pub const MT_TSTR: u8 = 0b011_00000;
/// Major Type 4 (Array)
pub const MT_ARRAY: u8 = 0b100_00000;
/// Major Type 5 (Map)
pub const MT_MAP: u8 = 0b101_00000;
/// Major Type 6 (Tag)
pub const MT_TAG: u8 = 0b110_00000;
/// Major Type 7 (Floats, simple types etc.)
pub const MT_SIMPLE: u8 = 0b111_00000;
/// Major Type 7 is shared between simple values and floats
pub const MT_FLOAT: u8 = 0b111_00000;

/// Maximum value of a "simple" payload mapped on AI bits
pub const PAYLOAD_AI_BITS: u8 = 23;
/// Indicates one byte of length or value information follows the MT/AI byte
pub const PAYLOAD_ONE_BYTE: u8 = 24;
/// Indicates two bytes of length or value information follow the MT/AI byte
pub const PAYLOAD_TWO_BYTES: u8 = 25;
/// Indicates four bytes of length or value information follow the MT/AI byte
pub const PAYLOAD_FOUR_BYTES: u8 = 26;
/// Indicates eight bytes of length or value information follow the MT/AI byte
pub const PAYLOAD_EIGHT_BYTES: u8 = 27;
/// Indicates an indefinite length item, terminated by [`BREAK`]
pub const PAYLOAD_INDEFINITE: u8 = 31;

/// The break marker terminating indefinite length items
pub const BREAK: u8 = 0xff;

/// Default size of the decoder readahead buffer, in bytes
pub const DEFAULT_READ_SIZE: usize = 4096;
/// Default maximum decoder recursion depth
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Registered semantic tag numbers understood by the codec.
pub mod tags {
    /// Standard date/time string (RFC 3339)
    pub const DATE_TIME_STRING: u64 = 0;
    /// Epoch-based date/time (seconds from 1970-01-01T00:00Z)
    pub const EPOCH_DATE_TIME: u64 = 1;
    /// Unsigned bignum (big-endian magnitude byte string)
    pub const POS_BIGNUM: u64 = 2;
    /// Negative bignum (value = -1 - magnitude)
    pub const NEG_BIGNUM: u64 = 3;
    /// Decimal fraction `[exponent, mantissa]`, radix 10
    pub const DECIMAL_FRACTION: u64 = 4;
    /// Bigfloat `[exponent, mantissa]`, radix 2
    pub const BIGFLOAT: u64 = 5;
    /// String reference (index into the enclosing namespace)
    pub const STRING_REF: u64 = 25;
    /// Mark the next item as shareable
    pub const SHAREABLE: u64 = 28;
    /// Reference to a previously marked shareable
    pub const SHARED_REF: u64 = 29;
    /// Rational number `[numerator, denominator]`
    pub const RATIONAL: u64 = 30;
    /// Regular expression (text)
    pub const REGEXP: u64 = 35;
    /// MIME message (text)
    pub const MIME_MESSAGE: u64 = 36;
    /// Binary UUID (16 bytes)
    pub const UUID: u64 = 37;
    /// IPv4 address or network (RFC 9164)
    pub const IPV4: u64 = 52;
    /// IPv6 address or network (RFC 9164)
    pub const IPV6: u64 = 54;
    /// Epoch-based date (days from 1970-01-01)
    pub const EPOCH_DATE: u64 = 100;
    /// String reference namespace
    pub const STRING_REF_NAMESPACE: u64 = 256;
    /// Mathematical set
    pub const SET: u64 = 258;
    /// Deprecated network address form (4/16 byte string)
    pub const NETWORK_ADDRESS: u64 = 260;
    /// Deprecated network prefix form (single-entry map)
    pub const NETWORK_PREFIX: u64 = 261;
    /// Date string (RFC 8943, `yyyy-mm-dd`)
    pub const DATE_STRING: u64 = 1004;
    /// Complex number `[real, imaginary]`
    pub const COMPLEX: u64 = 43000;
    /// Self-described CBOR; semantically transparent
    pub const SELF_DESCRIBE: u64 = 55799;
}

/// Number of days between 0001-01-01 (Common Era day 1) and the 1970-01-01 epoch.
pub(crate) const UNIX_EPOCH_DAY_FROM_CE: i64 = 719_163;

/// String reference assignment rule from the stringref specification: a string of byte
/// length `len` is only worth remembering if a later tag-25 reference to the index it would
/// receive is strictly shorter than re-emitting the string itself. Strings shorter than 3
/// bytes never qualify.
#[inline]
pub(crate) fn stringref_assignable(next_index: usize, len: usize) -> bool {
    match next_index {
        0..=23 => len >= 3,
        24..=255 => len >= 4,
        256..=65535 => len >= 5,
        65536..=4294967295 => len >= 7,
        _ => len >= 11,
    }
}

#[cfg(test)]
mod tests {
    use super::stringref_assignable;

    #[test]
    fn stringref_thresholds() {
        assert!(!stringref_assignable(0, 2));
        assert!(stringref_assignable(0, 3));
        assert!(stringref_assignable(23, 3));
        assert!(!stringref_assignable(24, 3));
        assert!(stringref_assignable(24, 4));
        assert!(!stringref_assignable(256, 4));
        assert!(stringref_assignable(256, 5));
        assert!(!stringref_assignable(65536, 5));
        assert!(stringref_assignable(65536, 7));
    }
}
