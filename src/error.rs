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
 * fullcbor CBOR Error API
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949), decoding to owned
 * values with support for shared values, string references and deterministic encoding.
 **************************************************************************************************/
use std::io;
use std::result;

use thiserror::Error;

/// An alias for Result<T, CBORError> used throughout this crate.
pub type Result<T> = result::Result<T, CBORError>;

/// `CBORError` provides information about errors encoding and decoding CBOR items.
///
/// Variants fall into three families: decode errors (malformed or truncated input),
/// encode errors (values that cannot be represented under the current options), and
/// configuration errors (rejected before any bytes move). The [`CBORError::is_decode_error`]
/// and [`CBORError::is_encode_error`] predicates classify a value.
#[derive(Error, Debug)]
pub enum CBORError {
    /// Input ended before a complete item was read.
    #[error("Premature end of input")]
    Eof,
    /// The underlying byte source or sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Encoding is illegal or unsupported.
    #[error("Encoding is illegal or unsupported")]
    MalformedEncoding,
    /// The item was not expecting this Additional Information encoding. Probably malformed CBOR.
    #[error("The item was not expecting this AI encoding. Probably malformed")]
    AIError,
    /// A break marker appeared outside of any indefinite length item.
    #[error("Break marker outside an indefinite length item")]
    StrayBreak,
    /// A tstr input contains an invalid UTF8 sequence.
    #[error("A tstr contains an invalid UTF8 sequence")]
    UTF8Error,
    /// A number or length conversion has overflowed or underflowed.
    #[error("Overflow or underflow in number conversion")]
    OutOfRange,
    /// Nesting depth exceeded the configured limit.
    #[error("Nesting depth exceeded the limit of {0}")]
    DepthExceeded(usize),
    /// The payload of a semantic tag does not have the required shape.
    #[error("Malformed payload for tag {0}")]
    TagPayload(u64),
    /// A shared reference index does not name an allocated shareable slot.
    #[error("Shared reference {0} out of range")]
    SharedRefOutOfRange(u64),
    /// A string reference index does not name a registered string.
    #[error("String reference {0} out of range")]
    StringRefOutOfRange(u64),
    /// A string reference was used with no enclosing namespace.
    #[error("String reference outside a string reference namespace")]
    NoStringRefNamespace,
    /// The provided value is not a legal Date/Time.
    #[error("Bad Date/Time value")]
    BadDateTime,
    /// Attempt to convert an item to an incompatible type.
    #[error("Attempt to convert an item of incompatible type")]
    IncompatibleType,

    /// No encoder is registered for the supplied native type.
    #[error("No encoder matches type {0}")]
    UnsupportedType(&'static str),
    /// The value cannot be represented under the current encoder options.
    #[error("Value cannot be encoded: {0}")]
    ValueError(&'static str),
    /// A cyclic or shared structure was found while value sharing is disabled.
    #[error("Cyclic structure: enable value sharing to encode shared references")]
    CyclicStructure,
    /// Two keys of a canonical map encode to identical bytes.
    #[error("Duplicate map key in canonical encoding")]
    DuplicateMapKey,
    /// A datetime without offset was encoded with no default timezone configured.
    #[error("Naive datetime encoded without a default timezone")]
    NaiveDateTime,

    /// The requested option combination is invalid.
    #[error("Invalid options: {0}")]
    InvalidOptions(&'static str),
}

impl CBORError {
    /// `true` if the error arose from decoding malformed, truncated or otherwise invalid input.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            CBORError::Eof
                | CBORError::Io(_)
                | CBORError::MalformedEncoding
                | CBORError::AIError
                | CBORError::StrayBreak
                | CBORError::UTF8Error
                | CBORError::OutOfRange
                | CBORError::DepthExceeded(_)
                | CBORError::TagPayload(_)
                | CBORError::SharedRefOutOfRange(_)
                | CBORError::StringRefOutOfRange(_)
                | CBORError::NoStringRefNamespace
                | CBORError::BadDateTime
        )
    }

    /// `true` if the error arose from a value that cannot be encoded.
    pub fn is_encode_error(&self) -> bool {
        matches!(
            self,
            CBORError::UnsupportedType(_)
                | CBORError::ValueError(_)
                | CBORError::CyclicStructure
                | CBORError::DuplicateMapKey
                | CBORError::NaiveDateTime
        )
    }

    /// `true` if the error indicates the byte source ran out of data.
    pub fn is_eof(&self) -> bool {
        match self {
            CBORError::Eof => true,
            CBORError::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
