/***************************************************************************************************
 * Copyright (c) 2020-2023 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice (including the next
 * paragraph) shall be included in all copies or substantial portions of the
 * Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * fullcbor module definition
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949), decoding to owned
 * values with support for shared values, string references and deterministic encoding.
 **************************************************************************************************/
#![warn(missing_docs)]

//! # FULLCBOR
//!
//! The `fullcbor` crate provides a CBOR implementation aimed at hosted targets where the
//! programmer wants complete decoded values rather than low-level control over buffers. It is
//! the std sibling of the minicbor family: input is pulled from any [`std::io::Read`], output
//! pushed to any [`std::io::Write`], and every item materializes as an owned
//! [`types::CBOR`] value.
//!
//! ## Features
//!
//! - All CBOR primitive types, definite and indefinite length, with integers beyond 64 bits
//!   carried as bignums (tags 2/3).
//! - The commonly registered semantic tags: date/time (0/1/100/1004), decimal fractions and
//!   bigfloats (4/5), rationals (30), regular expressions (35), MIME (36), UUID (37),
//!   IP addresses and networks (52/54, plus the deprecated 260/261 on decode), sets (258),
//!   complex numbers (43000) and self-described CBOR (55799).
//! - Shared values (tags 28/29), so cyclic and aliased object graphs round-trip.
//! - String references (tags 25/256), compressing repeated strings inside a namespace.
//! - Deterministic (canonical) encoding per RFC 8949 §4.2: shortest heads, narrowest float
//!   widths, map keys sorted by their canonical encodings.
//! - Extension hooks: a `TypeId`-keyed encoder registry with a `default` fallback and a
//!   shareable wrapper on the encode side; tag and object hooks on the decode side.
//!
//! ## Encoding
//!
//! ```
//! use fullcbor::encoder::{to_vec, to_vec_with, EncodeOptions};
//! use fullcbor::error::CBORError;
//! use fullcbor::types::{CBOR, CBORMap};
//!
//! fn main() -> Result<(), CBORError> {
//!     let map = CBOR::Map(CBORMap::from(vec![
//!         (CBOR::from("b"), CBOR::Array(vec![CBOR::from(2u64), CBOR::from(3u64)])),
//!         (CBOR::from("a"), CBOR::from(1u64)),
//!     ]));
//!     // Deterministic mode sorts keys by their encoded bytes
//!     let bytes = to_vec_with(&map, EncodeOptions::new().canonical(true))?;
//!     assert_eq!(
//!         bytes,
//!         &[0xa2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x82, 0x02, 0x03]
//!     );
//!     assert_eq!(to_vec(&CBOR::from("IETF"))?, &[0x64, 0x49, 0x45, 0x54, 0x46]);
//!     Ok(())
//! }
//! ```
//!
//! ## Decoding
//!
//! ```
//! use fullcbor::decoder::from_slice;
//! use fullcbor::error::CBORError;
//! use fullcbor::types::CBOR;
//!
//! fn main() -> Result<(), CBORError> {
//!     let item = from_slice(&[0x83, 0x01, 0x02, 0x03])?;
//!     assert_eq!(
//!         item,
//!         CBOR::Array(vec![CBOR::UInt(1), CBOR::UInt(2), CBOR::UInt(3)])
//!     );
//!     // A stray break marker is a decode error
//!     assert!(from_slice(&[0xff]).is_err());
//!     Ok(())
//! }
//! ```

pub(crate) mod ast;
mod cbor_diag;
/// Major type, payload and semantic tag constants for the CBOR wire format.
pub mod constants;
pub(crate) mod decode;
pub(crate) mod encode;
pub(crate) mod tag;

/// The `error` module contains error definitions used throughout `fullcbor`.
pub mod error;

/// The `types` module exports the main [`types::CBOR`] structure which represents a single
/// CBOR item, together with the map, set and regular expression carriers it contains.
pub mod types {
    pub use super::ast::{CBOR, CBORMap, CBORRegex, CBORSet};
    pub use super::constants::tags;
}

/// The `decoder` module exports types, functions and traits for decoding CBOR items from a
/// byte source.
pub mod decoder {
    pub use super::decode::{
        from_slice, from_slice_with, CBORDecoder, DecodeOptions, ObjectHook, StrErrors, TagHook,
    };
}

/// The `encoder` module exports the [`encoder::CBOREncoder`] type and helpers used to encode
/// values as CBOR items.
pub mod encoder {
    pub use super::encode::{make_shareable, to_vec, to_vec_with, CBOREncoder, EncodeOptions};
}

/// Diagnostic notation helpers.
pub mod debug {
    pub use super::cbor_diag::print_hex;
    pub use super::cbor_diag::Diag;
}
