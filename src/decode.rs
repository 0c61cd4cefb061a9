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
 * CBOR Decoder
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949), decoding to owned
 * values with support for shared values, string references and deterministic encoding.
 **************************************************************************************************/
//! # CBOR decoding
//!
//! CBOR input is pulled from any [`std::io::Read`] through a readahead buffer and decoded to
//! owned [`CBOR`] values. A [`CBORDecoder`] decodes one item per [`CBORDecoder::decode`] call
//! and doubles as an iterator over an RFC 8742 CBOR sequence.
//!
//! ## Example
//!
//! ```
//! use fullcbor::decoder::from_slice;
//! use fullcbor::types::CBOR;
//!
//! let item = from_slice(&[0x18, 0x18]).unwrap();
//! assert_eq!(item, CBOR::UInt(24));
//! ```

use std::io::Read;
use std::rc::Rc;

use log::debug;

use crate::ast::{CBOR, CBORMap};
use crate::constants::*;
use crate::error::{CBORError, Result};
use crate::tag::{decode_tagged, TagOutcome};

/// Policy for text strings that fail UTF-8 validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum StrErrors {
    /// Fail the decode with [`CBORError::UTF8Error`].
    #[default]
    Strict,
    /// Substitute U+FFFD for each invalid sequence.
    Replace,
    /// Drop invalid sequences.
    Ignore,
}

/// Fallback invoked for semantic tags the codec does not recognize. Receives the tag number,
/// the fully decoded child and the current immutable flag.
pub type TagHook = dyn Fn(u64, CBOR, bool) -> Result<CBOR>;

/// Post-processor invoked for every decoded map.
pub type ObjectHook = dyn Fn(CBORMap) -> Result<CBOR>;

/// Decoder configuration.
///
/// `read_size` bounds the readahead buffer pulled from the byte source (0 disables readahead
/// and the source is consumed byte-at-a-time). `max_depth` bounds nesting before the decoder
/// fails fast rather than exhausting the stack.
#[derive(Clone)]
pub struct DecodeOptions {
    /// UTF-8 failure policy for text strings.
    pub str_errors: StrErrors,
    /// Readahead buffer size in bytes; 0 disables buffering.
    pub read_size: usize,
    /// Maximum nesting depth.
    pub max_depth: usize,
    /// Fallback for unrecognized semantic tags.
    pub tag_hook: Option<Rc<TagHook>>,
    /// Post-processor for decoded maps.
    pub object_hook: Option<Rc<ObjectHook>>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            str_errors: StrErrors::Strict,
            read_size: DEFAULT_READ_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            tag_hook: None,
            object_hook: None,
        }
    }
}

impl DecodeOptions {
    /// Construct the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the UTF-8 failure policy.
    pub fn str_errors(mut self, policy: StrErrors) -> Self {
        self.str_errors = policy;
        self
    }

    /// Set the readahead buffer size in bytes. 0 disables readahead.
    pub fn read_size(mut self, size: usize) -> Self {
        self.read_size = size;
        self
    }

    /// Set the maximum nesting depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Install a fallback for unrecognized semantic tags.
    pub fn tag_hook(mut self, hook: impl Fn(u64, CBOR, bool) -> Result<CBOR> + 'static) -> Self {
        self.tag_hook = Some(Rc::new(hook));
        self
    }

    /// Install a post-processor for decoded maps.
    pub fn object_hook(mut self, hook: impl Fn(CBORMap) -> Result<CBOR> + 'static) -> Self {
        self.object_hook = Some(Rc::new(hook));
        self
    }
}

/***************************************************************************************************
 * Readahead byte source
 **************************************************************************************************/

/// Pull-model readahead over the underlying byte source. A `read_size` of zero degrades to a
/// one byte buffer so the break-marker peek still works against byte-at-a-time sources.
struct ReadSource<R: Read> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    len: usize,
}

impl<R: Read> ReadSource<R> {
    fn new(inner: R, read_size: usize) -> Self {
        ReadSource {
            inner,
            buf: vec![0u8; read_size.max(1)],
            pos: 0,
            len: 0,
        }
    }

    /// Pull the next slab from the source. Errors with `Eof` when the source is dry.
    fn fill(&mut self) -> Result<()> {
        self.pos = 0;
        self.len = 0;
        let n = self.inner.read(&mut self.buf)?;
        if n == 0 {
            return Err(CBORError::Eof);
        }
        self.len = n;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.pos >= self.len {
            self.fill()?;
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn peek_byte(&mut self) -> Result<u8> {
        if self.pos >= self.len {
            self.fill()?;
        }
        Ok(self.buf[self.pos])
    }

    /// Read exactly `n` bytes, draining the readahead buffer before pulling further slabs.
    /// A short source fails with `Eof` per the framing contract.
    fn read_exact_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        // Preallocation is capped so a corrupt length cannot demand the whole address space
        let mut out = Vec::with_capacity(n.min(65536));
        while out.len() < n {
            if self.pos < self.len {
                let take = (n - out.len()).min(self.len - self.pos);
                out.extend_from_slice(&self.buf[self.pos..self.pos + take]);
                self.pos += take;
            } else {
                self.fill()?;
            }
        }
        Ok(out)
    }
}

/***************************************************************************************************
 * Decoder
 **************************************************************************************************/

/// A decoder over any byte source, producing owned [`CBOR`] items.
///
/// Each call to [`CBORDecoder::decode`] performs one top-level decode; the shareable arena
/// and string reference namespaces are reset at the start of each call and remain available
/// for inspection afterwards. The decoder iterates a CBOR sequence when used as an
/// [`Iterator`], yielding one `Result` per item.
pub struct CBORDecoder<R: Read> {
    source: ReadSource<R>,
    options: DecodeOptions,
    depth: usize,
    immutable: bool,
    shareables: Vec<Option<CBOR>>,
    stringrefs: Vec<Vec<CBOR>>,
}

/// Decode a single item from a byte slice with default options.
pub fn from_slice(data: &[u8]) -> Result<CBOR> {
    CBORDecoder::new(data, DecodeOptions::default()).decode()
}

/// Decode a single item from a byte slice with the supplied options.
pub fn from_slice_with(data: &[u8], options: DecodeOptions) -> Result<CBOR> {
    CBORDecoder::new(data, options).decode()
}

impl<R: Read> CBORDecoder<R> {
    /// Construct a decoder over `reader` with the supplied options.
    pub fn new(reader: R, options: DecodeOptions) -> Self {
        let read_size = options.read_size;
        CBORDecoder {
            source: ReadSource::new(reader, read_size),
            options,
            depth: 0,
            immutable: false,
            shareables: Vec::new(),
            stringrefs: Vec::new(),
        }
    }

    /// Decode one top-level item.
    pub fn decode(&mut self) -> Result<CBOR> {
        self.shareables.clear();
        self.stringrefs.clear();
        self.depth = 0;
        self.immutable = false;
        self.decode_item()
    }

    /// The contents of shareable slot `index` from the most recent decode, if that slot was
    /// bound. In-progress (cyclic) slots read as `None` only while the decode is running.
    pub fn shareable(&self, index: u64) -> Option<&CBOR> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.shareables.get(i))
            .and_then(|slot| slot.as_ref())
    }

    /// `true` while decoding positions that must yield immutable aggregates (map keys and
    /// set members). Exposed for symmetry with the hook argument.
    pub fn immutable(&self) -> bool {
        self.immutable
    }

    /// Parse a single CBOR item, guarding recursion depth.
    fn decode_item(&mut self) -> Result<CBOR> {
        if self.depth >= self.options.max_depth {
            return Err(CBORError::DepthExceeded(self.options.max_depth));
        }
        self.depth += 1;
        let result = self.decode_item_inner();
        self.depth -= 1;
        result
    }

    fn decode_item_inner(&mut self) -> Result<CBOR> {
        let ib = self.source.read_byte()?;
        if ib == BREAK {
            return Err(CBORError::StrayBreak);
        }
        let ai = ib & AI_MASK;
        match ib >> 5 {
            0 => self.read_argument(ai).map(CBOR::UInt),
            1 => self.read_argument(ai).map(CBOR::NInt),
            2 => self.decode_bstr(ai),
            3 => self.decode_tstr(ai),
            4 => self.decode_array(ai),
            5 => self.decode_map(ai),
            6 => self.decode_tag(ai),
            _ => self.decode_simple_or_float(ai),
        }
    }

    /// Read the argument encoded on the AI bits and any following bytes. Reserved AI values
    /// (28..=30) and the indefinite marker are rejected; callers that accept indefinite
    /// lengths test for AI 31 before calling.
    fn read_argument(&mut self, ai: u8) -> Result<u64> {
        match ai {
            0..=PAYLOAD_AI_BITS => Ok(ai as u64),
            PAYLOAD_ONE_BYTE => Ok(self.source.read_byte()? as u64),
            PAYLOAD_TWO_BYTES => {
                let b = self.source.read_exact_vec(2)?;
                Ok(u16::from_be_bytes([b[0], b[1]]) as u64)
            }
            PAYLOAD_FOUR_BYTES => {
                let b = self.source.read_exact_vec(4)?;
                Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64)
            }
            PAYLOAD_EIGHT_BYTES => {
                let b = self.source.read_exact_vec(8)?;
                Ok(u64::from_be_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ]))
            }
            _ => Err(CBORError::AIError),
        }
    }

    /// Read a length argument and narrow it to the platform word.
    fn read_length(&mut self, ai: u8) -> Result<usize> {
        let n = self.read_argument(ai)?;
        usize::try_from(n).map_err(|_| CBORError::OutOfRange)
    }

    fn decode_bstr(&mut self, ai: u8) -> Result<CBOR> {
        let bytes = if ai == PAYLOAD_INDEFINITE {
            self.decode_chunks(MT_BSTR >> 5)?.concat()
        } else {
            let len = self.read_length(ai)?;
            self.source.read_exact_vec(len)?
        };
        let item = CBOR::Bstr(bytes);
        self.register_stringref(&item);
        Ok(item)
    }

    fn decode_tstr(&mut self, ai: u8) -> Result<CBOR> {
        let text = if ai == PAYLOAD_INDEFINITE {
            let mut joined = String::new();
            for chunk in self.decode_chunks(MT_TSTR >> 5)? {
                joined.push_str(&self.convert_text(chunk)?);
            }
            joined
        } else {
            let len = self.read_length(ai)?;
            let bytes = self.source.read_exact_vec(len)?;
            self.convert_text(bytes)?
        };
        let item = CBOR::Tstr(text);
        self.register_stringref(&item);
        Ok(item)
    }

    /// Collect the chunks of an indefinite length string. Chunks must be definite length
    /// items of the same major type.
    fn decode_chunks(&mut self, major: u8) -> Result<Vec<Vec<u8>>> {
        let mut chunks = Vec::new();
        loop {
            if self.source.peek_byte()? == BREAK {
                let _ = self.source.read_byte()?;
                return Ok(chunks);
            }
            let ib = self.source.read_byte()?;
            let ai = ib & AI_MASK;
            if ib >> 5 != major || ai == PAYLOAD_INDEFINITE {
                return Err(CBORError::MalformedEncoding);
            }
            let len = self.read_length(ai)?;
            chunks.push(self.source.read_exact_vec(len)?);
        }
    }

    /// Apply the configured UTF-8 policy to raw text bytes.
    fn convert_text(&self, bytes: Vec<u8>) -> Result<String> {
        match self.options.str_errors {
            StrErrors::Strict => String::from_utf8(bytes).map_err(|_| CBORError::UTF8Error),
            StrErrors::Replace => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            StrErrors::Ignore => {
                let mut out = String::with_capacity(bytes.len());
                let mut rest = &bytes[..];
                while !rest.is_empty() {
                    match std::str::from_utf8(rest) {
                        Ok(s) => {
                            out.push_str(s);
                            break;
                        }
                        Err(e) => {
                            let (valid, after) = rest.split_at(e.valid_up_to());
                            if let Ok(s) = std::str::from_utf8(valid) {
                                out.push_str(s);
                            }
                            let skip = e.error_len().unwrap_or(after.len());
                            rest = &after[skip..];
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    /// Register a decoded string in the innermost namespace, mirroring the encoder side so
    /// reference indices stay synchronized.
    fn register_stringref(&mut self, item: &CBOR) {
        if let Some(ns) = self.stringrefs.last_mut() {
            let len = match item {
                CBOR::Bstr(b) => b.len(),
                CBOR::Tstr(s) => s.len(),
                _ => return,
            };
            if stringref_assignable(ns.len(), len) {
                ns.push(item.clone());
            }
        }
    }

    fn decode_array(&mut self, ai: u8) -> Result<CBOR> {
        let mut items = Vec::new();
        if ai == PAYLOAD_INDEFINITE {
            loop {
                if self.source.peek_byte()? == BREAK {
                    let _ = self.source.read_byte()?;
                    break;
                }
                items.push(self.decode_item()?);
            }
        } else {
            let n = self.read_length(ai)?;
            items.reserve(n.min(65536));
            for _ in 0..n {
                items.push(self.decode_item()?);
            }
        }
        Ok(CBOR::Array(items))
    }

    fn decode_map(&mut self, ai: u8) -> Result<CBOR> {
        let mut map = CBORMap::new();
        if ai == PAYLOAD_INDEFINITE {
            loop {
                if self.source.peek_byte()? == BREAK {
                    let _ = self.source.read_byte()?;
                    break;
                }
                let key = self.decode_key()?;
                let value = self.decode_item()?;
                map.insert(key, value);
            }
        } else {
            let n = self.read_length(ai)?;
            for _ in 0..n {
                let key = self.decode_key()?;
                let value = self.decode_item()?;
                map.insert(key, value);
            }
        }
        match self.options.object_hook.clone() {
            Some(hook) => hook(map),
            None => Ok(CBOR::Map(map)),
        }
    }

    /// Keys decode with the immutable flag raised; the previous state is restored on exit.
    fn decode_key(&mut self) -> Result<CBOR> {
        let saved = self.immutable;
        self.immutable = true;
        let result = self.decode_item();
        self.immutable = saved;
        result
    }

    fn decode_tag(&mut self, ai: u8) -> Result<CBOR> {
        let tag = self.read_argument(ai)?;
        match tag {
            tags::SHAREABLE => {
                // The slot is allocated before the child decodes so that a reference inside
                // the child resolves to this index
                let slot = self.shareables.len();
                self.shareables.push(None);
                let inner = self.decode_item()?;
                self.shareables[slot] = Some(inner.clone());
                Ok(CBOR::Shareable(Box::new(inner)))
            }
            tags::SHARED_REF => {
                let child = self.decode_item()?;
                let index = match child {
                    CBOR::UInt(k) => k,
                    _ => return Err(CBORError::TagPayload(tags::SHARED_REF)),
                };
                let in_range = usize::try_from(index)
                    .map(|i| i < self.shareables.len())
                    .unwrap_or(false);
                if !in_range {
                    return Err(CBORError::SharedRefOutOfRange(index));
                }
                Ok(CBOR::SharedRef(index))
            }
            tags::STRING_REF => {
                let child = self.decode_item()?;
                let index = match child {
                    CBOR::UInt(k) => k,
                    _ => return Err(CBORError::TagPayload(tags::STRING_REF)),
                };
                let ns = self
                    .stringrefs
                    .last()
                    .ok_or(CBORError::NoStringRefNamespace)?;
                usize::try_from(index)
                    .ok()
                    .and_then(|i| ns.get(i))
                    .cloned()
                    .ok_or(CBORError::StringRefOutOfRange(index))
            }
            tags::STRING_REF_NAMESPACE => {
                self.stringrefs.push(Vec::new());
                let result = self.decode_item();
                self.stringrefs.pop();
                result
            }
            tags::SELF_DESCRIBE => self.decode_item(),
            _ => {
                // Set members land in hashed positions, so they decode as immutable, like keys
                let saved = self.immutable;
                if tag == tags::SET {
                    self.immutable = true;
                }
                let child = self.decode_item();
                self.immutable = saved;
                let child = child?;
                match decode_tagged(tag, child)? {
                    TagOutcome::Value(v) => Ok(v),
                    TagOutcome::Unrecognized(child) => {
                        match self.options.tag_hook.clone() {
                            Some(hook) => hook(tag, child, self.immutable),
                            None => {
                                debug!("no handler for tag {tag}; yielding opaque Tag item");
                                Ok(CBOR::Tag(tag, Box::new(child)))
                            }
                        }
                    }
                }
            }
        }
    }

    fn decode_simple_or_float(&mut self, ai: u8) -> Result<CBOR> {
        match ai {
            0..=19 => Ok(CBOR::Simple(ai)),
            20 => Ok(CBOR::False),
            21 => Ok(CBOR::True),
            22 => Ok(CBOR::Null),
            23 => Ok(CBOR::Undefined),
            PAYLOAD_ONE_BYTE => {
                let v = self.source.read_byte()?;
                // 0..=31 have one byte encodings or reserved meanings in this position
                if v < 32 {
                    Err(CBORError::MalformedEncoding)
                } else {
                    Ok(CBOR::Simple(v))
                }
            }
            PAYLOAD_TWO_BYTES => {
                let b = self.source.read_exact_vec(2)?;
                let h = half::f16::from_be_bytes([b[0], b[1]]);
                Ok(CBOR::Float(f64::from(h)))
            }
            PAYLOAD_FOUR_BYTES => {
                let b = self.source.read_exact_vec(4)?;
                Ok(CBOR::Float(
                    f32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f64
                ))
            }
            PAYLOAD_EIGHT_BYTES => {
                let b = self.source.read_exact_vec(8)?;
                Ok(CBOR::Float(f64::from_be_bytes([
                    b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
                ])))
            }
            PAYLOAD_INDEFINITE => Err(CBORError::StrayBreak),
            _ => Err(CBORError::AIError),
        }
    }
}

/// Iterate a CBOR sequence (RFC 8742): one `Result` per top-level item until the source is
/// exhausted.
impl<R: Read> Iterator for CBORDecoder<R> {
    type Item = Result<CBOR>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.source.peek_byte() {
            Err(e) if e.is_eof() => None,
            Err(e) => Some(Err(e)),
            Ok(_) => Some(self.decode()),
        }
    }
}
