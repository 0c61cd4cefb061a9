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
/// # diag - CBOR diagnostic style output for structured binary data
///
/// CBOR diagnostic notation is defined in RFC8949 and extended slightly in RFC8610. Rendering
/// is lossy and human-oriented: all tags print in `n(...)` form, strings print quoted, byte
/// strings print as `h'...'`, and indefinite length forms are not distinguished.
use std::error::Error;
use std::io::Write;

use chrono::SecondsFormat;

use crate::ast::CBOR;
use crate::constants::tags;

/// Trait defining helper functions for conveniently displaying information in CBOR
/// diagnostic format.
pub trait Diag {
    fn cbor_diag(&self, outfp: &mut dyn Write) -> Result<(), Box<dyn Error>>;
}

impl Diag for CBOR {
    fn cbor_diag(&self, outfp: &mut dyn Write) -> Result<(), Box<dyn Error>> {
        diag_item(self, outfp)?;
        Ok(())
    }
}

/// Dump a byte slice in the `h'...'` form used for byte strings.
pub fn print_hex(bytes: &[u8], outfp: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    write!(outfp, "h'")?;
    for b in bytes {
        write!(outfp, "{b:02x}")?;
    }
    write!(outfp, "'")?;
    Ok(())
}

fn diag_item(item: &CBOR, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    match item {
        CBOR::UInt(n) => write!(out, "{n}")?,
        CBOR::NInt(n) => write!(out, "-{}", (*n as u128) + 1)?,
        CBOR::BigInt(v) => write!(out, "{v}")?,
        CBOR::Bstr(b) => print_hex(b, out)?,
        CBOR::Tstr(s) => write!(out, "{s:?}")?,
        CBOR::Array(items) => {
            write!(out, "[")?;
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                diag_item(v, out)?;
            }
            write!(out, "]")?;
        }
        CBOR::Map(map) => {
            write!(out, "{{")?;
            for (i, (k, v)) in map.iter().enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                diag_item(k, out)?;
                write!(out, ": ")?;
                diag_item(v, out)?;
            }
            write!(out, "}}")?;
        }
        CBOR::Tag(t, child) => {
            write!(out, "{t}(")?;
            diag_item(child, out)?;
            write!(out, ")")?;
        }
        CBOR::Simple(v) => write!(out, "simple({v})")?,
        CBOR::Float(f) => diag_float(*f, out)?,
        CBOR::False => write!(out, "false")?,
        CBOR::True => write!(out, "true")?,
        CBOR::Null => write!(out, "null")?,
        CBOR::Undefined => write!(out, "undefined")?,
        CBOR::Break => write!(out, "break")?,
        CBOR::DateTime(dt) => write!(
            out,
            "{}({:?})",
            tags::DATE_TIME_STRING,
            dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        )?,
        CBOR::NaiveDateTime(ndt) => write!(
            out,
            "{}({:?})",
            tags::DATE_TIME_STRING,
            ndt.format("%Y-%m-%dT%H:%M:%S").to_string()
        )?,
        CBOR::Date(d) => write!(
            out,
            "{}({:?})",
            tags::DATE_STRING,
            d.format("%Y-%m-%d").to_string()
        )?,
        CBOR::Decimal { exponent, mantissa } => {
            write!(out, "{}([{exponent}, {mantissa}])", tags::DECIMAL_FRACTION)?
        }
        CBOR::Bigfloat { exponent, mantissa } => {
            write!(out, "{}([{exponent}, {mantissa}])", tags::BIGFLOAT)?
        }
        CBOR::Rational(r) => write!(out, "{}([{}, {}])", tags::RATIONAL, r.numer(), r.denom())?,
        CBOR::Regexp(re) => write!(out, "{}({:?})", tags::REGEXP, re.as_str())?,
        CBOR::Mime(s) => write!(out, "{}({s:?})", tags::MIME_MESSAGE)?,
        CBOR::Uuid(u) => {
            write!(out, "{}(", tags::UUID)?;
            print_hex(u.as_bytes(), out)?;
            write!(out, ")")?;
        }
        CBOR::IpAddr(a) => write!(out, "{}({a})", ip_tag(a.is_ipv6()))?,
        CBOR::IpNetwork(n) => write!(out, "{}({n})", ip_tag(n.is_ipv6()))?,
        CBOR::Set(set) => {
            write!(out, "{}([", tags::SET)?;
            for (i, v) in set.iter().enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                diag_item(v, out)?;
            }
            write!(out, "])")?;
        }
        CBOR::Complex(z) => write!(out, "{}([{}, {}])", tags::COMPLEX, z.re, z.im)?,
        CBOR::Shareable(inner) => {
            write!(out, "{}(", tags::SHAREABLE)?;
            diag_item(inner, out)?;
            write!(out, ")")?;
        }
        CBOR::SharedRef(k) => write!(out, "{}({k})", tags::SHARED_REF)?,
    }
    Ok(())
}

fn ip_tag(v6: bool) -> u64 {
    if v6 {
        tags::IPV6
    } else {
        tags::IPV4
    }
}

fn diag_float(f: f64, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    if f.is_nan() {
        write!(out, "NaN")?;
    } else if f.is_infinite() {
        write!(out, "{}Infinity", if f < 0.0 { "-" } else { "" })?;
    } else {
        write!(out, "{f:?}")?;
    }
    Ok(())
}
