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
 * CBOR semantic tag adapters
 *
 * A fairly comprehensive serializer and deserializer for CBOR (RFC8949), decoding to owned
 * values with support for shared values, string references and deterministic encoding.
 **************************************************************************************************/
//! Adapters between registered semantic tags and their materialized value forms. The decoder
//! calls [`decode_tagged`] with the fully decoded child of a tag; the encoder calls the
//! `encode_*` helpers, which wrap the tag head around values routed back through the normal
//! item path (so string referencing and deterministic rules apply inside tag payloads too).

use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use num_bigint::{BigInt, BigUint, Sign};
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};
use uuid::Uuid;

use crate::ast::{CBOR, CBORRegex, CBORSet};
use crate::constants::{tags, MT_TAG, UNIX_EPOCH_DAY_FROM_CE};
use crate::encode::CBOREncoder;
use crate::error::{CBORError, Result};

/***************************************************************************************************
 * Decode side
 **************************************************************************************************/

/// Result of semantic tag dispatch: a materialized value, or the child handed back for the
/// tag hook / opaque `Tag` fallback.
pub(crate) enum TagOutcome {
    Value(CBOR),
    Unrecognized(CBOR),
}

/// Dispatch a decoded tag child to the matching handler. Tags 25/28/29/256/55799 are
/// structural and handled inside the decoder itself.
pub(crate) fn decode_tagged(tag: u64, child: CBOR) -> Result<TagOutcome> {
    let value = match tag {
        tags::DATE_TIME_STRING => decode_datetime_string(child)?,
        tags::EPOCH_DATE_TIME => decode_epoch_datetime(child)?,
        tags::POS_BIGNUM => decode_bignum(child, false)?,
        tags::NEG_BIGNUM => decode_bignum(child, true)?,
        tags::DECIMAL_FRACTION => {
            let (exponent, mantissa) = decode_exponent_pair(child, tags::DECIMAL_FRACTION)?;
            CBOR::Decimal { exponent, mantissa }
        }
        tags::BIGFLOAT => {
            let (exponent, mantissa) = decode_exponent_pair(child, tags::BIGFLOAT)?;
            CBOR::Bigfloat { exponent, mantissa }
        }
        tags::RATIONAL => decode_rational(child)?,
        tags::REGEXP => match child {
            CBOR::Tstr(s) => CBOR::Regexp(CBORRegex::new(&s)?),
            _ => return Err(CBORError::TagPayload(tags::REGEXP)),
        },
        tags::MIME_MESSAGE => match child {
            CBOR::Tstr(s) => CBOR::Mime(s),
            _ => return Err(CBORError::TagPayload(tags::MIME_MESSAGE)),
        },
        tags::UUID => match child {
            CBOR::Bstr(b) => CBOR::Uuid(
                Uuid::from_slice(&b).map_err(|_| CBORError::TagPayload(tags::UUID))?,
            ),
            _ => return Err(CBORError::TagPayload(tags::UUID)),
        },
        tags::IPV4 => decode_ip(child, false)?,
        tags::IPV6 => decode_ip(child, true)?,
        tags::EPOCH_DATE => decode_epoch_date(child)?,
        tags::SET => match child {
            CBOR::Array(items) => CBOR::Set(CBORSet::from(items)),
            _ => return Err(CBORError::TagPayload(tags::SET)),
        },
        tags::NETWORK_ADDRESS => decode_network_address(child)?,
        tags::NETWORK_PREFIX => decode_network_prefix(child)?,
        tags::DATE_STRING => match child {
            CBOR::Tstr(s) => CBOR::Date(
                NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| CBORError::BadDateTime)?,
            ),
            _ => return Err(CBORError::TagPayload(tags::DATE_STRING)),
        },
        tags::COMPLEX => decode_complex(child)?,
        _ => return Ok(TagOutcome::Unrecognized(child)),
    };
    Ok(TagOutcome::Value(value))
}

fn decode_datetime_string(child: CBOR) -> Result<CBOR> {
    match child {
        CBOR::Tstr(s) => DateTime::parse_from_rfc3339(&s)
            .map(CBOR::DateTime)
            .map_err(|_| CBORError::BadDateTime),
        _ => Err(CBORError::TagPayload(tags::DATE_TIME_STRING)),
    }
}

fn decode_epoch_datetime(child: CBOR) -> Result<CBOR> {
    let utc = match child {
        CBOR::UInt(_) | CBOR::NInt(_) => {
            let secs = i64::try_from(child)?;
            DateTime::from_timestamp(secs, 0).ok_or(CBORError::BadDateTime)?
        }
        CBOR::Float(f) => {
            if !f.is_finite() {
                return Err(CBORError::BadDateTime);
            }
            let floor = f.floor();
            if floor < i64::MIN as f64 || floor > i64::MAX as f64 {
                return Err(CBORError::BadDateTime);
            }
            // Sub-second precision is kept to the microsecond, as in the text form
            let mut secs = floor as i64;
            let mut micros = ((f - floor) * 1e6).round() as u32;
            if micros >= 1_000_000 {
                secs = secs.checked_add(1).ok_or(CBORError::BadDateTime)?;
                micros = 0;
            }
            DateTime::from_timestamp(secs, micros * 1000).ok_or(CBORError::BadDateTime)?
        }
        _ => return Err(CBORError::TagPayload(tags::EPOCH_DATE_TIME)),
    };
    Ok(CBOR::DateTime(utc.fixed_offset()))
}

/// Bytes are a big-endian magnitude; tag 3 represents `-1 - magnitude`. Values that fit the
/// 64 bit wire integers collapse to `UInt`/`NInt`.
fn decode_bignum(child: CBOR, negative: bool) -> Result<CBOR> {
    let tag = if negative {
        tags::NEG_BIGNUM
    } else {
        tags::POS_BIGNUM
    };
    match child {
        CBOR::Bstr(bytes) => {
            let magnitude = BigInt::from(BigUint::from_bytes_be(&bytes));
            let value = if negative { -magnitude - 1 } else { magnitude };
            Ok(CBOR::from_bigint(value))
        }
        _ => Err(CBORError::TagPayload(tag)),
    }
}

fn decode_exponent_pair(child: CBOR, tag: u64) -> Result<(i64, BigInt)> {
    match child {
        CBOR::Array(items) if items.len() == 2 => {
            let mut it = items.into_iter();
            let exponent = match it.next() {
                Some(e @ (CBOR::UInt(_) | CBOR::NInt(_))) => i64::try_from(e)?,
                _ => return Err(CBORError::TagPayload(tag)),
            };
            let mantissa = match it.next() {
                Some(m) => BigInt::try_from(m).map_err(|_| CBORError::TagPayload(tag))?,
                None => return Err(CBORError::TagPayload(tag)),
            };
            Ok((exponent, mantissa))
        }
        _ => Err(CBORError::TagPayload(tag)),
    }
}

fn decode_rational(child: CBOR) -> Result<CBOR> {
    match child {
        CBOR::Array(items) if items.len() == 2 => {
            let mut it = items.into_iter();
            let numer = it
                .next()
                .and_then(|n| BigInt::try_from(n).ok())
                .ok_or(CBORError::TagPayload(tags::RATIONAL))?;
            let denom = it
                .next()
                .and_then(|d| BigInt::try_from(d).ok())
                .ok_or(CBORError::TagPayload(tags::RATIONAL))?;
            if denom.is_zero() {
                return Err(CBORError::TagPayload(tags::RATIONAL));
            }
            Ok(CBOR::Rational(BigRational::new(numer, denom)))
        }
        _ => Err(CBORError::TagPayload(tags::RATIONAL)),
    }
}

/// RFC 9164 address and prefix forms: a bare byte string is an address, a two element array
/// `[prefix-length, address-bytes]` is a network. Address bytes shorter than the full width
/// are zero padded on the right, as the RFC permits for prefixes.
fn decode_ip(child: CBOR, v6: bool) -> Result<CBOR> {
    let tag = if v6 { tags::IPV6 } else { tags::IPV4 };
    match child {
        CBOR::Bstr(bytes) => ip_from_bytes(&bytes, v6, tag).map(CBOR::IpAddr),
        CBOR::Array(items) if items.len() == 2 => {
            let mut it = items.into_iter();
            let prefix = match it.next() {
                Some(CBOR::UInt(p)) => p,
                _ => return Err(CBORError::TagPayload(tag)),
            };
            let bytes = match it.next() {
                Some(CBOR::Bstr(b)) => b,
                _ => return Err(CBORError::TagPayload(tag)),
            };
            let prefix = u8::try_from(prefix).map_err(|_| CBORError::TagPayload(tag))?;
            let net = if v6 {
                let mut addr = [0u8; 16];
                if bytes.len() > 16 {
                    return Err(CBORError::TagPayload(tag));
                }
                addr[..bytes.len()].copy_from_slice(&bytes);
                IpNetwork::V6(
                    Ipv6Network::new(Ipv6Addr::from(addr), prefix)
                        .map_err(|_| CBORError::TagPayload(tag))?,
                )
            } else {
                let mut addr = [0u8; 4];
                if bytes.len() > 4 {
                    return Err(CBORError::TagPayload(tag));
                }
                addr[..bytes.len()].copy_from_slice(&bytes);
                IpNetwork::V4(
                    Ipv4Network::new(Ipv4Addr::from(addr), prefix)
                        .map_err(|_| CBORError::TagPayload(tag))?,
                )
            };
            Ok(CBOR::IpNetwork(net))
        }
        _ => Err(CBORError::TagPayload(tag)),
    }
}

fn ip_from_bytes(bytes: &[u8], v6: bool, tag: u64) -> Result<IpAddr> {
    if v6 {
        let addr: [u8; 16] = bytes.try_into().map_err(|_| CBORError::TagPayload(tag))?;
        Ok(IpAddr::V6(Ipv6Addr::from(addr)))
    } else {
        let addr: [u8; 4] = bytes.try_into().map_err(|_| CBORError::TagPayload(tag))?;
        Ok(IpAddr::V4(Ipv4Addr::from(addr)))
    }
}

fn decode_epoch_date(child: CBOR) -> Result<CBOR> {
    let days = match child {
        CBOR::UInt(_) | CBOR::NInt(_) => i64::try_from(child)?,
        _ => return Err(CBORError::TagPayload(tags::EPOCH_DATE)),
    };
    let from_ce = days
        .checked_add(UNIX_EPOCH_DAY_FROM_CE)
        .and_then(|d| i32::try_from(d).ok())
        .ok_or(CBORError::BadDateTime)?;
    NaiveDate::from_num_days_from_ce_opt(from_ce)
        .map(CBOR::Date)
        .ok_or(CBORError::BadDateTime)
}

/// Deprecated tag 260: address as a bare 4 or 16 byte string. The 6 byte EUI-48 form has no
/// address-type counterpart and is rejected.
fn decode_network_address(child: CBOR) -> Result<CBOR> {
    match child {
        CBOR::Bstr(bytes) if bytes.len() == 4 => {
            ip_from_bytes(&bytes, false, tags::NETWORK_ADDRESS).map(CBOR::IpAddr)
        }
        CBOR::Bstr(bytes) if bytes.len() == 16 => {
            ip_from_bytes(&bytes, true, tags::NETWORK_ADDRESS).map(CBOR::IpAddr)
        }
        _ => Err(CBORError::TagPayload(tags::NETWORK_ADDRESS)),
    }
}

/// Deprecated tag 261: a single entry map of address bytes to prefix length.
fn decode_network_prefix(child: CBOR) -> Result<CBOR> {
    let map = match child {
        CBOR::Map(m) if m.len() == 1 => m,
        _ => return Err(CBORError::TagPayload(tags::NETWORK_PREFIX)),
    };
    let (key, value) = match map.entries().first() {
        Some(pair) => pair.clone(),
        None => return Err(CBORError::TagPayload(tags::NETWORK_PREFIX)),
    };
    let prefix = match value {
        CBOR::UInt(p) => u8::try_from(p).map_err(|_| CBORError::TagPayload(tags::NETWORK_PREFIX))?,
        _ => return Err(CBORError::TagPayload(tags::NETWORK_PREFIX)),
    };
    match key {
        CBOR::Bstr(bytes) if bytes.len() == 4 => {
            let addr: [u8; 4] = bytes[..]
                .try_into()
                .map_err(|_| CBORError::TagPayload(tags::NETWORK_PREFIX))?;
            Ipv4Network::new(Ipv4Addr::from(addr), prefix)
                .map(|n| CBOR::IpNetwork(IpNetwork::V4(n)))
                .map_err(|_| CBORError::TagPayload(tags::NETWORK_PREFIX))
        }
        CBOR::Bstr(bytes) if bytes.len() == 16 => {
            let addr: [u8; 16] = bytes[..]
                .try_into()
                .map_err(|_| CBORError::TagPayload(tags::NETWORK_PREFIX))?;
            Ipv6Network::new(Ipv6Addr::from(addr), prefix)
                .map(|n| CBOR::IpNetwork(IpNetwork::V6(n)))
                .map_err(|_| CBORError::TagPayload(tags::NETWORK_PREFIX))
        }
        _ => Err(CBORError::TagPayload(tags::NETWORK_PREFIX)),
    }
}

fn decode_complex(child: CBOR) -> Result<CBOR> {
    match child {
        CBOR::Array(items) if items.len() == 2 => {
            let mut it = items.into_iter();
            let re = number_to_f64(it.next())?;
            let im = number_to_f64(it.next())?;
            Ok(CBOR::Complex(Complex64::new(re, im)))
        }
        _ => Err(CBORError::TagPayload(tags::COMPLEX)),
    }
}

fn number_to_f64(item: Option<CBOR>) -> Result<f64> {
    match item {
        Some(CBOR::Float(f)) => Ok(f),
        Some(CBOR::UInt(n)) => Ok(n as f64),
        Some(CBOR::NInt(n)) => Ok(-1.0 - n as f64),
        _ => Err(CBORError::TagPayload(tags::COMPLEX)),
    }
}

/***************************************************************************************************
 * Encode side
 **************************************************************************************************/

/// Encode a timezone-aware datetime as tag 0 (RFC 3339 text) or tag 1 (numeric epoch),
/// depending on the encoder options. Tag 1 uses an integer when there is no sub-second
/// component, a float otherwise.
pub(crate) fn encode_datetime<W: Write>(
    enc: &mut CBOREncoder<W>,
    dt: &DateTime<FixedOffset>,
) -> Result<()> {
    if enc.options().datetime_as_timestamp {
        enc.write_head(MT_TAG, tags::EPOCH_DATE_TIME)?;
        let micros = dt.timestamp_subsec_micros();
        if micros == 0 {
            enc.insert(&CBOR::from(dt.timestamp()))
        } else {
            enc.insert(&CBOR::Float(dt.timestamp_micros() as f64 / 1e6))
        }
    } else {
        enc.write_head(MT_TAG, tags::DATE_TIME_STRING)?;
        let text = dt.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        enc.insert(&CBOR::Tstr(text))
    }
}

/// A datetime without offset picks up the configured default timezone; with no default it is
/// not encodable.
pub(crate) fn encode_naive_datetime<W: Write>(
    enc: &mut CBOREncoder<W>,
    ndt: &NaiveDateTime,
) -> Result<()> {
    let tz = enc.options().timezone.ok_or(CBORError::NaiveDateTime)?;
    let dt = ndt
        .and_local_timezone(tz)
        .single()
        .ok_or(CBORError::BadDateTime)?;
    encode_datetime(enc, &dt)
}

pub(crate) fn encode_date<W: Write>(enc: &mut CBOREncoder<W>, date: &NaiveDate) -> Result<()> {
    if enc.options().date_as_datetime {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or(CBORError::BadDateTime)?;
        encode_naive_datetime(enc, &midnight)
    } else {
        enc.write_head(MT_TAG, tags::DATE_STRING)?;
        enc.insert(&CBOR::Tstr(date.format("%Y-%m-%d").to_string()))
    }
}

/// Integers beyond the 64 bit wire forms wrap a big-endian magnitude in tag 2 or 3; anything
/// smaller re-enters the plain integer path.
pub(crate) fn encode_bigint<W: Write>(enc: &mut CBOREncoder<W>, v: &BigInt) -> Result<()> {
    if v.is_negative() {
        let magnitude = -v - 1u8;
        match magnitude.to_u64() {
            Some(n) => enc.write_head(crate::constants::MT_NINT, n),
            None => {
                enc.write_head(MT_TAG, tags::NEG_BIGNUM)?;
                let (_, bytes) = magnitude.to_bytes_be();
                enc.insert(&CBOR::Bstr(bytes))
            }
        }
    } else {
        match v.to_u64() {
            Some(n) => enc.write_head(crate::constants::MT_UINT, n),
            None => {
                enc.write_head(MT_TAG, tags::POS_BIGNUM)?;
                let (sign, bytes) = v.to_bytes_be();
                debug_assert!(sign != Sign::Minus);
                enc.insert(&CBOR::Bstr(bytes))
            }
        }
    }
}

pub(crate) fn encode_exponent_pair<W: Write>(
    enc: &mut CBOREncoder<W>,
    tag: u64,
    exponent: i64,
    mantissa: &BigInt,
) -> Result<()> {
    enc.write_head(MT_TAG, tag)?;
    enc.insert(&CBOR::Array(vec![
        CBOR::from(exponent),
        CBOR::from_bigint(mantissa.clone()),
    ]))
}

pub(crate) fn encode_rational<W: Write>(enc: &mut CBOREncoder<W>, r: &BigRational) -> Result<()> {
    enc.write_head(MT_TAG, tags::RATIONAL)?;
    enc.insert(&CBOR::Array(vec![
        CBOR::from_bigint(r.numer().clone()),
        CBOR::from_bigint(r.denom().clone()),
    ]))
}

pub(crate) fn encode_uuid<W: Write>(enc: &mut CBOREncoder<W>, u: &Uuid) -> Result<()> {
    enc.write_head(MT_TAG, tags::UUID)?;
    enc.insert(&CBOR::Bstr(u.as_bytes().to_vec()))
}

pub(crate) fn encode_ipaddr<W: Write>(enc: &mut CBOREncoder<W>, addr: &IpAddr) -> Result<()> {
    match addr {
        IpAddr::V4(a) => {
            enc.write_head(MT_TAG, tags::IPV4)?;
            enc.insert(&CBOR::Bstr(a.octets().to_vec()))
        }
        IpAddr::V6(a) => {
            enc.write_head(MT_TAG, tags::IPV6)?;
            enc.insert(&CBOR::Bstr(a.octets().to_vec()))
        }
    }
}

pub(crate) fn encode_ipnetwork<W: Write>(enc: &mut CBOREncoder<W>, net: &IpNetwork) -> Result<()> {
    let (tag, prefix, bytes) = match net {
        IpNetwork::V4(n) => (tags::IPV4, n.prefix(), n.network().octets().to_vec()),
        IpNetwork::V6(n) => (tags::IPV6, n.prefix(), n.network().octets().to_vec()),
    };
    enc.write_head(MT_TAG, tag)?;
    enc.insert(&CBOR::Array(vec![
        CBOR::UInt(prefix as u64),
        CBOR::Bstr(bytes),
    ]))
}

pub(crate) fn encode_complex<W: Write>(enc: &mut CBOREncoder<W>, z: &Complex64) -> Result<()> {
    enc.write_head(MT_TAG, tags::COMPLEX)?;
    enc.insert(&CBOR::Array(vec![CBOR::Float(z.re), CBOR::Float(z.im)]))
}
