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
 * Registered semantic tag handling, both directions
 **************************************************************************************************/

use chrono::{DateTime, FixedOffset, NaiveDate};
use fullcbor::decoder::{from_slice, from_slice_with, DecodeOptions};
use fullcbor::encoder::{to_vec, to_vec_with, EncodeOptions};
use fullcbor::error::CBORError;
use fullcbor::types::{CBOR, CBORRegex, CBORSet};
use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use uuid::Uuid;

fn decode_hex(s: &str) -> Result<CBOR, CBORError> {
    from_slice(&hex::decode(s).unwrap())
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

#[test]
fn datetime_text_form() -> Result<(), CBORError> {
    let dt = DateTime::parse_from_rfc3339("2013-03-21T20:04:00Z").unwrap();
    let expect = "c074323031332d30332d32315432303a30343a30305a";
    assert_eq!(to_vec(&CBOR::DateTime(dt))?, hex::decode(expect).unwrap());
    assert_eq!(decode_hex(expect)?, CBOR::DateTime(dt));

    // Offsets other than UTC render as +HH:MM
    let dt = DateTime::parse_from_rfc3339("2013-03-21T22:04:00+02:00").unwrap();
    let bytes = to_vec(&CBOR::DateTime(dt))?;
    assert_eq!(
        bytes,
        hex::decode("c078193230 31332d30332d32315432323a30343a30302b30323a3030".replace(' ', ""))
            .unwrap()
    );
    assert_eq!(from_slice(&bytes)?, CBOR::DateTime(dt));
    Ok(())
}

#[test]
fn datetime_epoch_form() -> Result<(), CBORError> {
    let dt = DateTime::parse_from_rfc3339("2013-03-21T20:04:00Z").unwrap();
    let options = EncodeOptions::new().datetime_as_timestamp(true);
    assert_eq!(
        to_vec_with(&CBOR::DateTime(dt), options.clone())?,
        hex::decode("c11a514b67b0").unwrap()
    );
    assert_eq!(decode_hex("c11a514b67b0")?, CBOR::DateTime(dt));

    // Sub-second components force the float form
    let dt = DateTime::parse_from_rfc3339("2013-03-21T20:04:00.5Z").unwrap();
    assert_eq!(
        to_vec_with(&CBOR::DateTime(dt), options)?,
        hex::decode("c1fb41d452d9ec200000").unwrap()
    );
    assert_eq!(decode_hex("c1fb41d452d9ec200000")?, CBOR::DateTime(dt));

    // Negative epoch seconds land before 1970
    let dt = DateTime::parse_from_rfc3339("1969-12-31T23:59:50Z").unwrap();
    assert_eq!(decode_hex("c129")?, CBOR::DateTime(dt));
    Ok(())
}

#[test]
fn naive_datetime_needs_a_default_timezone() -> Result<(), CBORError> {
    let ndt = NaiveDate::from_ymd_opt(2013, 3, 21)
        .unwrap()
        .and_hms_opt(20, 4, 0)
        .unwrap();
    assert!(matches!(
        to_vec(&CBOR::NaiveDateTime(ndt)),
        Err(CBORError::NaiveDateTime)
    ));
    assert_eq!(
        to_vec_with(
            &CBOR::NaiveDateTime(ndt),
            EncodeOptions::new().timezone(utc())
        )?,
        hex::decode("c074323031332d30332d32315432303a30343a30305a").unwrap()
    );
    Ok(())
}

#[test]
fn date_forms() -> Result<(), CBORError> {
    let date = NaiveDate::from_ymd_opt(2013, 3, 21).unwrap();
    let expect = "d903ec6a323031332d30332d3231";
    assert_eq!(to_vec(&CBOR::Date(date))?, hex::decode(expect).unwrap());
    assert_eq!(decode_hex(expect)?, CBOR::Date(date));

    // Epoch day form (tag 100)
    assert_eq!(decode_hex("d864193da9")?, CBOR::Date(date));
    assert_eq!(
        decode_hex("d86420")?,
        CBOR::Date(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap())
    );

    // Promotion to a midnight datetime in the default zone
    assert_eq!(
        to_vec_with(
            &CBOR::Date(date),
            EncodeOptions::new().date_as_datetime(true).timezone(utc())
        )?,
        hex::decode("c074323031332d30332d32315430303a30303a30305a").unwrap()
    );
    Ok(())
}

#[test]
fn bignums() -> Result<(), CBORError> {
    let big: BigInt = BigInt::from(u64::MAX) + 1;
    assert_eq!(
        to_vec(&CBOR::BigInt(big.clone()))?,
        hex::decode("c249010000000000000000").unwrap()
    );
    assert_eq!(decode_hex("c249010000000000000000")?, CBOR::BigInt(big));

    // Leading zero bytes and small magnitudes collapse to wire integers
    assert_eq!(decode_hex("c243000001")?, CBOR::UInt(1));
    assert_eq!(decode_hex("c34101")?, CBOR::NInt(1));
    Ok(())
}

#[test]
fn decimals_and_bigfloats() -> Result<(), CBORError> {
    let dec = CBOR::Decimal {
        exponent: -2,
        mantissa: BigInt::from(27315),
    };
    assert_eq!(to_vec(&dec)?, hex::decode("c48221196ab3").unwrap());
    assert_eq!(decode_hex("c48221196ab3")?, dec);

    let big = CBOR::Bigfloat {
        exponent: -1,
        mantissa: BigInt::from(3),
    };
    assert_eq!(to_vec(&big)?, hex::decode("c5822003").unwrap());
    assert_eq!(decode_hex("c5822003")?, big);

    // A bignum mantissa is carried through the integer path
    let dec = CBOR::Decimal {
        exponent: 2,
        mantissa: BigInt::from(u64::MAX) + 1,
    };
    assert_eq!(
        to_vec(&dec)?,
        hex::decode("c48202c249010000000000000000").unwrap()
    );
    assert_eq!(decode_hex("c48202c249010000000000000000")?, dec);
    Ok(())
}

#[test]
fn rationals() -> Result<(), CBORError> {
    let r = CBOR::Rational(BigRational::new(BigInt::from(1), BigInt::from(3)));
    assert_eq!(to_vec(&r)?, hex::decode("d81e820103").unwrap());
    assert_eq!(decode_hex("d81e820103")?, r);

    assert!(matches!(
        decode_hex("d81e820100"),
        Err(CBORError::TagPayload(30))
    ));
    Ok(())
}

#[test]
fn regexps() -> Result<(), CBORError> {
    let re = CBOR::Regexp(CBORRegex::new("ab+c")?);
    assert_eq!(to_vec(&re)?, hex::decode("d8236461622b63").unwrap());
    assert_eq!(decode_hex("d8236461622b63")?, re);

    // An unparseable pattern is a payload error
    assert!(matches!(
        decode_hex("d8236128"),
        Err(CBORError::TagPayload(35))
    ));
    Ok(())
}

#[test]
fn mime_messages() -> Result<(), CBORError> {
    let mime = CBOR::Mime("MIME-Version: 1.0".to_owned());
    let expect = "d824714d494d452d56657273696f6e3a20312e30";
    assert_eq!(to_vec(&mime)?, hex::decode(expect).unwrap());
    assert_eq!(decode_hex(expect)?, mime);
    Ok(())
}

#[test]
fn uuids() -> Result<(), CBORError> {
    let uuid = CBOR::Uuid(Uuid::from_bytes([
        0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
    ]));
    let expect = "d82550000102030405060708090a0b0c0d0e0f";
    assert_eq!(to_vec(&uuid)?, hex::decode(expect).unwrap());
    assert_eq!(decode_hex(expect)?, uuid);

    assert!(matches!(
        decode_hex("d82541aa"),
        Err(CBORError::TagPayload(37))
    ));
    Ok(())
}

#[test]
fn ip_addresses_and_networks() -> Result<(), CBORError> {
    let v4 = CBOR::IpAddr("192.168.0.1".parse().unwrap());
    assert_eq!(to_vec(&v4)?, hex::decode("d83444c0a80001").unwrap());
    assert_eq!(decode_hex("d83444c0a80001")?, v4);

    let v6 = CBOR::IpAddr("::1".parse().unwrap());
    let expect = "d8365000000000000000000000000000000001";
    assert_eq!(to_vec(&v6)?, hex::decode(expect).unwrap());
    assert_eq!(decode_hex(expect)?, v6);

    let net = CBOR::IpNetwork("192.168.0.0/24".parse().unwrap());
    assert_eq!(to_vec(&net)?, hex::decode("d83482181844c0a80000").unwrap());
    assert_eq!(decode_hex("d83482181844c0a80000")?, net);

    // Trailing zero bytes of a prefix may be omitted on the wire
    assert_eq!(
        decode_hex("d834820a410a")?,
        CBOR::IpNetwork("10.0.0.0/10".parse().unwrap())
    );

    // Deprecated forms decode only
    assert_eq!(decode_hex("d9010444c0a80001")?, v4);
    assert_eq!(
        decode_hex("d90105a144c0a800001818")?,
        CBOR::IpNetwork("192.168.0.0/24".parse().unwrap())
    );
    Ok(())
}

#[test]
fn sets() -> Result<(), CBORError> {
    let set = CBOR::Set(CBORSet::from(vec![CBOR::UInt(1), CBOR::UInt(2)]));
    assert_eq!(to_vec(&set)?, hex::decode("d90102820102").unwrap());
    assert_eq!(decode_hex("d90102820102")?, set);

    // Duplicate members collapse on decode
    assert_eq!(
        decode_hex("d90102820101")?,
        CBOR::Set(CBORSet::from(vec![CBOR::UInt(1)]))
    );
    Ok(())
}

#[test]
fn complex_numbers() -> Result<(), CBORError> {
    let z = CBOR::Complex(Complex64::new(1.0, -2.0));
    let expect = "d9a7f882fb3ff0000000000000fbc000000000000000";
    assert_eq!(to_vec(&z)?, hex::decode(expect).unwrap());
    assert_eq!(decode_hex(expect)?, z);
    Ok(())
}

#[test]
fn self_described_cbor_is_transparent() -> Result<(), CBORError> {
    assert_eq!(decode_hex("d9d9f700")?, CBOR::UInt(0));
    assert_eq!(
        decode_hex("d9d9f783010203")?,
        CBOR::Array(vec![CBOR::UInt(1), CBOR::UInt(2), CBOR::UInt(3)])
    );
    Ok(())
}

#[test]
fn unrecognized_tags_yield_opaque_items() -> Result<(), CBORError> {
    assert_eq!(
        decode_hex("c601")?,
        CBOR::Tag(6, Box::new(CBOR::UInt(1)))
    );
    Ok(())
}

#[test]
fn tag_hook_sees_tag_child_and_immutability() -> Result<(), CBORError> {
    let options = DecodeOptions::new().tag_hook(|tag, child, immutable| {
        assert!(!immutable);
        Ok(CBOR::Array(vec![CBOR::UInt(tag), child]))
    });
    assert_eq!(
        from_slice_with(&hex::decode("c601").unwrap(), options)?,
        CBOR::Array(vec![CBOR::UInt(6), CBOR::UInt(1)])
    );

    // In key position the flag is raised
    let options = DecodeOptions::new().tag_hook(|_, child, immutable| {
        assert!(immutable);
        Ok(child)
    });
    assert_eq!(
        from_slice_with(&hex::decode("a1c60102").unwrap(), options)?,
        CBOR::Map(fullcbor::types::CBORMap::from(vec![(
            CBOR::UInt(1),
            CBOR::UInt(2)
        )]))
    );
    Ok(())
}

#[test]
fn object_hook_postprocesses_maps() -> Result<(), CBORError> {
    let options = DecodeOptions::new().object_hook(|map| Ok(CBOR::UInt(map.len() as u64)));
    assert_eq!(
        from_slice_with(&hex::decode("a2616101616202").unwrap(), options)?,
        CBOR::UInt(2)
    );
    Ok(())
}

#[test]
fn malformed_tag_payloads() {
    // Tag 0 must carry text
    assert!(matches!(decode_hex("c001"), Err(CBORError::TagPayload(0))));
    // Unparseable datetime text
    assert!(matches!(decode_hex("c06161"), Err(CBORError::BadDateTime)));
    // Tag 2 must carry bytes
    assert!(matches!(decode_hex("c201"), Err(CBORError::TagPayload(2))));
    // Decimal fraction needs a two element array
    assert!(matches!(
        decode_hex("c48101"),
        Err(CBORError::TagPayload(4))
    ));
}
