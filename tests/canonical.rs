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
 * Deterministic (canonical) encoding per RFC8949 section 4.2
 **************************************************************************************************/

use fullcbor::decoder::from_slice;
use fullcbor::encoder::{to_vec_with, EncodeOptions};
use fullcbor::error::CBORError;
use fullcbor::types::{CBOR, CBORMap, CBORSet};
use num_bigint::BigInt;

fn canonical(value: &CBOR) -> Result<Vec<u8>, CBORError> {
    to_vec_with(value, EncodeOptions::new().canonical(true))
}

#[test]
fn canonical_integer_boundaries() -> Result<(), CBORError> {
    for (val, expect) in [
        (0i128, "00"),
        (23, "17"),
        (24, "1818"),
        (255, "18ff"),
        (256, "190100"),
        (65535, "19ffff"),
        (65536, "1a00010000"),
        (4294967295, "1affffffff"),
        (4294967296, "1b0000000100000000"),
        (18446744073709551615, "1bffffffffffffffff"),
        (18446744073709551616, "c249010000000000000000"),
        (-1, "20"),
        (-24, "37"),
        (-25, "3818"),
        (-256, "38ff"),
        (-257, "390100"),
        (-65536, "39ffff"),
        (-65537, "3a00010000"),
        (-4294967297, "3b0000000100000000"),
        (-18446744073709551616, "3bffffffffffffffff"),
        (-18446744073709551617, "c349010000000000000000"),
    ] {
        assert_eq!(
            canonical(&CBOR::from(val))?,
            hex::decode(expect).unwrap(),
            "for value {val}"
        );
    }
    Ok(())
}

#[test]
fn canonical_float_widths() -> Result<(), CBORError> {
    for (val, expect) in [
        (0.0f64, "f90000"),
        (-0.0, "f98000"),
        (1.0, "f93c00"),
        (1.5, "f93e00"),
        (65504.0, "f97bff"),
        // Just past the largest half float, so it widens to single
        (65520.0, "fa477ff000"),
        (3.4028234663852886e38, "fa7f7fffff"),
        (1.0e300, "fb7e37e43c8800759c"),
        (1.1, "fb3ff199999999999a"),
        (f64::INFINITY, "f97c00"),
        (f64::NEG_INFINITY, "f9fc00"),
        (f64::NAN, "f97e00"),
    ] {
        assert_eq!(
            canonical(&CBOR::Float(val))?,
            hex::decode(expect).unwrap(),
            "for value {val}"
        );
    }
    Ok(())
}

#[test]
fn canonical_map_key_order() -> Result<(), CBORError> {
    // Scrambled insertion; deterministic output sorts keys by their encoded bytes
    let mut map = CBORMap::new();
    map.insert(
        CBOR::from("b"),
        CBOR::Array(vec![CBOR::from(2u64), CBOR::from(3u64)]),
    );
    map.insert(CBOR::from("a"), CBOR::from(1u64));
    assert_eq!(
        canonical(&CBOR::Map(map))?,
        hex::decode("a26161016162820203").unwrap()
    );

    // Byte-lexicographic order across key types, per RFC8949 section 4.2.1
    let mut map = CBORMap::new();
    map.insert(CBOR::False, CBOR::UInt(6));
    map.insert(CBOR::Array(vec![CBOR::UInt(100)]), CBOR::UInt(5));
    map.insert(CBOR::from("aa"), CBOR::UInt(4));
    map.insert(CBOR::from("z"), CBOR::UInt(3));
    map.insert(CBOR::from(-1i64), CBOR::UInt(2));
    map.insert(CBOR::UInt(100), CBOR::UInt(1));
    map.insert(CBOR::UInt(10), CBOR::UInt(0));
    assert_eq!(
        canonical(&CBOR::Map(map))?,
        hex::decode("a70a001864012002617a036261610481186405f406").unwrap()
    );
    Ok(())
}

#[test]
fn canonical_output_is_insertion_order_independent() -> Result<(), CBORError> {
    let mut m1 = CBORMap::new();
    m1.insert(CBOR::from("x"), CBOR::from(1u64));
    m1.insert(CBOR::from("y"), CBOR::from(2u64));
    let mut m2 = CBORMap::new();
    m2.insert(CBOR::from("y"), CBOR::from(2u64));
    m2.insert(CBOR::from("x"), CBOR::from(1u64));
    assert_eq!(canonical(&CBOR::Map(m1))?, canonical(&CBOR::Map(m2))?);

    let s1 = CBOR::Set(CBORSet::from(vec![
        CBOR::from(2u64),
        CBOR::from(1u64),
        CBOR::from(3u64),
    ]));
    let s2 = CBOR::Set(CBORSet::from(vec![
        CBOR::from(3u64),
        CBOR::from(2u64),
        CBOR::from(1u64),
    ]));
    let bytes = canonical(&s1)?;
    assert_eq!(bytes, canonical(&s2)?);
    assert_eq!(bytes, hex::decode("d9010283010203").unwrap());
    Ok(())
}

#[test]
fn canonical_duplicate_encoded_keys_rejected() {
    // Distinct items in the value model, identical bytes on the wire
    let mut map = CBORMap::new();
    map.insert(CBOR::UInt(1), CBOR::True);
    map.insert(CBOR::BigInt(BigInt::from(1)), CBOR::False);
    assert!(matches!(
        canonical(&CBOR::Map(map)),
        Err(CBORError::DuplicateMapKey)
    ));
}

#[test]
fn reencoding_noncanonical_input_is_deterministic() -> Result<(), CBORError> {
    // Oversized head, indefinite array, unsorted map: decode then re-encode canonically
    let input = hex::decode("9f1b0000000000000001bf616202616101ff38ffff").unwrap();
    let value = from_slice(&input)?;
    let bytes = canonical(&value)?;
    assert_eq!(bytes, hex::decode("8301a261610161620238ff").unwrap());
    // Round trip: the canonical bytes decode to the same value
    assert_eq!(from_slice(&bytes)?, value);
    Ok(())
}
