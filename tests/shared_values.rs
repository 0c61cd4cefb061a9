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
 * Shared value (tags 28/29) encode and decode
 **************************************************************************************************/

use std::rc::Rc;

use fullcbor::constants::MT_ARRAY;
use fullcbor::decoder::from_slice;
use fullcbor::encoder::{make_shareable, to_vec, to_vec_with, CBOREncoder, EncodeOptions};
use fullcbor::error::CBORError;
use fullcbor::types::CBOR;

fn sharing() -> EncodeOptions {
    EncodeOptions::new().value_sharing(true)
}

#[test]
fn cyclic_list_round_trips() -> Result<(), CBORError> {
    // L = [L]: the shareable mark owns the list, the reference closes the cycle
    let value = CBOR::Shareable(Box::new(CBOR::Array(vec![CBOR::SharedRef(0)])));
    let bytes = to_vec_with(&value, sharing())?;
    assert_eq!(bytes, hex::decode("d81c81d81d00").unwrap());
    assert_eq!(from_slice(&bytes)?, value);
    Ok(())
}

#[test]
fn nested_shareables_number_in_start_order() -> Result<(), CBORError> {
    let value = CBOR::Shareable(Box::new(CBOR::Array(vec![
        CBOR::Shareable(Box::new(CBOR::Array(vec![]))),
        CBOR::SharedRef(0),
        CBOR::SharedRef(1),
    ])));
    let bytes = to_vec_with(&value, sharing())?;
    assert_eq!(bytes, hex::decode("d81c83d81c80d81d00d81d01").unwrap());
    assert_eq!(from_slice(&bytes)?, value);
    Ok(())
}

#[test]
fn sharing_disabled_is_transparent_or_fails() {
    // A bare shareable mark degrades to its payload
    let value = CBOR::Shareable(Box::new(CBOR::Array(vec![CBOR::UInt(1)])));
    assert_eq!(to_vec(&value).unwrap(), hex::decode("8101").unwrap());

    // A reference cannot be expressed without sharing: that is the cyclic error
    let value = CBOR::Shareable(Box::new(CBOR::Array(vec![CBOR::SharedRef(0)])));
    assert!(matches!(
        to_vec(&value),
        Err(CBORError::CyclicStructure)
    ));
}

#[test]
fn reference_must_follow_its_shareable() {
    // Encode side: the referenced slot must already be started
    let value = CBOR::Array(vec![
        CBOR::SharedRef(0),
        CBOR::Shareable(Box::new(CBOR::UInt(1))),
    ]);
    assert!(matches!(
        to_vec_with(&value, sharing()),
        Err(CBORError::ValueError(_))
    ));

    // Decode side: same rule, surfaced as an out of range reference
    assert!(matches!(
        from_slice(&hex::decode("d81d00").unwrap()),
        Err(CBORError::SharedRefOutOfRange(0))
    ));
    assert!(matches!(
        from_slice(&hex::decode("82d81d00d81c01").unwrap()),
        Err(CBORError::SharedRefOutOfRange(0))
    ));
}

#[test]
fn forward_sharing_of_a_completed_value() -> Result<(), CBORError> {
    let value = CBOR::Array(vec![
        CBOR::Shareable(Box::new(CBOR::from("x"))),
        CBOR::SharedRef(0),
    ]);
    let bytes = to_vec_with(&value, sharing())?;
    assert_eq!(bytes, hex::decode("82d81c6178d81d00").unwrap());
    assert_eq!(from_slice(&bytes)?, value);
    Ok(())
}

#[test]
fn shareable_encoder_wrapper_uses_identity() -> Result<(), CBORError> {
    struct Doc {
        a: Rc<Vec<String>>,
        b: Rc<Vec<String>>,
    }

    let mut enc = CBOREncoder::new(Vec::new(), sharing())?;
    enc.register(|enc: &mut CBOREncoder<Vec<u8>>, d: &Doc| {
        enc.write_head(MT_ARRAY, 2)?;
        enc.insert_any(d.a.as_ref())?;
        enc.insert_any(d.b.as_ref())
    });
    enc.register(make_shareable(
        |enc: &mut CBOREncoder<Vec<u8>>, v: &Vec<String>| {
            enc.write_head(MT_ARRAY, v.len() as u64)?;
            for s in v {
                enc.insert(&CBOR::from(s.as_str()))?;
            }
            Ok(())
        },
    ));

    let shared = Rc::new(vec!["hello".to_owned()]);
    let doc = Doc {
        a: shared.clone(),
        b: shared,
    };
    enc.encode_any(&doc)?;
    // First occurrence emits tag 28 and the list, the second only tag 29 + index
    assert_eq!(
        enc.into_inner(),
        hex::decode("82d81c816568656c6c6fd81d00").unwrap()
    );
    Ok(())
}
