use hex_literal::hex;
use mintrecon_format::{Address, Data};

/// tryAggregate(bool,(address,bytes)[])
const TRY_AGGREGATE_SELECTOR: [u8; 4] = hex!("bce38bd7");
/// balanceOf(address)
const BALANCE_OF_SELECTOR: [u8; 4] = hex!("70a08231");

const WORD: usize = 32;

/// Calldata for `balanceOf(owner)`.
pub fn balance_of(owner: &Address) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&BALANCE_OF_SELECTOR);
    data.extend_from_slice(&[0; 12]);
    data.extend_from_slice(owner.as_slice());

    data
}

/// Calldata for `tryAggregate(false, calls)`.
///
/// `requireSuccess` stays false so one reverting sub-call doesn't revert
/// the whole aggregate; failures surface per item in the return value.
pub fn encode_try_aggregate(calls: &[(Address, Vec<u8>)]) -> Data {
    let mut out = Vec::new();
    out.extend_from_slice(&TRY_AGGREGATE_SELECTOR);

    out.extend_from_slice(&encode_word(0));
    // the calls array starts right after the two argument head words
    out.extend_from_slice(&encode_word(2 * WORD as u64));

    out.extend_from_slice(&encode_word(calls.len() as u64));

    // element offsets are relative to the start of the element area
    let mut offset = calls.len() * WORD;
    for (_, data) in calls.iter() {
        out.extend_from_slice(&encode_word(offset as u64));
        offset += 3 * WORD + pad32(data.len());
    }

    for (target, data) in calls.iter() {
        out.extend_from_slice(&[0; 12]);
        out.extend_from_slice(target.as_slice());
        out.extend_from_slice(&encode_word(2 * WORD as u64));
        out.extend_from_slice(&encode_word(data.len() as u64));
        out.extend_from_slice(data);
        out.resize(out.len() + pad32(data.len()) - data.len(), 0);
    }

    out.into()
}

/// Splits a `tryAggregate` return into per call return payloads.
///
/// Failed sub-calls come back as `None`; a malformed element never
/// poisons its neighbours. Returns `None` only when the envelope itself
/// doesn't decode or the element count is off.
pub fn decode_try_aggregate(data: &[u8], expected: usize) -> Option<Vec<Option<Vec<u8>>>> {
    let array_offset = read_usize(data, 0)?;
    let array = data.get(array_offset..)?;

    let count = read_usize(array, 0)?;
    if count != expected {
        return None;
    }

    let elements = array.get(WORD..)?;

    Some(
        (0..count)
            .map(|i| decode_result_item(elements, i))
            .collect(),
    )
}

/// A decoded `balanceOf` return, true when the balance is nonzero.
pub fn decode_holds(ret: &[u8]) -> Option<bool> {
    if ret.len() != WORD {
        return None;
    }

    Some(ret.iter().any(|b| *b != 0))
}

fn decode_result_item(elements: &[u8], i: usize) -> Option<Vec<u8>> {
    let offset = read_usize(elements, i * WORD)?;
    let tuple = elements.get(offset..)?;

    let success = read_usize(tuple, 0)?;
    if success == 0 {
        return None;
    }

    let data_offset = read_usize(tuple, WORD)?;
    let bytes = tuple.get(data_offset..)?;

    let len = read_usize(bytes, 0)?;

    bytes.get(WORD..WORD + len).map(|b| b.to_vec())
}

fn pad32(len: usize) -> usize {
    (len + WORD - 1) / WORD * WORD
}

fn encode_word(val: u64) -> [u8; WORD] {
    let mut word = [0; WORD];
    word[WORD - 8..].copy_from_slice(&val.to_be_bytes());

    word
}

fn read_usize(data: &[u8], at: usize) -> Option<usize> {
    let word = data.get(at..at + WORD)?;

    // offsets and lengths never come anywhere near 2^64 in a sane response
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return None;
    }

    let mut buf = [0; 8];
    buf.copy_from_slice(&word[WORD - 8..]);

    usize::try_from(u64::from_be_bytes(buf)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: [u8; 20] = hex!("1a2b3c4d5e6f70819283a4b5c6d7e8f901234567");
    const OWNER: [u8; 20] = hex!("00000000000000000000000000000000000000aa");

    /// Builds a `tryAggregate` return payload for single-word results.
    fn encode_response(items: &[Option<[u8; 32]>]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&encode_word(WORD as u64));
        out.extend_from_slice(&encode_word(items.len() as u64));

        let mut offset = items.len() * WORD;
        for item in items.iter() {
            out.extend_from_slice(&encode_word(offset as u64));
            offset += 3 * WORD + item.map(|_| WORD).unwrap_or(0);
        }

        for item in items.iter() {
            match item {
                Some(word) => {
                    out.extend_from_slice(&encode_word(1));
                    out.extend_from_slice(&encode_word(2 * WORD as u64));
                    out.extend_from_slice(&encode_word(WORD as u64));
                    out.extend_from_slice(word);
                }
                None => {
                    out.extend_from_slice(&encode_word(0));
                    out.extend_from_slice(&encode_word(2 * WORD as u64));
                    out.extend_from_slice(&encode_word(0));
                }
            }
        }

        out
    }

    #[test]
    fn test_balance_of_shape() {
        let data = balance_of(&OWNER.into());

        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &BALANCE_OF_SELECTOR);
        assert_eq!(&data[16..], &OWNER);
    }

    #[test]
    fn test_encode_try_aggregate_shape() {
        let calls = vec![
            (TOKEN.into(), balance_of(&OWNER.into())),
            (TOKEN.into(), balance_of(&OWNER.into())),
        ];

        let data = encode_try_aggregate(&calls);

        assert_eq!(&data[..4], &TRY_AGGREGATE_SELECTOR);

        let body = &data[4..];
        // requireSuccess = false
        assert_eq!(read_usize(body, 0).unwrap(), 0);
        // array offset points at the length word
        let array = &body[read_usize(body, WORD).unwrap()..];
        assert_eq!(read_usize(array, 0).unwrap(), 2);

        // each element offset lands on its target address word
        let elements = &array[WORD..];
        for (i, (target, call)) in calls.iter().enumerate() {
            let offset = read_usize(elements, i * WORD).unwrap();
            let tuple = &elements[offset..];

            assert_eq!(&tuple[12..WORD], target.as_slice());
            assert_eq!(read_usize(tuple, 2 * WORD).unwrap(), call.len());
            assert_eq!(&tuple[3 * WORD..3 * WORD + call.len()], call.as_slice());
        }
    }

    #[test]
    fn test_decode_round_trip() {
        let one = encode_word(1);
        let zero = encode_word(0);

        let resp = encode_response(&[Some(one), None, Some(zero)]);

        let items = decode_try_aggregate(&resp, 3).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_deref().and_then(decode_holds), Some(true));
        assert!(items[1].is_none());
        assert_eq!(items[2].as_deref().and_then(decode_holds), Some(false));
    }

    #[test]
    fn test_malformed_item_does_not_poison_group() {
        let one = encode_word(1);

        let mut resp = encode_response(&[Some(one), Some(one)]);
        // point the second element past the end of the payload
        let second_offset = WORD * 3;
        resp[second_offset..second_offset + WORD].copy_from_slice(&encode_word(1 << 20));

        let items = decode_try_aggregate(&resp, 2).unwrap();

        assert_eq!(items[0].as_deref().and_then(decode_holds), Some(true));
        assert!(items[1].is_none());
    }

    #[test]
    fn test_count_mismatch_rejects_envelope() {
        let resp = encode_response(&[Some(encode_word(1))]);

        assert!(decode_try_aggregate(&resp, 2).is_none());
    }

    #[test]
    fn test_truncated_envelope() {
        assert!(decode_try_aggregate(&[0; 16], 1).is_none());
    }
}
