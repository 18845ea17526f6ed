//! EIP-712 Struct Encoding
//!
//! Implements `encodeData` for the conditional-order structs. Every member is
//! a single 32-byte word; nested structs and dynamic members contribute
//! their hash.

use super::order::{conditional_order_type, ConditionalOrder, OrderDetails, ORDER_DETAILS_TYPE};
use super::types::*;
use ethers_core::types::{I256, U256};
use tiny_keccak::{Hasher, Keccak};

/// One ABI word
pub type Word = [u8; 32];

lazy_static::lazy_static! {
    /// keccak256 of [`ORDER_DETAILS_TYPE`]
    pub static ref ORDER_DETAILS_TYPEHASH: Word = keccak256(ORDER_DETAILS_TYPE.as_bytes());

    /// keccak256 of `encodeType(ConditionalOrder)`
    pub static ref CONDITIONAL_ORDER_TYPEHASH: Word =
        keccak256(conditional_order_type().as_bytes());
}

/// Head size of the `ConditionalOrder` encoding; the offset of the conditions
/// tail under [`ConditionsEncoding::AbiDynamicArray`].
const CONDITIONAL_ORDER_HEAD_WORDS: u64 = 8;

/// Encode `OrderDetails` as `typeHash || encodeData(s)`
pub fn encode_order_details(details: &OrderDetails) -> Result<Vec<u8>, Eip712Error> {
    let mut encoded = Vec::with_capacity(9 * 32);

    encoded.extend_from_slice(&*ORDER_DETAILS_TYPEHASH);
    encoded.extend_from_slice(&encode_uint(&details.market_id, 128, "marketId")?);
    encoded.extend_from_slice(&encode_uint(&details.account_id, 128, "accountId")?);
    encoded.extend_from_slice(&encode_int(&details.size_delta, 128, "sizeDelta")?);
    encoded.extend_from_slice(&encode_uint(
        &details.settlement_strategy_id,
        128,
        "settlementStrategyId",
    )?);
    encoded.extend_from_slice(&encode_uint(&details.acceptable_price, 256, "acceptablePrice")?);
    encoded.extend_from_slice(&encode_bool(details.is_reduce_only));
    encoded.extend_from_slice(&encode_bytes32(&details.tracking_code));
    encoded.extend_from_slice(&encode_address(&details.referrer));

    Ok(encoded)
}

/// Encode `ConditionalOrder` as `typeHash || encodeData(s)`.
///
/// The nested `OrderDetails` is replaced by its struct hash.
pub fn encode_conditional_order(
    order: &ConditionalOrder,
    encoding: ConditionsEncoding,
) -> Result<Vec<u8>, Eip712Error> {
    let order_details_hash = keccak256(&encode_order_details(&order.order_details)?);

    let mut encoded = Vec::with_capacity((CONDITIONAL_ORDER_HEAD_WORDS as usize + 2) * 32);
    encoded.extend_from_slice(&*CONDITIONAL_ORDER_TYPEHASH);
    encoded.extend_from_slice(&order_details_hash);
    encoded.extend_from_slice(&encode_address(&order.signer));
    encoded.extend_from_slice(&encode_uint(&order.nonce, 256, "nonce")?);
    encoded.extend_from_slice(&encode_bool(order.require_verified));
    encoded.extend_from_slice(&encode_address(&order.trusted_executor));
    encoded.extend_from_slice(&encode_uint(&order.max_executor_fee, 256, "maxExecutorFee")?);

    match encoding {
        ConditionsEncoding::Eip712 => {
            encoded.extend_from_slice(&hash_conditions(&order.conditions));
        }
        ConditionsEncoding::AbiDynamicArray => {
            let offset = U256::from(CONDITIONAL_ORDER_HEAD_WORDS * 32);
            let length = U256::from(order.conditions.len() as u64);
            encoded.extend_from_slice(&encode_uint(&offset, 256, "conditions.offset")?);
            encoded.extend_from_slice(&encode_uint(&length, 256, "conditions.length")?);
            for condition in &order.conditions {
                encoded.extend_from_slice(&keccak256(condition));
            }
        }
    }

    Ok(encoded)
}

/// Encode a `bytes[]` member: the hash of the concatenated element hashes.
/// An empty list hashes the empty byte string.
pub fn hash_conditions(conditions: &[Vec<u8>]) -> Word {
    let mut concatenated = Vec::with_capacity(conditions.len() * 32);
    for condition in conditions {
        concatenated.extend_from_slice(&keccak256(condition));
    }
    keccak256(&concatenated)
}

/// Encode a `uint<bits>` value, left-padded
pub fn encode_uint(value: &U256, bits: usize, field: &str) -> Result<Word, Eip712Error> {
    if value.bits() > bits {
        return Err(Eip712Error::EncodingError(format!(
            "{} does not fit in uint{}: {}",
            field, bits, value
        )));
    }

    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    Ok(word)
}

/// Encode an `int<bits>` value as sign-extended two's complement
pub fn encode_int(value: &I256, bits: usize, field: &str) -> Result<Word, Eip712Error> {
    if bits < 256 {
        let bound = I256::from_raw(U256::one() << (bits - 1));
        if *value < -bound || *value >= bound {
            return Err(Eip712Error::EncodingError(format!(
                "{} does not fit in int{}: {}",
                field, bits, value
            )));
        }
    }

    let mut word = [0u8; 32];
    value.into_raw().to_big_endian(&mut word);
    Ok(word)
}

/// address - 20 bytes, left-padded to 32
pub fn encode_address(address: &Address) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

pub fn encode_bool(value: bool) -> Word {
    let mut word = [0u8; 32];
    word[31] = u8::from(value);
    word
}

pub fn encode_bytes32(value: &Bytes32) -> Word {
    *value.as_bytes()
}

/// Parse an unsigned integer from a decimal or `0x`-hex string
pub fn parse_uint(s: &str) -> Result<U256, Eip712Error> {
    let s = s.trim();
    require_digits(strip_hex_prefix(s).unwrap_or(s), s, "uint256")?;
    let parsed = match strip_hex_prefix(s) {
        Some(hex_digits) => U256::from_str_radix(hex_digits, 16).map_err(|e| e.to_string()),
        None => U256::from_dec_str(s).map_err(|e| e.to_string()),
    };

    parsed.map_err(|e| Eip712Error::EncodingError(format!("invalid uint256 {:?}: {}", s, e)))
}

/// Parse a signed integer from a decimal string (optionally negative) or a
/// `0x`-hex magnitude
pub fn parse_int(s: &str) -> Result<I256, Eip712Error> {
    let s = s.trim();
    let magnitude = s.strip_prefix('-').unwrap_or(s);
    require_digits(strip_hex_prefix(magnitude).unwrap_or(magnitude), s, "int256")?;
    let parsed = match strip_hex_prefix(s) {
        Some(_) => I256::from_hex_str(s).map_err(|e| e.to_string()),
        None => I256::from_dec_str(s).map_err(|e| e.to_string()),
    };

    parsed.map_err(|e| Eip712Error::EncodingError(format!("invalid int256 {:?}: {}", s, e)))
}

// The ethers-core parsers read "" and "0x" as zero
fn require_digits(digits: &str, input: &str, kind: &str) -> Result<(), Eip712Error> {
    if digits.is_empty() {
        return Err(Eip712Error::EncodingError(format!("invalid {} {:?}: no digits", kind, input)));
    }
    Ok(())
}

/// Parse a hex string (with or without 0x prefix)
pub fn parse_hex(s: &str) -> Result<Vec<u8>, Eip712Error> {
    let digits = strip_hex_prefix(s).unwrap_or(s);

    hex::decode(digits).map_err(|e| Eip712Error::EncodingError(format!("invalid hex: {}", e)))
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

/// Compute keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}
