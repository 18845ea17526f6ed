//! EIP-712 Hashing
//!
//! Implements domain separator, struct hashing and the final signing digest.

use super::encoder::{encode_address, encode_conditional_order, encode_order_details, keccak256};
use super::order::{ConditionalOrder, OrderDetails};
use super::types::*;

/// Magic prefix for EIP-712 encoding
const EIP712_PREFIX: &[u8] = b"\x19\x01";

/// Type string of the four-field domain struct
pub const EIP712_DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

lazy_static::lazy_static! {
    pub static ref EIP712_DOMAIN_TYPEHASH: [u8; 32] = keccak256(EIP712_DOMAIN_TYPE.as_bytes());
}

/// Calculate the domain separator hash
///
/// domainSeparator = hashStruct(eip712Domain)
pub fn domain_separator(domain: &Eip712Domain) -> [u8; 32] {
    let mut encoded = Vec::with_capacity(5 * 32);

    encoded.extend_from_slice(&*EIP712_DOMAIN_TYPEHASH);
    encoded.extend_from_slice(&keccak256(domain.name.as_bytes()));
    encoded.extend_from_slice(&keccak256(domain.version.as_bytes()));
    let mut chain_id = [0u8; 32];
    domain.chain_id.to_big_endian(&mut chain_id);
    encoded.extend_from_slice(&chain_id);
    encoded.extend_from_slice(&encode_address(&domain.verifying_contract));

    keccak256(&encoded)
}

/// hashStruct(orderDetails) = keccak256(typeHash || encodeData(s))
pub fn hash_order_details(details: &OrderDetails) -> Result<[u8; 32], Eip712Error> {
    Ok(keccak256(&encode_order_details(details)?))
}

/// hashStruct(conditionalOrder) = keccak256(typeHash || encodeData(s))
pub fn hash_conditional_order(
    order: &ConditionalOrder,
    encoding: ConditionsEncoding,
) -> Result<[u8; 32], Eip712Error> {
    Ok(keccak256(&encode_conditional_order(order, encoding)?))
}

/// Calculate the final EIP-712 hash for signing
///
/// hash = keccak256("\x19\x01" || domainSeparator || structHash)
pub fn typed_data_digest(domain_separator: &[u8; 32], struct_hash: &[u8; 32]) -> [u8; 32] {
    let mut data = Vec::with_capacity(2 + 32 + 32);
    data.extend_from_slice(EIP712_PREFIX);
    data.extend_from_slice(domain_separator);
    data.extend_from_slice(struct_hash);

    keccak256(&data)
}

/// Get the pre-image components (for external signing)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712PreImage {
    pub domain_separator: [u8; 32],
    pub struct_hash: [u8; 32],
    pub final_hash: [u8; 32],
}

/// Calculate the pre-image components for a conditional order
pub fn get_pre_image(
    domain_separator: &[u8; 32],
    order: &ConditionalOrder,
    encoding: ConditionsEncoding,
) -> Result<Eip712PreImage, Eip712Error> {
    let struct_hash = hash_conditional_order(order, encoding)?;
    let final_hash = typed_data_digest(domain_separator, &struct_hash);

    Ok(Eip712PreImage {
        domain_separator: *domain_separator,
        struct_hash,
        final_hash,
    })
}

/// The digest of `order` under the standard encoding
pub fn hash_typed_data(
    domain_separator: &[u8; 32],
    order: &ConditionalOrder,
) -> Result<[u8; 32], Eip712Error> {
    Ok(get_pre_image(domain_separator, order, ConditionsEncoding::Eip712)?.final_hash)
}

#[cfg(test)]
mod hasher_tests {
    use super::*;

    fn mail_domain() -> Eip712Domain {
        Eip712Domain::new(
            "Ether Mail",
            "1",
            1,
            "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC".parse().unwrap(),
        )
    }

    #[test]
    fn test_domain_typehash() {
        assert_eq!(
            hex::encode(*EIP712_DOMAIN_TYPEHASH),
            "8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f"
        );
    }

    #[test]
    fn test_domain_separator_mail() {
        // Domain separator of the reference "Ether Mail" example
        assert_eq!(
            hex::encode(mail_domain().separator()),
            "f2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f"
        );
    }

    #[test]
    fn test_domain_separator_changes_with_chain() {
        let mut other = mail_domain();
        other.chain_id = 10u64.into();
        assert_ne!(domain_separator(&mail_domain()), domain_separator(&other));
    }

    #[test]
    fn test_typed_data_digest_layout() {
        let separator = [0x11u8; 32];
        let struct_hash = [0x22u8; 32];

        let mut payload = vec![0x19, 0x01];
        payload.extend_from_slice(&separator);
        payload.extend_from_slice(&struct_hash);
        assert_eq!(payload.len(), 66);

        assert_eq!(typed_data_digest(&separator, &struct_hash), keccak256(&payload));
    }
}
