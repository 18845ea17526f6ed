//! EIP-712 Type Definitions
//!
//! Value types shared by the conditional-order encoder, hasher and signer.

use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

use super::encoder::{keccak256, parse_hex};

/// A 20-byte account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Build from raw bytes; anything other than exactly 20 bytes is rejected
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Eip712Error> {
        if bytes.len() > 20 {
            return Err(Eip712Error::EncodingError(format!(
                "address is {} bytes wide, at most 20 allowed",
                bytes.len()
            )));
        }
        if bytes.len() < 20 {
            return Err(Eip712Error::InvalidAddress(format!(
                "expected 20 bytes, got {}",
                bytes.len()
            )));
        }

        let mut address = [0u8; 20];
        address.copy_from_slice(bytes);
        Ok(Self(address))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 mixed-case checksum rendering
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());

        let mut result = String::with_capacity(42);
        result.push_str("0x");
        for (i, ch) in lower.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

            if ch.is_ascii_alphabetic() && nibble >= 8 {
                result.push(ch.to_ascii_uppercase());
            } else {
                result.push(ch);
            }
        }

        result
    }
}

impl FromStr for Address {
    type Err = Eip712Error;

    /// Parses a hex address, with or without `0x`. Checksum casing is not enforced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = parse_hex(s.trim()).map_err(|e| Eip712Error::InvalidAddress(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl TryFrom<String> for Address {
    type Error = Eip712Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_checksum()
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

/// A `bytes32` value. Shorter inputs are right-padded with zeros, as Solidity does
/// for fixed-size byte arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bytes32(pub [u8; 32]);

impl Bytes32 {
    pub const ZERO: Bytes32 = Bytes32([0u8; 32]);

    pub fn from_slice(bytes: &[u8]) -> Result<Self, Eip712Error> {
        if bytes.len() > 32 {
            return Err(Eip712Error::EncodingError(format!(
                "bytes32 value is {} bytes wide",
                bytes.len()
            )));
        }

        let mut value = [0u8; 32];
        value[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(value))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Bytes32 {
    type Err = Eip712Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(&parse_hex(s.trim())?)
    }
}

impl TryFrom<String> for Bytes32 {
    type Error = Eip712Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Bytes32> for String {
    fn from(value: Bytes32) -> Self {
        value.to_hex()
    }
}

impl From<[u8; 32]> for Bytes32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// The EIP-712 domain of the verifying contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    /// The human-readable name of the signing domain
    pub name: String,
    /// The current major version of the signing domain
    pub version: String,
    /// The EIP-155 chain ID
    pub chain_id: U256,
    /// The address of the contract that will verify the signature
    pub verifying_contract: Address,
}

impl Eip712Domain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id: U256::from(chain_id),
            verifying_contract,
        }
    }

    /// `hashStruct(eip712Domain)`
    pub fn separator(&self) -> [u8; 32] {
        super::hasher::domain_separator(self)
    }
}

/// How the `bytes[] conditions` member is laid out inside the `ConditionalOrder`
/// struct encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionsEncoding {
    /// A single word: `keccak256(keccak256(c0) || keccak256(c1) || ...)`
    #[default]
    Eip712,
    /// `abi.encode` of a dynamic `bytes32[]` of element hashes: an offset word in
    /// the head, then a length word and the element hashes in the tail. Matches
    /// verifiers that hash `abi.encode(..., conditionHashes)`.
    AbiDynamicArray,
}

impl FromStr for ConditionsEncoding {
    type Err = Eip712Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eip712" | "eip-712" => Ok(Self::Eip712),
            "abi-dynamic-array" | "abi" => Ok(Self::AbiDynamicArray),
            other => Err(Eip712Error::InvalidJson(format!(
                "unknown conditions encoding: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ConditionsEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionsEncoding::Eip712 => write!(f, "eip712"),
            ConditionsEncoding::AbiDynamicArray => write!(f, "abi-dynamic-array"),
        }
    }
}

/// EIP-712 signature components
#[derive(Debug, Clone, PartialEq, Eq, Zeroize)]
#[zeroize(drop)]
pub struct Eip712Signature {
    /// r component (32 bytes)
    pub r: [u8; 32],
    /// s component (32 bytes)
    pub s: [u8; 32],
    /// v component (27 or 28)
    pub v: u8,
}

impl Eip712Signature {
    /// Create from raw components
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Create from 65-byte signature (r || s || v)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Eip712Error> {
        if bytes.len() != 65 {
            return Err(Eip712Error::InvalidSignature(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[0..32]);
        s.copy_from_slice(&bytes[32..64]);
        let v = bytes[64];

        Ok(Self { r, s, v })
    }

    /// Parse a `0x`-prefixed hex signature
    pub fn from_hex(s: &str) -> Result<Self, Eip712Error> {
        let bytes = parse_hex(s.trim()).map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Convert to 65-byte representation (r || s || v)
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[0..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// The recovery id with `v` folded back to `{0, 1}`
    pub fn recovery_id(&self) -> Result<u8, Eip712Error> {
        match self.v {
            0 | 1 => Ok(self.v),
            27 | 28 => Ok(self.v - 27),
            other => Err(Eip712Error::InvalidSignature(format!(
                "unsupported v value: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Eip712Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Errors that can occur during EIP-712 operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Eip712Error {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Signing failure: {0}")]
    SigningFailure(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_address_parsing() {
        let addr: Address = "0xF510a2Ff7e9DD7e18629137adA4eb56B9c13E885".parse().unwrap();
        assert_eq!(addr.0[0], 0xF5);
        assert_eq!(addr.to_checksum(), "0xF510a2Ff7e9DD7e18629137adA4eb56B9c13E885");

        let lower: Address = "f510a2ff7e9dd7e18629137ada4eb56b9c13e885".parse().unwrap();
        assert_eq!(addr, lower);
    }

    #[test]
    fn test_address_width() {
        let wide = format!("0x{}", "ab".repeat(21));
        assert!(matches!(wide.parse::<Address>(), Err(Eip712Error::EncodingError(_))));

        let short = format!("0x{}", "ab".repeat(19));
        assert!(matches!(short.parse::<Address>(), Err(Eip712Error::InvalidAddress(_))));

        assert!(matches!("0xzz".parse::<Address>(), Err(Eip712Error::InvalidAddress(_))));
    }

    #[test]
    fn test_checksum_address() {
        let addr: Address = "0xcd2a3d9f938e13cd947ec05abc7fe734df8dd826".parse().unwrap();
        assert_eq!(addr.to_checksum(), "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826");
    }

    #[test]
    fn test_bytes32_right_padding() {
        let code = Bytes32::from_slice(b"KWENTA").unwrap();
        assert_eq!(
            code.to_hex(),
            "0x4b57454e54410000000000000000000000000000000000000000000000000000"
        );

        let parsed: Bytes32 = "0x4b57454e5441".parse().unwrap();
        assert_eq!(parsed, code);

        assert!(matches!(
            Bytes32::from_slice(&[1u8; 33]),
            Err(Eip712Error::EncodingError(_))
        ));
    }

    #[test]
    fn test_signature_conversion() {
        let sig = Eip712Signature::new([1u8; 32], [2u8; 32], 27);
        let bytes = sig.to_bytes();
        let recovered = Eip712Signature::from_bytes(&bytes).unwrap();

        assert_eq!(sig, recovered);
        assert_eq!(Eip712Signature::from_hex(&sig.to_hex()).unwrap(), sig);
        assert!(Eip712Signature::from_bytes(&bytes[..64]).is_err());
    }

    #[test]
    fn test_recovery_id_normalization() {
        assert_eq!(Eip712Signature::new([0; 32], [0; 32], 28).recovery_id().unwrap(), 1);
        assert_eq!(Eip712Signature::new([0; 32], [0; 32], 0).recovery_id().unwrap(), 0);
        assert!(Eip712Signature::new([0; 32], [0; 32], 29).recovery_id().is_err());
    }

    #[test]
    fn test_conditions_encoding_names() {
        assert_eq!("eip712".parse::<ConditionsEncoding>().unwrap(), ConditionsEncoding::Eip712);
        assert_eq!(
            "abi-dynamic-array".parse::<ConditionsEncoding>().unwrap(),
            ConditionsEncoding::AbiDynamicArray
        );
        assert!("personal".parse::<ConditionsEncoding>().is_err());
    }
}
