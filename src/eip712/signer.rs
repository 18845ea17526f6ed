//! EIP-712 Signing
//!
//! ECDSA signing and verification of conditional-order digests. There is one
//! signing path, [`sign_hash`]; every other entry point computes a digest and
//! hands it over.

use super::hasher::{get_pre_image, Eip712PreImage};
use super::order::ConditionalOrder;
use super::types::*;
use crate::{log_debug, log_warn};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroizing;

const MODULE: &str = "eip712::signer";

/// A secp256k1 secret key that is erased when it goes out of scope.
struct SigningKey(SecretKey);

impl SigningKey {
    fn from_slice(private_key: &[u8]) -> Result<Self, Eip712Error> {
        if private_key.len() != 32 {
            return Err(Eip712Error::InvalidKey(format!(
                "invalid private key length: expected 32, got {}",
                private_key.len()
            )));
        }

        let mut bytes = Zeroizing::new([0u8; 32]);
        bytes.copy_from_slice(private_key);

        // Rejects zero and values not below the curve order
        SecretKey::from_slice(bytes.as_ref())
            .map(Self)
            .map_err(|e| Eip712Error::InvalidKey(e.to_string()))
    }

    fn secret(&self) -> &SecretKey {
        &self.0
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.0.non_secure_erase();
    }
}

/// Sign a conditional order against a precomputed domain separator.
///
/// The digest is signed directly, without a personal-message prefix, and `v`
/// is returned as 27 or 28.
pub fn sign_conditional_order(
    private_key: &[u8],
    domain_separator: &[u8; 32],
    order: &ConditionalOrder,
) -> Result<Eip712Signature, Eip712Error> {
    sign_conditional_order_with(private_key, domain_separator, order, ConditionsEncoding::Eip712)
}

/// Sign a conditional order using the given `conditions` layout
pub fn sign_conditional_order_with(
    private_key: &[u8],
    domain_separator: &[u8; 32],
    order: &ConditionalOrder,
    encoding: ConditionsEncoding,
) -> Result<Eip712Signature, Eip712Error> {
    sign_conditional_order_pre_image(private_key, domain_separator, order, encoding)
        .map(|(_, signature)| signature)
}

/// Sign a conditional order and also return the pre-image the signature
/// covers
pub fn sign_conditional_order_pre_image(
    private_key: &[u8],
    domain_separator: &[u8; 32],
    order: &ConditionalOrder,
    encoding: ConditionsEncoding,
) -> Result<(Eip712PreImage, Eip712Signature), Eip712Error> {
    let key = SigningKey::from_slice(private_key)?;

    let pre_image = get_pre_image(domain_separator, order, encoding)?;
    warn_on_signer_mismatch(&key, order);

    log_debug!(
        MODULE,
        "signing conditional order",
        digest = hex::encode(pre_image.final_hash),
        encoding = encoding,
        signer = order.signer,
    );

    let signature = sign_with_key(&pre_image.final_hash, &key)?;
    Ok((pre_image, signature))
}

/// Sign a conditional order, computing the domain separator from `domain`
pub fn sign_conditional_order_with_domain(
    private_key: &[u8],
    domain: &Eip712Domain,
    order: &ConditionalOrder,
) -> Result<Eip712Signature, Eip712Error> {
    sign_conditional_order(private_key, &domain.separator(), order)
}

/// Sign a pre-computed 32-byte digest
pub fn sign_hash(hash: &[u8], private_key: &[u8]) -> Result<Eip712Signature, Eip712Error> {
    let key = SigningKey::from_slice(private_key)?;
    sign_with_key(hash, &key)
}

fn sign_with_key(hash: &[u8], key: &SigningKey) -> Result<Eip712Signature, Eip712Error> {
    let secp = Secp256k1::signing_only();

    let message = Message::from_digest_slice(hash)
        .map_err(|e| Eip712Error::SigningFailure(e.to_string()))?;

    // RFC 6979 nonces, low-s normalized
    let (recovery_id, signature) = secp
        .sign_ecdsa_recoverable(&message, key.secret())
        .serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature[0..32]);
    s.copy_from_slice(&signature[32..64]);

    let v = u8::try_from(recovery_id.to_i32())
        .map_err(|e| Eip712Error::SigningFailure(e.to_string()))?
        + 27;

    Ok(Eip712Signature::new(r, s, v))
}

fn warn_on_signer_mismatch(key: &SigningKey, order: &ConditionalOrder) {
    let secp = Secp256k1::signing_only();
    let derived = public_key_to_address(&PublicKey::from_secret_key(&secp, key.secret()));

    if derived != order.signer {
        log_warn!(
            MODULE,
            "order signer does not match signing key; verifiers will reject this signature",
            signer = order.signer,
            key_address = derived,
        );
    }
}

/// Derive the account address controlled by `private_key`
pub fn address_from_private_key(private_key: &[u8]) -> Result<Address, Eip712Error> {
    let key = SigningKey::from_slice(private_key)?;
    let secp = Secp256k1::signing_only();
    Ok(public_key_to_address(&PublicKey::from_secret_key(&secp, key.secret())))
}

/// Recover the signer's address from a signature.
///
/// Accepts `v` as either 0/1 or 27/28.
pub fn recover_address(hash: &[u8; 32], signature: &Eip712Signature) -> Result<Address, Eip712Error> {
    let secp = Secp256k1::verification_only();

    let recovery_id = RecoveryId::from_i32(i32::from(signature.recovery_id()?))
        .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[0..32].copy_from_slice(&signature.r);
    sig_bytes[32..64].copy_from_slice(&signature.s);

    let recoverable_sig = RecoverableSignature::from_compact(&sig_bytes, recovery_id)
        .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;

    let message = Message::from_digest(*hash);

    let public_key = secp
        .recover_ecdsa(&message, &recoverable_sig)
        .map_err(|e| Eip712Error::InvalidSignature(e.to_string()))?;

    Ok(public_key_to_address(&public_key))
}

/// Verify a signature against a hash and expected address
pub fn verify_signature(
    hash: &[u8; 32],
    signature: &Eip712Signature,
    expected_address: &Address,
) -> Result<bool, Eip712Error> {
    Ok(recover_address(hash, signature)? == *expected_address)
}

/// Verify that `signature` over `order` recovers to `order.signer`
pub fn verify_conditional_order(
    domain_separator: &[u8; 32],
    order: &ConditionalOrder,
    signature: &Eip712Signature,
    encoding: ConditionsEncoding,
) -> Result<bool, Eip712Error> {
    let Eip712PreImage { final_hash, .. } = get_pre_image(domain_separator, order, encoding)?;
    verify_signature(&final_hash, signature, &order.signer)
}

/// Convert a secp256k1 public key to an account address
fn public_key_to_address(public_key: &PublicKey) -> Address {
    // Uncompressed key without the 0x04 tag
    let pubkey_bytes = public_key.serialize_uncompressed();
    let hash = super::encoder::keccak256(&pubkey_bytes[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    Address(address)
}

#[cfg(test)]
mod signer_tests {
    use super::*;

    const KEY: [u8; 32] = [0x11; 32];

    #[test]
    fn test_address_from_private_key() {
        let address = address_from_private_key(&KEY).unwrap();
        assert_eq!(address.to_checksum(), "0x19E7E376E7C213B7E7e7e46cc70A5dD086DAff2A");
    }

    #[test]
    fn test_invalid_keys() {
        assert!(matches!(sign_hash(&[0u8; 32], &[0u8; 32]), Err(Eip712Error::InvalidKey(_))));
        assert!(matches!(sign_hash(&[0u8; 32], &[0x11u8; 31]), Err(Eip712Error::InvalidKey(_))));

        // The curve order itself is out of range
        let order =
            hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141").unwrap();
        assert!(matches!(sign_hash(&[0u8; 32], &order), Err(Eip712Error::InvalidKey(_))));
    }

    #[test]
    fn test_invalid_digest_length() {
        assert!(matches!(
            sign_hash(&[0u8; 31], &KEY),
            Err(Eip712Error::SigningFailure(_))
        ));
    }

    #[test]
    fn test_sign_and_recover_hash() {
        let hash = super::super::encoder::keccak256(b"conditional order");
        let signature = sign_hash(&hash, &KEY).unwrap();

        assert!(signature.v == 27 || signature.v == 28);
        let recovered = recover_address(&hash, &signature).unwrap();
        assert_eq!(recovered, address_from_private_key(&KEY).unwrap());

        // Same recovery with v folded to 0/1
        let raw_v = Eip712Signature::new(signature.r, signature.s, signature.v - 27);
        assert_eq!(recover_address(&hash, &raw_v).unwrap(), recovered);

        assert!(verify_signature(&hash, &signature, &recovered).unwrap());
        assert!(!verify_signature(&hash, &signature, &Address::ZERO).unwrap());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let hash = [0x42u8; 32];
        assert_eq!(sign_hash(&hash, &KEY).unwrap(), sign_hash(&hash, &KEY).unwrap());
    }
}
