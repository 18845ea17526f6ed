//! Conditional Order Signer
//!
//! EIP-712 hashing and signing of perps `ConditionalOrder` messages.
//!
//! # Architecture
//!
//! This crate provides:
//! - **eip712**: type hashes, struct encoding, digests, signing and recovery
//! - **request**: JSON signing requests and their outcomes
//! - **error**: serializable error type for the CLI boundary
//! - **utils::logging**: structured stderr logging with redaction
//!
//! # Security
//!
//! Private keys are held in `zeroize` wrappers and erased when dropped. They
//! never appear in log output or `Debug` renderings.
//!
//! # Example
//!
//! ```rust,ignore
//! use conditional_order_signer::SigningRequest;
//!
//! let request = SigningRequest::load(Path::new("order.json"))?;
//! let outcome = request.prepare(None)?.sign(ConditionsEncoding::Eip712)?;
//! println!("{}", outcome.signature);
//! ```

pub mod error;
pub mod eip712;
pub mod request;
pub mod utils;

pub use error::{ErrorCode, SignerError, SignerResult};
pub use eip712::{
    address_from_private_key, get_pre_image, hash_typed_data, recover_address,
    sign_conditional_order, sign_conditional_order_pre_image, sign_conditional_order_with,
    sign_conditional_order_with_domain,
    sign_hash, verify_conditional_order, verify_signature, Address, Bytes32, ConditionalOrder,
    ConditionsEncoding, Eip712Domain, Eip712Error, Eip712PreImage, Eip712Signature, OrderDetails,
};
pub use request::{PreparedRequest, SecretHex, SigningOutcome, SigningRequest};
