//! EIP-712 Conditional Order Signing
//!
//! Hashing and signing of the `ConditionalOrder` / `OrderDetails` typed-data
//! structs accepted by the perps conditional-order engine.
//!
//! # Reference
//! - <https://eips.ethereum.org/EIPS/eip-712>
//!
//! # Example
//! ```rust,ignore
//! use conditional_order_signer::eip712::{sign_conditional_order, ConditionalOrder};
//!
//! let signature = sign_conditional_order(&private_key, &domain_separator, &order)?;
//! println!("{}", signature.to_hex());
//! ```

pub mod types;
pub mod order;
pub mod encoder;
pub mod hasher;
pub mod signer;

pub use types::*;
pub use order::*;
pub use encoder::*;
pub use hasher::*;
pub use signer::*;
