//! Conditional Order Structs
//!
//! The two typed-data structs signed by this crate. Field order here is the
//! field order of the struct encoding and must not change.

use ethers_core::types::{I256, U256};

use super::hasher::{hash_conditional_order, hash_order_details};
use super::signer::address_from_private_key;
use super::types::*;

/// `OrderDetails` type string
pub const ORDER_DETAILS_TYPE: &str = "OrderDetails(uint128 marketId,uint128 accountId,int128 sizeDelta,uint128 settlementStrategyId,uint256 acceptablePrice,bool isReduceOnly,bytes32 trackingCode,address referrer)";

/// `ConditionalOrder` struct definition, without its referenced types
pub const CONDITIONAL_ORDER_PRIMARY_TYPE: &str = "ConditionalOrder(OrderDetails orderDetails,address signer,uint256 nonce,bool requireVerified,address trustedExecutor,uint256 maxExecutorFee,bytes[] conditions)";

/// Full `encodeType(ConditionalOrder)`: the primary struct followed by the
/// referenced `OrderDetails` struct.
pub fn conditional_order_type() -> String {
    format!("{}{}", CONDITIONAL_ORDER_PRIMARY_TYPE, ORDER_DETAILS_TYPE)
}

/// The order that is executed once the conditions hold.
///
/// Integer members are held at 256 bits so out-of-range values can be
/// represented; widths are enforced when the struct is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    /// uint128
    pub market_id: U256,
    /// uint128
    pub account_id: U256,
    /// int128
    pub size_delta: I256,
    /// uint128
    pub settlement_strategy_id: U256,
    /// uint256
    pub acceptable_price: U256,
    pub is_reduce_only: bool,
    pub tracking_code: Bytes32,
    pub referrer: Address,
}

impl OrderDetails {
    /// `hashStruct(orderDetails)`
    pub fn struct_hash(&self) -> Result<[u8; 32], Eip712Error> {
        hash_order_details(self)
    }
}

/// An order that a trusted executor may submit on the signer's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalOrder {
    pub order_details: OrderDetails,
    /// Address expected to have produced the signature
    pub signer: Address,
    pub nonce: U256,
    pub require_verified: bool,
    pub trusted_executor: Address,
    pub max_executor_fee: U256,
    /// Opaque condition payloads; order is significant
    pub conditions: Vec<Vec<u8>>,
}

impl ConditionalOrder {
    /// Build an order whose `signer` is the address of `private_key`.
    pub fn for_signer(
        private_key: &[u8],
        order_details: OrderDetails,
        nonce: U256,
        require_verified: bool,
        trusted_executor: Address,
        max_executor_fee: U256,
        conditions: Vec<Vec<u8>>,
    ) -> Result<Self, Eip712Error> {
        Ok(Self {
            order_details,
            signer: address_from_private_key(private_key)?,
            nonce,
            require_verified,
            trusted_executor,
            max_executor_fee,
            conditions,
        })
    }

    /// `hashStruct(conditionalOrder)` with the standard conditions encoding
    pub fn struct_hash(&self) -> Result<[u8; 32], Eip712Error> {
        self.struct_hash_with(ConditionsEncoding::Eip712)
    }

    pub fn struct_hash_with(&self, encoding: ConditionsEncoding) -> Result<[u8; 32], Eip712Error> {
        hash_conditional_order(self, encoding)
    }
}
