//! Signing Requests
//!
//! JSON description of one conditional order to sign. Integers may be given
//! as decimal strings, `0x`-hex strings or JSON numbers; byte values are hex.
//!
//! ```json
//! {
//!   "privateKey": "0x…",
//!   "domainSeparator": "0x…",
//!   "order": { "marketId": "200", "sizeDelta": "-1000", "conditions": [] }
//! }
//! ```
//!
//! `domain` (`name`, `version`, `chainId`, `verifyingContract`) may be given
//! instead of `domainSeparator`.

use crate::eip712::{
    parse_hex, parse_int, parse_uint, sign_conditional_order_pre_image,
    address_from_private_key, Address, Bytes32, ConditionalOrder, ConditionsEncoding,
    Eip712Domain, Eip712Error, OrderDetails,
};
use crate::error::{SignerError, SignerResult};
use crate::log_info;
use ethers_core::types::{I256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const MODULE: &str = "request";

/// Hex-encoded private key, wiped on drop
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretHex(String);

impl SecretHex {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    fn decode(&self) -> Result<Zeroizing<Vec<u8>>, Eip712Error> {
        parse_hex(self.0.trim())
            .map(Zeroizing::new)
            .map_err(|_| Eip712Error::InvalidKey("private key is not valid hex".to_string()))
    }
}

impl fmt::Debug for SecretHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretHex([REDACTED])")
    }
}

/// An integer as it appears in JSON
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IntegerInput {
    Text(String),
    Number(serde_json::Number),
}

impl IntegerInput {
    fn text(&self) -> String {
        match self {
            IntegerInput::Text(s) => s.clone(),
            IntegerInput::Number(n) => n.to_string(),
        }
    }

    pub fn to_u256(&self, field: &str) -> Result<U256, Eip712Error> {
        parse_uint(&self.text()).map_err(|e| in_field(field, e))
    }

    pub fn to_i256(&self, field: &str) -> Result<I256, Eip712Error> {
        parse_int(&self.text()).map_err(|e| in_field(field, e))
    }
}

impl Default for IntegerInput {
    fn default() -> Self {
        IntegerInput::Text("0".to_string())
    }
}

fn in_field(field: &str, err: Eip712Error) -> Eip712Error {
    match err {
        Eip712Error::EncodingError(msg) => Eip712Error::EncodingError(format!("{}: {}", field, msg)),
        Eip712Error::InvalidAddress(msg) => Eip712Error::InvalidAddress(format!("{}: {}", field, msg)),
        other => other,
    }
}

fn parse_address(value: &str, field: &str) -> Result<Address, Eip712Error> {
    value.parse().map_err(|e| in_field(field, e))
}

/// Domain fields, as an alternative to a precomputed separator
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainInput {
    pub name: String,
    pub version: String,
    pub chain_id: IntegerInput,
    pub verifying_contract: String,
}

impl DomainInput {
    pub fn to_domain(&self) -> Result<Eip712Domain, Eip712Error> {
        Ok(Eip712Domain {
            name: self.name.clone(),
            version: self.version.clone(),
            chain_id: self.chain_id.to_u256("domain.chainId")?,
            verifying_contract: parse_address(&self.verifying_contract, "domain.verifyingContract")?,
        })
    }
}

/// Order fields. `signer` defaults to the address of the signing key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub market_id: IntegerInput,
    pub account_id: IntegerInput,
    pub size_delta: IntegerInput,
    #[serde(default)]
    pub settlement_strategy_id: IntegerInput,
    pub acceptable_price: IntegerInput,
    #[serde(default)]
    pub is_reduce_only: bool,
    #[serde(default)]
    pub tracking_code: Option<String>,
    pub referrer: String,
    #[serde(default)]
    pub signer: Option<String>,
    #[serde(default)]
    pub nonce: IntegerInput,
    #[serde(default)]
    pub require_verified: bool,
    pub trusted_executor: String,
    pub max_executor_fee: IntegerInput,
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl OrderInput {
    fn to_order(&self, private_key: &[u8]) -> Result<ConditionalOrder, Eip712Error> {
        let tracking_code = match &self.tracking_code {
            Some(code) => code.parse::<Bytes32>().map_err(|e| in_field("trackingCode", e))?,
            None => Bytes32::ZERO,
        };

        let order_details = OrderDetails {
            market_id: self.market_id.to_u256("marketId")?,
            account_id: self.account_id.to_u256("accountId")?,
            size_delta: self.size_delta.to_i256("sizeDelta")?,
            settlement_strategy_id: self.settlement_strategy_id.to_u256("settlementStrategyId")?,
            acceptable_price: self.acceptable_price.to_u256("acceptablePrice")?,
            is_reduce_only: self.is_reduce_only,
            tracking_code,
            referrer: parse_address(&self.referrer, "referrer")?,
        };

        let signer = match &self.signer {
            Some(signer) => parse_address(signer, "signer")?,
            None => address_from_private_key(private_key)?,
        };

        let conditions = self
            .conditions
            .iter()
            .enumerate()
            .map(|(i, c)| parse_hex(c).map_err(|e| in_field(&format!("conditions[{}]", i), e)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ConditionalOrder {
            order_details,
            signer,
            nonce: self.nonce.to_u256("nonce")?,
            require_verified: self.require_verified,
            trusted_executor: parse_address(&self.trusted_executor, "trustedExecutor")?,
            max_executor_fee: self.max_executor_fee.to_u256("maxExecutorFee")?,
            conditions,
        })
    }
}

/// A signing request as read from JSON
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningRequest {
    #[serde(default)]
    pub private_key: Option<SecretHex>,
    #[serde(default)]
    pub domain_separator: Option<String>,
    #[serde(default)]
    pub domain: Option<DomainInput>,
    pub order: OrderInput,
}

impl SigningRequest {
    /// Parse a request from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        serde_json::from_str(json).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Read a request from a JSON file
    pub fn load(path: &Path) -> SignerResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SignerError::from(e).with_details(path.display().to_string())
        })?;
        Ok(Self::from_json(&json)?)
    }

    /// Resolve key, domain separator and order. `key_override` takes
    /// precedence over the request's own `privateKey`.
    pub fn prepare(&self, key_override: Option<&SecretHex>) -> SignerResult<PreparedRequest> {
        let secret = key_override.or(self.private_key.as_ref()).ok_or_else(|| {
            SignerError::invalid_input("no private key in request or environment")
        })?;
        let private_key = secret.decode()?;

        let domain_separator = self.resolve_domain_separator()?;
        let order = self.order.to_order(&private_key)?;

        Ok(PreparedRequest {
            private_key,
            domain_separator,
            order,
        })
    }

    fn resolve_domain_separator(&self) -> SignerResult<[u8; 32]> {
        match (&self.domain_separator, &self.domain) {
            (Some(separator), None) => {
                let bytes = parse_hex(separator.trim())?;
                if bytes.len() != 32 {
                    return Err(SignerError::invalid_input(format!(
                        "domainSeparator must be 32 bytes, got {}",
                        bytes.len()
                    )));
                }
                let mut out = [0u8; 32];
                out.copy_from_slice(&bytes);
                Ok(out)
            }
            (None, Some(domain)) => Ok(domain.to_domain()?.separator()),
            (Some(_), Some(_)) => Err(SignerError::invalid_input(
                "give either domainSeparator or domain, not both",
            )),
            (None, None) => Err(SignerError::invalid_input(
                "request needs a domainSeparator or a domain",
            )),
        }
    }
}

/// A request with every field decoded, ready to sign
pub struct PreparedRequest {
    private_key: Zeroizing<Vec<u8>>,
    pub domain_separator: [u8; 32],
    pub order: ConditionalOrder,
}

impl PreparedRequest {
    pub fn sign(&self, encoding: ConditionsEncoding) -> SignerResult<SigningOutcome> {
        let (pre_image, signature) = sign_conditional_order_pre_image(
            &self.private_key,
            &self.domain_separator,
            &self.order,
            encoding,
        )?;

        let outcome = SigningOutcome {
            signer: self.order.signer,
            encoding,
            domain_separator: Bytes32(pre_image.domain_separator).to_hex(),
            struct_hash: Bytes32(pre_image.struct_hash).to_hex(),
            digest: Bytes32(pre_image.final_hash).to_hex(),
            signature: signature.to_hex(),
        };

        log_info!(
            MODULE,
            "signed conditional order",
            signer = outcome.signer,
            digest = outcome.digest,
            signature = outcome.signature,
        );

        Ok(outcome)
    }
}

impl fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("private_key", &"[REDACTED]")
            .field("domain_separator", &hex::encode(self.domain_separator))
            .field("order", &self.order)
            .finish()
    }
}

/// What the CLI reports for a signed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningOutcome {
    pub signer: Address,
    pub encoding: ConditionsEncoding,
    pub domain_separator: String,
    pub struct_hash: String,
    pub digest: String,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const VECTOR_REQUEST: &str = r#"{
        "privateKey": "1111111111111111111111111111111111111111111111111111111111111111",
        "domainSeparator": "0x6d10bb011eeb4e5a58d21ece8be3182d8c053ff9f30ece4c93ba12c58a93b7ed",
        "order": {
            "marketId": "200",
            "accountId": "170141183460469231731687303715884105756",
            "sizeDelta": "1000000000000000000",
            "settlementStrategyId": "0",
            "acceptablePrice": "115792089237316195423570985008687907853269984665640564039457584007913129639935",
            "isReduceOnly": false,
            "trackingCode": "0x4b57454e54410000000000000000000000000000000000000000000000000000",
            "referrer": "0xF510a2Ff7e9DD7e18629137adA4eb56B9c13E885",
            "nonce": "0",
            "requireVerified": false,
            "trustedExecutor": "0x7FA9385bE102ac3EAc297483Dd6233D62b3e1496",
            "maxExecutorFee": "115792089237316195423570985008687907853269984665640564039457584007913129639935",
            "conditions": []
        }
    }"#;

    fn with_order_field(field: &str, value: serde_json::Value) -> SigningRequest {
        let mut json: serde_json::Value = serde_json::from_str(VECTOR_REQUEST).unwrap();
        json["order"][field] = value;
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_vector_request_signatures() {
        let request = SigningRequest::from_json(VECTOR_REQUEST).unwrap();
        let prepared = request.prepare(None).unwrap();

        assert_eq!(
            prepared.order.signer.to_checksum(),
            "0x19E7E376E7C213B7E7e7e46cc70A5dD086DAff2A"
        );

        let outcome = prepared.sign(ConditionsEncoding::Eip712).unwrap();
        assert_eq!(
            outcome.digest,
            "0xc435aad544abdaf0a9dc05a6716271198cd93b7282501380ae39e7badf5bde88"
        );
        assert_eq!(
            outcome.signature,
            "0xb02a0b47cbaf155d8ddf097f6a0c6ee3d34a923c041225fc7273a1dcd8de81e94b0c6974bb45f77f15f2d1ecefdd264cf435605a3a376a107ad2e51dec2cf5eb1c"
        );

        let outcome = prepared.sign(ConditionsEncoding::AbiDynamicArray).unwrap();
        assert_eq!(
            outcome.signature,
            "0xaedc3a51d51c3de511aa8d6fb20a1ebb90ea85f71a8157677b1c440d952f910435067505954a4bb21d8cb7d80bc729df10b55a17297511fd918f449349c6e5df1b"
        );
    }

    #[test]
    fn test_numeric_and_hex_integers() {
        let request = with_order_field("marketId", serde_json::json!(200));
        let prepared = request.prepare(None).unwrap();
        assert_eq!(prepared.order.order_details.market_id, U256::from(200u64));

        let request = with_order_field("marketId", serde_json::json!("0xc8"));
        let prepared = request.prepare(None).unwrap();
        assert_eq!(prepared.order.order_details.market_id, U256::from(200u64));

        let request = with_order_field("sizeDelta", serde_json::json!("-5"));
        let prepared = request.prepare(None).unwrap();
        assert_eq!(prepared.order.order_details.size_delta, I256::from(-5i64));
    }

    #[test]
    fn test_blank_integers_rejected() {
        let request = with_order_field("marketId", serde_json::json!(""));
        let err = request.prepare(None).unwrap_err();
        assert_eq!(err.code, ErrorCode::EncodingError);
        assert!(err.message.contains("marketId"));

        let request = with_order_field("accountId", serde_json::json!("0x"));
        let err = request.prepare(None).unwrap_err();
        assert_eq!(err.code, ErrorCode::EncodingError);
        assert!(err.message.contains("accountId"));

        let request = with_order_field("sizeDelta", serde_json::json!("-"));
        assert_eq!(request.prepare(None).unwrap_err().code, ErrorCode::EncodingError);
    }

    #[test]
    fn test_wide_market_id_fails_at_signing() {
        let request = with_order_field(
            "marketId",
            serde_json::json!("340282366920938463463374607431768211456"),
        );
        let prepared = request.prepare(None).unwrap();

        let err = prepared.sign(ConditionsEncoding::Eip712).unwrap_err();
        assert_eq!(err.code, ErrorCode::EncodingError);
    }

    #[test]
    fn test_wide_referrer_rejected() {
        let request = with_order_field(
            "referrer",
            serde_json::json!("0xF510a2Ff7e9DD7e18629137adA4eb56B9c13E88500"),
        );
        let err = request.prepare(None).unwrap_err();
        assert_eq!(err.code, ErrorCode::EncodingError);
        assert!(err.message.contains("referrer"));
    }

    #[test]
    fn test_conditions_are_hex() {
        let request = with_order_field("conditions", serde_json::json!(["0x01", "0203"]));
        let prepared = request.prepare(None).unwrap();
        assert_eq!(prepared.order.conditions, vec![vec![0x01], vec![0x02, 0x03]]);

        let request = with_order_field("conditions", serde_json::json!(["0xzz"]));
        let err = request.prepare(None).unwrap_err();
        assert!(err.message.contains("conditions[0]"));
    }

    #[test]
    fn test_domain_object() {
        let mut json: serde_json::Value = serde_json::from_str(VECTOR_REQUEST).unwrap();
        json.as_object_mut().unwrap().remove("domainSeparator");
        json["domain"] = serde_json::json!({
            "name": "Ether Mail",
            "version": "1",
            "chainId": 1,
            "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
        });
        let request: SigningRequest = serde_json::from_value(json).unwrap();
        let prepared = request.prepare(None).unwrap();

        assert_eq!(
            hex::encode(prepared.domain_separator),
            "f2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f"
        );
    }

    #[test]
    fn test_domain_must_be_given_once() {
        let mut json: serde_json::Value = serde_json::from_str(VECTOR_REQUEST).unwrap();
        json.as_object_mut().unwrap().remove("domainSeparator");
        let request: SigningRequest = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(request.prepare(None).unwrap_err().code, ErrorCode::InvalidInput);

        json["domainSeparator"] = serde_json::json!("0x1234");
        let request: SigningRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.prepare(None).unwrap_err().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_key_override_and_missing_key() {
        let mut json: serde_json::Value = serde_json::from_str(VECTOR_REQUEST).unwrap();
        json.as_object_mut().unwrap().remove("privateKey");
        let request: SigningRequest = serde_json::from_value(json).unwrap();

        let err = request.prepare(None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);

        let key = SecretHex::new(format!("0x{}", "22".repeat(32)));
        let prepared = request.prepare(Some(&key)).unwrap();
        assert_eq!(
            prepared.order.signer,
            address_from_private_key(&[0x22u8; 32]).unwrap()
        );
    }

    #[test]
    fn test_zero_key_rejected() {
        let mut json: serde_json::Value = serde_json::from_str(VECTOR_REQUEST).unwrap();
        json["privateKey"] = serde_json::json!("00".repeat(32));
        let request: SigningRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.prepare(None).unwrap_err().code, ErrorCode::InvalidPrivateKey);
    }

    #[test]
    fn test_secrets_not_in_debug_output() {
        let request = SigningRequest::from_json(VECTOR_REQUEST).unwrap();
        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("1111111111111111"));

        let prepared = request.prepare(None).unwrap();
        assert!(!format!("{:?}", prepared).contains("1111111111111111"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            SigningRequest::from_json("{\"order\": 1}"),
            Err(Eip712Error::InvalidJson(_))
        ));
    }
}
