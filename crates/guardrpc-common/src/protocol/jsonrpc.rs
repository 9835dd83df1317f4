//! JSON-RPC 2.0 Protocol Types
//!
//! This module implements the JSON-RPC 2.0 message shapes used on both
//! sides of the proxy: requests arriving from wallets, and responses
//! returned by relays and upstreams.
//!
//! # Leniency
//!
//! Wallet traffic is messy: requests arrive without an `id`, without
//! `params`, or with an `id` of any JSON type. Deserialization therefore
//! defaults `params` and `id` to `null` instead of rejecting the request,
//! and every response echoes whatever `id` shape the caller sent. A caller
//! always gets a JSON-RPC-shaped answer back.
//!
//! # Error Codes
//!
//! - `-32700`: Parse error (body was not valid JSON-RPC)
//! - `-32602`: Invalid params (malformed write parameter, unknown network)
//! - `-32603`: Internal error (unexpected fault, short diagnostic attached)
//! - `-32000`: Server error (relay cascade exhausted, or a write against a
//!   network without relay protection)
//!
//! # Example
//!
//! ```
//! use guardrpc_common::protocol::{RpcError, RpcRequest, RpcResponse};
//! use serde_json::json;
//!
//! // `id` and `params` may be absent on the wire.
//! let req: RpcRequest = serde_json::from_str(
//!     r#"{"jsonrpc":"2.0","method":"eth_chainId"}"#,
//! ).unwrap();
//! assert!(req.id.is_null());
//!
//! let ok = RpcResponse::success(json!(1), json!("0xabc"));
//! let err = RpcResponse::error(json!(1), RpcError::invalid_params("bad hex"));
//! assert!(ok.error.is_none() && err.result.is_none());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 request.
///
/// `params` and `id` default to `null` when absent so malformed wallet
/// requests still round-trip instead of failing at the parse boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcRequest {
    /// JSON-RPC version (expected "2.0", not enforced)
    #[serde(default = "version")]
    pub jsonrpc: String,
    /// Name of the method to invoke
    pub method: String,
    /// Parameter values (array or object; `null` when omitted)
    #[serde(default)]
    pub params: Value,
    /// Request identifier (number, string, or null)
    #[serde(default)]
    pub id: Value,
}

impl RpcRequest {
    /// Create a request with the given method, params, and id.
    pub fn new(method: impl Into<String>, params: Value, id: Value) -> Self {
        Self {
            jsonrpc: version(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response.
///
/// Exactly one of `result` / `error` is present; the absent member is
/// omitted from the serialized form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcResponse {
    /// JSON-RPC version
    #[serde(default = "version")]
    pub jsonrpc: String,
    /// Result value on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error object on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    /// Request identifier (echoes the request id)
    #[serde(default)]
    pub id: Value,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: version(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response.
    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: version(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Whether this response carries a usable (non-null) result and no error.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.result.as_ref().is_some_and(|r| !r.is_null())
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    /// Error code (standard codes are negative integers)
    pub code: i32,
    /// Short description of the error
    pub message: String,
    /// Additional data (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Invalid JSON was received by the server
pub const PARSE_ERROR: i32 = -32700;
/// Invalid method parameter(s)
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error
pub const INTERNAL_ERROR: i32 = -32603;
/// Relay cascade exhausted, or write against an unprotected network
pub const ALL_RELAYS_FAILED: i32 = -32000;

impl RpcError {
    /// Create a parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: PARSE_ERROR,
            message: "Parse error".into(),
            data: None,
        }
    }

    /// Create an invalid params error (-32602).
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS,
            message: msg.into(),
            data: None,
        }
    }

    /// Create an internal error (-32603) with a short diagnostic.
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: msg.into(),
            data: None,
        }
    }

    /// Create a server error (-32000).
    pub fn server_error(msg: impl Into<String>) -> Self {
        Self {
            code: ALL_RELAYS_FAILED,
            message: msg.into(),
            data: None,
        }
    }
}

/// HTTP body of `POST /rpc`: a single call or a batch of calls.
///
/// Batches fan out concurrently downstream; the reply preserves input
/// order and cardinality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RpcPayload {
    /// A JSON array of requests
    Batch(Vec<RpcRequest>),
    /// A single request object
    Single(RpcRequest),
}

/// Reply mirroring [`RpcPayload`]: one response, or one per batch entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RpcReply {
    Batch(Vec<RpcResponse>),
    Single(RpcResponse),
}

fn version() -> String {
    "2.0".into()
}
