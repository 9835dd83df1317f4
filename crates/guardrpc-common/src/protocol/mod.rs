//! Guardrpc Protocol Types
//!
//! JSON-RPC 2.0 wire types shared by the HTTP surface, the relay
//! dispatcher, and the read-forwarding path.

pub mod jsonrpc;

pub use jsonrpc::{RpcError, RpcPayload, RpcReply, RpcRequest, RpcResponse};
pub use jsonrpc::{ALL_RELAYS_FAILED, INTERNAL_ERROR, INVALID_PARAMS, PARSE_ERROR};
