//! Guardrpc Common Types
//!
//! This crate provides the core protocol definitions and collaborator
//! interfaces shared by the guardrpc relay router.
//!
//! # Overview
//!
//! Guardrpc is a JSON-RPC proxy that routes write-class calls through a
//! ranked cascade of relay endpoints and forwards read-class calls to a
//! per-network upstream. This crate contains the pieces every component
//! depends on:
//!
//! - **Protocol Layer**: JSON-RPC 2.0 request/response/error types and the
//!   single-or-batch body envelope.
//! - **Key/Value Layer**: the [`kv::KvStore`] trait used for endpoint
//!   statistics and submission status records, plus an in-process
//!   implementation backed by a concurrent map.
//!
//! # Example
//!
//! ```
//! use guardrpc_common::protocol::{RpcRequest, RpcResponse};
//! use serde_json::json;
//!
//! let request: RpcRequest = serde_json::from_str(
//!     r#"{"jsonrpc":"2.0","method":"eth_blockNumber","params":[],"id":7}"#,
//! ).unwrap();
//!
//! let response = RpcResponse::success(request.id.clone(), json!("0x10"));
//! assert!(response.error.is_none());
//! ```

pub mod error;
pub mod kv;
pub mod protocol;

pub use error::{GuardError, Result};
pub use kv::{KvStore, MemoryKvStore};
pub use protocol::{RpcError, RpcPayload, RpcReply, RpcRequest, RpcResponse};
