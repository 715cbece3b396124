//! JSON-RPC 2.0 envelope types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::{RpcReply, TransportError};

pub const JSONRPC_VERSION: &str = "2.0";

/// Outbound request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        // Missing params are sent as an empty positional list.
        let params = if params.is_null() { Value::Array(Vec::new()) } else { params };
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// Error member of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Inbound response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    /// Check the envelope against the request it answers and extract the result.
    ///
    /// An error object with a `null` id is accepted, since servers send one when
    /// they could not read the request id.
    pub fn into_reply(self, expected_id: u64) -> Result<RpcReply, TransportError> {
        if self.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
            return Err(TransportError::Malformed(format!(
                "unexpected jsonrpc version {:?}",
                self.jsonrpc
            )));
        }
        let id_matches = match &self.id {
            Some(Value::Null) => self.error.is_some(),
            Some(id) => id.as_u64() == Some(expected_id),
            None => false,
        };
        if !id_matches {
            return Err(TransportError::Malformed(format!(
                "response id {:?} does not match request id {}",
                self.id, expected_id
            )));
        }
        match (self.result, self.error) {
            (_, Some(error)) => Err(TransportError::Rpc {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(RpcReply::new(result)),
            (None, None) => Err(TransportError::Malformed(
                "response has neither result nor error".to_string(),
            )),
        }
    }
}

/// Keeps an explicit `null` distinct from an absent member.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Decode a raw body into the reply for the request with `expected_id`.
pub fn decode_reply(body: &[u8], expected_id: u64) -> Result<RpcReply, TransportError> {
    let response: JsonRpcResponse = serde_json::from_slice(body)
        .map_err(|e| TransportError::Malformed(e.to_string()))?;
    response.into_reply(expected_id)
}
