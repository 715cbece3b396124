//! JSON-RPC over HTTP using reqwest.

use std::time::Duration;

use reqwest::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use reqwest::Client;

use crate::transport::jsonrpc::{decode_reply, JsonRpcRequest};
use crate::transport::{RpcTransport, TransportError, TransportFut};

/// HTTP transport shared by every endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("rpc-router/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl RpcTransport for HttpTransport {
    fn send<'a>(&'a self, url: &'a str, request: &'a JsonRpcRequest) -> TransportFut<'a> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .json(request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                tracing::debug!(endpoint = %url, status = %status, "Non-success HTTP status");
                return Err(TransportError::HttpStatus(status.as_u16()));
            }

            let cors_allowed = response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN);
            let body = response.bytes().await?;
            let mut reply = decode_reply(&body, request.id)?;
            reply.cors_allowed = Some(cors_allowed);
            Ok(reply)
        })
    }
}
