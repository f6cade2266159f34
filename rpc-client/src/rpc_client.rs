use crate::{endpoint::Endpoint, Error, Result, RpcClientConfig, RpcRequest, RpcResponse};
use std::sync::Arc;
use std::time::Duration;

/// Sending side of the JSON-RPC layer.
///
/// The concrete implementation fans a request out over configured
/// endpoints; tests substitute scripted transports.
#[allow(async_fn_in_trait)]
pub trait RpcTransport: Send + Sync {
    async fn send(&self, req: RpcRequest) -> Result<RpcResponse>;
}

pub struct RpcClient {
    endpoints: Vec<Endpoint>,
}

impl RpcClient {
    pub fn new(config: RpcClientConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.http_req_timeout_millis.get()))
            .build()
            .unwrap();

        let endpoints = config
            .endpoints
            .into_iter()
            .map(|cfg| Endpoint::new(http_client.clone(), cfg))
            .collect::<Vec<_>>();

        Self { endpoints }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}

impl RpcTransport for RpcClient {
    async fn send(&self, req: RpcRequest) -> Result<RpcResponse> {
        let req = Arc::new(req);
        let mut errs = Vec::new();
        for endpoint in self.endpoints.iter() {
            match endpoint.send(req.clone()).await {
                Ok(resp) => return Ok(resp),
                Err(e) => errs.push(e),
            }
        }

        Err(Error::NoHealthyEndpoints(errs))
    }
}

impl<T: RpcTransport> RpcTransport for Arc<T> {
    async fn send(&self, req: RpcRequest) -> Result<RpcResponse> {
        T::send(self, req).await
    }
}
