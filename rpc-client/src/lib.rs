mod config;
mod endpoint;
mod error;
mod rpc_client;
mod types;

pub use config::{EndpointConfig, LimitConfig, RpcClientConfig};
pub use error::{Error, Result};
pub use rpc_client::{RpcClient, RpcTransport};
pub use types::{
    CallRequest, GetBlockNumber, GetLogs, MaybeBatch, RpcRequest, RpcRequestImpl, RpcResponse,
    RpcResponseImpl,
};
