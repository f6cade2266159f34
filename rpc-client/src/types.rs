use mintrecon_format::{Address, Block, BlockNumber, Data, Hash, Log, LogArgument, Transaction};
use std::result::Result as StdResult;

#[derive(Debug, Clone)]
pub enum RpcRequestImpl {
    GetBlockNumber,
    GetBlockByNumber(BlockNumber),
    GetLogs(GetLogs),
    GetTransactionByHash(Hash),
    Call(CallRequest),
}

pub enum RpcResponseImpl {
    GetBlockNumber(BlockNumber),
    GetBlockByNumber(Block<Transaction>),
    GetLogs(Vec<Log>),
    GetTransactionByHash(Transaction),
    Call(Data),
}

pub enum MaybeBatch<T> {
    Single(T),
    Batch(Vec<T>),
}

pub type RpcRequest = MaybeBatch<RpcRequestImpl>;
pub type RpcResponse = MaybeBatch<RpcResponseImpl>;

impl<T> From<Vec<T>> for MaybeBatch<T> {
    fn from(vals: Vec<T>) -> Self {
        Self::Batch(vals)
    }
}

impl From<RpcRequestImpl> for MaybeBatch<RpcRequestImpl> {
    fn from(val: RpcRequestImpl) -> Self {
        Self::Single(val)
    }
}

pub struct GetBlockNumber;

#[derive(Debug, Clone)]
pub struct GetLogs {
    pub address: Address,
    pub topic0: LogArgument,
    pub from_block: BlockNumber,
    pub to_block: BlockNumber,
}

/// Read-only contract call executed against latest state.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub to: Address,
    pub data: Data,
}

impl From<GetBlockNumber> for RpcRequest {
    fn from(_: GetBlockNumber) -> Self {
        Self::Single(RpcRequestImpl::GetBlockNumber)
    }
}

impl From<GetLogs> for RpcRequest {
    fn from(req: GetLogs) -> Self {
        Self::Single(RpcRequestImpl::GetLogs(req))
    }
}

impl From<CallRequest> for RpcRequest {
    fn from(req: CallRequest) -> Self {
        Self::Single(RpcRequestImpl::Call(req))
    }
}

impl TryInto<BlockNumber> for RpcResponseImpl {
    type Error = ();

    fn try_into(self) -> StdResult<BlockNumber, Self::Error> {
        match self {
            RpcResponseImpl::GetBlockNumber(block_num) => Ok(block_num),
            _ => Err(()),
        }
    }
}

impl TryInto<Vec<Log>> for RpcResponseImpl {
    type Error = ();

    fn try_into(self) -> StdResult<Vec<Log>, Self::Error> {
        match self {
            RpcResponseImpl::GetLogs(logs) => Ok(logs),
            _ => Err(()),
        }
    }
}

impl TryInto<Block<Transaction>> for RpcResponseImpl {
    type Error = ();

    fn try_into(self) -> StdResult<Block<Transaction>, Self::Error> {
        match self {
            RpcResponseImpl::GetBlockByNumber(block) => Ok(block),
            _ => Err(()),
        }
    }
}

impl TryInto<Transaction> for RpcResponseImpl {
    type Error = ();

    fn try_into(self) -> StdResult<Transaction, Self::Error> {
        match self {
            RpcResponseImpl::GetTransactionByHash(tx) => Ok(tx),
            _ => Err(()),
        }
    }
}

impl TryInto<Data> for RpcResponseImpl {
    type Error = ();

    fn try_into(self) -> StdResult<Data, Self::Error> {
        match self {
            RpcResponseImpl::Call(data) => Ok(data),
            _ => Err(()),
        }
    }
}

impl<T> TryInto<Vec<T>> for RpcResponse
where
    RpcResponseImpl: TryInto<T, Error = ()>,
{
    type Error = ();

    fn try_into(self) -> StdResult<Vec<T>, Self::Error> {
        match self {
            Self::Batch(resps) => resps.into_iter().map(TryInto::try_into).collect(),
            _ => Err(()),
        }
    }
}

impl RpcResponse {
    pub fn try_into_single<T>(self) -> Option<T>
    where
        RpcResponseImpl: TryInto<T, Error = ()>,
    {
        match self {
            Self::Single(v) => v.try_into().ok(),
            _ => None,
        }
    }
}

impl From<&RpcRequest> for serde_json::Value {
    fn from(req: &RpcRequest) -> serde_json::Value {
        match req {
            RpcRequest::Single(req) => req.to_json(0),
            RpcRequest::Batch(reqs) => {
                let arr = reqs
                    .iter()
                    .enumerate()
                    .map(|(idx, req)| req.to_json(idx))
                    .collect::<Vec<_>>();

                serde_json::Value::Array(arr)
            }
        }
    }
}

impl RpcRequestImpl {
    fn to_json(&self, idx: usize) -> serde_json::Value {
        match self {
            RpcRequestImpl::GetBlockNumber => serde_json::json!({
                "method": "eth_blockNumber",
                "params": [],
                "id": idx,
                "jsonrpc": "2.0",
            }),
            RpcRequestImpl::GetBlockByNumber(block_number) => serde_json::json!({
                "method": "eth_getBlockByNumber",
                "params": [
                    block_number,
                    // hydrate transaction objects, hashes alone are useless here
                    true,
                ],
                "id": idx,
                "jsonrpc": "2.0",
            }),
            RpcRequestImpl::GetLogs(GetLogs {
                address,
                topic0,
                from_block,
                to_block,
            }) => serde_json::json!({
                "method": "eth_getLogs",
                "params": [{
                    "address": address,
                    "topics": [topic0],
                    "fromBlock": from_block,
                    "toBlock": to_block,
                }],
                "id": idx,
                "jsonrpc": "2.0",
            }),
            RpcRequestImpl::GetTransactionByHash(hash) => serde_json::json!({
                "method": "eth_getTransactionByHash",
                "params": [hash],
                "id": idx,
                "jsonrpc": "2.0",
            }),
            RpcRequestImpl::Call(CallRequest { to, data }) => serde_json::json!({
                "method": "eth_call",
                "params": [
                    {
                        "to": to,
                        "data": data,
                    },
                    "latest",
                ],
                "id": idx,
                "jsonrpc": "2.0",
            }),
        }
    }
}

impl RpcRequest {
    pub(crate) fn resp_from_json(&self, json: &str) -> Option<RpcResponse> {
        let json = serde_json::from_str(json).ok()?;

        match (self, json) {
            (Self::Batch(reqs), serde_json::Value::Array(mut arr)) => {
                // providers are allowed to answer a batch out of order
                arr.sort_by_key(|val| val.get("id").and_then(serde_json::Value::as_u64));

                let mut vals = Vec::new();

                for (idx, (val, req)) in arr.into_iter().zip(reqs.iter()).enumerate() {
                    match val {
                        serde_json::Value::Object(obj) => {
                            vals.push(req.resp_from_json(idx, obj)?);
                        }
                        _ => return None,
                    }
                }

                Some(RpcResponse::Batch(vals))
            }
            (Self::Single(req), serde_json::Value::Object(obj)) => {
                Some(RpcResponse::Single(req.resp_from_json(0, obj)?))
            }
            _ => None,
        }
    }
}

impl RpcRequestImpl {
    fn resp_from_json(&self, idx: usize, mut json: JsonObject) -> Option<RpcResponseImpl> {
        if json.remove("jsonrpc")?.as_str()? != "2.0" {
            return None;
        }

        if json.remove("id")?.as_u64()? != u64::try_from(idx).unwrap() {
            return None;
        }

        let res = json.remove("result")?;

        match self {
            Self::GetBlockNumber => Some(RpcResponseImpl::GetBlockNumber(
                serde_json::from_value(res).ok()?,
            )),
            Self::GetBlockByNumber(_) => serde_json::from_value(res)
                .ok()
                .map(RpcResponseImpl::GetBlockByNumber),
            Self::GetLogs(_) => serde_json::from_value(res)
                .ok()
                .map(RpcResponseImpl::GetLogs),
            Self::GetTransactionByHash(_) => serde_json::from_value(res)
                .ok()
                .map(RpcResponseImpl::GetTransactionByHash),
            Self::Call(_) => serde_json::from_value(res).ok().map(RpcResponseImpl::Call),
        }
    }
}

type JsonObject = serde_json::Map<String, serde_json::Value>;
