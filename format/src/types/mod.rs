use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

mod data;
mod fixed_size_data;
mod quantity;
mod uint;

pub use data::Data;
pub use fixed_size_data::FixedSizeData;
pub use quantity::Quantity;
pub use uint::UInt;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    pub number: BlockNumber,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub timestamp: Quantity,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block<Tx> {
    #[serde(flatten)]
    pub header: BlockHeader,
    pub transactions: Box<[Tx]>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub block_hash: Hash,
    pub block_number: BlockNumber,
    pub from: Option<Address>,
    pub gas: Quantity,
    pub gas_price: Option<Quantity>,
    pub hash: Hash,
    pub input: Data,
    pub nonce: Quantity,
    pub to: Option<Address>,
    pub transaction_index: TransactionIndex,
    pub value: Quantity,
    pub chain_id: Option<Quantity>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub removed: Option<bool>,
    pub log_index: LogIndex,
    pub transaction_index: TransactionIndex,
    pub transaction_hash: Hash,
    pub block_hash: Hash,
    pub block_number: BlockNumber,
    pub address: Address,
    pub data: Data,
    pub topics: ArrayVec<LogArgument, 4>,
}

pub type Hash = FixedSizeData<32>;
pub type LogArgument = FixedSizeData<32>;
pub type Address = FixedSizeData<20>;
pub type BlockNumber = uint::UInt;
pub type TransactionIndex = uint::UInt;
pub type LogIndex = uint::UInt;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_block_with_transactions() {
        let json = r#"{
            "number": "0xf4240",
            "hash": "0x5af6d9b3d1cbb4e44f9f10c2e9d4c0cea6e09ee66d30c1d05e3c0c6cf24f6d99",
            "parentHash": "0x8a60bd57dd3bdca16fef8ab304d2c7498e5b1d7e9ba26e0dbcd10c3b4b6e3a11",
            "timestamp": "0x64b5f3c2",
            "miner": "0x0000000000000000000000000000000000000000",
            "gasUsed": "0x5208",
            "transactions": [
                {
                    "blockHash": "0x5af6d9b3d1cbb4e44f9f10c2e9d4c0cea6e09ee66d30c1d05e3c0c6cf24f6d99",
                    "blockNumber": "0xf4240",
                    "from": "0xAbC1230000000000000000000000000000000001",
                    "gas": "0x5208",
                    "gasPrice": "0x3b9aca00",
                    "hash": "0x017e8ad62f871604544a2ac9ea80ce920a0c79c30f11440a7b481ece7f18b2b0",
                    "input": "0x",
                    "nonce": "0x1",
                    "to": "0xdef4560000000000000000000000000000000002",
                    "transactionIndex": "0x0",
                    "value": "0x2386f26fc10000",
                    "chainId": "0x1"
                }
            ]
        }"#;

        let block: Block<Transaction> = serde_json::from_str(json).unwrap();

        assert_eq!(*block.header.number, 1_000_000);
        assert_eq!(block.transactions.len(), 1);

        let tx = &block.transactions[0];
        let from: Address = "0xabc1230000000000000000000000000000000001".parse().unwrap();
        assert_eq!(tx.from.as_ref(), Some(&from));
        assert!(!tx.value.is_zero());
    }

    #[test]
    fn test_deserialize_log() {
        let json = r#"{
            "removed": false,
            "logIndex": "0x2",
            "transactionIndex": "0x1",
            "transactionHash": "0xeab31339e74d34155f8b0a92f384672c7b861c07939f7d58d921d5b50fde640e",
            "blockHash": "0x5af6d9b3d1cbb4e44f9f10c2e9d4c0cea6e09ee66d30c1d05e3c0c6cf24f6d99",
            "blockNumber": "0xf4240",
            "address": "0x1a2b3c4d5e6f70819283a4b5c6d7e8f901234567",
            "data": "0x",
            "topics": [
                "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
                "0x0000000000000000000000000000000000000000000000000000000000000000",
                "0x000000000000000000000000abc1230000000000000000000000000000000001",
                "0x0000000000000000000000000000000000000000000000000000000000000001"
            ]
        }"#;

        let log: Log = serde_json::from_str(json).unwrap();

        assert_eq!(log.topics.len(), 4);
        assert_eq!(*log.block_number, 1_000_000);
    }
}
