use serde::{Deserialize, Serialize};

/// An anchoring transaction observed on the blockchain.
///
/// `anchor_string` is the CAS address of the batch file the transaction
/// commits to. Transaction numbers increase strictly along the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_number: u64,
    pub transaction_time: u64,
    pub anchor_string: String,
}
