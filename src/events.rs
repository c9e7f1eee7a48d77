use crate::chain::RawLog;
use alloy::sol;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256};

sol! {
    event Transfer(address indexed from, address indexed to, uint256 value);
}

pub fn decode_transfer_event(log: &RawLog) -> anyhow::Result<Transfer> {
    let decoded = Transfer::decode_raw_log(log.topics.iter().copied(), &log.data)?;
    Ok(decoded)
}

/// Topic value used to filter on an indexed address argument.
pub fn address_topic(address: Address) -> B256 {
    address.into_word()
}
