//! 32-byte word access into log payloads

use alloy::primitives::{Address, B256, I256, U256};

const WORD: usize = 32;

/// Word `i` of `data`, or `None` if the payload is too short
pub fn word(data: &[u8], i: usize) -> Option<&[u8]> {
    data.get(i * WORD..(i + 1) * WORD)
}

pub fn uint(data: &[u8], i: usize) -> Option<U256> {
    word(data, i).map(U256::from_be_slice)
}

/// Two's complement over 256 bits
pub fn int(data: &[u8], i: usize) -> Option<I256> {
    uint(data, i).map(I256::from_raw)
}

/// Low 20 bytes of word `i`
pub fn address(data: &[u8], i: usize) -> Option<Address> {
    word(data, i).map(|w| Address::from_slice(&w[12..]))
}

/// Address in the low 20 bytes of an indexed topic
pub fn topic_address(topics: &[B256], i: usize) -> Option<Address> {
    topics.get(i).map(|t| Address::from_word(*t))
}
