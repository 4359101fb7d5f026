//! Event signatures (topic 0) the scanner queries

use alloy::primitives::{b256, B256};

// ── Swaps ─────────────────────────────────────────────────────────────

/// Uniswap V2 `Swap(address,uint256,uint256,uint256,uint256,address)`
pub const UNISWAP_V2_SWAP: B256 = b256!("d78ad95fa46c994b6551d0da85fc275fe613ce37657fb8d5e3d130840159d822");

/// Uniswap V3 `Swap(address,address,int256,int256,uint160,uint128,int24)`
pub const UNISWAP_V3_SWAP: B256 = b256!("c42079f94a6350d7e6235f29174924f928cc2ac818eb64fed8004e115fbcca67");

/// Balancer V1 `LOG_SWAP(address,address,address,uint256,uint256)`
pub const BALANCER_V1_SWAP: B256 = b256!("908fb5ee8f16c6bc9bc3690973819f32a4d4b10188134543c88706e0e1d43378");

/// Balancer V2 `Swap(bytes32,address,address,uint256,uint256)`
pub const BALANCER_V2_SWAP: B256 = b256!("2170c741c41531aec20e7c107c24eecfdd15e69c9bb0a8dd37b1840b9e0b207b");

/// Curve `TokenExchangeUnderlying(address,int128,uint256,int128,uint256)`
pub const CURVE_EXCHANGE_UNDERLYING: B256 =
    b256!("d013ca23e77a65003c2c659c5442c00c805371b7fc1ebd4c206c41d1536bd90b");

/// Curve `TokenExchange(address,int128,uint256,int128,uint256)`
pub const CURVE_EXCHANGE: B256 = b256!("8b3e96f2b889fa771c53c981b40daf005f63f637f1869f707052d15a3dd97140");

/// Velodrome `Swap(address,uint256,uint256,uint256,uint256,address)`
pub const VELODROME_SWAP: B256 = b256!("b3e2773606abfd36b5bd91394b3a54d1398336c65005baf7bf7a05efeffaf75b");

/// Query order per window
pub const SWAP_TOPICS: [B256; 7] = [
    VELODROME_SWAP,
    UNISWAP_V2_SWAP,
    UNISWAP_V3_SWAP,
    BALANCER_V1_SWAP,
    BALANCER_V2_SWAP,
    CURVE_EXCHANGE_UNDERLYING,
    CURVE_EXCHANGE,
];

// ── Flash loans ───────────────────────────────────────────────────────

/// Aave V2 `FlashLoan(address,address,address,uint256,uint256,uint16)`
pub const AAVE_V2_FLASH_LOAN: B256 = b256!("631042c832b07452973831137f2d73e395028b44b250dedc5abb0ee766e168ac");

/// Aave V3 `FlashLoan(address,address,address,uint256,uint8,uint256,uint16)`
pub const AAVE_V3_FLASH_LOAN: B256 = b256!("efefaba5e921573100900a3ad9cf29f222d995fb3b6045797eaea7521bd8d6f0");

/// Balancer V2 vault `FlashLoan(address,address,uint256,uint256)`
pub const BALANCER_FLASH_LOAN: B256 = b256!("0d7d75e01ab95780d3cd1c8ec0dd6c2ce19e3a20427eec8bf53283b6fb8e95f0");

pub const FLASH_LOAN_TOPICS: [B256; 3] = [AAVE_V2_FLASH_LOAN, AAVE_V3_FLASH_LOAN, BALANCER_FLASH_LOAN];
