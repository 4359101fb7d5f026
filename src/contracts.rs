//! Centralized Contract Definitions
//!
//! Solidity interfaces used for metadata resolution, defined with alloy's
//! `sol!` macro. Calls are ABI-encoded here and sent through
//! `ChainClient::call`, so the same function name can exist in several
//! shapes (string vs bytes32 `name()`, int128 vs uint256 coin index).
//!
//! Created: 2026-10-02

use alloy::sol;

// ── ERC20 ─────────────────────────────────────────────────────────────

sol! {
    /// Modern ERC20 metadata (string name)
    interface IERC20Metadata {
        function name() external view returns (string);
        function decimals() external view returns (uint8);
    }
}

sol! {
    /// Legacy ERC20 metadata (fixed-width name, e.g. MKR, SAI)
    interface IERC20Bytes32Name {
        function name() external view returns (bytes32);
    }
}

// ── Constant-product / concentrated-liquidity pools ───────────────────

sol! {
    /// token0/token1 accessors shared by Uniswap V2, V3 and Velodrome pools
    interface IUniswapPool {
        function token0() external view returns (address);
        function token1() external view returns (address);
    }
}

// ── Curve stable-swap pools ───────────────────────────────────────────

sol! {
    interface ICurvePoolInt128 {
        function coins(int128 i) external view returns (address);
        function underlying_coins(int128 i) external view returns (address);
    }
}

sol! {
    interface ICurvePoolUint256 {
        function coins(uint256 i) external view returns (address);
        function underlying_coins(uint256 i) external view returns (address);
    }
}
