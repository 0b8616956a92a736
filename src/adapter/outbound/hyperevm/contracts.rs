//! ABI definitions for the contracts and precompiles the adapter talks to.

use alloy_sol_types::sol;

sol! {
    #[sol(rpc)]
    contract IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

sol! {
    #[sol(rpc)]
    contract IWrappedNative {
        function deposit() external payable;
        function withdraw(uint256 amount) external;
    }
}

sol! {
    #[sol(rpc)]
    contract ICoreWriter {
        function sendRawAction(bytes data) external;
    }
}

sol! {
    #[sol(rpc)]
    contract ITokenRegistry {
        function getTokenIndex(address evmContract) external view returns (uint32);
    }
}

// Precompile return layouts; calldata is the bare ABI-encoded arguments.
sol! {
    struct SpotBalanceRecord {
        uint64 total;
        uint64 hold;
        uint64 entryNtl;
    }

    struct TokenInfoRecord {
        string name;
        uint64[] spots;
        uint64 deployerTradingFeeShare;
        address deployer;
        address evmContract;
        uint8 szDecimals;
        uint8 weiDecimals;
        int8 evmExtraWeiDecimals;
    }

    struct SpotInfoRecord {
        string name;
        uint64[2] tokens;
    }
}
