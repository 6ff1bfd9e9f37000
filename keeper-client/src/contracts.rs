use alloy_sol_types::sol;

sol! {
    /// Upkeep surface of the Counter contract.
    #[sol(rpc)]
    interface ICounter {
        function checkUpkeep(bytes calldata checkData)
            external
            returns (bool upkeepNeeded, bytes memory performData);

        function performUpkeep(bytes calldata performData) external;
    }
}

sol! {
    /// Wrapper that calls `checkUpkeep` on a Counter bound at construction
    /// and remembers the answer.
    #[sol(rpc)]
    contract KeeperSimulation {
        constructor(address counterAddress);

        function checkUpkeep() external;

        function getUpkeepNeeded() external view returns (bool);
    }
}

pub use ICounter::ICounterInstance;
pub use KeeperSimulation::KeeperSimulationInstance;

/// Deployment record name of the upkeep-enabled counter.
pub const COUNTER: &str = "Counter";

/// Deployment record name of the keeper simulation wrapper.
pub const KEEPER_SIMULATION: &str = "KeeperSimulation";
