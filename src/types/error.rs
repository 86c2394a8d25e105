//! Error taxonomy for the matching engine.
//!
//! Every fallible operation returns `Result<_, EngineError>`; errors are
//! always surfaced to the caller, never swallowed. "No match possible" is
//! not an error anywhere in the engine - it is an empty result.

use thiserror::Error;

use crate::types::{OrderId, Price, SlotId};

/// Tagged rejection returned by every fallible engine operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown slot {0}")]
    SlotUnknown(SlotId),

    #[error("slot {0} delivery window has closed")]
    SlotExpired(SlotId),

    #[error("slot {0} is deactivated")]
    SlotInactive(SlotId),

    #[error("slot {0} is already registered")]
    SlotDuplicate(SlotId),

    #[error("order targeting {order:#x} does not match slot targeting {slot:#x}")]
    TargetingMismatch { order: u64, slot: u64 },

    #[error("order quantity must be positive")]
    QuantityZero,

    #[error("order expired before submission")]
    OrderExpired,

    #[error("order type is not routable")]
    UnknownOrderType,

    #[error("commit phase for slot {0} is closed")]
    CommitPhaseClosed(SlotId),

    #[error("no committed order {0} in the arena")]
    CommitOrderMissing(OrderId),

    #[error("commitment hash mismatch for order {0}")]
    CommitHashMismatch(OrderId),

    #[error("pool for slot {0} has no liquidity")]
    PoolEmpty(SlotId),

    #[error("swap would exhaust pool liquidity for slot {0}")]
    PoolLiquidityExhausted(SlotId),

    #[error("slot {0} has no remaining supply")]
    InsufficientSupply(SlotId),

    #[error("ask at {price} is below the slot floor {floor}")]
    AskBelowFloor { price: Price, floor: Price },
}
