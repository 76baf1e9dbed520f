//! # Contract Events
//!
//! Every state-changing operation on the diamond emits one or more events.
//! Events are staged in shared storage while a call executes, then committed
//! to the diamond's log only if the call succeeds — a reverted call leaves
//! no trace. Off-chain observers (the node's WebSocket feed, indexers,
//! tests) consume the committed log.
//!
//! Each event carries the acting address, the position id where one is
//! involved, the amounts moved, and the chain timestamp at emission.

use serde::{Deserialize, Serialize};

use crate::state::{Address, Amount};

/// Which position registry an NFT belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionKind {
    /// A masternode position (deposit-backed, time-locked).
    Masternode,
    /// A vault staking position (continuous reward accrual).
    Vault,
}

impl std::fmt::Display for PositionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionKind::Masternode => write!(f, "masternode"),
            PositionKind::Vault => write!(f, "vault"),
        }
    }
}

/// An event emitted by a contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new masternode position was minted.
    MasternodeMinted {
        owner: Address,
        id: u64,
        deposit: Amount,
        timestamp: u64,
    },
    /// A reward pool was split across active masternode positions.
    RewardsDistributed {
        distributor: Address,
        pool: Amount,
        recipients: u64,
        timestamp: u64,
    },
    /// A masternode owner scheduled an unlock.
    WithdrawalRequested {
        owner: Address,
        id: u64,
        unlock_at: u64,
        timestamp: u64,
    },
    /// A matured masternode was burned and its deposit plus rewards returned.
    MasternodeRedeemed {
        owner: Address,
        id: u64,
        amount: Amount,
        timestamp: u64,
    },
    /// A masternode exited early; the decaying fee went to the fee recipient.
    InstantWithdrawn {
        owner: Address,
        id: u64,
        fee: Amount,
        payout: Amount,
        timestamp: u64,
    },
    /// A new stakeable vault NFT was minted.
    VaultMinted {
        owner: Address,
        id: u64,
        timestamp: u64,
    },
    /// Native currency was staked into a vault position.
    Staked {
        owner: Address,
        id: u64,
        amount: Amount,
        timestamp: u64,
    },
    /// Accrued vault rewards were claimed.
    RewardPaid {
        owner: Address,
        id: u64,
        amount: Amount,
        timestamp: u64,
    },
    /// The reward distributor funded (or extended) the vault reward program.
    RewardNotified {
        distributor: Address,
        amount: Amount,
        duration: u64,
        reward_rate: Amount,
        timestamp: u64,
    },
    /// A vault position was fully exited: stake plus rewards returned, NFT burned.
    VaultRedeemed {
        owner: Address,
        id: u64,
        staked: Amount,
        rewards: Amount,
        timestamp: u64,
    },
    /// Ownership of a position NFT changed hands.
    PositionTransferred {
        kind: PositionKind,
        from: Address,
        to: Address,
        id: u64,
        timestamp: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_tags_variant() {
        let e = Event::Staked {
            owner: "alice".into(),
            id: 3,
            amount: 1_000,
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"type\":\"staked\""));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
