//! # Shared Storage
//!
//! The single state region every logic module operates on. No facet owns
//! storage of its own — the dispatch proxy hands each handler a mutable
//! reference to one [`SharedState`], partitioned into named sub-regions so
//! independently evolving modules never collide:
//!
//! - [`GlobalConfig`] — platform configuration (admin-set parameters).
//! - [`NodeRegistry`] — masternode positions and distribution bookkeeping.
//! - [`VaultRegistry`] — vault staking positions and the reward program.
//! - [`Bank`] — the simulated native-currency (MRD) ledger.
//!
//! Two staging areas live alongside the durable regions: events emitted by
//! the executing call, and outbound native transfers queued by it. Both are
//! drained by the proxy after the handler returns — state mutation always
//! completes before value leaves the contract.
//!
//! All monetary arithmetic in this crate is checked. Wrapping arithmetic
//! and money do not mix.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::events::Event;

/// An account identifier, hex-encoded public key or well-known handle.
pub type Address = String;

/// A native-currency amount in base units.
pub type Amount = u128;

// ---------------------------------------------------------------------------
// Platform constants
// ---------------------------------------------------------------------------

/// Base units per whole MRD. 18 decimals, EVM-style.
pub const MRD: Amount = 1_000_000_000_000_000_000;

/// Fixed-point scale for the vault reward-per-token accumulator.
pub const REWARD_PRECISION: Amount = 1_000_000_000_000_000_000;

/// Seconds a masternode stays locked after a withdrawal request.
pub const LOCK_DURATION_SECS: u64 = 30 * SECONDS_PER_DAY;

/// Whole days after which the instant-withdrawal fee reaches zero.
pub const MATURITY_DAYS: u64 = 32;

/// Seconds in a day, the fee curve's day-count unit.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Default minimum pool size accepted by `distribute_rewards`.
/// Admin-adjustable after initialization via `set_min_reward_pool`.
pub const DEFAULT_MIN_REWARD_POOL: Amount = 25 * MRD;

/// Layout version of [`SharedState`]. Bumped on any change to the
/// sub-region structure so module upgrades can detect stale state.
pub const STATE_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the native-currency ledger.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BankError {
    /// The debited account does not hold enough native currency.
    #[error("insufficient balance: account {account} holds {balance}, needs {amount}")]
    InsufficientBalance {
        /// Account being debited.
        account: Address,
        /// Its current balance.
        balance: Amount,
        /// The amount the operation required.
        amount: Amount,
    },

    /// A credit would overflow the account balance.
    #[error("balance overflow crediting account {account}")]
    BalanceOverflow {
        /// Account being credited.
        account: Address,
    },
}

// ---------------------------------------------------------------------------
// Native-currency ledger
// ---------------------------------------------------------------------------

/// The simulated native-currency ledger.
///
/// In production these balances are the host chain's own account state; the
/// contract only observes deposits (`msg.value`) and issues transfers. The
/// in-memory ledger here gives the engines and the devnet node an exact,
/// checkable stand-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    accounts: HashMap<Address, Amount>,
}

impl Bank {
    /// Returns the balance of `account`, zero if unknown.
    pub fn balance_of(&self, account: &str) -> Amount {
        self.accounts.get(account).copied().unwrap_or(0)
    }

    /// Credits `account` with `amount`.
    pub fn credit(&mut self, account: &str, amount: Amount) -> Result<(), BankError> {
        let balance = self.accounts.entry(account.to_string()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| BankError::BalanceOverflow {
                account: account.to_string(),
            })?;
        Ok(())
    }

    /// Debits `amount` from `account`.
    pub fn debit(&mut self, account: &str, amount: Amount) -> Result<(), BankError> {
        let balance = self.balance_of(account);
        if balance < amount {
            return Err(BankError::InsufficientBalance {
                account: account.to_string(),
                balance,
                amount,
            });
        }
        self.accounts.insert(account.to_string(), balance - amount);
        Ok(())
    }

    /// Moves `amount` from `from` to `to`. Debit is checked first, so a
    /// failed transfer leaves both balances untouched.
    pub fn transfer(&mut self, from: &str, to: &str, amount: Amount) -> Result<(), BankError> {
        self.debit(from, amount)?;
        self.credit(to, amount)
    }
}

// ---------------------------------------------------------------------------
// External collaborator: the eligibility token
// ---------------------------------------------------------------------------

/// Balance-query view of the external eligibility token.
///
/// The vault's `safe_mint` requires callers to hold a minimum balance of
/// this token. The token's own mint/transfer mechanics are out of scope —
/// the contracts only ever read balances through this trait.
pub trait TokenBalance: Send + Sync {
    /// Returns `account`'s balance of the eligibility token.
    fn balance_of(&self, account: &str) -> Amount;
}

/// A token nobody holds. The default collaborator until one is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullToken;

impl TokenBalance for NullToken {
    fn balance_of(&self, _account: &str) -> Amount {
        0
    }
}

/// Fixed balance table, used by the devnet node and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticBalances {
    balances: HashMap<Address, Amount>,
}

impl StaticBalances {
    /// Creates an empty balance table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `account`'s balance, replacing any previous value.
    pub fn set(&mut self, account: &str, amount: Amount) {
        self.balances.insert(account.to_string(), amount);
    }
}

impl TokenBalance for StaticBalances {
    fn balance_of(&self, account: &str) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Configuration region
// ---------------------------------------------------------------------------

/// Masternode engine configuration. Populated by `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasternodeConfig {
    /// Whether `initialize` has run.
    pub initialized: bool,
    /// The address that initialized the engine; sole caller of the setters.
    pub authority: Address,
    /// Minimum native deposit to mint a masternode.
    pub min_deposit: Amount,
    /// Recipient of instant-withdrawal fees.
    pub fee_recipient: Address,
    /// Base URI for masternode NFT metadata.
    pub metadata_uri: String,
    /// Minimum pool accepted by `distribute_rewards`.
    pub min_reward_pool: Amount,
}

/// Vault engine configuration. Populated by `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Whether `initialize` has run.
    pub initialized: bool,
    /// External price oracle address (recorded, queried off-chain).
    pub price_oracle: Address,
    /// Address of the eligibility token contract.
    pub reward_token: Address,
    /// The only address allowed to call `notify_reward_amount`.
    pub reward_distributor: Address,
    /// Minimum eligibility-token balance required to `safe_mint`.
    pub min_eligibility: Amount,
    /// Base URI for vault NFT metadata.
    pub metadata_uri: String,
    /// Display name of the vault position NFT.
    pub token_name: String,
    /// Display symbol of the vault position NFT.
    pub token_symbol: String,
}

/// The configuration sub-region: one singleton per engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Masternode engine settings.
    pub masternode: MasternodeConfig,
    /// Vault engine settings.
    pub vault: VaultConfig,
}

// ---------------------------------------------------------------------------
// Masternode registry
// ---------------------------------------------------------------------------

/// One minted masternode position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePosition {
    /// Sequential id, assigned at mint, never reused.
    pub id: u64,
    /// Current owner. Changes only via NFT transfer.
    pub owner: Address,
    /// The native deposit locked behind this position.
    pub deposit: Amount,
    /// Chain timestamp at mint.
    pub created_at: u64,
    /// Unlock timestamp once a withdrawal has been requested.
    pub unlock_at: Option<u64>,
    /// Rewards credited to this position by distributions so far.
    pub cumulative_rewards: Amount,
}

/// The masternode sub-region: position arena plus distribution bookkeeping.
///
/// Keyed by sequential id in a `BTreeMap` so every iteration order is
/// canonical — reward splits must not depend on insertion history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRegistry {
    /// Active positions by id. Burned ids are removed and never reassigned.
    pub positions: BTreeMap<u64, NodePosition>,
    /// Next id to assign.
    pub next_id: u64,
    /// Total rewards distributed across all positions, ever.
    pub total_rewards_paid: Amount,
    /// Timestamp of the last `distribute_rewards`; eligibility windows for
    /// the next distribution start here (or at mint, whichever is later).
    pub last_distribution_at: u64,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self {
            positions: BTreeMap::new(),
            next_id: 1,
            total_rewards_paid: 0,
            last_distribution_at: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Vault registry
// ---------------------------------------------------------------------------

/// Staking data for one vault NFT id.
///
/// Created lazily at first settlement and zeroed — not removed — on full
/// exit, so historical ids keep a readable (zero) record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPosition {
    /// Native currency currently staked under this id.
    pub staked: Amount,
    /// Accumulator snapshot at this position's last settlement.
    pub reward_per_token_paid: Amount,
    /// Rewards settled but not yet claimed.
    pub unclaimed: Amount,
}

/// The global vault reward program (singleton).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardProgram {
    /// Reward emitted per second, in base units.
    pub reward_rate: Amount,
    /// Timestamp at which the committed reward period ends.
    pub period_finish: u64,
    /// Global accumulator: reward per staked token, scaled by
    /// [`REWARD_PRECISION`]. Advances lazily on every mutating call.
    pub reward_per_token_stored: Amount,
    /// Timestamp of the accumulator's last advance.
    pub last_update_time: u64,
}

/// The vault sub-region: NFT ownership, per-id staking data, and the
/// reward program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRegistry {
    /// NFT ownership by id. Burned ids are removed.
    pub owners: BTreeMap<u64, Address>,
    /// Staking data by id. Survives burn as a zero record.
    pub positions: BTreeMap<u64, VaultPosition>,
    /// Next id to assign.
    pub next_id: u64,
    /// Sum of all `staked` amounts; the accrual formula's denominator.
    pub total_staked: Amount,
    /// The active reward program.
    pub reward: RewardProgram,
}

impl Default for VaultRegistry {
    fn default() -> Self {
        Self {
            owners: BTreeMap::new(),
            positions: BTreeMap::new(),
            next_id: 1,
            total_staked: 0,
            reward: RewardProgram::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// The shared state itself
// ---------------------------------------------------------------------------

/// An outbound native transfer queued by a handler, settled by the proxy
/// after the handler's state mutation has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Recipient address.
    pub to: Address,
    /// Amount in base units.
    pub amount: Amount,
}

/// The one mutable state object behind the dispatch proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedState {
    /// Layout version, see [`STATE_SCHEMA_VERSION`].
    pub schema_version: u32,
    /// Configuration sub-region.
    pub config: GlobalConfig,
    /// Masternode sub-region.
    pub nodes: NodeRegistry,
    /// Vault sub-region.
    pub vault: VaultRegistry,
    /// Native-currency ledger.
    pub bank: Bank,
    /// Events staged by the executing call.
    staged_events: Vec<Event>,
    /// Outbound transfers queued by the executing call.
    queued_transfers: Vec<Transfer>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            config: GlobalConfig::default(),
            nodes: NodeRegistry::default(),
            vault: VaultRegistry::default(),
            bank: Bank::default(),
            staged_events: Vec::new(),
            queued_transfers: Vec::new(),
        }
    }
}

impl SharedState {
    /// Creates a fresh state at the current schema version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an event for commit when the current call succeeds.
    pub fn emit(&mut self, event: Event) {
        self.staged_events.push(event);
    }

    /// Queues an outbound native transfer for post-commit settlement.
    /// Zero-amount transfers are dropped here rather than settled.
    pub fn queue_transfer(&mut self, to: &str, amount: Amount) {
        if amount > 0 {
            self.queued_transfers.push(Transfer {
                to: to.to_string(),
                amount,
            });
        }
    }

    /// Drains the staged events. Called by the proxy on commit.
    pub(crate) fn take_staged_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.staged_events)
    }

    /// Drains the queued transfers. Called by the proxy on commit.
    pub(crate) fn take_queued_transfers(&mut self) -> Vec<Transfer> {
        std::mem::take(&mut self.queued_transfers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_credit_and_debit() {
        let mut bank = Bank::default();
        bank.credit("alice", 100).unwrap();
        assert_eq!(bank.balance_of("alice"), 100);
        bank.debit("alice", 40).unwrap();
        assert_eq!(bank.balance_of("alice"), 60);
    }

    #[test]
    fn bank_overdraft_rejected() {
        let mut bank = Bank::default();
        bank.credit("alice", 10).unwrap();
        let err = bank.debit("alice", 11).unwrap_err();
        assert!(matches!(err, BankError::InsufficientBalance { .. }));
        assert_eq!(bank.balance_of("alice"), 10);
    }

    #[test]
    fn bank_transfer_moves_funds_atomically() {
        let mut bank = Bank::default();
        bank.credit("alice", 100).unwrap();
        bank.transfer("alice", "bob", 60).unwrap();
        assert_eq!(bank.balance_of("alice"), 40);
        assert_eq!(bank.balance_of("bob"), 60);

        // Failed transfer leaves both sides untouched.
        assert!(bank.transfer("alice", "bob", 1_000).is_err());
        assert_eq!(bank.balance_of("alice"), 40);
        assert_eq!(bank.balance_of("bob"), 60);
    }

    #[test]
    fn bank_credit_overflow_rejected() {
        let mut bank = Bank::default();
        bank.credit("alice", Amount::MAX).unwrap();
        let err = bank.credit("alice", 1).unwrap_err();
        assert!(matches!(err, BankError::BalanceOverflow { .. }));
    }

    #[test]
    fn zero_transfers_are_not_queued() {
        let mut state = SharedState::new();
        state.queue_transfer("alice", 0);
        state.queue_transfer("bob", 5);
        let queued = state.take_queued_transfers();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].to, "bob");
    }

    #[test]
    fn static_balances_lookup() {
        let mut t = StaticBalances::new();
        t.set("alice", 200 * MRD);
        assert_eq!(t.balance_of("alice"), 200 * MRD);
        assert_eq!(t.balance_of("bob"), 0);
        assert_eq!(NullToken.balance_of("alice"), 0);
    }
}
