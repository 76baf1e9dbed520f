//! # Dispatch Proxy & Table
//!
//! The diamond: one externally-addressable entry point that routes every
//! call, by selector, to whichever logic module currently owns it, and runs
//! that module against the single [`SharedState`].
//!
//! The moving parts:
//!
//! - [`Selector`] — 4-byte operation identifier, derived from the operation
//!   signature string.
//! - [`DispatchTable`] — `selector -> facet address` routing map, mutated
//!   only through the atomic [`Diamond::cut`] batch.
//! - [`Facet`] — a stateless handler capability. Facets are "installed"
//!   (the deploy step) and then wired into the table by a cut.
//! - [`Diamond`] — owns the shared state, the table, the installed facets,
//!   the admin identity, the chain clock, and the committed event log.
//!
//! ## Atomicity
//!
//! A cut batch is validated entry-by-entry against a working copy of the
//! table and committed only if every entry passes — a failing batch leaves
//! the table untouched. A call snapshots the shared state before executing
//! and restores it wholesale on any error, so a failed call mutates nothing,
//! including the payable deposit it arrived with.
//!
//! ## Effects before interactions
//!
//! Handlers receive `&mut SharedState` and nothing else — they queue
//! outbound native transfers in storage rather than moving value, and the
//! proxy settles the queue only after the handler has returned. Re-entering
//! the proxy from inside a handler is unrepresentable by construction.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use uuid::Uuid;

use crate::events::Event;
use crate::getters::VaultSnapshot;
use crate::masternode::MasternodeError;
use crate::state::{
    Address, Amount, BankError, NodePosition, NullToken, SharedState, TokenBalance,
};
use crate::vault::VaultError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the dispatch machinery itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The caller is not the diamond admin.
    #[error("unauthorized: {caller} is not the diamond admin")]
    Unauthorized {
        /// The address that attempted the operation.
        caller: Address,
    },

    /// An Add entry targeted a selector that is already mapped.
    #[error("selector {0} is already registered")]
    SelectorAlreadyRegistered(Selector),

    /// A Replace or Remove entry targeted a selector that is not mapped.
    #[error("selector {0} is not registered")]
    SelectorNotRegistered(Selector),

    /// No facet is registered for the called selector.
    #[error("no facet registered for selector {0}")]
    FunctionNotFound(Selector),

    /// A cut referenced a facet address that was never installed, or the
    /// table routes to a facet that has since disappeared.
    #[error("unknown facet address: {0}")]
    UnknownFacet(String),

    /// An Add or Replace entry carried no facet address.
    #[error("cut entry is missing a facet address")]
    MissingFacetAddress,
}

/// Unified error type returned by every call through the diamond.
///
/// Each module keeps its own error enum (the named failure conditions in
/// its docs); the proxy folds them into one type at the dispatch boundary.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Masternode(#[from] MasternodeError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Bank(#[from] BankError),
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// A 4-byte operation identifier: the first four bytes of the BLAKE3 hash
/// of the operation's signature string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector([u8; 4]);

impl Selector {
    /// Derives the selector for a signature string, e.g.
    /// `Selector::of("stake(uint64,uint128)")`.
    pub fn of(signature: &str) -> Self {
        let hash = blake3::hash(signature.as_bytes());
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&hash.as_bytes()[..4]);
        Self(bytes)
    }

    /// Raw selector bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Operation signature strings. One constant per routable operation;
/// facets and [`Call::selector`] both derive selectors from these, so the
/// two can never drift apart.
pub mod sig {
    // Masternode engine.
    pub const INITIALIZE_MASTERNODE: &str = "initializeMasternode(uint128,address,string)";
    pub const SET_MIN_DEPOSIT: &str = "setMinDeposit(uint128)";
    pub const SET_MIN_REWARD_POOL: &str = "setMinRewardPool(uint128)";
    pub const MINT_MASTERNODE: &str = "mintMasternode()";
    pub const DISTRIBUTE_REWARDS: &str = "distributeRewards()";
    pub const REQUEST_WITHDRAWAL: &str = "requestWithdrawal(uint64)";
    pub const BURN_AND_REDEEM_MASTERNODE: &str = "burnAndRedeemMasternode(uint64)";
    pub const INSTANT_WITHDRAW: &str = "instantWithdraw(uint64)";
    pub const TRANSFER_MASTERNODE: &str = "transferMasternode(uint64,address)";
    pub const MASTERNODE_OWNER_OF: &str = "masternodeOwnerOf(uint64)";
    pub const MASTERNODE_BALANCE_OF: &str = "masternodeBalanceOf(address)";

    // Vault engine.
    pub const INITIALIZE_VAULT: &str =
        "initializeVault(address,address,address,uint128,uint128,string,string,string)";
    pub const NOTIFY_REWARD_AMOUNT: &str = "notifyRewardAmount(uint128,uint64)";
    pub const SAFE_MINT: &str = "safeMint()";
    pub const STAKE: &str = "stake(uint64,uint128)";
    pub const GET_REWARD: &str = "getReward(uint64)";
    pub const BURN_AND_REDEEM_VAULT: &str = "burnAndRedeemVault(uint64)";
    pub const EARNED: &str = "earned(uint64)";
    pub const TRANSFER_VAULT: &str = "transferVault(uint64,address)";
    pub const VAULT_OWNER_OF: &str = "vaultOwnerOf(uint64)";
    pub const VAULT_BALANCE_OF: &str = "vaultBalanceOf(address)";

    // Read accessors.
    pub const GET_MIN_MASTERNODE: &str = "getMinMasternode()";
    pub const GET_MIN_REWARD_POOL: &str = "getMinRewardPool()";
    pub const GET_TOTAL_REWARDS_PAID: &str = "getTotalRewardsPaid()";
    pub const GET_NODE_DATA: &str = "getNodeData(uint64)";
    pub const GET_VAULT_DATA: &str = "getVaultData(uint64)";
    pub const GET_REWARD_RATE: &str = "getRewardRate()";
    pub const GET_PERIOD_FINISH: &str = "getPeriodFinish()";
    pub const GET_STAKED_BALANCE: &str = "getStakedBalance(uint64)";
    pub const GET_TOTAL_STAKED: &str = "getTotalStaked()";
}

// ---------------------------------------------------------------------------
// Calls and outputs
// ---------------------------------------------------------------------------

/// Parameters for vault initialization. Grouped because the vault's
/// constructor surface is wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultInit {
    /// External price oracle address.
    pub price_oracle: Address,
    /// Eligibility token contract address.
    pub reward_token: Address,
    /// Sole caller of `notify_reward_amount`.
    pub reward_distributor: Address,
    /// Minimum eligibility-token balance to mint a vault NFT.
    pub min_eligibility: Amount,
    /// Reward rate visible before the first notification.
    pub initial_reward_rate: Amount,
    /// NFT metadata base URI.
    pub metadata_uri: String,
    /// NFT display name.
    pub token_name: String,
    /// NFT display symbol.
    pub token_symbol: String,
}

/// A typed call payload. The diamond routes on [`Call::selector`], so the
/// table — not this enum — decides which facet executes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    // Masternode engine.
    InitializeMasternode {
        min_deposit: Amount,
        fee_recipient: Address,
        metadata_uri: String,
    },
    SetMinDeposit {
        value: Amount,
    },
    SetMinRewardPool {
        value: Amount,
    },
    MintMasternode,
    DistributeRewards,
    RequestWithdrawal {
        id: u64,
    },
    BurnAndRedeemMasternode {
        id: u64,
    },
    InstantWithdraw {
        id: u64,
    },
    TransferMasternode {
        id: u64,
        to: Address,
    },
    MasternodeOwnerOf {
        id: u64,
    },
    MasternodeBalanceOf {
        owner: Address,
    },

    // Vault engine.
    InitializeVault(VaultInit),
    NotifyRewardAmount {
        amount: Amount,
        duration: u64,
    },
    SafeMint,
    Stake {
        id: u64,
        amount: Amount,
    },
    GetReward {
        id: u64,
    },
    BurnAndRedeemVault {
        id: u64,
    },
    Earned {
        id: u64,
    },
    TransferVault {
        id: u64,
        to: Address,
    },
    VaultOwnerOf {
        id: u64,
    },
    VaultBalanceOf {
        owner: Address,
    },

    // Read accessors.
    GetMinMasternode,
    GetMinRewardPool,
    GetTotalRewardsPaid,
    GetNodeData {
        id: u64,
    },
    GetVaultData {
        id: u64,
    },
    GetRewardRate,
    GetPeriodFinish,
    GetStakedBalance {
        id: u64,
    },
    GetTotalStaked,
}

impl Call {
    /// The selector this call routes on.
    pub fn selector(&self) -> Selector {
        Selector::of(self.signature())
    }

    /// The signature string behind [`Call::selector`].
    pub fn signature(&self) -> &'static str {
        match self {
            Call::InitializeMasternode { .. } => sig::INITIALIZE_MASTERNODE,
            Call::SetMinDeposit { .. } => sig::SET_MIN_DEPOSIT,
            Call::SetMinRewardPool { .. } => sig::SET_MIN_REWARD_POOL,
            Call::MintMasternode => sig::MINT_MASTERNODE,
            Call::DistributeRewards => sig::DISTRIBUTE_REWARDS,
            Call::RequestWithdrawal { .. } => sig::REQUEST_WITHDRAWAL,
            Call::BurnAndRedeemMasternode { .. } => sig::BURN_AND_REDEEM_MASTERNODE,
            Call::InstantWithdraw { .. } => sig::INSTANT_WITHDRAW,
            Call::TransferMasternode { .. } => sig::TRANSFER_MASTERNODE,
            Call::MasternodeOwnerOf { .. } => sig::MASTERNODE_OWNER_OF,
            Call::MasternodeBalanceOf { .. } => sig::MASTERNODE_BALANCE_OF,
            Call::InitializeVault(_) => sig::INITIALIZE_VAULT,
            Call::NotifyRewardAmount { .. } => sig::NOTIFY_REWARD_AMOUNT,
            Call::SafeMint => sig::SAFE_MINT,
            Call::Stake { .. } => sig::STAKE,
            Call::GetReward { .. } => sig::GET_REWARD,
            Call::BurnAndRedeemVault { .. } => sig::BURN_AND_REDEEM_VAULT,
            Call::Earned { .. } => sig::EARNED,
            Call::TransferVault { .. } => sig::TRANSFER_VAULT,
            Call::VaultOwnerOf { .. } => sig::VAULT_OWNER_OF,
            Call::VaultBalanceOf { .. } => sig::VAULT_BALANCE_OF,
            Call::GetMinMasternode => sig::GET_MIN_MASTERNODE,
            Call::GetMinRewardPool => sig::GET_MIN_REWARD_POOL,
            Call::GetTotalRewardsPaid => sig::GET_TOTAL_REWARDS_PAID,
            Call::GetNodeData { .. } => sig::GET_NODE_DATA,
            Call::GetVaultData { .. } => sig::GET_VAULT_DATA,
            Call::GetRewardRate => sig::GET_REWARD_RATE,
            Call::GetPeriodFinish => sig::GET_PERIOD_FINISH,
            Call::GetStakedBalance { .. } => sig::GET_STAKED_BALANCE,
            Call::GetTotalStaked => sig::GET_TOTAL_STAKED,
        }
    }
}

/// The typed result of a successful call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CallOutput {
    /// The call returns nothing.
    None,
    /// A native-currency or reward amount.
    Amount(Amount),
    /// A count (NFT balances).
    Count(u64),
    /// A newly minted or queried token id.
    TokenId(u64),
    /// An account address.
    Address(Address),
    /// A masternode position snapshot.
    Node(NodePosition),
    /// A vault position snapshot.
    Vault(VaultSnapshot),
}

impl CallOutput {
    /// The amount, if this output carries one.
    pub fn as_amount(&self) -> Option<Amount> {
        match self {
            CallOutput::Amount(a) => Some(*a),
            _ => None,
        }
    }

    /// The count, if this output carries one.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            CallOutput::Count(c) => Some(*c),
            _ => None,
        }
    }

    /// The token id, if this output carries one.
    pub fn as_token_id(&self) -> Option<u64> {
        match self {
            CallOutput::TokenId(id) => Some(*id),
            _ => None,
        }
    }

    /// The address, if this output carries one.
    pub fn as_address(&self) -> Option<&str> {
        match self {
            CallOutput::Address(a) => Some(a),
            _ => None,
        }
    }

    /// The node snapshot, if this output carries one.
    pub fn as_node(&self) -> Option<&NodePosition> {
        match self {
            CallOutput::Node(n) => Some(n),
            _ => None,
        }
    }

    /// The vault snapshot, if this output carries one.
    pub fn as_vault(&self) -> Option<&VaultSnapshot> {
        match self {
            CallOutput::Vault(v) => Some(v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Facets
// ---------------------------------------------------------------------------

/// Per-call execution context handed to a facet alongside the state.
pub struct CallContext<'a> {
    /// The calling address.
    pub caller: Address,
    /// Native currency attached to the call, already credited to the
    /// diamond when the handler runs.
    pub value: Amount,
    /// Chain timestamp for this call.
    pub now: u64,
    /// Transaction id assigned by the proxy.
    pub tx_id: Uuid,
    /// Balance-query view of the external eligibility token.
    pub eligibility: &'a dyn TokenBalance,
}

/// A logic module: stateless itself, executing against the shared state.
///
/// Implementations hold no fields that could desynchronize from storage —
/// everything they know arrives through `state` and `ctx`.
pub trait Facet: Send + Sync {
    /// Human-readable module name, used in facet addresses and logs.
    fn name(&self) -> &'static str;

    /// The selectors this module answers for. Used to build cut batches.
    fn selectors(&self) -> Vec<Selector>;

    /// Executes one call against the shared state.
    fn handle(
        &self,
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        call: &Call,
    ) -> Result<CallOutput, ContractError>;
}

/// Address assigned to an installed facet instance.
pub type FacetAddress = String;

// ---------------------------------------------------------------------------
// Cuts
// ---------------------------------------------------------------------------

/// What a cut entry does to its selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutAction {
    /// Map selectors that are currently unmapped.
    Add,
    /// Remap selectors that are currently mapped.
    Replace,
    /// Clear selectors that are currently mapped.
    Remove,
}

/// One entry in a cut batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetCut {
    /// Target facet. Required for Add and Replace; ignored for Remove.
    pub facet: Option<FacetAddress>,
    /// What to do with the selectors.
    pub action: CutAction,
    /// The selectors this entry covers.
    pub selectors: Vec<Selector>,
}

impl FacetCut {
    /// An Add entry covering `selectors`.
    pub fn add(facet: &str, selectors: Vec<Selector>) -> Self {
        Self {
            facet: Some(facet.to_string()),
            action: CutAction::Add,
            selectors,
        }
    }

    /// A Replace entry covering `selectors`.
    pub fn replace(facet: &str, selectors: Vec<Selector>) -> Self {
        Self {
            facet: Some(facet.to_string()),
            action: CutAction::Replace,
            selectors,
        }
    }

    /// A Remove entry covering `selectors`.
    pub fn remove(selectors: Vec<Selector>) -> Self {
        Self {
            facet: None,
            action: CutAction::Remove,
            selectors,
        }
    }
}

/// The selector routing map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchTable {
    routes: HashMap<Selector, FacetAddress>,
}

impl DispatchTable {
    /// Resolves a selector to the responsible facet address.
    pub fn resolve(&self, selector: &Selector) -> Option<&FacetAddress> {
        self.routes.get(selector)
    }

    /// Number of mapped selectors.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Applies one cut entry, enforcing the Add/Replace/Remove invariants.
    fn apply(
        &mut self,
        entry: &FacetCut,
        installed: &BTreeMap<FacetAddress, Box<dyn Facet>>,
    ) -> Result<(), DispatchError> {
        match entry.action {
            CutAction::Add | CutAction::Replace => {
                let facet = entry
                    .facet
                    .as_ref()
                    .ok_or(DispatchError::MissingFacetAddress)?;
                if !installed.contains_key(facet) {
                    return Err(DispatchError::UnknownFacet(facet.clone()));
                }
                for selector in &entry.selectors {
                    let mapped = self.routes.contains_key(selector);
                    match entry.action {
                        CutAction::Add if mapped => {
                            return Err(DispatchError::SelectorAlreadyRegistered(*selector));
                        }
                        CutAction::Replace if !mapped => {
                            return Err(DispatchError::SelectorNotRegistered(*selector));
                        }
                        _ => {
                            self.routes.insert(*selector, facet.clone());
                        }
                    }
                }
            }
            CutAction::Remove => {
                for selector in &entry.selectors {
                    if self.routes.remove(selector).is_none() {
                        return Err(DispatchError::SelectorNotRegistered(*selector));
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// The diamond
// ---------------------------------------------------------------------------

/// Receipt returned by a successful call.
#[derive(Debug, Clone)]
pub struct Receipt {
    /// Transaction id assigned by the proxy.
    pub tx_id: Uuid,
    /// The call's typed return value.
    pub output: CallOutput,
    /// Events this call emitted, in emission order.
    pub events: Vec<Event>,
}

/// The dispatch proxy: the single entry point of the platform.
pub struct Diamond {
    address: Address,
    admin: Address,
    now: u64,
    state: SharedState,
    table: DispatchTable,
    facets: BTreeMap<FacetAddress, Box<dyn Facet>>,
    eligibility: Box<dyn TokenBalance>,
    log: Vec<Event>,
}

impl Diamond {
    /// Creates a diamond with `admin` as the sole cut authority. The chain
    /// clock starts at the current wall-clock time; tests advance it
    /// explicitly with [`Diamond::advance_time`].
    pub fn new(admin: &str) -> Self {
        Self {
            address: format!("diamond:{}", Uuid::new_v4().simple()),
            admin: admin.to_string(),
            now: chrono::Utc::now().timestamp() as u64,
            state: SharedState::new(),
            table: DispatchTable::default(),
            facets: BTreeMap::new(),
            eligibility: Box::new(NullToken),
            log: Vec::new(),
        }
    }

    /// The diamond's own address. Pooled deposits sit here in the bank.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The admin address.
    pub fn admin(&self) -> &str {
        &self.admin
    }

    /// Current chain timestamp.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Advances the chain clock by `secs`.
    pub fn advance_time(&mut self, secs: u64) {
        self.now += secs;
    }

    /// Sets the chain clock. The clock never moves backwards.
    pub fn set_time(&mut self, now: u64) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Read access to the shared state, for accessors and the API layer.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// The current dispatch table.
    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// The committed event log.
    pub fn log(&self) -> &[Event] {
        &self.log
    }

    /// Wires in the external eligibility token collaborator.
    pub fn set_eligibility(&mut self, token: Box<dyn TokenBalance>) {
        self.eligibility = token;
    }

    /// Devnet faucet: credits `account` with native currency out of thin
    /// air. Genesis allocation, not a contract operation.
    pub fn fund(&mut self, account: &str, amount: Amount) {
        self.state
            .bank
            .credit(account, amount)
            .expect("faucet credit overflow");
    }

    /// Native balance of `account` in the simulated ledger.
    pub fn native_balance_of(&self, account: &str) -> Amount {
        self.state.bank.balance_of(account)
    }

    /// Installs a facet instance and returns its address — the deploy step.
    /// Installation does not route anything; follow with [`Diamond::cut`].
    pub fn install(&mut self, facet: Box<dyn Facet>) -> FacetAddress {
        let address = format!("{}:{}", facet.name(), Uuid::new_v4().simple());
        tracing::info!(facet = facet.name(), %address, "facet installed");
        self.facets.insert(address.clone(), facet);
        address
    }

    /// Applies a cut batch: every entry in order, atomically.
    ///
    /// The batch is validated against a working copy of the table; only a
    /// fully valid batch is committed, so a failing entry leaves the live
    /// table exactly as it was.
    pub fn cut(&mut self, caller: &str, entries: &[FacetCut]) -> Result<(), ContractError> {
        if caller != self.admin {
            return Err(DispatchError::Unauthorized {
                caller: caller.to_string(),
            }
            .into());
        }

        let mut working = self.table.clone();
        for entry in entries {
            working.apply(entry, &self.facets)?;
        }

        tracing::info!(
            entries = entries.len(),
            routes = working.len(),
            "diamond cut applied"
        );
        self.table = working;
        Ok(())
    }

    /// Executes a call through the dispatch table.
    ///
    /// `value` is the native currency attached to the call; it is debited
    /// from `caller` and credited to the diamond before the handler runs.
    /// On any failure the pre-call state snapshot is restored wholesale.
    pub fn execute(
        &mut self,
        caller: &str,
        value: Amount,
        call: Call,
    ) -> Result<Receipt, ContractError> {
        let selector = call.selector();
        let facet_address = self
            .table
            .resolve(&selector)
            .cloned()
            .ok_or(DispatchError::FunctionNotFound(selector))?;

        let snapshot = self.state.clone();
        let tx_id = Uuid::new_v4();

        match self.dispatch(&facet_address, caller, value, tx_id, &call) {
            Ok(output) => {
                let events = self.state.take_staged_events();
                self.log.extend(events.iter().cloned());
                Ok(Receipt {
                    tx_id,
                    output,
                    events,
                })
            }
            Err(err) => {
                self.state = snapshot;
                tracing::debug!(%selector, caller, %err, "call reverted");
                Err(err)
            }
        }
    }

    /// The unprotected inner dispatch: payable debit, handler execution,
    /// settlement of queued transfers. Callers handle rollback.
    fn dispatch(
        &mut self,
        facet_address: &str,
        caller: &str,
        value: Amount,
        tx_id: Uuid,
        call: &Call,
    ) -> Result<CallOutput, ContractError> {
        let facet = self
            .facets
            .get(facet_address)
            .ok_or_else(|| DispatchError::UnknownFacet(facet_address.to_string()))?;

        if value > 0 {
            self.state.bank.transfer(caller, &self.address, value)?;
        }

        let ctx = CallContext {
            caller: caller.to_string(),
            value,
            now: self.now,
            tx_id,
            eligibility: self.eligibility.as_ref(),
        };

        let output = facet.handle(&mut self.state, &ctx, call)?;

        // State mutation is complete; only now does value leave the pool.
        for transfer in self.state.take_queued_transfers() {
            self.state
                .bank
                .transfer(&self.address, &transfer.to, transfer.amount)?;
        }

        Ok(output)
    }
}
