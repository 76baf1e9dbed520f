//! # Meridian Staking Contracts
//!
//! On-chain logic for the Meridian staking and node-membership platform.
//! All behavior lives in logic modules ("facets") registered behind a
//! single dispatch proxy — the diamond — that routes every call by
//! selector and executes the chosen module against one shared state:
//!
//! - **Dispatch Proxy & Table** — selector routing with atomic batch
//!   upgrades (`cut`), so capability modules can be added or replaced
//!   without migrating state.
//! - **Masternode Engine** — deposit-backed node positions with
//!   time-weighted reward distribution, a 30-day scheduled unlock, and a
//!   linearly decaying instant-exit fee.
//! - **Vault Engine** — continuous reward accrual over staked native
//!   currency, accumulator-and-checkpoint style, so per-call cost never
//!   depends on the number of positions.
//! - **Getters** — view-only projections shared by callers and the node's
//!   API layer.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow — we use `checked_add`
//!    and `checked_mul` everywhere, because wrapping arithmetic and money
//!    do not mix.
//! 2. Calls are atomic: any failure restores the pre-call state snapshot,
//!    payable deposit included.
//! 3. Handlers mutate state first and queue value transfers for the proxy
//!    to settle afterwards; value never leaves mid-mutation.
//! 4. Every public state type is serializable (serde) for the API layer
//!    and persistent storage.

pub mod dispatch;
pub mod events;
pub mod getters;
pub mod masternode;
pub mod state;
pub mod vault;

pub use dispatch::{
    Call, CallContext, CallOutput, ContractError, CutAction, Diamond, DispatchError, DispatchTable,
    Facet, FacetAddress, FacetCut, Receipt, Selector, VaultInit,
};
pub use events::{Event, PositionKind};
pub use getters::{GetterFacet, VaultSnapshot};
pub use masternode::{MasternodeError, MasternodeFacet};
pub use state::{
    Address, Amount, Bank, BankError, GlobalConfig, NodePosition, NodeRegistry, RewardProgram,
    SharedState, StaticBalances, TokenBalance, VaultPosition, VaultRegistry, MRD,
};
pub use vault::{VaultError, VaultFacet};
