//! # Getter Facet
//!
//! View-only projections over the shared state, routed through the
//! dispatch table like every other call but guaranteed to mutate nothing.
//! The node's REST layer reuses the same functions directly.
//!
//! Snapshots deliberately tolerate burned vault ids: a fully exited
//! position keeps a readable zero record, so observers can distinguish
//! "exited" from "never existed".

use serde::{Deserialize, Serialize};

use crate::dispatch::{sig, Call, CallContext, CallOutput, ContractError, Facet, Selector};
use crate::masternode::MasternodeError;
use crate::state::{Address, Amount, NodePosition, SharedState};
use crate::vault::{self, VaultError};

/// Point-in-time view of a vault position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// The vault NFT id.
    pub id: u64,
    /// Current owner; `None` once the NFT has been burned.
    pub owner: Option<Address>,
    /// Native currency staked under this id.
    pub staked: Amount,
    /// Accumulator snapshot at the last settlement.
    pub reward_per_token_paid: Amount,
    /// Settled but unclaimed rewards.
    pub unclaimed: Amount,
    /// Total accrued rewards as of the query, including unsettled accrual.
    pub earned: Amount,
}

/// Minimum deposit to mint a masternode.
pub fn min_masternode(state: &SharedState) -> Amount {
    state.config.masternode.min_deposit
}

/// Minimum pool accepted by `distribute_rewards`.
pub fn min_reward_pool(state: &SharedState) -> Amount {
    state.config.masternode.min_reward_pool
}

/// Total rewards ever distributed to masternode positions.
pub fn total_rewards_paid(state: &SharedState) -> Amount {
    state.nodes.total_rewards_paid
}

/// Current vault reward rate (base units per second).
pub fn reward_rate(state: &SharedState) -> Amount {
    state.vault.reward.reward_rate
}

/// End of the committed vault reward period.
pub fn period_finish(state: &SharedState) -> u64 {
    state.vault.reward.period_finish
}

/// Sum of all staked vault balances.
pub fn total_staked(state: &SharedState) -> Amount {
    state.vault.total_staked
}

/// Snapshot of a masternode position.
pub fn node_data(state: &SharedState, id: u64) -> Result<NodePosition, MasternodeError> {
    state
        .nodes
        .positions
        .get(&id)
        .cloned()
        .ok_or(MasternodeError::InvalidTokenId(id))
}

/// Snapshot of a vault position as of `now`. Burned ids resolve to their
/// zero record; ids that never existed are an error.
pub fn vault_data(state: &SharedState, id: u64, now: u64) -> Result<VaultSnapshot, VaultError> {
    let owner = state.vault.owners.get(&id).cloned();
    let position = match state.vault.positions.get(&id) {
        Some(position) => position.clone(),
        None if owner.is_some() => Default::default(),
        None => return Err(VaultError::InvalidTokenId(id)),
    };
    let rpt = vault::reward_per_token(&state.vault, now)?;
    let earned = vault::earned_against(
        position.staked,
        position.reward_per_token_paid,
        position.unclaimed,
        rpt,
    )?;
    Ok(VaultSnapshot {
        id,
        owner,
        staked: position.staked,
        reward_per_token_paid: position.reward_per_token_paid,
        unclaimed: position.unclaimed,
        earned,
    })
}

/// Staked balance under a vault id. Zero for burned ids.
pub fn staked_balance(state: &SharedState, id: u64) -> Result<Amount, VaultError> {
    match state.vault.positions.get(&id) {
        Some(position) => Ok(position.staked),
        None if state.vault.owners.contains_key(&id) => Ok(0),
        None => Err(VaultError::InvalidTokenId(id)),
    }
}

/// The read-accessor logic module.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetterFacet;

impl Facet for GetterFacet {
    fn name(&self) -> &'static str {
        "getters"
    }

    fn selectors(&self) -> Vec<Selector> {
        [
            sig::GET_MIN_MASTERNODE,
            sig::GET_MIN_REWARD_POOL,
            sig::GET_TOTAL_REWARDS_PAID,
            sig::GET_NODE_DATA,
            sig::GET_VAULT_DATA,
            sig::GET_REWARD_RATE,
            sig::GET_PERIOD_FINISH,
            sig::GET_STAKED_BALANCE,
            sig::GET_TOTAL_STAKED,
        ]
        .iter()
        .map(|s| Selector::of(s))
        .collect()
    }

    fn handle(
        &self,
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        call: &Call,
    ) -> Result<CallOutput, ContractError> {
        let output = match call {
            Call::GetMinMasternode => CallOutput::Amount(min_masternode(state)),
            Call::GetMinRewardPool => CallOutput::Amount(min_reward_pool(state)),
            Call::GetTotalRewardsPaid => CallOutput::Amount(total_rewards_paid(state)),
            Call::GetNodeData { id } => CallOutput::Node(node_data(state, *id)?),
            Call::GetVaultData { id } => CallOutput::Vault(vault_data(state, *id, ctx.now)?),
            Call::GetRewardRate => CallOutput::Amount(reward_rate(state)),
            Call::GetPeriodFinish => CallOutput::Amount(period_finish(state) as Amount),
            Call::GetStakedBalance { id } => CallOutput::Amount(staked_balance(state, *id)?),
            Call::GetTotalStaked => CallOutput::Amount(total_staked(state)),
            other => {
                return Err(crate::dispatch::DispatchError::FunctionNotFound(
                    other.selector(),
                )
                .into())
            }
        };
        Ok(output)
    }
}
