//! # Masternode Facet
//!
//! The node lifecycle engine. Users mint a masternode position by
//! depositing at least the configured minimum of native currency; the
//! position then participates in periodic reward distributions until its
//! owner exits — either by requesting a scheduled unlock and redeeming
//! after the 30-day lock, or instantly, paying a fee that decays linearly
//! to zero as the position approaches 32 days of age.
//!
//! Position lifecycle: `Unminted -> Active -> WithdrawalRequested ->
//! Redeemed/Burned`. A position with a pending withdrawal request no longer
//! counts as active for reward distribution.
//!
//! ## Reward distribution
//!
//! `distribute_rewards` splits the attached pool across active positions
//! proportionally to the time each was eligible since the previous
//! distribution (a freshly minted position earns nothing retroactively).
//! Shares are computed by largest remainder so the split conserves the pool
//! exactly, and the registry iterates in id order so the result is
//! independent of mint history.

use thiserror::Error;

use crate::dispatch::{sig, Call, CallContext, CallOutput, ContractError, Facet, Selector};
use crate::events::{Event, PositionKind};
use crate::state::{
    Address, Amount, MasternodeConfig, NodePosition, SharedState, DEFAULT_MIN_REWARD_POOL,
    LOCK_DURATION_SECS, MATURITY_DAYS, SECONDS_PER_DAY,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during masternode operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MasternodeError {
    /// `initialize` was called twice.
    #[error("masternode engine is already initialized")]
    AlreadyInitialized,

    /// A state-changing call arrived before `initialize`.
    #[error("masternode engine is not initialized")]
    NotInitialized,

    /// The caller is not the configuration authority.
    #[error("unauthorized: {caller} may not change masternode configuration")]
    Unauthorized {
        /// The address that attempted the operation.
        caller: Address,
    },

    /// The attached deposit is below the configured minimum.
    #[error("insufficient deposit: sent {provided}, minimum is {minimum}")]
    InsufficientDeposit {
        /// Native currency attached to the call.
        provided: Amount,
        /// The configured minimum deposit.
        minimum: Amount,
    },

    /// The attached reward pool is below the configured minimum.
    #[error("reward pool too small: sent {provided}, minimum is {minimum}")]
    RewardPoolTooSmall {
        /// Native currency attached to the call.
        provided: Amount,
        /// The configured minimum pool.
        minimum: Amount,
    },

    /// A distribution found no active position with nonzero eligible time.
    #[error("no positions eligible for distribution")]
    NoEligiblePositions,

    /// The referenced position does not exist (never minted, or burned).
    #[error("invalid token id: {0}")]
    InvalidTokenId(u64),

    /// The caller does not own the referenced position.
    #[error("not owner: {caller} does not own position {id}")]
    NotOwner {
        /// The address that attempted the operation.
        caller: Address,
        /// The position id.
        id: u64,
    },

    /// A withdrawal was already requested for this position.
    #[error("withdrawal already requested for position {id}")]
    WithdrawalAlreadyRequested {
        /// The position id.
        id: u64,
    },

    /// The position's lock has not expired (or no unlock was requested).
    #[error("position {id} is still locked")]
    TokenLocked {
        /// The position id.
        id: u64,
    },

    /// A reward or payout computation would overflow.
    #[error("amount overflow in masternode accounting")]
    AmountOverflow,
}

// ---------------------------------------------------------------------------
// Fee curve
// ---------------------------------------------------------------------------

/// Instant-withdrawal fee for a deposit that has been locked for
/// `elapsed_days` whole days.
///
/// Linear decay: the full deposit at day 0, zero from day
/// [`MATURITY_DAYS`] on. Monotonically non-increasing in `elapsed_days`.
pub fn exit_fee(deposit: Amount, elapsed_days: u64) -> Result<Amount, MasternodeError> {
    if elapsed_days >= MATURITY_DAYS {
        return Ok(0);
    }
    let remaining = (MATURITY_DAYS - elapsed_days) as Amount;
    let scaled = deposit
        .checked_mul(remaining)
        .ok_or(MasternodeError::AmountOverflow)?;
    Ok(scaled / MATURITY_DAYS as Amount)
}

// ---------------------------------------------------------------------------
// The facet
// ---------------------------------------------------------------------------

/// The masternode logic module. Stateless; all data lives in
/// [`SharedState::nodes`] and [`SharedState::config`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MasternodeFacet;

impl Facet for MasternodeFacet {
    fn name(&self) -> &'static str {
        "masternode"
    }

    fn selectors(&self) -> Vec<Selector> {
        [
            sig::INITIALIZE_MASTERNODE,
            sig::SET_MIN_DEPOSIT,
            sig::SET_MIN_REWARD_POOL,
            sig::MINT_MASTERNODE,
            sig::DISTRIBUTE_REWARDS,
            sig::REQUEST_WITHDRAWAL,
            sig::BURN_AND_REDEEM_MASTERNODE,
            sig::INSTANT_WITHDRAW,
            sig::TRANSFER_MASTERNODE,
            sig::MASTERNODE_OWNER_OF,
            sig::MASTERNODE_BALANCE_OF,
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
            Call::InitializeMasternode {
                min_deposit,
                fee_recipient,
                metadata_uri,
            } => Self::initialize(state, ctx, *min_deposit, fee_recipient, metadata_uri)?,
            Call::SetMinDeposit { value } => Self::set_min_deposit(state, ctx, *value)?,
            Call::SetMinRewardPool { value } => Self::set_min_reward_pool(state, ctx, *value)?,
            Call::MintMasternode => Self::mint(state, ctx)?,
            Call::DistributeRewards => Self::distribute_rewards(state, ctx)?,
            Call::RequestWithdrawal { id } => Self::request_withdrawal(state, ctx, *id)?,
            Call::BurnAndRedeemMasternode { id } => Self::burn_and_redeem(state, ctx, *id)?,
            Call::InstantWithdraw { id } => Self::instant_withdraw(state, ctx, *id)?,
            Call::TransferMasternode { id, to } => Self::transfer(state, ctx, *id, to)?,
            Call::MasternodeOwnerOf { id } => Self::owner_of(state, *id)?,
            Call::MasternodeBalanceOf { owner } => Self::balance_of(state, owner),
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

impl MasternodeFacet {
    /// One-time engine setup. The caller becomes the configuration
    /// authority for the setters below.
    fn initialize(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        min_deposit: Amount,
        fee_recipient: &str,
        metadata_uri: &str,
    ) -> Result<CallOutput, MasternodeError> {
        if state.config.masternode.initialized {
            return Err(MasternodeError::AlreadyInitialized);
        }
        state.config.masternode = MasternodeConfig {
            initialized: true,
            authority: ctx.caller.clone(),
            min_deposit,
            fee_recipient: fee_recipient.to_string(),
            metadata_uri: metadata_uri.to_string(),
            min_reward_pool: DEFAULT_MIN_REWARD_POOL,
        };
        tracing::info!(authority = %ctx.caller, min_deposit, "masternode engine initialized");
        Ok(CallOutput::None)
    }

    fn set_min_deposit(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        value: Amount,
    ) -> Result<CallOutput, MasternodeError> {
        let config = Self::config(state)?;
        if ctx.caller != config.authority {
            return Err(MasternodeError::Unauthorized {
                caller: ctx.caller.clone(),
            });
        }
        state.config.masternode.min_deposit = value;
        Ok(CallOutput::None)
    }

    fn set_min_reward_pool(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        value: Amount,
    ) -> Result<CallOutput, MasternodeError> {
        let config = Self::config(state)?;
        if ctx.caller != config.authority {
            return Err(MasternodeError::Unauthorized {
                caller: ctx.caller.clone(),
            });
        }
        state.config.masternode.min_reward_pool = value;
        Ok(CallOutput::None)
    }

    /// Mints a masternode backed by the attached deposit.
    fn mint(state: &mut SharedState, ctx: &CallContext<'_>) -> Result<CallOutput, MasternodeError> {
        let config = Self::config(state)?;
        if ctx.value < config.min_deposit {
            return Err(MasternodeError::InsufficientDeposit {
                provided: ctx.value,
                minimum: config.min_deposit,
            });
        }

        let id = state.nodes.next_id;
        state.nodes.next_id += 1;
        state.nodes.positions.insert(
            id,
            NodePosition {
                id,
                owner: ctx.caller.clone(),
                deposit: ctx.value,
                created_at: ctx.now,
                unlock_at: None,
                cumulative_rewards: 0,
            },
        );

        state.emit(Event::MasternodeMinted {
            owner: ctx.caller.clone(),
            id,
            deposit: ctx.value,
            timestamp: ctx.now,
        });
        Ok(CallOutput::TokenId(id))
    }

    /// Splits the attached pool across active positions, weighted by the
    /// time each was eligible since the last distribution.
    fn distribute_rewards(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
    ) -> Result<CallOutput, MasternodeError> {
        let config = Self::config(state)?;
        let pool = ctx.value;
        if pool < config.min_reward_pool {
            return Err(MasternodeError::RewardPoolTooSmall {
                provided: pool,
                minimum: config.min_reward_pool,
            });
        }

        let since = state.nodes.last_distribution_at;
        // (id, eligible seconds, floor share, remainder), id-ordered.
        let mut shares: Vec<(u64, Amount, Amount)> = Vec::new();
        let mut total_weight: Amount = 0;
        for position in state.nodes.positions.values() {
            if position.unlock_at.is_some() {
                continue;
            }
            let eligible_from = position.created_at.max(since);
            let weight = ctx.now.saturating_sub(eligible_from) as Amount;
            total_weight = total_weight
                .checked_add(weight)
                .ok_or(MasternodeError::AmountOverflow)?;
            shares.push((position.id, weight, 0));
        }
        if shares.is_empty() || total_weight == 0 {
            return Err(MasternodeError::NoEligiblePositions);
        }

        // Largest-remainder split: floor shares first, then hand the
        // leftover units to the largest fractional remainders (ties to the
        // lower id). Conserves the pool exactly.
        let mut assigned: Amount = 0;
        let mut remainders: Vec<(Amount, u64, usize)> = Vec::new();
        for (index, entry) in shares.iter_mut().enumerate() {
            let numerator = pool
                .checked_mul(entry.1)
                .ok_or(MasternodeError::AmountOverflow)?;
            entry.2 = numerator / total_weight;
            assigned += entry.2;
            remainders.push((numerator % total_weight, entry.0, index));
        }
        let mut leftover = pool - assigned;
        remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        for (_, _, index) in remainders {
            if leftover == 0 {
                break;
            }
            shares[index].2 += 1;
            leftover -= 1;
        }

        let recipients = shares.len() as u64;
        for (id, _, share) in shares {
            let position = state
                .nodes
                .positions
                .get_mut(&id)
                .ok_or(MasternodeError::InvalidTokenId(id))?;
            position.cumulative_rewards = position
                .cumulative_rewards
                .checked_add(share)
                .ok_or(MasternodeError::AmountOverflow)?;
        }

        state.nodes.total_rewards_paid = state
            .nodes
            .total_rewards_paid
            .checked_add(pool)
            .ok_or(MasternodeError::AmountOverflow)?;
        state.nodes.last_distribution_at = ctx.now;

        state.emit(Event::RewardsDistributed {
            distributor: ctx.caller.clone(),
            pool,
            recipients,
            timestamp: ctx.now,
        });
        Ok(CallOutput::None)
    }

    /// Schedules an unlock 30 days out and takes the position out of
    /// reward distribution.
    fn request_withdrawal(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        id: u64,
    ) -> Result<CallOutput, MasternodeError> {
        Self::config(state)?;
        let position = Self::owned_position_mut(state, &ctx.caller, id)?;
        if position.unlock_at.is_some() {
            return Err(MasternodeError::WithdrawalAlreadyRequested { id });
        }
        let unlock_at = ctx.now + LOCK_DURATION_SECS;
        position.unlock_at = Some(unlock_at);

        state.emit(Event::WithdrawalRequested {
            owner: ctx.caller.clone(),
            id,
            unlock_at,
            timestamp: ctx.now,
        });
        Ok(CallOutput::None)
    }

    /// Burns a matured position and returns deposit plus accrued rewards.
    fn burn_and_redeem(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        id: u64,
    ) -> Result<CallOutput, MasternodeError> {
        Self::config(state)?;
        let position = Self::owned_position_mut(state, &ctx.caller, id)?;
        match position.unlock_at {
            Some(unlock_at) if unlock_at <= ctx.now => {}
            _ => return Err(MasternodeError::TokenLocked { id }),
        }

        let payout = position
            .deposit
            .checked_add(position.cumulative_rewards)
            .ok_or(MasternodeError::AmountOverflow)?;
        state.nodes.positions.remove(&id);

        state.queue_transfer(&ctx.caller, payout);
        state.emit(Event::MasternodeRedeemed {
            owner: ctx.caller.clone(),
            id,
            amount: payout,
            timestamp: ctx.now,
        });
        Ok(CallOutput::Amount(payout))
    }

    /// Exits immediately, paying the decaying early-exit fee.
    fn instant_withdraw(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        id: u64,
    ) -> Result<CallOutput, MasternodeError> {
        let fee_recipient = Self::config(state)?.fee_recipient.clone();
        let position = Self::owned_position_mut(state, &ctx.caller, id)?;

        let elapsed_days = ctx.now.saturating_sub(position.created_at) / SECONDS_PER_DAY;
        let fee = exit_fee(position.deposit, elapsed_days)?;
        let payout = (position.deposit - fee)
            .checked_add(position.cumulative_rewards)
            .ok_or(MasternodeError::AmountOverflow)?;
        state.nodes.positions.remove(&id);

        state.queue_transfer(&fee_recipient, fee);
        state.queue_transfer(&ctx.caller, payout);
        state.emit(Event::InstantWithdrawn {
            owner: ctx.caller.clone(),
            id,
            fee,
            payout,
            timestamp: ctx.now,
        });
        Ok(CallOutput::Amount(payout))
    }

    /// Transfers position ownership. A pure registry update; the deposit
    /// and accrued rewards travel with the position.
    fn transfer(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        id: u64,
        to: &str,
    ) -> Result<CallOutput, MasternodeError> {
        Self::config(state)?;
        let position = Self::owned_position_mut(state, &ctx.caller, id)?;
        position.owner = to.to_string();

        state.emit(Event::PositionTransferred {
            kind: PositionKind::Masternode,
            from: ctx.caller.clone(),
            to: to.to_string(),
            id,
            timestamp: ctx.now,
        });
        Ok(CallOutput::None)
    }

    fn owner_of(state: &SharedState, id: u64) -> Result<CallOutput, MasternodeError> {
        state
            .nodes
            .positions
            .get(&id)
            .map(|p| CallOutput::Address(p.owner.clone()))
            .ok_or(MasternodeError::InvalidTokenId(id))
    }

    fn balance_of(state: &SharedState, owner: &str) -> CallOutput {
        let count = state
            .nodes
            .positions
            .values()
            .filter(|p| p.owner == owner)
            .count() as u64;
        CallOutput::Count(count)
    }

    fn config(state: &SharedState) -> Result<&MasternodeConfig, MasternodeError> {
        if !state.config.masternode.initialized {
            return Err(MasternodeError::NotInitialized);
        }
        Ok(&state.config.masternode)
    }

    fn owned_position_mut<'s>(
        state: &'s mut SharedState,
        caller: &str,
        id: u64,
    ) -> Result<&'s mut NodePosition, MasternodeError> {
        let position = state
            .nodes
            .positions
            .get_mut(&id)
            .ok_or(MasternodeError::InvalidTokenId(id))?;
        if position.owner != caller {
            return Err(MasternodeError::NotOwner {
                caller: caller.to_string(),
                id,
            });
        }
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{NullToken, MRD};
    use uuid::Uuid;

    static NULL_TOKEN: NullToken = NullToken;

    fn ctx(caller: &str, value: Amount, now: u64) -> CallContext<'static> {
        CallContext {
            caller: caller.to_string(),
            value,
            now,
            tx_id: Uuid::new_v4(),
            eligibility: &NULL_TOKEN,
        }
    }

    fn initialized_state() -> SharedState {
        let mut state = SharedState::new();
        MasternodeFacet::initialize(
            &mut state,
            &ctx("admin", 0, 1_000),
            1_000 * MRD,
            "fee_recipient",
            "node.meridian.uri",
        )
        .unwrap();
        state
    }

    #[test]
    fn initialize_runs_once() {
        let mut state = initialized_state();
        let err = MasternodeFacet::initialize(
            &mut state,
            &ctx("admin", 0, 1_000),
            1_000 * MRD,
            "fee_recipient",
            "uri",
        )
        .unwrap_err();
        assert_eq!(err, MasternodeError::AlreadyInitialized);
    }

    #[test]
    fn only_authority_changes_min_deposit() {
        let mut state = initialized_state();
        MasternodeFacet::set_min_deposit(&mut state, &ctx("admin", 0, 1_000), 1_500 * MRD)
            .unwrap();
        assert_eq!(state.config.masternode.min_deposit, 1_500 * MRD);

        let err = MasternodeFacet::set_min_deposit(&mut state, &ctx("mallory", 0, 1_000), 1)
            .unwrap_err();
        assert!(matches!(err, MasternodeError::Unauthorized { .. }));
    }

    #[test]
    fn mint_below_minimum_rejected() {
        let mut state = initialized_state();
        let err = MasternodeFacet::mint(&mut state, &ctx("alice", 500 * MRD, 2_000)).unwrap_err();
        assert!(matches!(err, MasternodeError::InsufficientDeposit { .. }));
        assert!(state.nodes.positions.is_empty());
    }

    #[test]
    fn mint_assigns_sequential_ids() {
        let mut state = initialized_state();
        let a = MasternodeFacet::mint(&mut state, &ctx("alice", 1_000 * MRD, 2_000)).unwrap();
        let b = MasternodeFacet::mint(&mut state, &ctx("bob", 1_000 * MRD, 2_100)).unwrap();
        assert_eq!(a.as_token_id(), Some(1));
        assert_eq!(b.as_token_id(), Some(2));
    }

    #[test]
    fn exit_fee_is_monotone_and_bounded() {
        let deposit = 1_500 * MRD;
        let mut previous = exit_fee(deposit, 0).unwrap();
        assert_eq!(previous, deposit);
        for day in 1..=40 {
            let fee = exit_fee(deposit, day).unwrap();
            assert!(fee <= previous, "fee rose between day {} and {}", day - 1, day);
            previous = fee;
        }
        assert_eq!(exit_fee(deposit, MATURITY_DAYS).unwrap(), 0);
        assert_eq!(exit_fee(deposit, MATURITY_DAYS + 100).unwrap(), 0);
    }

    #[test]
    fn exit_fee_matches_linear_curve() {
        // 23 of 32 days elapsed: 9/32 of the deposit remains as fee.
        let deposit = 1_500 * MRD;
        assert_eq!(exit_fee(deposit, 23).unwrap(), deposit * 9 / 32);
    }

    #[test]
    fn distribution_conserves_the_pool() {
        let mut state = initialized_state();
        let t0 = 10_000;
        // Three positions minted at staggered times.
        MasternodeFacet::mint(&mut state, &ctx("alice", 1_000 * MRD, t0)).unwrap();
        MasternodeFacet::mint(&mut state, &ctx("bob", 1_000 * MRD, t0 + 1_234)).unwrap();
        MasternodeFacet::mint(&mut state, &ctx("carol", 1_000 * MRD, t0 + 9_999)).unwrap();

        let pool = 50 * MRD + 7; // odd remainder on purpose
        MasternodeFacet::distribute_rewards(&mut state, &ctx("admin", pool, t0 + 20_000)).unwrap();

        let total: Amount = state
            .nodes
            .positions
            .values()
            .map(|p| p.cumulative_rewards)
            .sum();
        assert_eq!(total, pool);
        assert_eq!(state.nodes.total_rewards_paid, pool);
    }

    #[test]
    fn distribution_weights_by_eligible_time() {
        let mut state = initialized_state();
        let t0 = 10_000;
        MasternodeFacet::mint(&mut state, &ctx("alice", 1_000 * MRD, t0)).unwrap();
        // Bob mints three quarters of the way through the window.
        MasternodeFacet::mint(&mut state, &ctx("bob", 1_000 * MRD, t0 + 3_000)).unwrap();

        let pool = 40 * MRD;
        MasternodeFacet::distribute_rewards(&mut state, &ctx("admin", pool, t0 + 4_000)).unwrap();

        // Weights 4000 : 1000, so 4/5 and 1/5 of the pool.
        assert_eq!(state.nodes.positions[&1].cumulative_rewards, pool * 4 / 5);
        assert_eq!(state.nodes.positions[&2].cumulative_rewards, pool / 5);
    }

    #[test]
    fn fresh_mint_earns_nothing_retroactively() {
        let mut state = initialized_state();
        let t0 = 10_000;
        MasternodeFacet::mint(&mut state, &ctx("alice", 1_000 * MRD, t0)).unwrap();
        // Bob mints at the distribution instant: zero eligible seconds.
        MasternodeFacet::mint(&mut state, &ctx("bob", 1_000 * MRD, t0 + 5_000)).unwrap();

        let pool = 50 * MRD;
        MasternodeFacet::distribute_rewards(&mut state, &ctx("admin", pool, t0 + 5_000)).unwrap();
        assert_eq!(state.nodes.positions[&1].cumulative_rewards, pool);
        assert_eq!(state.nodes.positions[&2].cumulative_rewards, 0);
    }

    #[test]
    fn distribution_without_positions_rejected() {
        let mut state = initialized_state();
        let err = MasternodeFacet::distribute_rewards(&mut state, &ctx("admin", 50 * MRD, 5_000))
            .unwrap_err();
        assert_eq!(err, MasternodeError::NoEligiblePositions);
    }

    #[test]
    fn small_pool_rejected() {
        let mut state = initialized_state();
        MasternodeFacet::mint(&mut state, &ctx("alice", 1_000 * MRD, 1_000)).unwrap();
        let err = MasternodeFacet::distribute_rewards(&mut state, &ctx("admin", 10 * MRD, 5_000))
            .unwrap_err();
        assert!(matches!(err, MasternodeError::RewardPoolTooSmall { .. }));
    }

    #[test]
    fn requested_positions_leave_the_distribution_set() {
        let mut state = initialized_state();
        let t0 = 10_000;
        MasternodeFacet::mint(&mut state, &ctx("alice", 1_000 * MRD, t0)).unwrap();
        MasternodeFacet::mint(&mut state, &ctx("bob", 1_000 * MRD, t0)).unwrap();
        MasternodeFacet::request_withdrawal(&mut state, &ctx("bob", 0, t0 + 100), 2).unwrap();

        let pool = 50 * MRD;
        MasternodeFacet::distribute_rewards(&mut state, &ctx("admin", pool, t0 + 1_000)).unwrap();
        assert_eq!(state.nodes.positions[&1].cumulative_rewards, pool);
        assert_eq!(state.nodes.positions[&2].cumulative_rewards, 0);
    }

    #[test]
    fn double_withdrawal_request_rejected() {
        let mut state = initialized_state();
        MasternodeFacet::mint(&mut state, &ctx("alice", 1_000 * MRD, 1_000)).unwrap();
        MasternodeFacet::request_withdrawal(&mut state, &ctx("alice", 0, 2_000), 1).unwrap();
        let err = MasternodeFacet::request_withdrawal(&mut state, &ctx("alice", 0, 3_000), 1)
            .unwrap_err();
        assert_eq!(err, MasternodeError::WithdrawalAlreadyRequested { id: 1 });
    }

    #[test]
    fn burn_before_unlock_rejected() {
        let mut state = initialized_state();
        let t0 = 1_000;
        MasternodeFacet::mint(&mut state, &ctx("alice", 1_000 * MRD, t0)).unwrap();

        // No request at all: locked.
        let err =
            MasternodeFacet::burn_and_redeem(&mut state, &ctx("alice", 0, t0 + 1), 1).unwrap_err();
        assert_eq!(err, MasternodeError::TokenLocked { id: 1 });

        MasternodeFacet::request_withdrawal(&mut state, &ctx("alice", 0, t0), 1).unwrap();
        let before_unlock = t0 + LOCK_DURATION_SECS - 1;
        let err = MasternodeFacet::burn_and_redeem(&mut state, &ctx("alice", 0, before_unlock), 1)
            .unwrap_err();
        assert_eq!(err, MasternodeError::TokenLocked { id: 1 });

        let after_unlock = t0 + LOCK_DURATION_SECS;
        let out =
            MasternodeFacet::burn_and_redeem(&mut state, &ctx("alice", 0, after_unlock), 1)
                .unwrap();
        assert_eq!(out.as_amount(), Some(1_000 * MRD));
        assert!(state.nodes.positions.is_empty());
    }

    #[test]
    fn operations_on_unknown_id_rejected() {
        let mut state = initialized_state();
        let err =
            MasternodeFacet::request_withdrawal(&mut state, &ctx("alice", 0, 1_000), 77)
                .unwrap_err();
        assert_eq!(err, MasternodeError::InvalidTokenId(77));
    }

    #[test]
    fn transfer_moves_ownership() {
        let mut state = initialized_state();
        MasternodeFacet::mint(&mut state, &ctx("alice", 1_000 * MRD, 1_000)).unwrap();
        MasternodeFacet::transfer(&mut state, &ctx("alice", 0, 2_000), 1, "bob").unwrap();
        assert_eq!(state.nodes.positions[&1].owner, "bob");

        let err =
            MasternodeFacet::transfer(&mut state, &ctx("alice", 0, 3_000), 1, "carol").unwrap_err();
        assert!(matches!(err, MasternodeError::NotOwner { .. }));
    }
}
