//! # Vault Facet
//!
//! The continuous staking engine. Holders of a stakeable vault NFT deposit
//! native currency against their token id and accrue rewards at the global
//! program rate, proportionally to their share of the total stake.
//!
//! ## Accrual scheme
//!
//! A single global accumulator (`reward_per_token_stored`, fixed-point at
//! [`REWARD_PRECISION`]) advances lazily whenever any mutating call touches
//! the vault:
//!
//! ```text
//! reward_per_token = stored
//!     + (min(now, period_finish) - last_update) * rate * PRECISION / total_staked
//! earned(id) = staked(id) * (reward_per_token - paid(id)) / PRECISION + unclaimed(id)
//! ```
//!
//! Every mutating entry point settles the affected id before doing anything
//! else, so a position's `reward_per_token_paid` snapshot can never go
//! stale across a rate change. With nothing staked the accumulator stands
//! still — rewards for an empty vault accrue to no one.
//!
//! Eligibility to mint the NFT is gated on a minimum balance of an
//! external token, observed through [`crate::state::TokenBalance`] and
//! never mutated.

use thiserror::Error;

use crate::dispatch::{
    sig, Call, CallContext, CallOutput, ContractError, Facet, Selector, VaultInit,
};
use crate::events::{Event, PositionKind};
use crate::state::{Address, Amount, SharedState, VaultConfig, VaultRegistry, REWARD_PRECISION};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during vault operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaultError {
    /// `initialize` was called twice.
    #[error("vault engine is already initialized")]
    AlreadyInitialized,

    /// A state-changing call arrived before `initialize`.
    #[error("vault engine is not initialized")]
    NotInitialized,

    /// The caller is not the configured reward distributor.
    #[error("not reward distributor: {caller}")]
    NotRewardDistributor {
        /// The address that attempted the operation.
        caller: Address,
    },

    /// The requested duration would end before the committed period does.
    #[error("cannot reduce period: {remaining}s committed, {requested}s requested")]
    CannotReducePeriod {
        /// Seconds left in the committed period.
        remaining: u64,
        /// The requested new duration.
        requested: u64,
    },

    /// A reward program with zero duration is meaningless.
    #[error("reward duration must be nonzero")]
    ZeroDuration,

    /// The attached native value does not match the declared amount.
    #[error("amount mismatch: declared {declared}, attached {provided}")]
    AmountMismatch {
        /// Amount declared in the call payload.
        declared: Amount,
        /// Native currency actually attached.
        provided: Amount,
    },

    /// Staking zero is rejected rather than silently ignored.
    #[error("stake amount must be nonzero")]
    ZeroAmount,

    /// The caller does not hold enough of the eligibility token.
    #[error("insufficient eligibility balance: holds {balance}, requires {required}")]
    InsufficientEligibility {
        /// The caller's eligibility-token balance.
        balance: Amount,
        /// The configured minimum.
        required: Amount,
    },

    /// The referenced vault NFT does not exist (never minted, or burned).
    #[error("invalid token id: {0}")]
    InvalidTokenId(u64),

    /// The caller does not own the referenced vault NFT.
    #[error("not owner: {caller} does not own position {id}")]
    NotOwner {
        /// The address that attempted the operation.
        caller: Address,
        /// The NFT id.
        id: u64,
    },

    /// A reward computation would overflow.
    #[error("amount overflow in vault accounting")]
    AmountOverflow,
}

// ---------------------------------------------------------------------------
// Accrual math
// ---------------------------------------------------------------------------

/// The global accumulator evaluated at `now`, without writing it back.
pub fn reward_per_token(vault: &VaultRegistry, now: u64) -> Result<Amount, VaultError> {
    let program = &vault.reward;
    if vault.total_staked == 0 {
        return Ok(program.reward_per_token_stored);
    }
    let applicable = now.min(program.period_finish);
    let elapsed = applicable.saturating_sub(program.last_update_time) as Amount;
    let accrued = elapsed
        .checked_mul(program.reward_rate)
        .and_then(|x| x.checked_mul(REWARD_PRECISION))
        .ok_or(VaultError::AmountOverflow)?
        / vault.total_staked;
    program
        .reward_per_token_stored
        .checked_add(accrued)
        .ok_or(VaultError::AmountOverflow)
}

/// Rewards accrued by `id` as of `now`, including the unclaimed carry.
pub fn earned(vault: &VaultRegistry, id: u64, now: u64) -> Result<Amount, VaultError> {
    if !vault.owners.contains_key(&id) {
        return Err(VaultError::InvalidTokenId(id));
    }
    let rpt = reward_per_token(vault, now)?;
    let position = vault.positions.get(&id).cloned().unwrap_or_default();
    earned_against(position.staked, position.reward_per_token_paid, position.unclaimed, rpt)
}

pub(crate) fn earned_against(
    staked: Amount,
    paid: Amount,
    unclaimed: Amount,
    rpt: Amount,
) -> Result<Amount, VaultError> {
    // The accumulator is monotone, so rpt >= paid always holds.
    let delta = rpt - paid;
    let fresh = staked
        .checked_mul(delta)
        .ok_or(VaultError::AmountOverflow)?
        / REWARD_PRECISION;
    unclaimed
        .checked_add(fresh)
        .ok_or(VaultError::AmountOverflow)
}

/// Advances the global accumulator to `now` and, when `id` is given,
/// settles that position's snapshot against it.
fn settle(vault: &mut VaultRegistry, id: Option<u64>, now: u64) -> Result<(), VaultError> {
    let rpt = reward_per_token(vault, now)?;
    vault.reward.reward_per_token_stored = rpt;
    vault.reward.last_update_time = now.min(vault.reward.period_finish);
    if let Some(id) = id {
        let position = vault.positions.entry(id).or_default();
        position.unclaimed = earned_against(
            position.staked,
            position.reward_per_token_paid,
            position.unclaimed,
            rpt,
        )?;
        position.reward_per_token_paid = rpt;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// The facet
// ---------------------------------------------------------------------------

/// The vault logic module. Stateless; all data lives in
/// [`SharedState::vault`] and [`SharedState::config`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VaultFacet;

impl Facet for VaultFacet {
    fn name(&self) -> &'static str {
        "vault"
    }

    fn selectors(&self) -> Vec<Selector> {
        [
            sig::INITIALIZE_VAULT,
            sig::NOTIFY_REWARD_AMOUNT,
            sig::SAFE_MINT,
            sig::STAKE,
            sig::GET_REWARD,
            sig::BURN_AND_REDEEM_VAULT,
            sig::EARNED,
            sig::TRANSFER_VAULT,
            sig::VAULT_OWNER_OF,
            sig::VAULT_BALANCE_OF,
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
            Call::InitializeVault(init) => Self::initialize(state, init)?,
            Call::NotifyRewardAmount { amount, duration } => {
                Self::notify_reward_amount(state, ctx, *amount, *duration)?
            }
            Call::SafeMint => Self::safe_mint(state, ctx)?,
            Call::Stake { id, amount } => Self::stake(state, ctx, *id, *amount)?,
            Call::GetReward { id } => Self::get_reward(state, ctx, *id)?,
            Call::BurnAndRedeemVault { id } => Self::burn_and_redeem(state, ctx, *id)?,
            Call::Earned { id } => CallOutput::Amount(earned(&state.vault, *id, ctx.now)?),
            Call::TransferVault { id, to } => Self::transfer(state, ctx, *id, to)?,
            Call::VaultOwnerOf { id } => Self::owner_of(state, *id)?,
            Call::VaultBalanceOf { owner } => Self::balance_of(state, owner),
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

impl VaultFacet {
    /// One-time engine setup. The initial reward rate is visible through
    /// the accessors immediately, but accrual starts only when the
    /// distributor funds a period via `notify_reward_amount`.
    fn initialize(state: &mut SharedState, init: &VaultInit) -> Result<CallOutput, VaultError> {
        if state.config.vault.initialized {
            return Err(VaultError::AlreadyInitialized);
        }
        state.config.vault = VaultConfig {
            initialized: true,
            price_oracle: init.price_oracle.clone(),
            reward_token: init.reward_token.clone(),
            reward_distributor: init.reward_distributor.clone(),
            min_eligibility: init.min_eligibility,
            metadata_uri: init.metadata_uri.clone(),
            token_name: init.token_name.clone(),
            token_symbol: init.token_symbol.clone(),
        };
        state.vault.reward.reward_rate = init.initial_reward_rate;
        tracing::info!(
            distributor = %init.reward_distributor,
            initial_reward_rate = init.initial_reward_rate,
            "vault engine initialized"
        );
        Ok(CallOutput::None)
    }

    /// Funds (or extends) the reward program.
    ///
    /// Folds whatever the committed period has not yet emitted into the new
    /// rate; refuses to end the committed period early.
    fn notify_reward_amount(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        amount: Amount,
        duration: u64,
    ) -> Result<CallOutput, VaultError> {
        let config = Self::config(state)?;
        if ctx.caller != config.reward_distributor {
            return Err(VaultError::NotRewardDistributor {
                caller: ctx.caller.clone(),
            });
        }
        if duration == 0 {
            return Err(VaultError::ZeroDuration);
        }
        if ctx.value != amount {
            return Err(VaultError::AmountMismatch {
                declared: amount,
                provided: ctx.value,
            });
        }

        settle(&mut state.vault, None, ctx.now)?;

        let program = &mut state.vault.reward;
        let rate = if ctx.now < program.period_finish {
            let remaining = program.period_finish - ctx.now;
            if duration < remaining {
                return Err(VaultError::CannotReducePeriod {
                    remaining,
                    requested: duration,
                });
            }
            let leftover = (remaining as Amount)
                .checked_mul(program.reward_rate)
                .ok_or(VaultError::AmountOverflow)?;
            amount
                .checked_add(leftover)
                .ok_or(VaultError::AmountOverflow)?
                / duration as Amount
        } else {
            amount / duration as Amount
        };

        program.reward_rate = rate;
        program.last_update_time = ctx.now;
        program.period_finish = ctx.now + duration;

        state.emit(Event::RewardNotified {
            distributor: ctx.caller.clone(),
            amount,
            duration,
            reward_rate: rate,
            timestamp: ctx.now,
        });
        Ok(CallOutput::None)
    }

    /// Mints a stakeable vault NFT. No deposit moves at mint time; the
    /// caller must merely hold the minimum eligibility-token balance.
    fn safe_mint(state: &mut SharedState, ctx: &CallContext<'_>) -> Result<CallOutput, VaultError> {
        let config = Self::config(state)?;
        let balance = ctx.eligibility.balance_of(&ctx.caller);
        if balance < config.min_eligibility {
            return Err(VaultError::InsufficientEligibility {
                balance,
                required: config.min_eligibility,
            });
        }

        let id = state.vault.next_id;
        state.vault.next_id += 1;
        state.vault.owners.insert(id, ctx.caller.clone());
        state.vault.positions.entry(id).or_default();

        state.emit(Event::VaultMinted {
            owner: ctx.caller.clone(),
            id,
            timestamp: ctx.now,
        });
        Ok(CallOutput::TokenId(id))
    }

    /// Stakes the attached native currency under `id`.
    fn stake(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        id: u64,
        amount: Amount,
    ) -> Result<CallOutput, VaultError> {
        Self::config(state)?;
        Self::require_owner(&state.vault, &ctx.caller, id)?;
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        if ctx.value != amount {
            return Err(VaultError::AmountMismatch {
                declared: amount,
                provided: ctx.value,
            });
        }

        settle(&mut state.vault, Some(id), ctx.now)?;

        let position = state.vault.positions.entry(id).or_default();
        position.staked = position
            .staked
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;
        state.vault.total_staked = state
            .vault
            .total_staked
            .checked_add(amount)
            .ok_or(VaultError::AmountOverflow)?;

        state.emit(Event::Staked {
            owner: ctx.caller.clone(),
            id,
            amount,
            timestamp: ctx.now,
        });
        Ok(CallOutput::None)
    }

    /// Pays out everything `id` has accrued, leaving the stake in place.
    fn get_reward(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        id: u64,
    ) -> Result<CallOutput, VaultError> {
        Self::config(state)?;
        Self::require_owner(&state.vault, &ctx.caller, id)?;

        settle(&mut state.vault, Some(id), ctx.now)?;

        let position = state.vault.positions.entry(id).or_default();
        let payout = position.unclaimed;
        position.unclaimed = 0;

        state.queue_transfer(&ctx.caller, payout);
        if payout > 0 {
            state.emit(Event::RewardPaid {
                owner: ctx.caller.clone(),
                id,
                amount: payout,
                timestamp: ctx.now,
            });
        }
        Ok(CallOutput::Amount(payout))
    }

    /// Full exit: settles, pays out stake plus rewards, zeroes the
    /// position record, and burns the NFT.
    fn burn_and_redeem(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        id: u64,
    ) -> Result<CallOutput, VaultError> {
        Self::config(state)?;
        Self::require_owner(&state.vault, &ctx.caller, id)?;

        settle(&mut state.vault, Some(id), ctx.now)?;

        let position = state.vault.positions.entry(id).or_default();
        let staked = position.staked;
        let rewards = position.unclaimed;
        position.staked = 0;
        position.unclaimed = 0;

        state.vault.total_staked = state
            .vault
            .total_staked
            .checked_sub(staked)
            .ok_or(VaultError::AmountOverflow)?;
        state.vault.owners.remove(&id);

        let payout = staked
            .checked_add(rewards)
            .ok_or(VaultError::AmountOverflow)?;
        state.queue_transfer(&ctx.caller, payout);
        state.emit(Event::VaultRedeemed {
            owner: ctx.caller.clone(),
            id,
            staked,
            rewards,
            timestamp: ctx.now,
        });
        Ok(CallOutput::Amount(payout))
    }

    /// Transfers NFT ownership. The staking position travels with the id.
    fn transfer(
        state: &mut SharedState,
        ctx: &CallContext<'_>,
        id: u64,
        to: &str,
    ) -> Result<CallOutput, VaultError> {
        Self::config(state)?;
        Self::require_owner(&state.vault, &ctx.caller, id)?;
        state.vault.owners.insert(id, to.to_string());

        state.emit(Event::PositionTransferred {
            kind: PositionKind::Vault,
            from: ctx.caller.clone(),
            to: to.to_string(),
            id,
            timestamp: ctx.now,
        });
        Ok(CallOutput::None)
    }

    fn owner_of(state: &SharedState, id: u64) -> Result<CallOutput, VaultError> {
        state
            .vault
            .owners
            .get(&id)
            .map(|owner| CallOutput::Address(owner.clone()))
            .ok_or(VaultError::InvalidTokenId(id))
    }

    fn balance_of(state: &SharedState, owner: &str) -> CallOutput {
        let count = state
            .vault
            .owners
            .values()
            .filter(|o| o.as_str() == owner)
            .count() as u64;
        CallOutput::Count(count)
    }

    fn config(state: &SharedState) -> Result<&VaultConfig, VaultError> {
        if !state.config.vault.initialized {
            return Err(VaultError::NotInitialized);
        }
        Ok(&state.config.vault)
    }

    fn require_owner(vault: &VaultRegistry, caller: &str, id: u64) -> Result<(), VaultError> {
        let owner = vault
            .owners
            .get(&id)
            .ok_or(VaultError::InvalidTokenId(id))?;
        if owner != caller {
            return Err(VaultError::NotOwner {
                caller: caller.to_string(),
                id,
            });
        }
        Ok(())
    }
}
