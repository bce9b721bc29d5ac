use soroban_sdk::{token, Address, Env, Map, Vec};

use crate::errors::AjoError;
use crate::storage;
use crate::types::{
    CycleRecord, GroupStatus, PayToken, PaymentRecord, TokenConfig, BPS_DENOMINATOR,
    LATE_PENALTY_BPS, REPUTATION_CAP, TIMELY_PAYMENT_BONUS,
};

// --- Token configuration ---

pub fn configure_token(
    env: &Env,
    admin: Address,
    token_kind: PayToken,
    token_address: Address,
    monthly_payment: i128,
) -> Result<(), AjoError> {
    admin.require_auth();

    let config = storage::get_config(env).ok_or(AjoError::NotInitialized)?;
    if admin != config.admin && admin != storage::get_admin(env) {
        return Err(AjoError::Unauthorized);
    }
    if monthly_payment <= 0 {
        return Err(AjoError::InvalidAmount);
    }

    // Collateral is sized against the monthly payment at join time, so
    // terms are frozen once the rotation is underway.
    let state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status != GroupStatus::Forming {
        return Err(AjoError::GroupNotForming);
    }

    storage::set_token_address(env, token_kind, &token_address);
    storage::set_token_config(
        env,
        token_kind,
        &TokenConfig {
            is_active: true,
            monthly_payment,
        },
    );

    env.events().publish(
        (crate::symbol_short!("tok_cfg"),),
        (token_kind, monthly_payment),
    );

    Ok(())
}

pub fn get_token_config(env: &Env, token_kind: PayToken) -> TokenConfig {
    storage::get_token_config(env, token_kind)
}

pub fn monthly_payment(env: &Env, token_kind: PayToken) -> Result<i128, AjoError> {
    let config = storage::get_token_config(env, token_kind);
    if !config.is_active {
        return Err(AjoError::TokenNotConfigured);
    }
    Ok(config.monthly_payment)
}

pub fn token_address(env: &Env, token_kind: PayToken) -> Result<Address, AjoError> {
    storage::get_token_address(env, token_kind).ok_or(AjoError::TokenNotConfigured)
}

// --- Contributions ---

pub fn contribute(env: &Env, member: Address) -> Result<(), AjoError> {
    member.require_auth();

    let state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status != GroupStatus::Active {
        return Err(AjoError::GroupNotActive);
    }

    let mut record = storage::get_member(env, &member).ok_or(AjoError::NotMember)?;
    if !record.is_active {
        return Err(AjoError::MemberInactive);
    }

    let mut cycle = storage::get_cycle_record(env, state.current_cycle)
        .ok_or(AjoError::CycleNotOpen)?;
    if cycle.contributions.contains_key(member.clone()) {
        return Err(AjoError::AlreadyContributed);
    }

    // Any pending late penalty is settled together with the contribution.
    let monthly = monthly_payment(env, record.preferred_token)?;
    let penalty = storage::get_penalty(env, &member);
    let due = monthly + penalty;

    let token = token_address(env, record.preferred_token)?;
    token::Client::new(env, &token).transfer(&member, &env.current_contract_address(), &due);

    cycle.contributions.set(member.clone(), true);
    let pot = cycle.pot.get(record.preferred_token).unwrap_or(0);
    cycle.pot.set(record.preferred_token, pot + due);
    storage::set_cycle_record(env, &cycle);

    let now = env.ledger().timestamp();
    record.last_payment_cycle = state.current_cycle;
    record.total_paid += monthly;
    if now <= cycle.deadline {
        record.reputation_score =
            (record.reputation_score + TIMELY_PAYMENT_BONUS).min(REPUTATION_CAP);
    }
    storage::set_member(env, &member, &record);

    if penalty > 0 {
        storage::clear_penalty(env, &member);
    }

    storage::push_payment(
        env,
        &member,
        &PaymentRecord {
            cycle: state.current_cycle,
            amount: due,
            timestamp: now,
        },
    );

    env.events().publish(
        (crate::symbol_short!("contrib"),),
        (member, state.current_cycle, due),
    );

    Ok(())
}

pub fn get_payment_history(env: &Env, member: Address) -> Vec<PaymentRecord> {
    storage::get_payments(env, &member)
}

/// True iff the member is active and has not paid for the current cycle.
/// The obligation persists past the deadline until the member either pays
/// (curing the default) or is processed by the automation controller.
pub fn needs_to_pay_this_cycle(env: &Env, member: Address) -> bool {
    let state = match storage::get_state(env) {
        Some(state) => state,
        None => return false,
    };
    if state.status != GroupStatus::Active {
        return false;
    }
    match storage::get_member(env, &member) {
        Some(record) => record.is_active && record.last_payment_cycle < state.current_cycle,
        None => false,
    }
}

pub fn get_current_cycle(env: &Env) -> u32 {
    storage::get_state(env).map(|s| s.current_cycle).unwrap_or(0)
}

pub fn get_next_payment_deadline(env: &Env) -> u64 {
    storage::get_state(env)
        .map(|s| s.next_payment_deadline)
        .unwrap_or(0)
}

/// Active members who have missed the current cycle, once the grace period
/// has elapsed. Ascending queue order (the member list is kept sorted).
pub fn get_members_in_default(env: &Env) -> Vec<Address> {
    let mut defaulters = Vec::new(env);
    let state = match storage::get_state(env) {
        Some(state) => state,
        None => return defaulters,
    };
    if state.status != GroupStatus::Active {
        return defaulters;
    }
    let automation = match storage::get_automation(env) {
        Some(automation) => automation,
        None => return defaulters,
    };
    let now = env.ledger().timestamp();
    if now < state.next_payment_deadline + automation.grace_period {
        return defaulters;
    }
    for member in storage::get_member_list(env).iter() {
        if let Some(record) = storage::get_member(env, &member) {
            if record.is_active && record.last_payment_cycle < state.current_cycle {
                defaulters.push_back(member);
            }
        }
    }
    defaulters
}

// --- Cycle settlement ---

/// Close the current cycle: pay the pot to the next queued member, accrue
/// late penalties against members who missed, and open the next cycle (or
/// complete the group after the final round).
///
/// Allowed early once every active member has contributed, otherwise only
/// after the payment deadline.
pub fn settle_cycle(env: &Env, caller: Address) -> Result<(), AjoError> {
    caller.require_auth();

    let config = storage::get_config(env).ok_or(AjoError::NotInitialized)?;
    if caller != config.admin && caller != storage::get_admin(env) {
        return Err(AjoError::Unauthorized);
    }

    let mut state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status != GroupStatus::Active {
        return Err(AjoError::GroupNotActive);
    }

    let cycle = storage::get_cycle_record(env, state.current_cycle)
        .ok_or(AjoError::CycleNotOpen)?;
    let now = env.ledger().timestamp();
    if now < state.next_payment_deadline && !all_active_contributed(env, &cycle) {
        return Err(AjoError::CycleNotDue);
    }

    let members = storage::get_member_list(env);

    // Payout goes to the first active, not-yet-paid member at or past the
    // current queue position. Deactivated positions are skipped; if nobody
    // is eligible the pot rolls over into the next cycle.
    let mut recipient = None;
    for member in members.iter() {
        if let Some(record) = storage::get_member(env, &member) {
            if record.is_active
                && !record.has_received_payout
                && record.queue_number >= state.current_queue_position
            {
                recipient = Some((member, record));
                break;
            }
        }
    }

    let mut rollover: Map<PayToken, i128> = Map::new(env);
    match recipient {
        Some((member, mut record)) => {
            let contract = env.current_contract_address();
            let mut paid_out = 0i128;
            for (token_kind, amount) in cycle.pot.iter() {
                if amount > 0 {
                    let token = token_address(env, token_kind)?;
                    token::Client::new(env, &token).transfer(&contract, &member, &amount);
                    paid_out += amount;
                }
            }
            record.has_received_payout = true;
            state.current_queue_position = record.queue_number + 1;
            storage::set_member(env, &member, &record);

            env.events().publish(
                (crate::symbol_short!("payout"),),
                (member, state.current_cycle, paid_out),
            );
        }
        None => {
            rollover = cycle.pot.clone();
        }
    }

    // Members who missed the cycle accrue a late penalty, collected with
    // their next contribution (or wiped by seizure).
    for member in members.iter() {
        if let Some(record) = storage::get_member(env, &member) {
            if record.is_active && record.last_payment_cycle < state.current_cycle {
                let monthly = monthly_payment(env, record.preferred_token)?;
                let penalty = monthly * LATE_PENALTY_BPS / BPS_DENOMINATOR;
                let pending = storage::get_penalty(env, &member);
                storage::set_penalty(env, &member, pending + penalty);
            }
        }
    }

    if state.current_cycle >= state.total_rounds {
        state.status = GroupStatus::Completed;
        storage::set_state(env, &state);
        env.events()
            .publish((crate::symbol_short!("grp_comp"),), state.current_cycle);
    } else {
        state.current_cycle += 1;
        state.next_payment_deadline += config.cycle_duration;
        storage::set_state(env, &state);
        storage::set_cycle_record(
            env,
            &CycleRecord {
                cycle: state.current_cycle,
                contributions: Map::new(env),
                pot: rollover,
                deadline: state.next_payment_deadline,
            },
        );
        env.events()
            .publish((crate::symbol_short!("cyc_adv"),), state.current_cycle);
    }

    Ok(())
}

/// Credit an amount to the pot of the given cycle (seized collateral flows
/// back to the group through the next payout).
pub fn credit_pot(env: &Env, cycle_number: u32, token_kind: PayToken, amount: i128) {
    if let Some(mut cycle) = storage::get_cycle_record(env, cycle_number) {
        let pot = cycle.pot.get(token_kind).unwrap_or(0);
        cycle.pot.set(token_kind, pot + amount);
        storage::set_cycle_record(env, &cycle);
    }
}

fn all_active_contributed(env: &Env, cycle: &CycleRecord) -> bool {
    for member in storage::get_member_list(env).iter() {
        if let Some(record) = storage::get_member(env, &member) {
            if record.is_active && !cycle.contributions.contains_key(member) {
                return false;
            }
        }
    }
    true
}
