use soroban_sdk::{token, Address, Env, Map, String};

use crate::errors::AjoError;
use crate::payments;
use crate::storage;
use crate::types::{
    AutomationConfig, CycleRecord, CycleState, Dispute, GroupConfig, GroupStatus, PayToken,
    DEFAULT_MAX_BATCH_SIZE,
};

pub fn create_group(
    env: &Env,
    admin: Address,
    name: String,
    max_members: u32,
    cycle_duration: u64,
    grace_period: u64,
    active_token: PayToken,
    max_voting_power: u32,
) -> Result<(), AjoError> {
    admin.require_auth();

    if storage::get_config(env).is_some() {
        return Err(AjoError::AlreadyInitialized);
    }
    if max_members < 2 {
        return Err(AjoError::InsufficientMembers);
    }
    if cycle_duration == 0 || max_voting_power == 0 {
        return Err(AjoError::InvalidAmount);
    }

    let config = GroupConfig {
        name,
        admin: admin.clone(),
        max_members,
        cycle_duration,
        active_token,
        max_voting_power,
        created_at: env.ledger().timestamp(),
    };
    storage::set_config(env, &config);

    storage::set_state(
        env,
        &CycleState {
            status: GroupStatus::Forming,
            current_cycle: 0,
            next_payment_deadline: 0,
            current_queue_position: 1,
            total_rounds: 0,
        },
    );

    // Automation starts disabled with the group admin as the relayer; the
    // admin turns it on and delegates once an off-chain agent exists.
    storage::set_automation(
        env,
        &AutomationConfig {
            enabled: false,
            grace_period,
            authorized_caller: admin,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        },
    );

    env.events()
        .publish((crate::symbol_short!("grp_creat"),), max_members);

    Ok(())
}

/// Start the rotation. Requires a fully subscribed group so every queue
/// position's collateral was sized against the final rotation length.
pub fn start_group(env: &Env, admin: Address) -> Result<(), AjoError> {
    admin.require_auth();

    let config = storage::get_config(env).ok_or(AjoError::NotInitialized)?;
    if admin != config.admin {
        return Err(AjoError::Unauthorized);
    }

    let mut state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status != GroupStatus::Forming {
        return Err(AjoError::GroupNotForming);
    }

    let members = storage::get_member_list(env);
    if members.len() < config.max_members {
        return Err(AjoError::InsufficientMembers);
    }

    state.status = GroupStatus::Active;
    state.current_cycle = 1;
    state.total_rounds = config.max_members;
    state.current_queue_position = 1;
    state.next_payment_deadline = env.ledger().timestamp() + config.cycle_duration;
    storage::set_state(env, &state);

    storage::set_cycle_record(
        env,
        &CycleRecord {
            cycle: 1,
            contributions: Map::new(env),
            pot: Map::new(env),
            deadline: state.next_payment_deadline,
        },
    );

    env.events()
        .publish((crate::symbol_short!("grp_strt"),), state.next_payment_deadline);

    Ok(())
}

pub fn pause_group(env: &Env, admin: Address) -> Result<(), AjoError> {
    admin.require_auth();

    let config = storage::get_config(env).ok_or(AjoError::NotInitialized)?;
    if admin != config.admin && admin != storage::get_admin(env) {
        return Err(AjoError::Unauthorized);
    }

    let mut state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status == GroupStatus::Disputed {
        return Err(AjoError::DisputeActive);
    }
    if state.status != GroupStatus::Active {
        return Err(AjoError::GroupNotActive);
    }

    state.status = GroupStatus::Paused;
    storage::set_state(env, &state);

    env.events()
        .publish((crate::symbol_short!("grp_paus"),), admin);

    Ok(())
}

pub fn resume_group(env: &Env, admin: Address) -> Result<(), AjoError> {
    admin.require_auth();

    let config = storage::get_config(env).ok_or(AjoError::NotInitialized)?;
    if admin != config.admin && admin != storage::get_admin(env) {
        return Err(AjoError::Unauthorized);
    }

    let mut state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status != GroupStatus::Paused {
        return Err(AjoError::GroupNotActive);
    }

    state.status = GroupStatus::Active;
    storage::set_state(env, &state);

    env.events()
        .publish((crate::symbol_short!("grp_resm"),), admin);

    Ok(())
}

pub fn raise_dispute(
    env: &Env,
    member: Address,
    reason: String,
) -> Result<(), AjoError> {
    member.require_auth();

    let record = storage::get_member(env, &member).ok_or(AjoError::NotMember)?;
    if !record.is_active {
        return Err(AjoError::MemberInactive);
    }

    let mut state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status != GroupStatus::Active {
        return Err(AjoError::GroupNotActive);
    }

    state.status = GroupStatus::Disputed;
    storage::set_state(env, &state);
    storage::set_dispute(
        env,
        &Dispute {
            raised_by: member.clone(),
            reason,
            raised_at: env.ledger().timestamp(),
        },
    );

    env.events()
        .publish((crate::symbol_short!("dispute"),), member);

    Ok(())
}

pub fn resolve_dispute(env: &Env, admin: Address) -> Result<(), AjoError> {
    admin.require_auth();

    let config = storage::get_config(env).ok_or(AjoError::NotInitialized)?;
    if admin != config.admin && admin != storage::get_admin(env) {
        return Err(AjoError::Unauthorized);
    }

    let mut state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status != GroupStatus::Disputed {
        return Err(AjoError::GroupNotActive);
    }

    state.status = GroupStatus::Active;
    storage::set_state(env, &state);
    storage::remove_dispute(env);

    env.events()
        .publish((crate::symbol_short!("resolved"),), admin);

    Ok(())
}

pub fn get_dispute(env: &Env) -> Option<Dispute> {
    storage::get_dispute(env)
}

pub fn set_group_admin(
    env: &Env,
    current_admin: Address,
    new_admin: Address,
) -> Result<(), AjoError> {
    current_admin.require_auth();

    let mut config = storage::get_config(env).ok_or(AjoError::NotInitialized)?;
    if current_admin != config.admin {
        return Err(AjoError::Unauthorized);
    }

    config.admin = new_admin.clone();
    storage::set_config(env, &config);

    env.events()
        .publish((crate::symbol_short!("adm_chng"),), new_admin);

    Ok(())
}

/// Unwind a group that cannot continue. Locked collateral goes back to its
/// owners in full; whatever contribution balance remains is split
/// proportionally to what each member actually paid in. Only the protocol
/// admin can trigger this.
pub fn emergency_withdraw(env: &Env, admin: Address) -> Result<(), AjoError> {
    admin.require_auth();

    if admin != storage::get_admin(env) {
        return Err(AjoError::Unauthorized);
    }

    let mut state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status == GroupStatus::Completed {
        return Err(AjoError::GroupCompleted);
    }

    let members = storage::get_member_list(env);
    let contract = env.current_contract_address();

    for member in members.iter() {
        if let Some(mut record) = storage::get_member(env, &member) {
            if record.locked_collateral > 0 {
                let token = payments::token_address(env, record.preferred_token)?;
                token::Client::new(env, &token).transfer(
                    &contract,
                    &member,
                    &record.locked_collateral,
                );
                record.locked_collateral = 0;
                storage::set_member(env, &member, &record);
            }
        }
    }

    for token_kind in [PayToken::Usdc, PayToken::Native] {
        let token = match storage::get_token_address(env, token_kind) {
            Some(token) => token,
            None => continue,
        };
        let client = token::Client::new(env, &token);
        let balance = client.balance(&contract);
        if balance <= 0 {
            continue;
        }

        let mut total_paid = 0i128;
        for member in members.iter() {
            if let Some(record) = storage::get_member(env, &member) {
                if record.preferred_token == token_kind {
                    total_paid += record.total_paid;
                }
            }
        }
        if total_paid == 0 {
            continue;
        }

        // Integer division leaves dust in the contract, same as any
        // proportional split.
        for member in members.iter() {
            if let Some(record) = storage::get_member(env, &member) {
                if record.preferred_token == token_kind && record.total_paid > 0 {
                    let share = balance * record.total_paid / total_paid;
                    if share > 0 {
                        client.transfer(&contract, &member, &share);
                    }
                }
            }
        }
    }

    state.status = GroupStatus::Completed;
    storage::set_state(env, &state);

    env.events()
        .publish((crate::symbol_short!("emergenc"),), admin);

    Ok(())
}
