use soroban_sdk::{token, Address, Env, Map, Vec};

use crate::collateral;
use crate::errors::AjoError;
use crate::payments;
use crate::storage;
use crate::types::{
    ContractStats, GroupStatus, Member, MemberInfo, PayToken, QueueInfo,
    DEFAULT_MAX_VOTING_POWER, MAX_GUARANTEES, REPUTATION_START,
};

pub fn join_group(
    env: &Env,
    member: Address,
    preferred_token: PayToken,
    guarantor: Option<Address>,
) -> Result<u32, AjoError> {
    member.require_auth();

    let config = storage::get_config(env).ok_or(AjoError::NotInitialized)?;
    let state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status != GroupStatus::Forming {
        return Err(AjoError::GroupNotForming);
    }

    let mut members = storage::get_member_list(env);
    if members.len() >= config.max_members {
        return Err(AjoError::GroupFull);
    }
    if storage::get_member(env, &member).is_some() {
        return Err(AjoError::AlreadyMember);
    }

    let monthly = payments::monthly_payment(env, preferred_token)?;

    // Departures during forming leave gaps; a new joiner takes the lowest
    // free slot so the queue is contiguous by start time.
    let (queue_number, insert_at) = next_free_queue_slot(env, &members);
    let required =
        collateral::required_collateral(queue_number, config.max_members, monthly);

    let mut guarantee_position = 0u32;
    if let Some(backer) = &guarantor {
        if storage::get_member(env, backer).is_none() {
            return Err(AjoError::GuarantorNotFound);
        }
        let used = storage::get_guarantee_count(env, backer);
        if used >= MAX_GUARANTEES {
            return Err(AjoError::GuarantorSlotsFull);
        }
        storage::set_guarantee_count(env, backer, used + 1);
        guarantee_position = used + 1;
    }

    if required > 0 {
        let token = payments::token_address(env, preferred_token)?;
        token::Client::new(env, &token).transfer(
            &member,
            &env.current_contract_address(),
            &required,
        );
    }

    let record = Member {
        queue_number,
        joined_cycle: state.current_cycle,
        total_paid: 0,
        required_collateral: required,
        locked_collateral: required,
        last_payment_cycle: 0,
        default_count: 0,
        has_received_payout: false,
        is_active: true,
        guarantor,
        guarantee_position,
        preferred_token,
        reputation_score: REPUTATION_START,
    };
    storage::set_member(env, &member, &record);

    members.insert(insert_at, member.clone());
    storage::set_member_list(env, &members);

    env.events()
        .publish((crate::symbol_short!("joined"),), (member, queue_number));

    Ok(queue_number)
}

/// Leave a group that is still forming. Locked collateral is refunded and
/// the queue slot reopens for the next joiner.
pub fn leave_group(env: &Env, member: Address) -> Result<(), AjoError> {
    member.require_auth();

    let state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status != GroupStatus::Forming {
        return Err(AjoError::GroupNotForming);
    }

    let record = storage::get_member(env, &member).ok_or(AjoError::NotMember)?;

    if record.locked_collateral > 0 {
        let token = payments::token_address(env, record.preferred_token)?;
        token::Client::new(env, &token).transfer(
            &env.current_contract_address(),
            &member,
            &record.locked_collateral,
        );
    }

    if let Some(backer) = &record.guarantor {
        let used = storage::get_guarantee_count(env, backer);
        if used > 0 {
            storage::set_guarantee_count(env, backer, used - 1);
        }
    }

    let members = storage::get_member_list(env);
    let mut remaining = Vec::new(env);
    for existing in members.iter() {
        if existing != member {
            remaining.push_back(existing);
        }
    }
    storage::set_member_list(env, &remaining);
    storage::remove_member(env, &member);

    env.events()
        .publish((crate::symbol_short!("left"),), member);

    Ok(())
}

/// Member record composed with the cross-component values. Never errors:
/// unknown addresses yield a zeroed record with `is_active = false`, which
/// callers must check before acting on the result.
pub fn get_member_info(env: &Env, member: Address) -> MemberInfo {
    match storage::get_member(env, &member) {
        Some(record) => {
            let cap = storage::get_config(env)
                .map(|c| c.max_voting_power)
                .unwrap_or(DEFAULT_MAX_VOTING_POWER);
            let power = effective_voting_power(&record, cap);
            MemberInfo {
                pending_penalty: storage::get_penalty(env, &member),
                effective_voting_power: power,
                member: record,
            }
        }
        None => MemberInfo {
            member: zeroed_member(),
            pending_penalty: 0,
            effective_voting_power: 0,
        },
    }
}

/// Queue position and a payout estimate. With 1-indexed cycles the payout
/// for position `p` settles at the end of cycle `p`, so the wait is simply
/// the positions not yet reached. Zeroed for unknown or inactive members.
pub fn get_queue_info(env: &Env, member: Address) -> QueueInfo {
    match storage::get_member(env, &member) {
        Some(record) if record.is_active => {
            let current_cycle = storage::get_state(env)
                .map(|s| s.current_cycle)
                .unwrap_or(0);
            let wait = if record.has_received_payout {
                0
            } else {
                record.queue_number.saturating_sub(current_cycle)
            };
            QueueInfo {
                position: record.queue_number,
                estimated_cycles_wait: wait,
            }
        }
        _ => QueueInfo {
            position: 0,
            estimated_cycles_wait: 0,
        },
    }
}

pub fn get_contract_stats(env: &Env) -> ContractStats {
    let members = storage::get_member_list(env);

    let mut total_collateral: Map<PayToken, i128> = Map::new(env);
    total_collateral.set(PayToken::Usdc, 0);
    total_collateral.set(PayToken::Native, 0);

    let mut active_members = 0u32;
    for member in members.iter() {
        if let Some(record) = storage::get_member(env, &member) {
            if record.is_active {
                active_members += 1;
            }
            let held = total_collateral.get(record.preferred_token).unwrap_or(0);
            total_collateral.set(record.preferred_token, held + record.locked_collateral);
        }
    }

    let mut contract_balance: Map<PayToken, i128> = Map::new(env);
    for token_kind in [PayToken::Usdc, PayToken::Native] {
        if let Some(token) = storage::get_token_address(env, token_kind) {
            let balance =
                token::Client::new(env, &token).balance(&env.current_contract_address());
            contract_balance.set(token_kind, balance);
        }
    }

    ContractStats {
        total_members: members.len(),
        active_members,
        total_collateral,
        contract_balance,
        current_queue_position: storage::get_state(env)
            .map(|s| s.current_queue_position)
            .unwrap_or(0),
        active_token: storage::get_config(env)
            .map(|c| c.active_token)
            .unwrap_or(PayToken::Usdc),
    }
}

/// Reclaim locked collateral once the rotation has completed. Any pending
/// late penalty is deducted from the refund and kept by the contract.
pub fn withdraw_collateral(env: &Env, member: Address) -> Result<(), AjoError> {
    member.require_auth();

    let state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status != GroupStatus::Completed {
        return Err(AjoError::GroupNotCompleted);
    }

    let mut record = storage::get_member(env, &member).ok_or(AjoError::NotMember)?;
    if !record.is_active {
        return Err(AjoError::MemberInactive);
    }
    if record.locked_collateral == 0 {
        return Err(AjoError::NothingToWithdraw);
    }

    let penalty = storage::get_penalty(env, &member);
    let refund = (record.locked_collateral - penalty).max(0);
    if refund > 0 {
        let token = payments::token_address(env, record.preferred_token)?;
        token::Client::new(env, &token).transfer(
            &env.current_contract_address(),
            &member,
            &refund,
        );
    }

    record.locked_collateral = 0;
    storage::set_member(env, &member, &record);
    storage::clear_penalty(env, &member);

    env.events()
        .publish((crate::symbol_short!("clm_coll"),), (member, refund));

    Ok(())
}

fn zeroed_member() -> Member {
    Member {
        queue_number: 0,
        joined_cycle: 0,
        total_paid: 0,
        required_collateral: 0,
        locked_collateral: 0,
        last_payment_cycle: 0,
        default_count: 0,
        has_received_payout: false,
        is_active: false,
        guarantor: None,
        guarantee_position: 0,
        preferred_token: PayToken::Usdc,
        reputation_score: 0,
    }
}

/// Tiered voting power: reputation grants 0/1/2 at <40 / >=40 / >=80, a
/// fully collateralized position grants one more, clamped to the group's
/// configured maximum. Inactive members carry no weight.
fn effective_voting_power(record: &Member, cap: u32) -> u32 {
    if !record.is_active {
        return 0;
    }
    let mut power = if record.reputation_score >= 80 {
        2
    } else if record.reputation_score >= 40 {
        1
    } else {
        0
    };
    if record.locked_collateral >= record.required_collateral {
        power += 1;
    }
    power.min(cap)
}

/// Lowest unused queue number plus the list index that keeps the member
/// list sorted ascending by queue number.
fn next_free_queue_slot(env: &Env, members: &Vec<Address>) -> (u32, u32) {
    let mut expected = 1u32;
    let mut index = 0u32;
    for member in members.iter() {
        let queue_number = storage::get_member(env, &member)
            .map(|record| record.queue_number)
            .unwrap_or(0);
        if queue_number == expected {
            expected += 1;
            index += 1;
        } else {
            break;
        }
    }
    (expected, index)
}
