use soroban_sdk::{Address, Env, Vec};

use crate::errors::AjoError;
use crate::payments;
use crate::storage;
use crate::types::{Member, SeizableAssets};

/// Minimum collateral for queue position `position` out of `participants`,
/// given one `monthly_payment`.
///
/// Members who receive their payout earlier carry more remaining obligation
/// to the group afterwards, so the requirement decreases linearly from
/// `monthly_payment * (participants - 1)` at position 1 down to zero for the
/// last position.
pub fn required_collateral(position: u32, participants: u32, monthly_payment: i128) -> i128 {
    monthly_payment * i128::from(participants.saturating_sub(position))
}

/// Full collateral schedule for a hypothetical group, position by position.
pub fn get_collateral_demo(
    env: &Env,
    participants: u32,
    monthly_payment: i128,
) -> (Vec<u32>, Vec<i128>) {
    let mut positions = Vec::new(env);
    let mut amounts = Vec::new(env);
    for position in 1..=participants {
        positions.push_back(position);
        amounts.push_back(required_collateral(position, participants, monthly_payment));
    }
    (positions, amounts)
}

/// What a seizure of `member` would recover right now. Unknown addresses
/// yield zeros.
///
/// Contributions already paid in count as recoverable only while the member
/// has not yet received their rotation payout.
pub fn calculate_seizable_assets(env: &Env, member: &Address) -> SeizableAssets {
    match storage::get_member(env, member) {
        Some(record) => seizable_of(&record),
        None => SeizableAssets {
            total_seizable: 0,
            collateral_seized: 0,
            payments_seized: 0,
        },
    }
}

fn seizable_of(record: &Member) -> SeizableAssets {
    let collateral_seized = record.locked_collateral;
    let payments_seized = if record.has_received_payout {
        0
    } else {
        record.total_paid
    };
    SeizableAssets {
        total_seizable: collateral_seized + payments_seized,
        collateral_seized,
        payments_seized,
    }
}

/// Seize a defaulter's assets. Irrevocable.
///
/// The locked collateral is credited to the current cycle pot and zeroed on
/// the member record; unreceived contributions are forfeited (they already
/// sit in the pot or have been paid out). If the member's own collateral
/// does not cover the missed monthly payment, the shortfall is taken from
/// the guarantor's locked collateral next.
///
/// The caller owns the member record and is responsible for storing it
/// along with the default bookkeeping (deactivation, counters, reputation).
pub fn seize(env: &Env, member: &Address, record: &mut Member) -> Result<SeizableAssets, AjoError> {
    let state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    let seized = seizable_of(record);

    if record.locked_collateral > 0 {
        payments::credit_pot(
            env,
            state.current_cycle,
            record.preferred_token,
            record.locked_collateral,
        );
    }

    let monthly = payments::monthly_payment(env, record.preferred_token)?;
    if record.locked_collateral < monthly {
        if let Some(guarantor) = record.guarantor.clone() {
            if let Some(mut backer) = storage::get_member(env, &guarantor) {
                let shortfall = monthly - record.locked_collateral;
                let taken = shortfall.min(backer.locked_collateral);
                if taken > 0 {
                    backer.locked_collateral -= taken;
                    storage::set_member(env, &guarantor, &backer);
                    payments::credit_pot(env, state.current_cycle, backer.preferred_token, taken);
                    env.events().publish(
                        (crate::symbol_short!("backer"),),
                        (member.clone(), guarantor, taken),
                    );
                }
            }
        }
    }

    record.locked_collateral = 0;
    storage::clear_penalty(env, member);

    env.events().publish(
        (crate::symbol_short!("seized"),),
        (member.clone(), seized.total_seizable),
    );

    Ok(seized)
}
