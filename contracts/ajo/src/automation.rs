use soroban_sdk::{Address, Env, String, Vec};

use crate::collateral;
use crate::errors::AjoError;
use crate::payments;
use crate::storage;
use crate::types::{
    AutomationCheck, AutomationConfig, BatchReport, CycleState, GroupStatus,
    DEFAULT_REPUTATION_SLASH,
};

/// Gate check for off-chain relayers. The contract never schedules anything
/// itself; an external agent polls this at whatever interval it likes and
/// the checks here (and in `batch_handle_defaults`) make overlapping or
/// early invocations harmless.
pub fn should_automation_run(env: &Env) -> AutomationCheck {
    let automation = match storage::get_automation(env) {
        Some(automation) => automation,
        None => return blocked(env, "Automation not configured"),
    };
    if !automation.enabled {
        return blocked(env, "Automation disabled");
    }

    let state = match storage::get_state(env) {
        Some(state) => state,
        None => return blocked(env, "Group not initialized"),
    };
    if state.status != GroupStatus::Active {
        return blocked(env, "Group not active");
    }

    let now = env.ledger().timestamp();
    if now < state.next_payment_deadline + automation.grace_period {
        return blocked(env, "Grace period not elapsed");
    }

    let defaulters = payments::get_members_in_default(env);
    if defaulters.is_empty() {
        return blocked(env, "No members in default");
    }

    AutomationCheck {
        should_run: true,
        reason: String::from_str(env, "Defaulters ready for processing"),
        defaulter_count: defaulters.len(),
    }
}

/// Process a batch of defaulters. All validation happens before any state
/// change, so a rejected call leaves the ledger untouched and is safe to
/// retry. Accepted batches process each address independently: one bad
/// entry becomes a recorded failure, never an abort of its siblings.
pub fn batch_handle_defaults(
    env: &Env,
    caller: Address,
    defaulters: Vec<Address>,
) -> Result<BatchReport, AjoError> {
    caller.require_auth();

    let config = storage::get_config(env).ok_or(AjoError::NotInitialized)?;
    let automation = storage::get_automation(env).ok_or(AjoError::NotInitialized)?;
    if caller != automation.authorized_caller && caller != config.admin {
        return Err(AjoError::Unauthorized);
    }
    if !automation.enabled {
        return Err(AjoError::AutomationDisabled);
    }
    if defaulters.len() > automation.max_batch_size {
        return Err(AjoError::BatchTooLarge);
    }

    let state = storage::get_state(env).ok_or(AjoError::NotInitialized)?;
    if state.status != GroupStatus::Active {
        return Err(AjoError::GroupNotActive);
    }
    let now = env.ledger().timestamp();
    if now < state.next_payment_deadline + automation.grace_period {
        return Err(AjoError::GracePeriodNotElapsed);
    }

    let mut processed = Vec::new(env);
    let mut failed = Vec::new(env);
    for defaulter in defaulters.iter() {
        match process_defaulter(env, &defaulter, &state) {
            Ok(()) => processed.push_back(defaulter),
            Err(_) => failed.push_back(defaulter),
        }
    }

    let report = BatchReport {
        success_count: processed.len(),
        failure_count: failed.len(),
        processed,
        failed,
    };

    env.events().publish(
        (crate::symbol_short!("defaults"),),
        (report.success_count, report.failure_count),
    );

    Ok(report)
}

pub fn set_automation_config(
    env: &Env,
    admin: Address,
    enabled: bool,
    grace_period: u64,
    authorized_caller: Address,
    max_batch_size: u32,
) -> Result<(), AjoError> {
    admin.require_auth();

    let config = storage::get_config(env).ok_or(AjoError::NotInitialized)?;
    if admin != config.admin && admin != storage::get_admin(env) {
        return Err(AjoError::Unauthorized);
    }
    if max_batch_size == 0 {
        return Err(AjoError::InvalidAmount);
    }

    storage::set_automation(
        env,
        &AutomationConfig {
            enabled,
            grace_period,
            authorized_caller,
            max_batch_size,
        },
    );

    env.events()
        .publish((crate::symbol_short!("auto_cfg"),), (enabled, grace_period));

    Ok(())
}

pub fn get_automation_config(env: &Env) -> Result<AutomationConfig, AjoError> {
    storage::get_automation(env).ok_or(AjoError::NotInitialized)
}

/// Seize one defaulter and record the default. A member that is unknown,
/// already settled, or not actually behind on payments is a per-member
/// failure; a settled member is never penalized twice.
fn process_defaulter(env: &Env, member: &Address, state: &CycleState) -> Result<(), AjoError> {
    let mut record = storage::get_member(env, member).ok_or(AjoError::NotMember)?;
    if !record.is_active {
        return Err(AjoError::AlreadySettled);
    }
    if record.last_payment_cycle >= state.current_cycle {
        return Err(AjoError::NotInDefault);
    }

    collateral::seize(env, member, &mut record)?;

    record.default_count += 1;
    record.reputation_score = record
        .reputation_score
        .saturating_sub(DEFAULT_REPUTATION_SLASH);
    record.is_active = false;
    storage::set_member(env, member, &record);

    Ok(())
}

fn blocked(env: &Env, reason: &str) -> AutomationCheck {
    AutomationCheck {
        should_run: false,
        reason: String::from_str(env, reason),
        defaulter_count: 0,
    }
}
