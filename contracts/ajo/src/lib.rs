#![no_std]

use soroban_sdk::{contract, contractimpl, symbol_short, Address, Env, String, Vec};

mod automation;
mod collateral;
mod errors;
mod governance;
mod members;
mod payments;
mod storage;
mod types;

pub use errors::AjoError;
pub use types::*;

#[contract]
pub struct AjoContract;

#[contractimpl]
impl AjoContract {
    /// Initialize the protocol with a global admin.
    pub fn __constructor(env: Env, admin: Address) {
        if storage::has_admin(&env) {
            panic!("already initialized");
        }
        storage::set_admin(&env, &admin);
    }

    // ─── Group Lifecycle ────────────────────────────────────────────

    /// Create the savings group. The caller becomes the group admin.
    /// One group per deployed contract.
    pub fn create_group(
        env: Env,
        admin: Address,
        name: String,
        max_members: u32,
        cycle_duration: u64,
        grace_period: u64,
        active_token: PayToken,
        max_voting_power: u32,
    ) -> Result<(), AjoError> {
        governance::create_group(
            &env,
            admin,
            name,
            max_members,
            cycle_duration,
            grace_period,
            active_token,
            max_voting_power,
        )
    }

    /// Configure a payment token's terms. Forming groups only.
    pub fn configure_token(
        env: Env,
        admin: Address,
        token_kind: PayToken,
        token_address: Address,
        monthly_payment: i128,
    ) -> Result<(), AjoError> {
        payments::configure_token(&env, admin, token_kind, token_address, monthly_payment)
    }

    /// Start the rotation. Only the group admin, only once fully subscribed.
    pub fn start_group(env: Env, admin: Address) -> Result<(), AjoError> {
        governance::start_group(&env, admin)
    }

    pub fn get_group_config(env: Env) -> Result<GroupConfig, AjoError> {
        storage::get_config(&env).ok_or(AjoError::NotInitialized)
    }

    pub fn get_group_state(env: Env) -> Result<CycleState, AjoError> {
        storage::get_state(&env).ok_or(AjoError::NotInitialized)
    }

    // ─── Member Registry ────────────────────────────────────────────

    /// Join the forming group. Locks the queue-position collateral in the
    /// member's preferred token and returns the assigned queue number.
    pub fn join_group(
        env: Env,
        member: Address,
        preferred_token: PayToken,
        guarantor: Option<Address>,
    ) -> Result<u32, AjoError> {
        members::join_group(&env, member, preferred_token, guarantor)
    }

    /// Leave the group (only allowed while it is still forming).
    pub fn leave_group(env: Env, member: Address) -> Result<(), AjoError> {
        members::leave_group(&env, member)
    }

    /// Member record plus pending penalty and derived voting power. Unknown
    /// addresses yield a zeroed record with `is_active = false`.
    pub fn get_member_info(env: Env, member: Address) -> MemberInfo {
        members::get_member_info(&env, member)
    }

    /// Queue position and estimated cycles until payout.
    pub fn get_queue_info(env: Env, member: Address) -> QueueInfo {
        members::get_queue_info(&env, member)
    }

    /// Aggregate counts, collateral and balances per token.
    pub fn get_contract_stats(env: Env) -> ContractStats {
        members::get_contract_stats(&env)
    }

    /// Reclaim locked collateral after the rotation has completed.
    pub fn withdraw_collateral(env: Env, member: Address) -> Result<(), AjoError> {
        members::withdraw_collateral(&env, member)
    }

    // ─── Payment Cycle Ledger ───────────────────────────────────────

    /// Contribute to the current cycle (plus any pending late penalty).
    pub fn contribute(env: Env, member: Address) -> Result<(), AjoError> {
        payments::contribute(&env, member)
    }

    /// Whether the member still owes a contribution for the current cycle.
    pub fn needs_to_pay_this_cycle(env: Env, member: Address) -> bool {
        payments::needs_to_pay_this_cycle(&env, member)
    }

    pub fn get_current_cycle(env: Env) -> u32 {
        payments::get_current_cycle(&env)
    }

    pub fn get_next_payment_deadline(env: Env) -> u64 {
        payments::get_next_payment_deadline(&env)
    }

    /// Token terms; zeroed (`is_active = false`) for unconfigured tokens.
    pub fn get_token_config(env: Env, token_kind: PayToken) -> TokenConfig {
        payments::get_token_config(&env, token_kind)
    }

    /// Active members past deadline + grace for the current cycle, in
    /// ascending queue order.
    pub fn get_members_in_default(env: Env) -> Vec<Address> {
        payments::get_members_in_default(&env)
    }

    /// Append-only contribution history for a member.
    pub fn get_payment_history(env: Env, member: Address) -> Vec<PaymentRecord> {
        payments::get_payment_history(&env, member)
    }

    /// Close the current cycle: payout, penalties, deadline rollover.
    /// Group admin (or protocol admin) only.
    pub fn settle_cycle(env: Env, caller: Address) -> Result<(), AjoError> {
        payments::settle_cycle(&env, caller)
    }

    // ─── Collateral Engine ──────────────────────────────────────────

    /// Collateral schedule for a hypothetical group of `participants`
    /// paying `monthly_payment` per cycle.
    pub fn get_collateral_demo(
        env: Env,
        participants: u32,
        monthly_payment: i128,
    ) -> (Vec<u32>, Vec<i128>) {
        collateral::get_collateral_demo(&env, participants, monthly_payment)
    }

    /// What a default seizure of this member would recover right now.
    pub fn calculate_seizable_assets(env: Env, member: Address) -> SeizableAssets {
        collateral::calculate_seizable_assets(&env, &member)
    }

    // ─── Default & Automation Controller ────────────────────────────

    /// Whether an off-chain relayer should trigger default handling now.
    pub fn should_automation_run(env: Env) -> AutomationCheck {
        automation::should_automation_run(&env)
    }

    /// Seize a batch of defaulters. Authorized relayer or group admin only;
    /// validation rejects the whole batch before any state change.
    pub fn batch_handle_defaults(
        env: Env,
        caller: Address,
        defaulters: Vec<Address>,
    ) -> Result<BatchReport, AjoError> {
        automation::batch_handle_defaults(&env, caller, defaulters)
    }

    pub fn set_automation_config(
        env: Env,
        admin: Address,
        enabled: bool,
        grace_period: u64,
        authorized_caller: Address,
        max_batch_size: u32,
    ) -> Result<(), AjoError> {
        automation::set_automation_config(
            &env,
            admin,
            enabled,
            grace_period,
            authorized_caller,
            max_batch_size,
        )
    }

    pub fn get_automation_config(env: Env) -> Result<AutomationConfig, AjoError> {
        automation::get_automation_config(&env)
    }

    // ─── Governance ─────────────────────────────────────────────────

    /// Pause an active group.
    pub fn pause_group(env: Env, admin: Address) -> Result<(), AjoError> {
        governance::pause_group(&env, admin)
    }

    /// Resume a paused group.
    pub fn resume_group(env: Env, admin: Address) -> Result<(), AjoError> {
        governance::resume_group(&env, admin)
    }

    /// Raise a dispute; freezes the group including automation.
    pub fn raise_dispute(env: Env, member: Address, reason: String) -> Result<(), AjoError> {
        governance::raise_dispute(&env, member, reason)
    }

    /// Resolve a dispute (group admin or protocol admin).
    pub fn resolve_dispute(env: Env, admin: Address) -> Result<(), AjoError> {
        governance::resolve_dispute(&env, admin)
    }

    pub fn get_dispute(env: Env) -> Option<Dispute> {
        governance::get_dispute(&env)
    }

    /// Transfer the group admin role.
    pub fn set_group_admin(
        env: Env,
        current_admin: Address,
        new_admin: Address,
    ) -> Result<(), AjoError> {
        governance::set_group_admin(&env, current_admin, new_admin)
    }

    /// Unwind the group: refund collateral, split remaining contributions
    /// proportionally. Protocol admin only.
    pub fn emergency_withdraw(env: Env, admin: Address) -> Result<(), AjoError> {
        governance::emergency_withdraw(&env, admin)
    }
}

#[cfg(test)]
mod test;
