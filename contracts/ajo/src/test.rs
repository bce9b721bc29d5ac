use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token::{StellarAssetClient, TokenClient},
    vec, Address, Env, String, Vec,
};

use crate::types::{GroupStatus, PayToken};
use crate::{AjoContract, AjoContractClient, AjoError};

const MONTHLY: i128 = 1_000_000;
const CYCLE: u64 = 86400;
const GRACE: u64 = 7200;
const STARTING_BALANCE: i128 = 100_000_000;

fn setup_env() -> (Env, Address, AjoContractClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();

    let admin = Address::generate(&env);
    let contract_id = env.register(AjoContract, (&admin,));
    let client = AjoContractClient::new(&env, &contract_id);

    let token_admin = Address::generate(&env);
    let token_id = env.register_stellar_asset_contract_v2(token_admin);

    (env, admin, client, token_id.address())
}

fn create_test_group(
    env: &Env,
    client: &AjoContractClient,
    admin: &Address,
    token: &Address,
    max_members: u32,
) {
    client.create_group(
        admin,
        &String::from_str(env, "Lagos Esusu Circle"),
        &max_members,
        &CYCLE,
        &GRACE,
        &PayToken::Usdc,
        &3,
    );
    client.configure_token(admin, &PayToken::Usdc, token, &MONTHLY);
}

fn fund(env: &Env, token: &Address, who: &Address) {
    StellarAssetClient::new(env, token).mint(who, &STARTING_BALANCE);
}

fn join_members(
    env: &Env,
    client: &AjoContractClient,
    token: &Address,
    count: u32,
) -> Vec<Address> {
    let mut members = Vec::new(env);
    for _ in 0..count {
        let member = Address::generate(env);
        fund(env, token, &member);
        client.join_group(&member, &PayToken::Usdc, &None);
        members.push_back(member);
    }
    members
}

fn balance(env: &Env, token: &Address, who: &Address) -> i128 {
    TokenClient::new(env, token).balance(who)
}

#[test]
fn test_create_group() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);

    let config = client.get_group_config();
    assert_eq!(config.admin, admin);
    assert_eq!(config.max_members, 5);
    assert_eq!(config.cycle_duration, CYCLE);
    assert_eq!(config.active_token, PayToken::Usdc);

    let state = client.get_group_state();
    assert_eq!(state.status, GroupStatus::Forming);
    assert_eq!(state.current_cycle, 0);

    let usdc = client.get_token_config(&PayToken::Usdc);
    assert!(usdc.is_active);
    assert_eq!(usdc.monthly_payment, MONTHLY);

    // Unconfigured tokens read back zeroed, not as an error.
    let native = client.get_token_config(&PayToken::Native);
    assert!(!native.is_active);
    assert_eq!(native.monthly_payment, 0);

    assert_eq!(
        client.try_create_group(
            &admin,
            &String::from_str(&env, "Second"),
            &5,
            &CYCLE,
            &GRACE,
            &PayToken::Usdc,
            &3,
        ),
        Err(Ok(AjoError::AlreadyInitialized))
    );
}

#[test]
fn test_collateral_demo_schedule() {
    let (env, _admin, client, _token) = setup_env();

    let (positions, amounts) = client.get_collateral_demo(&5, &100);
    assert_eq!(positions, vec![&env, 1, 2, 3, 4, 5]);
    assert_eq!(amounts, vec![&env, 400, 300, 200, 100, 0]);
}

#[test]
fn test_join_locks_queue_position_collateral() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);

    let first = members.get(0).unwrap();
    let info = client.get_member_info(&first);
    assert_eq!(info.member.queue_number, 1);
    assert_eq!(info.member.required_collateral, 4 * MONTHLY);
    assert_eq!(info.member.locked_collateral, 4 * MONTHLY);
    assert_eq!(info.member.reputation_score, 50);
    assert!(info.member.is_active);
    assert_eq!(balance(&env, &token, &first), STARTING_BALANCE - 4 * MONTHLY);

    let last = members.get(4).unwrap();
    let info = client.get_member_info(&last);
    assert_eq!(info.member.queue_number, 5);
    assert_eq!(info.member.locked_collateral, 0);

    let stats = client.get_contract_stats();
    assert_eq!(stats.total_members, 5);
    assert_eq!(stats.active_members, 5);
    assert_eq!(stats.total_collateral.get(PayToken::Usdc).unwrap(), 10 * MONTHLY);
    assert_eq!(stats.contract_balance.get(PayToken::Usdc).unwrap(), 10 * MONTHLY);
    assert_eq!(stats.current_queue_position, 1);
    assert_eq!(stats.active_token, PayToken::Usdc);
}

#[test]
fn test_join_rejections() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);

    let extra = Address::generate(&env);
    fund(&env, &token, &extra);
    assert_eq!(
        client.try_join_group(&extra, &PayToken::Usdc, &None),
        Err(Ok(AjoError::GroupFull))
    );

    let first = members.get(0).unwrap();
    assert_eq!(
        client.try_join_group(&first, &PayToken::Usdc, &None),
        Err(Ok(AjoError::AlreadyMember))
    );
}

#[test]
fn test_join_requires_configured_token() {
    let (env, admin, client, _token) = setup_env();
    client.create_group(
        &admin,
        &String::from_str(&env, "No Token Yet"),
        &3,
        &CYCLE,
        &GRACE,
        &PayToken::Usdc,
        &3,
    );

    let member = Address::generate(&env);
    assert_eq!(
        client.try_join_group(&member, &PayToken::Usdc, &None),
        Err(Ok(AjoError::TokenNotConfigured))
    );
}

#[test]
fn test_leave_reopens_queue_slot() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 3);
    let members = join_members(&env, &client, &token, 3);

    let second = members.get(1).unwrap();
    client.leave_group(&second);
    assert_eq!(balance(&env, &token, &second), STARTING_BALANCE);
    assert_eq!(client.get_contract_stats().total_members, 2);

    // The vacated slot goes to the next joiner, with that slot's collateral.
    let replacement = Address::generate(&env);
    fund(&env, &token, &replacement);
    let queue_number = client.join_group(&replacement, &PayToken::Usdc, &None);
    assert_eq!(queue_number, 2);
    let info = client.get_member_info(&replacement);
    assert_eq!(info.member.required_collateral, MONTHLY);
}

#[test]
fn test_start_requires_full_rotation() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    join_members(&env, &client, &token, 4);

    assert_eq!(
        client.try_start_group(&admin),
        Err(Ok(AjoError::InsufficientMembers))
    );

    join_members(&env, &client, &token, 1);
    client.start_group(&admin);

    let state = client.get_group_state();
    assert_eq!(state.status, GroupStatus::Active);
    assert_eq!(state.current_cycle, 1);
    assert_eq!(state.total_rounds, 5);
    assert_eq!(state.next_payment_deadline, CYCLE);
    assert_eq!(client.get_current_cycle(), 1);
    assert_eq!(client.get_next_payment_deadline(), CYCLE);

    assert_eq!(
        client.try_start_group(&admin),
        Err(Ok(AjoError::GroupNotForming))
    );
}

#[test]
fn test_contribute_flow() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);
    client.start_group(&admin);

    let first = members.get(0).unwrap();
    assert!(client.needs_to_pay_this_cycle(&first));

    client.contribute(&first);
    assert!(!client.needs_to_pay_this_cycle(&first));

    let info = client.get_member_info(&first);
    assert_eq!(info.member.last_payment_cycle, 1);
    assert_eq!(info.member.total_paid, MONTHLY);
    // Timely payment earns a reputation point.
    assert_eq!(info.member.reputation_score, 51);

    let history = client.get_payment_history(&first);
    assert_eq!(history.len(), 1);
    assert_eq!(history.get(0).unwrap().cycle, 1);
    assert_eq!(history.get(0).unwrap().amount, MONTHLY);

    assert_eq!(
        client.try_contribute(&first),
        Err(Ok(AjoError::AlreadyContributed))
    );
}

#[test]
fn test_settle_pays_queue_order() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);
    client.start_group(&admin);

    for member in members.iter() {
        client.contribute(&member);
    }

    let first = members.get(0).unwrap();
    let before = balance(&env, &token, &first);
    client.settle_cycle(&admin);
    assert_eq!(balance(&env, &token, &first), before + 5 * MONTHLY);

    let info = client.get_member_info(&first);
    assert!(info.member.has_received_payout);

    let state = client.get_group_state();
    assert_eq!(state.current_cycle, 2);
    assert_eq!(state.current_queue_position, 2);

    // Position 3 waits one more cycle after the current one settles.
    let third = members.get(2).unwrap();
    let queue = client.get_queue_info(&third);
    assert_eq!(queue.position, 3);
    assert_eq!(queue.estimated_cycles_wait, 1);
    assert_eq!(client.get_queue_info(&first).estimated_cycles_wait, 0);
}

#[test]
fn test_early_settle_requires_full_participation() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);
    client.start_group(&admin);

    client.contribute(&members.get(0).unwrap());
    assert_eq!(
        client.try_settle_cycle(&admin),
        Err(Ok(AjoError::CycleNotDue))
    );

    env.ledger().set_timestamp(CYCLE + 1);
    client.settle_cycle(&admin);
    assert_eq!(client.get_current_cycle(), 2);
}

#[test]
fn test_paid_members_never_listed_in_default() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);
    client.start_group(&admin);

    client.contribute(&members.get(1).unwrap());
    client.contribute(&members.get(3).unwrap());

    // Past the deadline but within grace: nobody is in default yet.
    env.ledger().set_timestamp(CYCLE + 1);
    assert_eq!(client.get_members_in_default().len(), 0);

    env.ledger().set_timestamp(CYCLE + GRACE);
    let defaulters = client.get_members_in_default();
    assert_eq!(
        defaulters,
        vec![
            &env,
            members.get(0).unwrap(),
            members.get(2).unwrap(),
            members.get(4).unwrap(),
        ]
    );
}

#[test]
fn test_should_automation_run_gating() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    join_members(&env, &client, &token, 5);

    let check = client.should_automation_run();
    assert!(!check.should_run);
    assert_eq!(check.reason, String::from_str(&env, "Automation disabled"));

    let relayer = Address::generate(&env);
    client.set_automation_config(&admin, &true, &GRACE, &relayer, &20);

    // Enabled but the group has not started.
    let check = client.should_automation_run();
    assert!(!check.should_run);
    assert_eq!(check.reason, String::from_str(&env, "Group not active"));

    client.start_group(&admin);

    env.ledger().set_timestamp(CYCLE + 1);
    let check = client.should_automation_run();
    assert!(!check.should_run);
    assert_eq!(
        check.reason,
        String::from_str(&env, "Grace period not elapsed")
    );
    assert_eq!(check.defaulter_count, 0);

    env.ledger().set_timestamp(CYCLE + GRACE + 1);
    let check = client.should_automation_run();
    assert!(check.should_run);
    assert_eq!(check.defaulter_count, 5);
    assert_eq!(
        check.reason,
        String::from_str(&env, "Defaulters ready for processing")
    );
}

#[test]
fn test_batch_rejects_oversized_without_mutation() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);
    let relayer = Address::generate(&env);
    client.set_automation_config(&admin, &true, &GRACE, &relayer, &20);
    client.start_group(&admin);

    env.ledger().set_timestamp(CYCLE + GRACE + 1);

    let mut oversized = Vec::new(&env);
    for _ in 0..25 {
        oversized.push_back(Address::generate(&env));
    }
    let result = client.try_batch_handle_defaults(&relayer, &oversized);
    assert_eq!(result.err().unwrap(), Ok(AjoError::BatchTooLarge));

    // Wholesale rejection: no member state changed.
    let info = client.get_member_info(&members.get(0).unwrap());
    assert!(info.member.is_active);
    assert_eq!(info.member.default_count, 0);
}

#[test]
fn test_batch_seizes_defaulters() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);
    let relayer = Address::generate(&env);
    client.set_automation_config(&admin, &true, &GRACE, &relayer, &20);
    client.start_group(&admin);

    let third = members.get(2).unwrap();
    for member in members.iter() {
        if member != third {
            client.contribute(&member);
        }
    }

    env.ledger().set_timestamp(CYCLE + GRACE + 1);
    let report = client.batch_handle_defaults(&relayer, &vec![&env, third.clone()]);
    assert_eq!(report.success_count, 1);
    assert_eq!(report.failure_count, 0);
    assert_eq!(report.processed, vec![&env, third.clone()]);

    let info = client.get_member_info(&third);
    assert!(!info.member.is_active);
    assert_eq!(info.member.locked_collateral, 0);
    assert_eq!(info.member.default_count, 1);
    assert_eq!(info.member.reputation_score, 40);

    let stats = client.get_contract_stats();
    assert_eq!(stats.active_members, 4);
    assert_eq!(stats.total_members, 5);
    assert!(stats.active_members <= stats.total_members);

    let check = client.should_automation_run();
    assert!(!check.should_run);
    assert_eq!(check.reason, String::from_str(&env, "No members in default"));

    // The seized collateral flows to the group through the next payout:
    // four contributions plus the defaulter's 2M position collateral.
    let first = members.get(0).unwrap();
    let before = balance(&env, &token, &first);
    client.settle_cycle(&admin);
    assert_eq!(balance(&env, &token, &first), before + 6 * MONTHLY);
}

#[test]
fn test_batch_is_idempotent_per_defaulter() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);
    let relayer = Address::generate(&env);
    client.set_automation_config(&admin, &true, &GRACE, &relayer, &20);
    client.start_group(&admin);

    let third = members.get(2).unwrap();
    env.ledger().set_timestamp(CYCLE + GRACE + 1);

    let report = client.batch_handle_defaults(&relayer, &vec![&env, third.clone()]);
    assert_eq!(report.success_count, 1);

    // A settled defaulter is reported as a failure, never penalized twice.
    let report = client.batch_handle_defaults(&relayer, &vec![&env, third.clone()]);
    assert_eq!(report.success_count, 0);
    assert_eq!(report.failure_count, 1);
    assert_eq!(report.failed, vec![&env, third.clone()]);

    let info = client.get_member_info(&third);
    assert_eq!(info.member.default_count, 1);
    assert_eq!(info.member.reputation_score, 40);
}

#[test]
fn test_batch_validation_order() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);
    let relayer = Address::generate(&env);
    client.set_automation_config(&admin, &true, &GRACE, &relayer, &20);
    client.start_group(&admin);

    let batch = vec![&env, members.get(0).unwrap()];

    let intruder = Address::generate(&env);
    let result = client.try_batch_handle_defaults(&intruder, &batch);
    assert_eq!(result.err().unwrap(), Ok(AjoError::Unauthorized));

    client.set_automation_config(&admin, &false, &GRACE, &relayer, &20);
    let result = client.try_batch_handle_defaults(&relayer, &batch);
    assert_eq!(result.err().unwrap(), Ok(AjoError::AutomationDisabled));

    client.set_automation_config(&admin, &true, &GRACE, &relayer, &20);
    env.ledger().set_timestamp(CYCLE + 1);
    let result = client.try_batch_handle_defaults(&relayer, &batch);
    assert_eq!(result.err().unwrap(), Ok(AjoError::GracePeriodNotElapsed));
}

#[test]
fn test_seizable_assets_identity() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);
    client.start_group(&admin);

    for member in members.iter() {
        client.contribute(&member);
    }

    // Paid in, payout not yet received: both components are at risk.
    let second = members.get(1).unwrap();
    let assets = client.calculate_seizable_assets(&second);
    assert_eq!(assets.collateral_seized, 3 * MONTHLY);
    assert_eq!(assets.payments_seized, MONTHLY);
    assert_eq!(
        assets.total_seizable,
        assets.collateral_seized + assets.payments_seized
    );

    // After receiving the payout, contributions are no longer recoverable.
    client.settle_cycle(&admin);
    let first = members.get(0).unwrap();
    let assets = client.calculate_seizable_assets(&first);
    assert_eq!(assets.payments_seized, 0);
    assert_eq!(assets.total_seizable, assets.collateral_seized);

    let stranger = Address::generate(&env);
    let assets = client.calculate_seizable_assets(&stranger);
    assert_eq!(assets.total_seizable, 0);
    assert_eq!(assets.collateral_seized, 0);
    assert_eq!(assets.payments_seized, 0);
}

#[test]
fn test_missed_cycle_cured_with_penalty() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 2);
    let members = join_members(&env, &client, &token, 2);
    client.start_group(&admin);

    let first = members.get(0).unwrap();
    let second = members.get(1).unwrap();
    client.contribute(&first);

    env.ledger().set_timestamp(CYCLE + 1);
    client.settle_cycle(&admin);

    // 5% of the monthly payment accrued for the missed cycle.
    let info = client.get_member_info(&second);
    assert_eq!(info.pending_penalty, MONTHLY * 500 / 10_000);
    assert!(client.needs_to_pay_this_cycle(&second));

    let before = balance(&env, &token, &second);
    client.contribute(&second);
    assert_eq!(balance(&env, &token, &second), before - MONTHLY - 50_000);

    let info = client.get_member_info(&second);
    assert_eq!(info.pending_penalty, 0);
    assert_eq!(info.member.last_payment_cycle, 2);
    assert!(!client.needs_to_pay_this_cycle(&second));
}

#[test]
fn test_effective_voting_power() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let members = join_members(&env, &client, &token, 5);

    // Reputation 50 gives one tier, full collateral adds one more.
    let info = client.get_member_info(&members.get(0).unwrap());
    assert_eq!(info.effective_voting_power, 2);

    let stranger = Address::generate(&env);
    assert_eq!(client.get_member_info(&stranger).effective_voting_power, 0);
}

#[test]
fn test_voting_power_clamped_to_group_cap() {
    let (env, admin, client, token) = setup_env();
    client.create_group(
        &admin,
        &String::from_str(&env, "Tight Cap"),
        &3,
        &CYCLE,
        &GRACE,
        &PayToken::Usdc,
        &1,
    );
    client.configure_token(&admin, &PayToken::Usdc, &token, &MONTHLY);
    let members = join_members(&env, &client, &token, 3);

    let info = client.get_member_info(&members.get(0).unwrap());
    assert_eq!(info.effective_voting_power, 1);
}

#[test]
fn test_unknown_member_reads_zeroed() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);

    let stranger = Address::generate(&env);
    let info = client.get_member_info(&stranger);
    assert!(!info.member.is_active);
    assert_eq!(info.member.queue_number, 0);
    assert_eq!(info.member.locked_collateral, 0);
    assert_eq!(info.pending_penalty, 0);

    let queue = client.get_queue_info(&stranger);
    assert_eq!(queue.position, 0);
    assert_eq!(queue.estimated_cycles_wait, 0);

    assert!(!client.needs_to_pay_this_cycle(&stranger));
}

#[test]
fn test_full_rotation_completes() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 2);
    let members = join_members(&env, &client, &token, 2);
    client.start_group(&admin);

    let first = members.get(0).unwrap();
    let second = members.get(1).unwrap();

    client.contribute(&first);
    client.contribute(&second);
    assert_eq!(
        client.try_withdraw_collateral(&first),
        Err(Ok(AjoError::GroupNotCompleted))
    );
    client.settle_cycle(&admin);

    client.contribute(&first);
    client.contribute(&second);
    client.settle_cycle(&admin);

    assert_eq!(client.get_group_state().status, GroupStatus::Completed);

    // Everyone paid twice and received the pot once; withdrawing the
    // collateral closes the books at exactly the starting balance.
    client.withdraw_collateral(&first);
    assert_eq!(balance(&env, &token, &first), STARTING_BALANCE);
    assert_eq!(balance(&env, &token, &second), STARTING_BALANCE);

    assert_eq!(
        client.try_withdraw_collateral(&second),
        Err(Ok(AjoError::NothingToWithdraw))
    );
}

#[test]
fn test_guarantor_slots_and_fallback() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 5);
    let relayer = Address::generate(&env);
    client.set_automation_config(&admin, &true, &GRACE, &relayer, &20);

    let m1 = Address::generate(&env);
    fund(&env, &token, &m1);
    client.join_group(&m1, &PayToken::Usdc, &None);

    let m2 = Address::generate(&env);
    fund(&env, &token, &m2);
    client.join_group(&m2, &PayToken::Usdc, &Some(m1.clone()));
    assert_eq!(client.get_member_info(&m2).member.guarantee_position, 1);

    let m3 = Address::generate(&env);
    fund(&env, &token, &m3);
    client.join_group(&m3, &PayToken::Usdc, &Some(m1.clone()));
    assert_eq!(client.get_member_info(&m3).member.guarantee_position, 2);

    // Two backed members exhaust a guarantor's slots.
    let m4 = Address::generate(&env);
    fund(&env, &token, &m4);
    assert_eq!(
        client.try_join_group(&m4, &PayToken::Usdc, &Some(m1.clone())),
        Err(Ok(AjoError::GuarantorSlotsFull))
    );
    client.join_group(&m4, &PayToken::Usdc, &None);

    let m5 = Address::generate(&env);
    fund(&env, &token, &m5);
    let stranger = Address::generate(&env);
    assert_eq!(
        client.try_join_group(&m5, &PayToken::Usdc, &Some(stranger)),
        Err(Ok(AjoError::GuarantorNotFound))
    );
    client.join_group(&m5, &PayToken::Usdc, &Some(m4.clone()));

    client.start_group(&admin);
    for member in [&m1, &m2, &m3, &m4] {
        client.contribute(member);
    }

    // The last position holds no collateral of its own, so the missed
    // payment is recovered from the guarantor's locked collateral.
    env.ledger().set_timestamp(CYCLE + GRACE + 1);
    let report = client.batch_handle_defaults(&relayer, &vec![&env, m5.clone()]);
    assert_eq!(report.success_count, 1);

    assert!(!client.get_member_info(&m5).member.is_active);
    assert_eq!(client.get_member_info(&m4).member.locked_collateral, 0);

    // Payout: four contributions plus the guarantor's seized monthly.
    let before = balance(&env, &token, &m1);
    client.settle_cycle(&admin);
    assert_eq!(balance(&env, &token, &m1), before + 5 * MONTHLY);
}

#[test]
fn test_settle_skips_seized_position() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 3);
    let members = join_members(&env, &client, &token, 3);
    let relayer = Address::generate(&env);
    client.set_automation_config(&admin, &true, &GRACE, &relayer, &20);
    client.start_group(&admin);

    let first = members.get(0).unwrap();
    let second = members.get(1).unwrap();
    let third = members.get(2).unwrap();
    client.contribute(&second);
    client.contribute(&third);

    env.ledger().set_timestamp(CYCLE + GRACE + 1);
    client.batch_handle_defaults(&relayer, &vec![&env, first.clone()]);

    // Queue position 1 was seized; the payout moves on to position 2 and
    // carries the seized 2M collateral with it.
    let before = balance(&env, &token, &second);
    client.settle_cycle(&admin);
    assert_eq!(balance(&env, &token, &second), before + 4 * MONTHLY);

    let state = client.get_group_state();
    assert_eq!(state.current_queue_position, 3);
    assert!(!client.get_member_info(&first).member.has_received_payout);
}

#[test]
fn test_pause_resume_and_dispute_freeze() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 3);
    let members = join_members(&env, &client, &token, 3);
    let relayer = Address::generate(&env);
    client.set_automation_config(&admin, &true, &GRACE, &relayer, &20);
    client.start_group(&admin);

    let first = members.get(0).unwrap();

    client.pause_group(&admin);
    assert_eq!(client.get_group_state().status, GroupStatus::Paused);
    assert_eq!(
        client.try_contribute(&first),
        Err(Ok(AjoError::GroupNotActive))
    );
    let check = client.should_automation_run();
    assert!(!check.should_run);
    assert_eq!(check.reason, String::from_str(&env, "Group not active"));

    client.resume_group(&admin);
    assert_eq!(client.get_group_state().status, GroupStatus::Active);

    client.raise_dispute(&first, &String::from_str(&env, "Payout mismatch"));
    assert_eq!(client.get_group_state().status, GroupStatus::Disputed);
    let dispute = client.get_dispute().unwrap();
    assert_eq!(dispute.raised_by, first);

    env.ledger().set_timestamp(CYCLE + GRACE + 1);
    let result = client.try_batch_handle_defaults(&relayer, &vec![&env, first.clone()]);
    assert_eq!(result.err().unwrap(), Ok(AjoError::GroupNotActive));

    client.resolve_dispute(&admin);
    assert_eq!(client.get_group_state().status, GroupStatus::Active);
    assert!(client.get_dispute().is_none());
}

#[test]
fn test_set_group_admin() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 3);

    let new_admin = Address::generate(&env);
    client.set_group_admin(&admin, &new_admin);
    assert_eq!(client.get_group_config().admin, new_admin);

    assert_eq!(
        client.try_set_group_admin(&admin, &new_admin),
        Err(Ok(AjoError::Unauthorized))
    );
}

#[test]
fn test_configure_token_frozen_after_start() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 3);
    join_members(&env, &client, &token, 3);
    client.start_group(&admin);

    assert_eq!(
        client.try_configure_token(&admin, &PayToken::Usdc, &token, &(2 * MONTHLY)),
        Err(Ok(AjoError::GroupNotForming))
    );
}

#[test]
fn test_emergency_withdraw_distributes_proportionally() {
    let (env, admin, client, token) = setup_env();
    create_test_group(&env, &client, &admin, &token, 3);
    let members = join_members(&env, &client, &token, 3);
    client.start_group(&admin);

    let first = members.get(0).unwrap();
    let second = members.get(1).unwrap();
    let third = members.get(2).unwrap();

    // Cycle 1: everyone pays, first position receives the pot.
    for member in members.iter() {
        client.contribute(&member);
    }
    client.settle_cycle(&admin);

    // Cycle 2: the third member stops paying.
    client.contribute(&first);
    client.contribute(&second);

    let intruder = Address::generate(&env);
    assert_eq!(
        client.try_emergency_withdraw(&intruder),
        Err(Ok(AjoError::Unauthorized))
    );

    client.emergency_withdraw(&admin);
    assert_eq!(client.get_group_state().status, GroupStatus::Completed);

    // Collateral comes back in full; the stranded cycle-2 pot of 2M splits
    // 2:2:1 across five lifetime contributions.
    assert_eq!(balance(&env, &token, &first), 101_800_000);
    assert_eq!(balance(&env, &token, &second), 98_800_000);
    assert_eq!(balance(&env, &token, &third), 99_400_000);
    assert_eq!(balance(&env, &token, &client.address), 0);
}
