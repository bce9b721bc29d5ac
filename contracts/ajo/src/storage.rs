use soroban_sdk::{Address, Env, Vec};

use crate::types::{
    AutomationConfig, CycleRecord, CycleState, DataKey, Dispute, GroupConfig, Member,
    PayToken, PaymentRecord, TokenConfig,
};

const INSTANCE_TTL_THRESHOLD: u32 = 100;
const INSTANCE_TTL_EXTEND: u32 = 500;
const PERSISTENT_TTL_THRESHOLD: u32 = 100;
const PERSISTENT_TTL_EXTEND: u32 = 1000;

// --- Protocol admin ---

pub fn get_admin(env: &Env) -> Address {
    env.storage().instance().get(&DataKey::Admin).unwrap()
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    extend_instance_ttl(env);
}

pub fn has_admin(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

// --- Group config / state ---

pub fn get_config(env: &Env) -> Option<GroupConfig> {
    env.storage().instance().get(&DataKey::Config)
}

pub fn set_config(env: &Env, config: &GroupConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    extend_instance_ttl(env);
}

pub fn get_state(env: &Env) -> Option<CycleState> {
    env.storage().instance().get(&DataKey::State)
}

pub fn set_state(env: &Env, state: &CycleState) {
    env.storage().instance().set(&DataKey::State, state);
    extend_instance_ttl(env);
}

// --- Automation ---

pub fn get_automation(env: &Env) -> Option<AutomationConfig> {
    env.storage().instance().get(&DataKey::Automation)
}

pub fn set_automation(env: &Env, config: &AutomationConfig) {
    env.storage().instance().set(&DataKey::Automation, config);
    extend_instance_ttl(env);
}

// --- Token configuration ---

pub fn get_token_config(env: &Env, token: PayToken) -> TokenConfig {
    env.storage()
        .instance()
        .get(&DataKey::TokenConfig(token))
        .unwrap_or(TokenConfig {
            is_active: false,
            monthly_payment: 0,
        })
}

pub fn set_token_config(env: &Env, token: PayToken, config: &TokenConfig) {
    env.storage()
        .instance()
        .set(&DataKey::TokenConfig(token), config);
    extend_instance_ttl(env);
}

pub fn get_token_address(env: &Env, token: PayToken) -> Option<Address> {
    env.storage().instance().get(&DataKey::TokenAddress(token))
}

pub fn set_token_address(env: &Env, token: PayToken, address: &Address) {
    env.storage()
        .instance()
        .set(&DataKey::TokenAddress(token), address);
    extend_instance_ttl(env);
}

// --- Member list (ascending queue order) ---

pub fn get_member_list(env: &Env) -> Vec<Address> {
    env.storage()
        .instance()
        .get(&DataKey::MemberList)
        .unwrap_or(Vec::new(env))
}

pub fn set_member_list(env: &Env, list: &Vec<Address>) {
    env.storage().instance().set(&DataKey::MemberList, list);
    extend_instance_ttl(env);
}

// --- Members ---

pub fn get_member(env: &Env, member: &Address) -> Option<Member> {
    let key = DataKey::Member(member.clone());
    let result = env.storage().persistent().get(&key);
    if result.is_some() {
        extend_persistent_ttl(env, &key);
    }
    result
}

pub fn set_member(env: &Env, member: &Address, record: &Member) {
    let key = DataKey::Member(member.clone());
    env.storage().persistent().set(&key, record);
    extend_persistent_ttl(env, &key);
}

pub fn remove_member(env: &Env, member: &Address) {
    env.storage()
        .persistent()
        .remove(&DataKey::Member(member.clone()));
}

// --- Payment history (append-only) ---

pub fn get_payments(env: &Env, member: &Address) -> Vec<PaymentRecord> {
    let key = DataKey::Payments(member.clone());
    env.storage()
        .persistent()
        .get(&key)
        .unwrap_or(Vec::new(env))
}

pub fn push_payment(env: &Env, member: &Address, record: &PaymentRecord) {
    let key = DataKey::Payments(member.clone());
    let mut history = get_payments(env, member);
    history.push_back(record.clone());
    env.storage().persistent().set(&key, &history);
    extend_persistent_ttl(env, &key);
}

// --- Pending penalties ---

pub fn get_penalty(env: &Env, member: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Penalty(member.clone()))
        .unwrap_or(0)
}

pub fn set_penalty(env: &Env, member: &Address, amount: i128) {
    let key = DataKey::Penalty(member.clone());
    env.storage().persistent().set(&key, &amount);
    extend_persistent_ttl(env, &key);
}

pub fn clear_penalty(env: &Env, member: &Address) {
    env.storage()
        .persistent()
        .remove(&DataKey::Penalty(member.clone()));
}

// --- Guarantor slots ---

pub fn get_guarantee_count(env: &Env, guarantor: &Address) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::Guarantees(guarantor.clone()))
        .unwrap_or(0)
}

pub fn set_guarantee_count(env: &Env, guarantor: &Address, count: u32) {
    let key = DataKey::Guarantees(guarantor.clone());
    env.storage().persistent().set(&key, &count);
    extend_persistent_ttl(env, &key);
}

// --- Cycle records ---

pub fn get_cycle_record(env: &Env, cycle: u32) -> Option<CycleRecord> {
    let key = DataKey::CycleRecord(cycle);
    let result = env.storage().persistent().get(&key);
    if result.is_some() {
        extend_persistent_ttl(env, &key);
    }
    result
}

pub fn set_cycle_record(env: &Env, record: &CycleRecord) {
    let key = DataKey::CycleRecord(record.cycle);
    env.storage().persistent().set(&key, record);
    extend_persistent_ttl(env, &key);
}

// --- Dispute ---

pub fn get_dispute(env: &Env) -> Option<Dispute> {
    env.storage().instance().get(&DataKey::Dispute)
}

pub fn set_dispute(env: &Env, dispute: &Dispute) {
    env.storage().instance().set(&DataKey::Dispute, dispute);
    extend_instance_ttl(env);
}

pub fn remove_dispute(env: &Env) {
    env.storage().instance().remove(&DataKey::Dispute);
}

// --- TTL Management ---

fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}
