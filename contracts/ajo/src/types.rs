use soroban_sdk::{contracttype, Address, Map, String, Vec};

pub const BPS_DENOMINATOR: i128 = 10_000;
/// Late penalty charged per missed cycle, in basis points of the monthly payment.
pub const LATE_PENALTY_BPS: i128 = 500;

pub const REPUTATION_START: u32 = 50;
pub const REPUTATION_CAP: u32 = 100;
pub const TIMELY_PAYMENT_BONUS: u32 = 1;
pub const DEFAULT_REPUTATION_SLASH: u32 = 10;

/// Vouching slots a single guarantor may back at once.
pub const MAX_GUARANTEES: u32 = 2;

pub const DEFAULT_MAX_BATCH_SIZE: u32 = 20;
pub const DEFAULT_MAX_VOTING_POWER: u32 = 3;

/// Status of an Ajo group throughout its lifecycle.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GroupStatus {
    Forming,   // Accepting members, not yet started
    Active,    // Cycles in progress
    Paused,    // Admin has paused the group
    Disputed,  // A dispute has been raised, group is frozen
    Completed, // All cycles finished, collateral withdrawable
}

/// Payment tokens a member may contribute in.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PayToken {
    Usdc,
    Native,
}

/// Per-member ledger entry.
///
/// `queue_number` is 1-indexed and fixes the payout order. Cycles are also
/// 1-indexed, so `last_payment_cycle == 0` means the member has never paid.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Member {
    pub queue_number: u32,
    pub joined_cycle: u32,
    pub total_paid: i128,
    pub required_collateral: i128,
    pub locked_collateral: i128,
    pub last_payment_cycle: u32,
    pub default_count: u32,
    pub has_received_payout: bool,
    pub is_active: bool,
    pub guarantor: Option<Address>,
    /// 1-based slot within the guarantor's vouching capacity, 0 if none.
    pub guarantee_position: u32,
    pub preferred_token: PayToken,
    pub reputation_score: u32,
}

/// One confirmed contribution, appended to the member's payment history.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaymentRecord {
    pub cycle: u32,
    pub amount: i128,
    pub timestamp: u64,
}

/// Immutable group configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupConfig {
    pub name: String,
    pub admin: Address,
    /// Rotation size `n` used by the collateral formula. The group must be
    /// fully subscribed before it can start.
    pub max_members: u32,
    pub cycle_duration: u64,
    pub active_token: PayToken,
    pub max_voting_power: u32,
    pub created_at: u64,
}

/// Mutable group state, updated on start, settlement and completion.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CycleState {
    pub status: GroupStatus,
    pub current_cycle: u32,
    pub next_payment_deadline: u64,
    /// Next queue slot due a payout.
    pub current_queue_position: u32,
    pub total_rounds: u32,
}

/// Tracks contributions and the pot for a single cycle.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CycleRecord {
    pub cycle: u32,
    pub contributions: Map<Address, bool>,
    pub pot: Map<PayToken, i128>,
    pub deadline: u64,
}

/// Payment terms for one token. Unconfigured tokens read back zeroed.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenConfig {
    pub is_active: bool,
    pub monthly_payment: i128,
}

/// Relayer-driven default handling configuration.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AutomationConfig {
    pub enabled: bool,
    pub grace_period: u64,
    pub authorized_caller: Address,
    pub max_batch_size: u32,
}

/// Composed member view: ledger entry plus the cross-component values
/// (pending penalty from the cycle ledger, derived voting power).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemberInfo {
    pub member: Member,
    pub pending_penalty: i128,
    pub effective_voting_power: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueueInfo {
    pub position: u32,
    pub estimated_cycles_wait: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContractStats {
    pub total_members: u32,
    pub active_members: u32,
    pub total_collateral: Map<PayToken, i128>,
    pub contract_balance: Map<PayToken, i128>,
    pub current_queue_position: u32,
    pub active_token: PayToken,
}

/// Breakdown of what a default seizure would recover.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SeizableAssets {
    pub total_seizable: i128,
    pub collateral_seized: i128,
    pub payments_seized: i128,
}

/// Result of `should_automation_run`, consumed by off-chain relayers.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AutomationCheck {
    pub should_run: bool,
    pub reason: String,
    pub defaulter_count: u32,
}

/// Settlement record for one batched default-handling call.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchReport {
    pub success_count: u32,
    pub failure_count: u32,
    pub processed: Vec<Address>,
    pub failed: Vec<Address>,
}

/// Dispute information for the group.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dispute {
    pub raised_by: Address,
    pub reason: String,
    pub raised_at: u64,
}

/// Storage keys for all contract data.
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Config,
    State,
    Automation,
    Dispute,
    MemberList,
    TokenConfig(PayToken),
    TokenAddress(PayToken),
    Member(Address),
    Payments(Address),
    Penalty(Address),
    Guarantees(Address),
    CycleRecord(u32),
}
