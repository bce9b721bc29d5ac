use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum AjoError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    GroupNotForming = 4,
    GroupNotActive = 5,
    GroupNotCompleted = 6,
    GroupCompleted = 7,
    GroupFull = 8,
    AlreadyMember = 9,
    NotMember = 10,
    MemberInactive = 11,
    InsufficientMembers = 12,
    InvalidAmount = 13,
    TokenNotConfigured = 14,
    AlreadyContributed = 15,
    CycleNotOpen = 16,
    CycleNotDue = 17,
    GuarantorNotFound = 18,
    GuarantorSlotsFull = 19,
    BatchTooLarge = 20,
    GracePeriodNotElapsed = 21,
    AutomationDisabled = 22,
    NotInDefault = 23,
    AlreadySettled = 24,
    NothingToWithdraw = 25,
    DisputeActive = 26,
}
