//! Loyalty-reward arithmetic shared by the accrual hook and the monthly
//! distribution cycle.

use crate::constants::ONE_TOKEN;

/// Divisor for the per-transfer reward credit (1%).
pub const TRANSFER_REWARD_DIVISOR: u128 = 100;

/// Denominator for bonus percentages.
pub const PERCENT_DENOMINATOR: u128 = 100;

/// Monthly partner-spend tiers, highest first.
///
/// | Spend (tokens) | Bonus |
/// |----------------|-------|
/// | ≥ 10 000       | 10 %  |
/// | ≥ 5 000        | 7 %   |
/// | ≥ 1 000        | 5 %   |
/// | ≥ 1            | 2 %   |
///
/// Lower bounds are inclusive.
pub const BONUS_TIERS: [(u128, u32); 4] = [
    (10_000 * ONE_TOKEN, 10),
    (5_000 * ONE_TOKEN, 7),
    (1_000 * ONE_TOKEN, 5),
    (ONE_TOKEN, 2),
];

/// Reward credit earned by the sender of a transfer: `floor(amount / 100)`.
pub fn transfer_reward(amount: u128) -> u128 {
    amount / TRANSFER_REWARD_DIVISOR
}

/// Bonus percentage unlocked by `monthly_spend`; 0 below the lowest tier.
pub fn bonus_percentage(monthly_spend: u128) -> u32 {
    BONUS_TIERS
        .iter()
        .find(|(threshold, _)| monthly_spend >= *threshold)
        .map(|(_, percent)| *percent)
        .unwrap_or(0)
}

/// `floor(accrued * percent / 100)`, `None` on overflow.
pub fn bonus_amount(accrued: u128, percent: u32) -> Option<u128> {
    accrued
        .checked_mul(u128::from(percent))
        .map(|scaled| scaled / PERCENT_DENOMINATOR)
}
