//! Reward and rate calculation.
//!
//! Rates are kept as an exact count of hundredths of a percent, so the fixed
//! mode identity `APY = bps / 100` holds without rounding.

use core::fmt;

use stakeflow_interface::{Project, RateMode, Stake};

/// Seconds in a 365-day year.
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// A percentage with two decimal places, stored as hundredths of a percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percent(u128);

impl Percent {
    /// Zero percent.
    pub const ZERO: Self = Self(0);

    /// From hundredths of a percent (basis points).
    pub const fn from_hundredths(hundredths: u128) -> Self {
        Self(hundredths)
    }

    /// Hundredths of a percent.
    pub const fn hundredths(self) -> u128 {
        self.0
    }

    /// Value in percent, for display math.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// Fixed-mode APY: `rate_bps_per_year / 100` percent.
pub fn fixed_apy(rate_bps_per_year: u64) -> Percent {
    Percent::from_hundredths(u128::from(rate_bps_per_year))
}

/// Variable-mode APR:
/// `floor(reward_rate_per_second * SECONDS_PER_YEAR * 10000 / total_staked) / 100`.
///
/// Zero when nothing is staked or nothing is emitted.
pub fn variable_apr(reward_rate_per_second: u64, total_staked: u64) -> Percent {
    if total_staked == 0 || reward_rate_per_second == 0 {
        return Percent::ZERO;
    }
    // u64 * 31_536_000 * 10_000 stays well inside u128.
    let yearly = u128::from(reward_rate_per_second) * u128::from(SECONDS_PER_YEAR) * 10_000;
    Percent::from_hundredths(yearly / u128::from(total_staked))
}

/// Rate of a pool with the label matching its mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolRate {
    /// Mode the rate was computed in
    pub mode: RateMode,
    /// The rate
    pub rate: Percent,
}

impl PoolRate {
    /// "APY" for fixed pools, "APR" for variable ones.
    pub fn label(&self) -> &'static str {
        match self.mode {
            RateMode::Fixed => "APY",
            RateMode::Variable => "APR",
        }
    }
}

impl fmt::Display for PoolRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.rate, self.label())
    }
}

/// Current rate of a project.
pub fn pool_rate(project: &Project) -> PoolRate {
    let rate = match project.rate_mode {
        RateMode::Fixed => fixed_apy(project.rate_bps_per_year),
        RateMode::Variable => variable_apr(project.reward_rate_per_second, project.total_staked),
    };
    PoolRate {
        mode: project.rate_mode,
        rate,
    }
}

/// Raw token units to human units.
pub fn to_ui_amount(raw: u64, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(i32::from(decimals))
}

/// Pending rewards of a stake in human units.
pub fn pending_rewards_ui(stake: &Stake, decimals: u8) -> f64 {
    to_ui_amount(stake.pending_rewards, decimals)
}

/// Seconds until the stake's lockup ends, 0 once it has.
///
/// `lockup_seconds` is the project's [`Project::lockup_seconds`].
pub fn lockup_remaining(stake: &Stake, lockup_seconds: i64, now: i64) -> i64 {
    stake
        .stake_timestamp
        .saturating_add(lockup_seconds)
        .saturating_sub(now)
        .max(0)
}

/// Unix time the pool ends, `None` for open-ended pools.
pub fn pool_end_time(project: &Project) -> Option<i64> {
    (project.pool_duration_seconds > 0)
        .then(|| project.start_time.saturating_add(project.pool_duration_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::pubkey::Pubkey;
    use test_case::test_case;

    #[test_case(1000, "10.00%" ; "ten percent")]
    #[test_case(0, "0.00%" ; "zero")]
    #[test_case(1, "0.01%" ; "one bps")]
    #[test_case(12_345, "123.45%" ; "fractional")]
    fn test_fixed_apy(bps: u64, expected: &str) {
        let apy = fixed_apy(bps);
        assert_eq!(apy.hundredths(), u128::from(bps));
        assert_eq!(apy.to_string(), expected);
    }

    #[test_case(0, 500_000 ; "no emission")]
    #[test_case(10, 0 ; "nothing staked")]
    #[test_case(0, 0 ; "both zero")]
    fn test_variable_apr_zero_guard(rate: u64, staked: u64) {
        assert_eq!(variable_apr(rate, staked), Percent::ZERO);
        assert_eq!(variable_apr(rate, staked).to_string(), "0.00%");
    }

    #[test]
    fn test_variable_apr_formula() {
        // 1 unit/s over 31_536_000 staked is exactly 100%
        assert_eq!(variable_apr(1, SECONDS_PER_YEAR).to_string(), "100.00%");
        // floor, not round
        let apr = variable_apr(1, 3 * SECONDS_PER_YEAR);
        assert_eq!(apr.hundredths(), 3333);
    }

    #[test]
    fn test_variable_apr_extremes_do_not_overflow() {
        let apr = variable_apr(u64::MAX, 1);
        assert_eq!(
            apr.hundredths(),
            u128::from(u64::MAX) * u128::from(SECONDS_PER_YEAR) * 10_000
        );
    }

    #[test_case(1_000, 3_600, 1_100, 3_500 ; "inside lockup")]
    #[test_case(1_000, 3_600, 4_600, 0 ; "exactly expired")]
    #[test_case(1_000, 3_600, 9_999, 0 ; "long expired")]
    #[test_case(1_000, 0, 1_000, 0 ; "no lockup")]
    fn test_lockup_remaining(staked_at: i64, lockup: i64, now: i64, expected: i64) {
        let stake = Stake {
            owner: Pubkey::new_unique(),
            project: Pubkey::new_unique(),
            withdrawal_wallet: Pubkey::new_unique(),
            amount: 1_000,
            stake_timestamp: staked_at,
            pending_rewards: 0,
            pending_reflections: 0,
            total_claimed: 0,
            bump: 255,
        };
        assert_eq!(lockup_remaining(&stake, lockup, now), expected);
    }

    #[test]
    fn test_ui_amount() {
        assert_eq!(to_ui_amount(1_500_000, 6), 1.5);
        assert_eq!(to_ui_amount(42, 0), 42.0);
    }
}
