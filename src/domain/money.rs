//! Points, shares and the fixed economic constants of the market.
//!
//! Points are whole integers held in user balances. Shares are decimals: one
//! point spent always buys exactly one share, but pool arithmetic (odds,
//! proportional payouts, average entry prices) needs fractional precision.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::MarketError;

/// Whole-point amount held in balances and paid out.
pub type Points = i64;

/// Share quantity held in positions.
pub type Shares = Decimal;

/// Flat bonus added to every winning payout.
pub const WINNER_BONUS: Points = 50;

/// Balance granted to newly registered users unless configured otherwise.
pub const DEFAULT_STARTING_BALANCE: Points = 1000;

/// Largest balance an admin may set, leaving headroom for payouts.
pub const MAX_BALANCE: Points = 1_000_000_000_000;

/// Positions whose share count falls below this are deleted.
pub const DUST_SHARES: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Decimal places kept on odds percentages.
pub const ODDS_DECIMALS: u32 = 2;

/// Round a percentage to hundredths, half away from zero.
#[must_use]
pub fn round_odds(pct: Decimal) -> Decimal {
    pct.round_dp_with_strategy(ODDS_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a share-denominated amount to whole points, half away from zero.
///
/// # Errors
/// Returns [`MarketError::InvalidAmount`] if the value does not fit in `i64`.
pub fn round_points(value: Decimal) -> Result<Points, MarketError> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(MarketError::InvalidAmount)
}

/// Truncate a share amount to whole points (used for admin deletion refunds).
///
/// # Errors
/// Returns [`MarketError::InvalidAmount`] if the value does not fit in `i64`.
pub fn truncate_points(value: Decimal) -> Result<Points, MarketError> {
    value.trunc().to_i64().ok_or(MarketError::InvalidAmount)
}

/// Points returned to a seller for `shares` whole shares.
///
/// Sellers receive half of face value, floored, with a floor of one point.
/// The other half stays behind and is never credited to anyone.
///
/// # Errors
/// Returns [`MarketError::InvalidAmount`] if the share count does not fit in `i64`.
pub fn sell_proceeds(shares: Shares) -> Result<Points, MarketError> {
    let face = shares.floor().to_i64().ok_or(MarketError::InvalidAmount)?;
    Ok((face / 2).max(1))
}

/// A winner's proportional slice of the pool, before the flat bonus.
///
/// # Errors
/// Returns [`MarketError::InvalidAmount`] on overflow or if `winning_shares` is zero.
pub fn pool_share(
    total_pool: Shares,
    shares: Shares,
    winning_shares: Shares,
) -> Result<Points, MarketError> {
    let fraction = shares
        .checked_div(winning_shares)
        .ok_or(MarketError::InvalidAmount)?;
    let value = total_pool
        .checked_mul(fraction)
        .ok_or(MarketError::InvalidAmount)?;
    round_points(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn odds_round_half_away_from_zero() {
        assert_eq!(round_odds(dec!(33.335)), dec!(33.34));
        assert_eq!(round_odds(dec!(33.334)), dec!(33.33));
        assert_eq!(round_odds(dec!(12.125)), dec!(12.13));
    }

    #[test]
    fn points_round_half_away_from_zero() {
        assert_eq!(round_points(dec!(2.5)).unwrap(), 3);
        assert_eq!(round_points(dec!(3.5)).unwrap(), 4);
        assert_eq!(round_points(dec!(2.49)).unwrap(), 2);
    }

    #[test]
    fn sell_returns_half_floored() {
        assert_eq!(sell_proceeds(dec!(100)).unwrap(), 50);
        assert_eq!(sell_proceeds(dec!(7)).unwrap(), 3);
    }

    #[test]
    fn sell_of_one_share_returns_one_point() {
        assert_eq!(sell_proceeds(dec!(1)).unwrap(), 1);
    }

    #[test]
    fn pool_share_splits_proportionally() {
        // Pool 300, winners hold 100 and 50 of 150 winning shares.
        assert_eq!(pool_share(dec!(300), dec!(100), dec!(150)).unwrap(), 200);
        assert_eq!(pool_share(dec!(300), dec!(50), dec!(150)).unwrap(), 100);
    }

    #[test]
    fn pool_share_rejects_zero_winning_shares() {
        assert!(pool_share(dec!(100), dec!(10), Decimal::ZERO).is_err());
    }

    #[test]
    fn dust_threshold_is_one_thousandth() {
        assert_eq!(DUST_SHARES, dec!(0.001));
    }

    #[test]
    fn truncation_drops_fraction() {
        assert_eq!(truncate_points(dec!(9.99)).unwrap(), 9);
    }
}
