//! Bounds for amounts in cents.

use crate::{CrmError, CrmResult};

/// Largest amount accepted on any input: one hundred billion reais.
pub const MAX_MONEY_CENTS: i64 = 10_000_000_000_000;

/// Reject amounts whose magnitude exceeds [`MAX_MONEY_CENTS`].
pub fn bounded(field: &'static str, cents: i64) -> CrmResult<i64> {
    if cents.unsigned_abs() > MAX_MONEY_CENTS.unsigned_abs() {
        return Err(CrmError::invalid(field, "exceeds the maximum amount"));
    }
    Ok(cents)
}

/// Add `cents` to a running total, failing instead of wrapping.
pub fn add(field: &'static str, total: i64, cents: i64) -> CrmResult<i64> {
    total
        .checked_add(cents)
        .ok_or(CrmError::TotalOutOfRange { field })
}

/// Checked sum of an iterator of amounts.
pub fn sum<I>(field: &'static str, amounts: I) -> CrmResult<i64>
where
    I: IntoIterator<Item = i64>,
{
    amounts
        .into_iter()
        .try_fold(0_i64, |total, cents| add(field, total, cents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_symmetric() {
        assert_eq!(bounded("value", MAX_MONEY_CENTS), Ok(MAX_MONEY_CENTS));
        assert_eq!(bounded("value", -MAX_MONEY_CENTS), Ok(-MAX_MONEY_CENTS));
        assert!(bounded("value", MAX_MONEY_CENTS + 1).is_err());
        assert!(bounded("value", i64::MIN).is_err());
    }

    #[test]
    fn sums_fail_instead_of_wrapping() {
        assert_eq!(sum("total", [1, 2, 3]), Ok(6));
        assert_eq!(
            sum("total", [i64::MAX, 1]),
            Err(CrmError::TotalOutOfRange { field: "total" })
        );
        assert!(add("total", i64::MIN, -1).is_err());
    }
}
