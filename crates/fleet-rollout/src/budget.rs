//! Resolves `maxUnavailable`/`maxSurge` (each an int or a percent of a declared target N) into a
//! concrete headroom count for one rollout cycle.

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use snafu::{ensure, Snafu};

#[derive(Debug, Snafu)]
pub enum BudgetError {
    #[snafu(display("budget value {value:?} does not parse as an integer or a percentage"))]
    InvalidFormat { value: String },

    #[snafu(display("budget value {value} is negative"))]
    Negative { value: i64 },
}

/// Resolves `maxUnavailable`: rounds a percentage down, matching the convention that the
/// unavailable count can never exceed what was declared.
pub fn unavailable_budget(value: &IntOrString, target: u32) -> Result<i64, BudgetError> {
    resolve(value, target, RoundDirection::Down)
}

/// Resolves `maxSurge`: rounds a percentage up, matching the convention that surge headroom is
/// generous rather than stingy.
pub fn surge_budget(value: &IntOrString, target: u32) -> Result<i64, BudgetError> {
    resolve(value, target, RoundDirection::Up)
}

/// Resolves a `DisruptionBudget`'s `minAvailable`: rounds a percentage up, since a minimum
/// guarantee must not be relaxed by rounding it down.
pub fn min_available_floor(value: &IntOrString, target: u32) -> Result<i64, BudgetError> {
    resolve(value, target, RoundDirection::Up)
}

enum RoundDirection {
    Up,
    Down,
}

fn resolve(value: &IntOrString, target: u32, direction: RoundDirection) -> Result<i64, BudgetError> {
    let resolved = match value {
        IntOrString::Int(i) => i64::from(*i),
        IntOrString::String(s) => {
            let percent_str = s.strip_suffix('%').context_invalid(s)?;
            let percent: f64 = percent_str.parse().ok().context_invalid(s)?;

            let scaled = percent / 100.0 * f64::from(target);
            match direction {
                RoundDirection::Up => scaled.ceil() as i64,
                RoundDirection::Down => scaled.floor() as i64,
            }
        }
    };

    ensure!(resolved >= 0, NegativeSnafu { value: resolved });
    Ok(resolved)
}

trait OptionExt<T> {
    fn context_invalid(self, value: &str) -> Result<T, BudgetError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context_invalid(self, value: &str) -> Result<T, BudgetError> {
        self.ok_or_else(|| BudgetError::InvalidFormat {
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(IntOrString::Int(3), 10, 3)]
    #[case(IntOrString::String("25%".to_string()), 10, 2)]
    #[case(IntOrString::String("33%".to_string()), 10, 3)]
    fn unavailable_rounds_down(#[case] value: IntOrString, #[case] target: u32, #[case] expected: i64) {
        assert_eq!(unavailable_budget(&value, target).unwrap(), expected);
    }

    #[rstest]
    #[case(IntOrString::Int(3), 10, 3)]
    #[case(IntOrString::String("25%".to_string()), 10, 3)]
    #[case(IntOrString::String("21%".to_string()), 10, 3)]
    fn surge_rounds_up(#[case] value: IntOrString, #[case] target: u32, #[case] expected: i64) {
        assert_eq!(surge_budget(&value, target).unwrap(), expected);
    }

    #[test]
    fn rejects_malformed_percentage() {
        let err = unavailable_budget(&IntOrString::String("abc%".to_string()), 10).unwrap_err();
        assert!(matches!(err, BudgetError::InvalidFormat { .. }));
    }

    #[test]
    fn rejects_negative_int() {
        let err = unavailable_budget(&IntOrString::Int(-1), 10).unwrap_err();
        assert!(matches!(err, BudgetError::Negative { .. }));
    }

    #[test]
    fn zero_target_resolves_percent_to_zero() {
        assert_eq!(
            unavailable_budget(&IntOrString::String("25%".to_string()), 0).unwrap(),
            0
        );
    }
}
