//! Resolves a stage's `maxConcurrency` (an int or a percent of the stage's cluster count) into a
//! concrete cap on simultaneously-updating clusters.

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use snafu::{ensure, Snafu};

#[derive(Debug, Snafu)]
pub enum ConcurrencyError {
    #[snafu(display("maxConcurrency value {value:?} does not parse as an integer or a percentage"))]
    InvalidFormat { value: String },

    #[snafu(display("maxConcurrency value {value} is negative"))]
    Negative { value: i64 },
}

/// Rounds a percentage down, matching `maxUnavailable`'s convention: a concurrency cap should
/// never permit more simultaneous updates than declared.
pub fn resolve(value: &IntOrString, stage_size: u32) -> Result<i64, ConcurrencyError> {
    let resolved = match value {
        IntOrString::Int(i) => i64::from(*i),
        IntOrString::String(s) => {
            let percent_str = s
                .strip_suffix('%')
                .ok_or_else(|| ConcurrencyError::InvalidFormat { value: s.clone() })?;
            let percent: f64 = percent_str
                .parse()
                .map_err(|_| ConcurrencyError::InvalidFormat { value: s.clone() })?;
            (percent / 100.0 * f64::from(stage_size)).floor() as i64
        }
    };

    ensure!(resolved >= 0, NegativeSnafu { value: resolved });
    Ok(resolved)
}
