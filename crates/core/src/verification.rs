//! Contact-method verification constants and code generation.

use std::time::Duration;

use rand::Rng;

/// Minimum interval between test or verification sends on a single contact
/// method. Both send paths share the same window.
pub const MIN_TIME_BETWEEN_TESTS: Duration = Duration::from_secs(60);

/// How long a verification code stays valid after (re)issue.
pub const CODE_TTL: Duration = Duration::from_secs(15 * 60);

/// Inclusive lower bound of a verification code.
pub const CODE_MIN: i32 = 100_000;

/// Inclusive upper bound of a verification code.
pub const CODE_MAX: i32 = 999_999;

/// Draw a uniformly random 6-digit verification code.
///
/// The RNG does not need to be cryptographic: codes must be unpredictable
/// to the verifying user, not to an attacker holding historical codes. The
/// store seeds a process-wide non-cryptographic generator from OS entropy
/// at construction.
pub fn random_code<R: Rng>(rng: &mut R) -> i32 {
    rng.random_range(CODE_MIN..=CODE_MAX)
}
