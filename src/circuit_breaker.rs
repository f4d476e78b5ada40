use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::time::Duration;

/// Circuit breaker guarding calls to the external search API.
pub type SearchCircuitBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Creates the circuit breaker for external search calls.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures triggers OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// While OPEN every call is rejected without touching the network; callers
/// report the rejection as an upstream error. There is no retry.
///
/// # Returns
///
/// * `SearchCircuitBreaker` - The configured circuit breaker instance. Clones share state.
pub fn create_search_circuit_breaker() -> SearchCircuitBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
