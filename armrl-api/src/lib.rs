// builders + test utilities for wiring a DDPG run together
pub mod builders;

#[cfg(feature = "test-utils")]
pub mod test_utils;
