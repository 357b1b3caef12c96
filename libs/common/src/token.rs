//! Opaque random token generation

use rand::{Rng, distributions::Alphanumeric};

/// Length of every opaque bearer token issued by the services
pub const TOKEN_LENGTH: usize = 48;

/// Generate a fresh opaque token from the thread-local CSPRNG
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
