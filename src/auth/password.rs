use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    /// Verified against when an identifier matches no user, so the miss path
    /// costs the same argon2 work as a wrong password.
    static ref DUMMY_HASH: String =
        hash_password("edugate-timing-equalizer").expect("argon2 default params hash");
}

/// Computes the dummy hash up front so the first unknown-identifier login
/// does not pay for an extra hash.
pub fn warm_up() {
    lazy_static::initialize(&DUMMY_HASH);
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Digest comparison inside argon2 is constant-time.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Verifies against `hash`, or against the dummy hash when there is none.
/// Returns false whenever `hash` is `None`.
pub fn verify_password_or_dummy(plain: &str, hash: Option<&str>) -> anyhow::Result<bool> {
    match hash {
        Some(h) => verify_password(plain, h),
        None => {
            verify_password(plain, &DUMMY_HASH)?;
            Ok(false)
        }
    }
}
