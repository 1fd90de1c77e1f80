//! Argon2 password hashing.

use argon2::{
  Algorithm, Argon2, Params, Version,
  password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand_core::OsRng;

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
  pub memory_kib:  u32,
  pub iterations:  u32,
  pub parallelism: u32,
}

impl Argon2Params {
  fn to_argon2(self) -> Result<Argon2<'static>, argon2::Error> {
    let params =
      Params::new(self.memory_kib, self.iterations, self.parallelism, None)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
  }

  /// Cheap parameters for tests and demo seeding. Never use in production.
  pub fn insecure_fast() -> Self {
    Self { memory_kib: 1024, iterations: 1, parallelism: 1 }
  }
}

impl Default for Argon2Params {
  /// Argon2id with the RFC 9106 second recommended option.
  fn default() -> Self {
    Self { memory_kib: 19456, iterations: 2, parallelism: 1 }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
  #[error("argon2 parameters: {0}")]
  Params(argon2::Error),
  #[error("password hashing: {0}")]
  Hash(argon2::password_hash::Error),
}

impl From<argon2::Error> for PasswordError {
  fn from(e: argon2::Error) -> Self { Self::Params(e) }
}

impl From<argon2::password_hash::Error> for PasswordError {
  fn from(e: argon2::password_hash::Error) -> Self { Self::Hash(e) }
}

/// Hash `password` into a PHC string with the given cost parameters.
pub fn hash_password_with_params(
  password: &str,
  params: Argon2Params,
) -> Result<String, PasswordError> {
  let salt = SaltString::generate(&mut OsRng);
  let hash = params
    .to_argon2()?
    .hash_password(password.as_bytes(), &salt)?
    .to_string();
  Ok(hash)
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
  hash_password_with_params(password, Argon2Params::default())
}

/// Check `password` against a stored PHC string. The parameters embedded in
/// the hash are used; an unparsable hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}
