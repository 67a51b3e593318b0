//! Argon2id passphrase key derivation for secrets at rest.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{CryptoError, Result};

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes.
pub const OUTPUT_LEN: usize = 32;

/// Largest accepted memory cost, in KiB (256 MiB).
pub const MAX_M_COST: u32 = 262_144;

/// Largest accepted iteration count.
pub const MAX_T_COST: u32 = 16;

/// Largest accepted parallelism.
pub const MAX_P_COST: u32 = 16;

/// Argon2id cost parameters. Stored next to every sealed secret so a reload
/// derives the key with the parameters that sealed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Iterations.
    pub t_cost: u32,
    /// Parallelism lanes.
    pub p_cost: u32,
}

impl Default for KdfParams {
    /// m=19 MiB, t=2, p=1.
    fn default() -> Self {
        Self {
            m_cost: 19_456,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

impl KdfParams {
    /// Smallest parameters Argon2 accepts. Only for tests.
    pub const fn insecure_fast() -> Self {
        Self {
            m_cost: 8,
            t_cost: 1,
            p_cost: 1,
        }
    }

    /// Reject costs above [`MAX_M_COST`], [`MAX_T_COST`] or [`MAX_P_COST`].
    ///
    /// Parameters read back from storage must pass this before any memory is
    /// allocated for them.
    pub fn check_limits(&self) -> Result<()> {
        let limits = [
            ("m_cost", self.m_cost, MAX_M_COST),
            ("t_cost", self.t_cost, MAX_T_COST),
            ("p_cost", self.p_cost, MAX_P_COST),
        ];
        for (name, value, max) in limits {
            if value > max {
                return Err(CryptoError::Argon2(format!(
                    "{name} {value} exceeds limit {max}"
                )));
            }
        }
        Ok(())
    }
}

/// Random salt from the OS CSPRNG.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 32-byte key from `passphrase` and `salt`.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    params: KdfParams,
) -> Result<Zeroizing<[u8; OUTPUT_LEN]>> {
    params.check_limits()?;
    let argon_params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(OUTPUT_LEN))
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut output = Zeroizing::new([0u8; OUTPUT_LEN]);
    argon2
        .hash_password_into(passphrase, salt, &mut output[..])
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let salt = [9u8; SALT_LEN];
        let a = derive_key(b"hunter2", &salt, KdfParams::insecure_fast()).expect("derive");
        let b = derive_key(b"hunter2", &salt, KdfParams::insecure_fast()).expect("derive");
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_salt_and_passphrase_matter() {
        let params = KdfParams::insecure_fast();
        let base = derive_key(b"hunter2", &[1u8; SALT_LEN], params).expect("derive");
        let other_salt = derive_key(b"hunter2", &[2u8; SALT_LEN], params).expect("derive");
        let other_pass = derive_key(b"hunter3", &[1u8; SALT_LEN], params).expect("derive");
        assert_ne!(*base, *other_salt);
        assert_ne!(*base, *other_pass);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = KdfParams {
            m_cost: 1,
            t_cost: 1,
            p_cost: 1,
        };
        assert!(matches!(
            derive_key(b"pw", &[0u8; SALT_LEN], params),
            Err(CryptoError::Argon2(_))
        ));
    }

    #[test]
    fn test_default_params() {
        let params = KdfParams::default();
        assert_eq!(params.m_cost, 19_456);
        assert_eq!(params.t_cost, 2);
        assert!(params.check_limits().is_ok());
    }

    #[test]
    fn test_oversized_costs_rejected_before_hashing() {
        let huge_memory = KdfParams {
            m_cost: 0x0FFF_FFFF,
            ..KdfParams::insecure_fast()
        };
        let err = derive_key(b"pw", &[0u8; SALT_LEN], huge_memory).expect_err("must fail");
        assert!(err.to_string().contains("m_cost"));

        let many_passes = KdfParams {
            t_cost: MAX_T_COST + 1,
            ..KdfParams::insecure_fast()
        };
        assert!(matches!(many_passes.check_limits(), Err(CryptoError::Argon2(_))));

        let at_limit = KdfParams {
            m_cost: MAX_M_COST,
            t_cost: MAX_T_COST,
            p_cost: MAX_P_COST,
        };
        assert!(at_limit.check_limits().is_ok());
    }
}
