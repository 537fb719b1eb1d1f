//! Bootstrap — first-start checks.
//!
//! When centrod starts:
//! 1. Verify the config has a root password hash — if not, refuse to start.
//! 2. Verify the JWT secret and data dir are set.

use crate::config::ServerConfig;

/// The well-known role carried by the superadmin's token.
pub const ROOT_ROLE_ID: &str = "root";

/// Verify server configuration is ready for production use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.root.password_hash.is_empty() {
        anyhow::bail!(
            "No root password hash found in configuration.\n\
             Run `centro context create <name>` to set up the server first."
        );
    }
    if config.jwt.secret.is_empty() {
        anyhow::bail!("JWT secret is empty in configuration.");
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    Ok(())
}

/// Verify a root login attempt against the stored argon2id hash.
pub fn verify_root_password(password: &str, hash: &str) -> bool {
    use argon2::Argon2;
    use password_hash::PasswordHash;
    use password_hash::PasswordVerifier;

    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JwtConfig, RootConfig, StorageConfig};

    fn config_with_hash(hash: &str) -> ServerConfig {
        ServerConfig {
            root: RootConfig {
                password_hash: hash.to_string(),
            },
            storage: StorageConfig {
                data_dir: "/tmp".to_string(),
            },
            jwt: JwtConfig {
                secret: "test".to_string(),
                expire_secs: 3600,
            },
            outbound: Default::default(),
            workers: Default::default(),
        }
    }

    #[test]
    fn test_verify_config_empty_hash() {
        assert!(verify_config(&config_with_hash("")).is_err());
        assert!(verify_config(&config_with_hash("$argon2id$x")).is_ok());
    }

    #[test]
    fn test_verify_root_password_invalid_hash() {
        assert!(!verify_root_password("test", "not-a-hash"));
    }

    #[test]
    fn test_verify_root_password_roundtrip() {
        use argon2::Argon2;
        use password_hash::rand_core::OsRng;
        use password_hash::{PasswordHasher, SaltString};

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(b"s3cret", &salt)
            .unwrap()
            .to_string();

        assert!(verify_root_password("s3cret", &hash));
        assert!(!verify_root_password("wrong", &hash));
    }
}
