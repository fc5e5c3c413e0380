use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use super::{IdentityResolver, ResolveError};
use crate::config::ConfigError;
use crate::identity::Claims;

/// Verifies tokens against one fixed key.
///
/// - Key material is intentionally not printable via Debug.
/// - `aud` is not checked: Cognito access tokens carry `client_id` instead.
#[derive(Clone)]
pub struct StaticKeyResolver {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for StaticKeyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("StaticKeyResolver")
            .field("validation", &self.validation)
            .finish()
    }
}

impl StaticKeyResolver {
    pub fn new(
        decoding_key: DecodingKey,
        algorithm: Algorithm,
        issuer: Option<&str>,
        leeway_seconds: u64,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        validation.validate_aud = false;
        validation.leeway = leeway_seconds;

        Self {
            decoding_key,
            validation,
        }
    }

    /// RS256 verifier from a PEM-encoded RSA public key.
    pub fn from_rsa_pem(
        public_key_pem: &str,
        issuer: Option<&str>,
        leeway_seconds: u64,
    ) -> Result<Self, ConfigError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|_| ConfigError::Invalid("rsa public key pem"))?;

        Ok(Self::new(
            decoding_key,
            Algorithm::RS256,
            issuer,
            leeway_seconds,
        ))
    }
}

#[async_trait]
impl IdentityResolver for StaticKeyResolver {
    async fn resolve(&self, token: &str) -> Result<Claims, ResolveError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}
