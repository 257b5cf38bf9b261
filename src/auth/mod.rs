use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Claims carried by the identity provider's session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub azp: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid JWT verification key: {0}")]
    InvalidKey(String),

    #[error("Invalid publishable key")]
    InvalidPublishableKey,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Token issued for unauthorized party: {0}")]
    UnauthorizedParty(String),
}

/// Networkless session-token verification against a configured PEM key
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
    authorized_parties: Vec<String>,
}

impl SessionVerifier {
    /// `Ok(None)` when no verification key is configured
    pub fn from_config(config: &SecurityConfig) -> Result<Option<Self>, AuthError> {
        let Some(pem) = config.jwt_key.as_deref() else {
            return Ok(None);
        };

        let key = DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = config.clock_skew_secs;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        if let Some(publishable_key) = config.publishable_key.as_deref() {
            let issuer = issuer_from_publishable_key(publishable_key)?;
            validation.set_issuer(&[issuer]);
        }

        Ok(Some(Self {
            key,
            validation,
            authorized_parties: config.authorized_parties.clone(),
        }))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let claims = token_data.claims;

        if !self.authorized_parties.is_empty() {
            let azp = claims.azp.as_deref().unwrap_or_default();
            if !self.authorized_parties.iter().any(|party| party == azp) {
                return Err(AuthError::UnauthorizedParty(azp.to_string()));
            }
        }

        Ok(claims)
    }
}

/// Publishable keys are `pk_(test|live)_` + base64("<frontend api host>$").
/// The frontend API host is the session token issuer.
pub fn issuer_from_publishable_key(key: &str) -> Result<String, AuthError> {
    let encoded = key
        .strip_prefix("pk_test_")
        .or_else(|| key.strip_prefix("pk_live_"))
        .ok_or(AuthError::InvalidPublishableKey)?;

    let decoded = STANDARD_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|_| AuthError::InvalidPublishableKey)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::InvalidPublishableKey)?;

    let host = decoded
        .strip_suffix('$')
        .filter(|host| !host.is_empty())
        .ok_or(AuthError::InvalidPublishableKey)?;

    Ok(format!("https://{}", host))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn decodes_issuer_from_publishable_key() {
        assert_eq!(
            issuer_from_publishable_key("pk_test_Y2xlcmsuZXhhbXBsZS50ZXN0JA==").unwrap(),
            "https://clerk.example.test"
        );
        // Unpadded form
        assert_eq!(
            issuer_from_publishable_key("pk_live_Y2xlcmsuZXhhbXBsZS50ZXN0JA").unwrap(),
            "https://clerk.example.test"
        );
    }

    #[test]
    fn rejects_malformed_publishable_keys() {
        assert!(issuer_from_publishable_key("sk_test_abc").is_err());
        assert!(issuer_from_publishable_key("pk_test_!!!").is_err());
        // base64("no-dollar")
        assert!(issuer_from_publishable_key("pk_test_bm8tZG9sbGFy").is_err());
    }

    #[test]
    fn verifier_is_absent_without_key() {
        let config = AppConfig::development().security;
        assert!(SessionVerifier::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn rejects_garbage_key() {
        let mut config = AppConfig::development().security;
        config.jwt_key = Some("not a pem".to_string());
        assert!(matches!(
            SessionVerifier::from_config(&config),
            Err(AuthError::InvalidKey(_))
        ));
    }
}
