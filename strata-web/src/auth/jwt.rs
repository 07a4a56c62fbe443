//! Bearer token validation
//!
//! Tokens are RS256-signed by the external identity provider and verified
//! against the cached signing keys. The claim set carries the well-known
//! identity attributes plus the serialized permission tree.

use super::keys::Jwk;
use super::AuthError;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use strata_core::SecurityAccess;
use tracing::{debug, warn};

/// Validation parameters for incoming tokens.
#[derive(Debug, Clone)]
pub struct TokenValidationConfig {
    pub audience: String,
    pub issuer: String,
}

/// Claims extracted from a validated bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal id)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    /// Serialized permission tree, when the token already carries one
    #[serde(rename = "SecurityAccess", default)]
    pub security_access: Option<String>,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    /// Parse the embedded permission tree, if the claim is present and
    /// well-formed. A malformed claim is treated as absent, matching the
    /// lenient handling of missing claims elsewhere.
    pub fn security_access(&self) -> Option<SecurityAccess> {
        let raw = self.security_access.as_deref()?;
        if raw.trim().is_empty() {
            return None;
        }
        match serde_json::from_str(raw) {
            Ok(access) => Some(access),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed SecurityAccess claim");
                None
            }
        }
    }
}

/// Verify a bearer token against the given signing keys.
///
/// Keys are tried in order; when the token names a key id only matching
/// keys are attempted. Audience, issuer and expiry are all enforced.
pub fn verify_token(
    token: &str,
    keys: &[Jwk],
    config: &TokenValidationConfig,
) -> Result<Claims, AuthError> {
    let header = decode_header(token).map_err(|e| {
        debug!(error = %e, "Unparseable token header");
        AuthError::InvalidToken
    })?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[&config.audience]);
    validation.set_issuer(&[&config.issuer]);

    let candidates = keys.iter().filter(|key| match (&header.kid, &key.kid) {
        (Some(wanted), Some(kid)) => wanted == kid,
        _ => true,
    });

    let mut last_error = AuthError::InvalidToken;
    for key in candidates {
        let decoding_key = match DecodingKey::from_rsa_components(&key.n, &key.e) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, kid = ?key.kid, "Unusable signing key");
                continue;
            }
        };

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(data) => return Ok(data.claims),
            Err(e) => {
                debug!(error = %e, kid = ?key.kid, "Token rejected by key");
                last_error = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                };
            }
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{AccessLevel, AccessRule};

    fn claims_with_access(raw: Option<&str>) -> Claims {
        Claims {
            sub: "user-1".to_string(),
            email: Some("dev@example.com".to_string()),
            name: None,
            given_name: None,
            family_name: None,
            picture: None,
            security_access: raw.map(str::to_string),
            exp: 0,
        }
    }

    #[test]
    fn embedded_tree_round_trips_through_the_claim() {
        let mut access = SecurityAccess::new();
        access.add_rule(&AccessRule {
            project: "acme".to_string(),
            application: "billing".to_string(),
            cluster: "prod".to_string(),
            access: AccessLevel::WRITE,
        });

        let raw = serde_json::to_string(&access).unwrap();
        let claims = claims_with_access(Some(&raw));

        assert_eq!(claims.security_access(), Some(access));
    }

    #[test]
    fn missing_blank_or_malformed_claims_yield_no_tree() {
        assert_eq!(claims_with_access(None).security_access(), None);
        assert_eq!(claims_with_access(Some("  ")).security_access(), None);
        assert_eq!(claims_with_access(Some("not json")).security_access(), None);
    }
}
