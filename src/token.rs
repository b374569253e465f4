//! Manage json web tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::role::Role;

/// Access token lifetime, in seconds.
pub const ACCESS_EXPIRATION: u64 = 60 * 30; // 30 minutes.
/// Refresh token lifetime, in seconds.
pub const REFRESH_EXPIRATION: u64 = 60 * 60 * 24 * 7; // 7 days.

/// Whether a token grants API access or only a new pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the JWT was issued.
    pub iat: u64,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// User ID.
    pub sub: String,
    /// Role of the user at issuance time.
    pub role: Role,
    /// Access or refresh token.
    pub kind: TokenKind,
}

/// Manage JWT tokens.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(issuer: &str, secret: &str) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_owned(),
        }
    }

    fn create(
        &self,
        user_id: &str,
        role: Role,
        kind: TokenKind,
        lifetime: u64,
    ) -> Result<String> {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| ServerError::Internal {
                details: format!("system clock before epoch: {err}"),
            })?
            .as_secs();
        let header = Header::new(self.algorithm);
        let claims = Claims {
            exp: time + lifetime,
            iat: time,
            iss: self.issuer.clone(),
            sub: user_id.to_owned(),
            role,
            kind,
        };

        encode(&header, &claims, &self.encoding_key).map_err(|err| {
            ServerError::Internal {
                details: format!("cannot sign token: {err}"),
            }
        })
    }

    /// Create a short-lived access token.
    pub fn create_access(&self, user_id: &str, role: Role) -> Result<String> {
        self.create(user_id, role, TokenKind::Access, ACCESS_EXPIRATION)
    }

    /// Create a refresh token, used only to get a new pair.
    pub fn create_refresh(&self, user_id: &str, role: Role) -> Result<String> {
        self.create(user_id, role, TokenKind::Refresh, REFRESH_EXPIRATION)
    }

    /// Decode and check a token.
    ///
    /// Expired tokens surface as [`ServerError::TokenExpired`], everything
    /// else that fails as [`ServerError::TokenInvalid`].
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(self.algorithm);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => match err.kind() {
                ErrorKind::ExpiredSignature => Err(ServerError::TokenExpired),
                _ => Err(ServerError::TokenInvalid),
            },
        }
    }
}
