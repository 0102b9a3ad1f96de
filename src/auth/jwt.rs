//! JWT codec for storefront access and refresh tokens.
//!
//! Both kinds carry the same claims but are signed with separate HS256 secrets
//! and expire on separate schedules, so neither secret can mint the other
//! kind of token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::models::{TokenKind, TokenPair, UserClaims};
use crate::config::AuthConfig;
use crate::domain::UserId;
use crate::errors::{Result, StorefrontError};

/// Signing algorithm for both token kinds. Tokens declaring anything else are rejected.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub user_id: String,
    pub user_agent: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Stateless signer/verifier for access and refresh tokens
#[derive(Clone)]
pub struct TokenCodec {
    access: SigningKeys,
    refresh: SigningKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;

        Self {
            access: SigningKeys::from_secret(access_secret),
            refresh: SigningKeys::from_secret(refresh_secret),
            access_ttl,
            refresh_ttl,
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.access_token_secret.as_bytes(),
            config.refresh_token_secret.as_bytes(),
            config.access_token_ttl(),
            config.refresh_token_ttl(),
        )
    }

    /// Sign a fresh access/refresh pair for the given claims.
    pub fn sign(&self, claims: &UserClaims) -> Result<TokenPair> {
        let now = Utc::now();
        let access_expires_at = now + self.access_ttl;
        let refresh_expires_at = now + self.refresh_ttl;

        let access_token = self.encode_claims(claims, now, access_expires_at, TokenKind::Access)?;
        let refresh_token =
            self.encode_claims(claims, now, refresh_expires_at, TokenKind::Refresh)?;

        Ok(TokenPair { access_token, refresh_token, access_expires_at, refresh_expires_at })
    }

    /// Verify a token of the given kind and return its embedded claims.
    pub fn parse(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> std::result::Result<UserClaims, jsonwebtoken::errors::Error> {
        let keys = self.keys(kind);
        let token_data = decode::<Claims>(token, &keys.decoding, &self.validation)?;

        Ok(UserClaims {
            user_id: UserId::from_string(token_data.claims.user_id),
            user_agent: token_data.claims.user_agent,
        })
    }

    fn encode_claims(
        &self,
        claims: &UserClaims,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        kind: TokenKind,
    ) -> Result<String> {
        // A unique jti keeps two pairs signed within the same second distinct;
        // rotation depends on the stored refresh token actually changing.
        let payload = Claims {
            user_id: claims.user_id.to_string(),
            user_agent: claims.user_agent.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &payload, &self.keys(kind).encoding).map_err(|err| {
            StorefrontError::internal_with_source(
                format!("Failed to sign {} token", kind),
                Box::new(err),
            )
        })
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}
