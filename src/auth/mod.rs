//! Credential hashing and bearer-token issuance for users, drivers and hospitals.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Driver,
    Hospital,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

pub struct Credentials {
    secret: String,
    ttl: Duration,
    hash_cost: u32,
}

impl Credentials {
    pub fn new(secret: impl Into<String>, ttl: Duration, hash_cost: u32) -> Self {
        Self {
            secret: secret.into(),
            ttl,
            hash_cost,
        }
    }

    /// Returns a bcrypt hash string (`$2b$<cost>$<salt+digest>`).
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        bcrypt::hash(password, self.hash_cost)
            .map_err(|err| AppError::Internal(format!("password hashing failed: {err}")))
    }

    pub fn verify_password(&self, password: &str, stored: &str) -> bool {
        match bcrypt::verify(password, stored) {
            Ok(matches) => matches,
            Err(err) => {
                warn!(error = %err, "stored password hash is unreadable");
                false
            }
        }
    }

    pub fn issue_token(&self, subject: Uuid, role: Role) -> Result<String, AppError> {
        self.issue_token_at(subject, role, Utc::now())
    }

    fn issue_token_at(
        &self,
        subject: Uuid,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: subject,
            role,
            exp: timestamp(now + self.ttl)?,
            iat: timestamp(now)?,
        };

        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|err| AppError::Internal(format!("token signing failed: {err}")))
    }
}

fn timestamp(at: DateTime<Utc>) -> Result<usize, AppError> {
    usize::try_from(at.timestamp())
        .map_err(|_| AppError::Internal("token timestamp out of range".to_string()))
}
