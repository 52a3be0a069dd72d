use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_types::{AppError, TeamType, UserRole, UserSummary};

/// JWT claims carried in access tokens. Role and teams ride in the
/// token so authorization never needs a directory lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub team_types: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Materialize the authenticated user. Unknown role strings are
    /// rejected rather than defaulted; a stale token must not grant a
    /// guessed permission level.
    pub fn to_user(&self) -> Result<UserSummary, AppError> {
        let role = UserRole::parse(&self.role)
            .ok_or_else(|| AppError::unauthorized(format!("unknown role '{}'", self.role)))?;
        let team_types = self
            .team_types
            .iter()
            .filter_map(|t| TeamType::parse(t))
            .collect();
        Ok(UserSummary {
            id: self.sub,
            name: self.name.clone(),
            role,
            team_types,
        })
    }
}

fn jwt_secret() -> Result<String, AppError> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::internal("JWT_SECRET is not configured"))
}

pub fn access_token_expiry_minutes() -> i64 {
    std::env::var("JWT_ACCESS_TOKEN_EXPIRY_MINUTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(480)
}

/// Mint an access token for a user. Used by the test harness and by
/// whatever identity provider fronts this service.
pub fn create_access_token(user: &UserSummary) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        name: user.name.clone(),
        role: user.role.as_str().to_string(),
        team_types: user
            .team_types
            .iter()
            .map(|t| t.as_str().to_string())
            .collect(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(access_token_expiry_minutes())).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret()?.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("failed to sign token: {e}")))
}

pub fn decode_token(token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret()?.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("invalid or expired token"))
}
