use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, response::IntoResponse};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use pinboard_db::Database;
use pinboard_review::{Access, ReviewService};
use pinboard_types::api::{AuthCheckResponse, LoginRequest, LoginResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::blocking;
use crate::error::ApiError;
use crate::storage::BlobStorage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub review: ReviewService<Database>,
    pub storage: BlobStorage,
    pub admin: AdminAuth,
}

const ADMIN_SUBJECT: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

/// Admin credential check and bearer token issuing.
///
/// Holds only the Argon2 hash of the admin password. Tokens are HS256 JWTs
/// signed with `jwt_secret`.
pub struct AdminAuth {
    password_hash: String,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AdminAuth {
    /// Hash a plaintext admin password with Argon2id.
    pub fn from_password(password: &str, jwt_secret: String, token_ttl: Duration) -> anyhow::Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("Failed to hash admin password: {}", e))?
            .to_string();
        Ok(Self { password_hash, jwt_secret, token_ttl })
    }

    /// Use a precomputed PHC hash string.
    pub fn from_hash(password_hash: String, jwt_secret: String, token_ttl: Duration) -> anyhow::Result<Self> {
        PasswordHash::new(&password_hash).map_err(|e| anyhow!("Invalid admin password hash: {}", e))?;
        Ok(Self { password_hash, jwt_secret, token_ttl })
    }

    pub fn verify_password(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn issue_token(&self) -> anyhow::Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;
        let claims = Claims {
            sub: ADMIN_SUBJECT.to_string(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok((token, expires_at))
    }

    /// Access granted to the holder of `token`; anything other than a valid,
    /// unexpired admin token is denied.
    pub fn access_for(&self, token: Option<&str>) -> Access {
        let Some(token) = token else {
            return Access::Denied;
        };

        let verdict = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims.sub == ADMIN_SUBJECT);

        Access::from_authorized(matches!(verdict, Ok(true)))
    }
}

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    // Argon2 is CPU-bound; run it on the blocking pool.
    let verifier = state.clone();
    let valid = blocking(move || Ok(verifier.admin.verify_password(&req.password))).await?;

    if !valid {
        warn!("Admin login rejected");
        return Err(ApiError::Unauthorized("Invalid password".into()));
    }

    let (token, expires_at) = state.admin.issue_token()?;
    info!("Admin login accepted, token valid until {}", expires_at);

    Ok(Json(LoginResponse {
        success: true,
        token,
        expires_at,
    }))
}

/// GET /api/admin/check
pub async fn check(Extension(access): Extension<Access>) -> impl IntoResponse {
    Json(AuthCheckResponse {
        authenticated: access.is_granted(),
    })
}
