use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use plateful_db::Database;
use plateful_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use plateful_types::models::Role;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') || email.len() < 5 || email.len() > 254 {
        return Err(ApiError::BadRequest("invalid email address".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }

    // Role is validated against the closed set here and re-checked
    // whenever the token comes back in.
    let role: Role = req
        .role
        .as_deref()
        .unwrap_or("user")
        .parse()
        .map_err(|e: plateful_types::models::UnknownVariant| ApiError::BadRequest(e.to_string()))?;

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|_| ApiError::Internal)?
        .to_string();

    let user_id = Uuid::new_v4();
    state
        .db
        .create_user(&user_id.to_string(), &email, &password_hash, role.as_str())?;

    let token = create_token(&state.jwt_secret, user_id, &email, role)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user_id, token }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();

    let user = state
        .db
        .get_user_by_email(&email)?
        .ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|_| ApiError::Internal)?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user.id.parse().map_err(|_| ApiError::Internal)?;
    let role: Role = user.role.parse().map_err(|_| ApiError::Internal)?;

    let token = create_token(&state.jwt_secret, user_id, &user.email, role)?;

    Ok(Json(LoginResponse {
        user_id,
        email: user.email,
        role,
        token,
    }))
}

fn create_token(secret: &str, user_id: Uuid, email: &str, role: Role) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| ApiError::Internal)
}
