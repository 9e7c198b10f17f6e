use crate::application::use_cases::auth::login::{Login as LoginUc, LoginRequest as LoginDto};
use crate::application::use_cases::auth::me::GetMe;
use crate::application::use_cases::auth::register::{
    Register as RegisterUc, RegisterRequest as RegisterDto,
};
use crate::application::validation::Validator;
use crate::bootstrap::app_context::AppContext;
use crate::bootstrap::config::Config;
use crate::domain::users::user::{Role, User};
use crate::presentation::http::error::{ApiError, ApiJson, ApiResult, ErrorBody};
use axum::{
    Json, Router,
    extract::{FromRef, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    routing::{get, post},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role.to_string(),
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(ctx)
}

#[utoipa::path(post, path = "/api/v1/auth/register", tag = "Auth", request_body = RegisterRequest, security(()), responses(
    (status = 201, body = UserResponse),
    (status = 400, body = ErrorBody),
    (status = 409, body = ErrorBody)
))]
pub async fn register(
    State(ctx): State<AppContext>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    Validator::new()
        .email("email", &req.email)
        .length("name", &req.name, 1, 80)
        .length("password", &req.password, 8, 128)
        .finish()?;
    let repo = ctx.user_repo();
    let uc = RegisterUc {
        repo: repo.as_ref(),
        admin_emails: &ctx.cfg.admin_emails,
    };
    let dto = RegisterDto {
        email: req.email,
        name: req.name,
        password: req.password,
    };
    let user = uc.execute(&dto).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(post, path = "/api/v1/auth/login", tag = "Auth", request_body = LoginRequest, security(()), responses(
    (status = 200, body = LoginResponse),
    (status = 401, body = ErrorBody)
))]
pub async fn login(
    State(ctx): State<AppContext>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<(HeaderMap, Json<LoginResponse>)> {
    let repo = ctx.user_repo();
    let uc = LoginUc {
        repo: repo.as_ref(),
    };
    let dto = LoginDto {
        email: req.email,
        password: req.password,
    };
    let user = uc.execute(&dto).await?;
    let token = issue_token(&ctx.cfg, &user)?;

    // Set HttpOnly cookie with the access token
    let mut headers = HeaderMap::new();
    let cookie = build_access_cookie(&token, ctx.cfg.jwt_expires_secs, ctx.cfg.secure_cookies());
    if let Ok(v) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, v);
    }
    tracing::debug!(user_id = %user.id, "login_succeeded");

    Ok((
        headers,
        Json(LoginResponse {
            access_token: token,
            user: user.into(),
        }),
    ))
}

#[utoipa::path(post, path = "/api/v1/auth/logout", tag = "Auth", responses((status = 204)))]
pub async fn logout(State(ctx): State<AppContext>) -> (HeaderMap, StatusCode) {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static(if ctx.cfg.secure_cookies() {
            "access_token=; HttpOnly; Secure; Path=/; Max-Age=0; SameSite=Lax"
        } else {
            "access_token=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax"
        }),
    );
    (headers, StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/v1/auth/me", tag = "Auth", responses(
    (status = 200, body = UserResponse),
    (status = 401, body = ErrorBody)
))]
pub async fn me(State(ctx): State<AppContext>, auth: AuthUser) -> ApiResult<Json<UserResponse>> {
    let repo = ctx.user_repo();
    let uc = GetMe {
        repo: repo.as_ref(),
    };
    let user = uc.execute(auth.id).await?;
    Ok(Json(user.into()))
}

// --- Authenticated caller extractor & JWT utils ---
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Caller identity decoded from the bearer token or the `access_token` cookie.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Config: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cfg = Config::from_ref(state);
        let token = bearer_token(&parts.headers).ok_or_else(ApiError::unauthorized)?;
        validate_token(&cfg, &token).ok_or_else(ApiError::unauthorized)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    // 1) Prefer Authorization header if present
    if let Some(t) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(t.trim().to_string());
    }
    // 2) Fallback to HttpOnly cookie `access_token`
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|c| get_cookie(c, "access_token"))
        .filter(|t| !t.is_empty())
}

pub fn issue_token(cfg: &Config, user: &User) -> ApiResult<String> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.to_string(),
        exp: now + (cfg.jwt_expires_secs.max(0) as usize),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!(error = ?e, "jwt_encode_failed");
        ApiError::internal()
    })
}

pub(crate) fn validate_token(cfg: &Config, token: &str) -> Option<AuthUser> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;
    let id = Uuid::parse_str(&data.claims.sub).ok()?;
    let role = data.claims.role.parse().ok()?;
    Some(AuthUser { id, role })
}

// --- Cookie helpers ---

fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    for part in cookie_header.split(';') {
        let kv = part.trim();
        if let Some((k, v)) = kv.split_once('=') {
            if k.trim() == name {
                return Some(v.trim().to_string());
            }
        }
    }
    None
}

fn build_access_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "access_token={}; HttpOnly{}; Path=/; Max-Age={}; SameSite=Lax",
        token,
        secure_attr,
        max_age_secs.max(0)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn cfg() -> Config {
        Config::from_lookup(|_| None).unwrap()
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ann@example.com".into(),
            name: "Ann".into(),
            role,
            created_at: chrono::Utc::now(),
        }
    }

    async fn whoami(auth: AuthUser) -> String {
        format!("{}:{}", auth.id, auth.role)
    }

    fn app() -> Router {
        Router::new().route("/whoami", get(whoami)).with_state(cfg())
    }

    #[tokio::test]
    async fn accepts_bearer_header_and_cookie() {
        let u = user(Role::Admin);
        let token = issue_token(&cfg(), &u).unwrap();
        let expected = format!("{}:admin", u.id);

        let resp = app()
            .oneshot(
                Request::get("/whoami")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, expected.as_bytes());

        let resp = app()
            .oneshot(
                Request::get("/whoami")
                    .header("cookie", format!("theme=dark; access_token={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_missing_or_forged_tokens() {
        let resp = app()
            .oneshot(Request::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let mut other = cfg();
        other.jwt_secret = "another-secret-entirely".into();
        let forged = issue_token(&other, &user(Role::User)).unwrap();
        let resp = app()
            .oneshot(
                Request::get("/whoami")
                    .header("authorization", format!("Bearer {forged}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn cookie_helpers() {
        assert_eq!(
            get_cookie("a=1; access_token=xyz ;b=2", "access_token").as_deref(),
            Some("xyz")
        );
        assert_eq!(get_cookie("a=1", "access_token"), None);
        let c = build_access_cookie("tok", -5, true);
        assert!(c.contains("Max-Age=0"));
        assert!(c.contains("; Secure"));
    }
}
