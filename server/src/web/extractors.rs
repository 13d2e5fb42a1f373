// grocer_server/src/web/extractors.rs

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use grocer::models::Role;
use grocer::services::{auth_service, user_service};
use grocer::GrocerError;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// Caller identified by an `Authorization: Bearer <jwt>` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub role: Role,
}

/// An authenticated caller whose account currently has the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthenticatedUser);

fn bearer_token(req: &HttpRequest) -> Option<&str> {
  let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
  let token = value.strip_prefix("Bearer ")?.trim();
  (!token.is_empty()).then_some(token)
}

async fn authenticate(state: web::Data<AppState>, token: Option<String>) -> Result<AuthenticatedUser, AppError> {
  let Some(token) = token else {
    warn!("AuthenticatedUser extractor: missing bearer token.");
    return Err(GrocerError::Auth("Authentication required.".to_string()).into());
  };

  let claims = auth_service::decode_token(&token, &state.config.auth).map_err(|e| {
    warn!(error = %e, "AuthenticatedUser extractor: token rejected.");
    GrocerError::Auth("Invalid or expired token.".to_string())
  })?;

  // The account is re-read on every request: a deleted user is shut out and
  // a role change applies before the token expires.
  let user = match user_service::get_user(&state.db_pool, claims.sub).await {
    Ok(user) => user,
    Err(GrocerError::NotFound(_)) => {
      warn!(user_id = %claims.sub, "AuthenticatedUser extractor: account no longer exists.");
      return Err(GrocerError::Auth("Invalid or expired token.".to_string()).into());
    }
    Err(e) => return Err(e.into()),
  };

  Ok(AuthenticatedUser {
    user_id: user.id,
    role: user.role,
  })
}

fn extract(req: &HttpRequest) -> LocalBoxFuture<'static, Result<AuthenticatedUser, AppError>> {
  let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
    let err = AppError::from(GrocerError::Internal("Application state is not configured.".to_string()));
    return Box::pin(async move { Err::<AuthenticatedUser, AppError>(err) });
  };
  let token = bearer_token(req).map(str::to_owned);
  Box::pin(authenticate(state, token))
}

async fn require_admin(
  user: LocalBoxFuture<'static, Result<AuthenticatedUser, AppError>>,
) -> Result<AdminUser, AppError> {
  let user = user.await?;
  if user.role == Role::Admin {
    Ok(AdminUser(user))
  } else {
    warn!(user_id = %user.user_id, "Non-admin caller on an admin route.");
    Err(GrocerError::Forbidden("Administrator access required.".to_string()).into())
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    extract(req)
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    Box::pin(require_admin(extract(req)))
  }
}
