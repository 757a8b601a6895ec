//! Identidad del llamador
//!
//! El colaborador de autenticación que está delante de este servicio
//! resuelve la sesión y reenvía la identidad en headers de confianza.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::models::user::AccountRole;
use crate::utils::errors::{forbidden_error, AppError, AppResult};

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";
pub const ACCOUNT_ROLE_HEADER: &str = "x-account-role";

/// Cuenta autenticada que hace el request
#[derive(Debug, Clone, PartialEq)]
pub struct CallerIdentity {
    pub account_id: String,
    pub role: AccountRole,
}

impl CallerIdentity {
    /// Verificar que el llamador tenga el rol requerido por la operación
    pub fn require_role(&self, role: AccountRole, operation: &str) -> AppResult<()> {
        if self.role != role {
            return Err(forbidden_error(operation, &format!("requires the {} role", role)));
        }
        Ok(())
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account_id = header_value(parts, ACCOUNT_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing caller identity".to_string()))?;

        let role = header_value(parts, ACCOUNT_ROLE_HEADER)
            .and_then(AccountRole::parse)
            .ok_or_else(|| AppError::Unauthorized("Missing or invalid caller role".to_string()))?;

        Ok(Self {
            account_id: account_id.to_string(),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::ErrorKind;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> AppResult<CallerIdentity> {
        let (mut parts, _) = request.into_parts();
        CallerIdentity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_identity_from_headers() {
        let request = Request::builder()
            .header(ACCOUNT_ID_HEADER, "user_1")
            .header(ACCOUNT_ROLE_HEADER, "Driver")
            .body(())
            .unwrap();

        let identity = extract(request).await.unwrap();
        assert_eq!(identity.account_id, "user_1");
        assert_eq!(identity.role, AccountRole::Driver);
    }

    #[tokio::test]
    async fn test_missing_or_bad_headers_are_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(extract(request).await.unwrap_err().kind(), ErrorKind::Unauthorized);

        let request = Request::builder()
            .header(ACCOUNT_ID_HEADER, "user_1")
            .header(ACCOUNT_ROLE_HEADER, "admin")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap_err().kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_require_role() {
        let identity = CallerIdentity {
            account_id: "user_1".to_string(),
            role: AccountRole::Owner,
        };
        assert!(identity.require_role(AccountRole::Owner, "generate fleet code").is_ok());
        assert_eq!(
            identity
                .require_role(AccountRole::Driver, "join fleet")
                .unwrap_err()
                .kind(),
            ErrorKind::Forbidden
        );
    }
}
