use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;

/// Academy roles. The hosted auth service issues the Italian names;
/// the English ones are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    Coach,
    Player,
}

impl Role {
    /// Roles allowed to confirm bookings, block courts and run group draws.
    pub const MANAGEMENT: &'static [Role] = &[Role::Admin, Role::Manager];
    /// Roles allowed to create bookings for others and record match results.
    pub const STAFF: &'static [Role] = &[Role::Admin, Role::Manager, Role::Coach];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "gestore",
            Role::Coach => "maestro",
            Role::Player => "atleta",
        }
    }

    pub fn is_staff(&self) -> bool {
        Self::STAFF.contains(self)
    }
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        match role.to_lowercase().as_str() {
            "admin" => Role::Admin,
            "gestore" | "manager" => Role::Manager,
            "maestro" | "coach" => Role::Coach,
            _ => Role::Player, // Default to player for unknown roles
        }
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        Role::from(role.as_str())
    }
}

/// The authenticated caller, taken from the claims the JWT middleware
/// stored in the request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| AppError::Unauthorized(format!("Invalid user ID in token: {}", e)))?;
        Ok(Self {
            user_id,
            email: claims.email.clone(),
            role: Role::from(claims.role.as_str()),
        })
    }

    /// Fail with 403 unless the caller holds one of `allowed`.
    pub fn require_any_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            return Ok(());
        }
        let names: Vec<&str> = allowed.iter().map(Role::as_str).collect();
        Err(AppError::Forbidden(format!(
            "Access denied: requires one of [{}]. Your current role is {}",
            names.join(", "),
            self.role.as_str()
        )))
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().ok_or_else(|| {
            AppError::Unauthorized("You must be logged in to perform this action".to_string())
        })?;
        AuthUser::from_claims(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "someone@academy.test".to_string(),
            role,
        }
    }

    #[test]
    fn italian_and_english_role_names_map_to_same_role() {
        assert_eq!(Role::from("gestore"), Role::Manager);
        assert_eq!(Role::from("Manager"), Role::Manager);
        assert_eq!(Role::from("maestro"), Role::Coach);
        assert_eq!(Role::from("coach"), Role::Coach);
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from("atleta"), Role::Player);
        assert_eq!(Role::from("something-else"), Role::Player);
    }

    #[test]
    fn coach_may_record_results_but_not_draw_groups() {
        let coach = user(Role::Coach);
        assert!(coach.require_any_role(Role::STAFF).is_ok());
        assert!(matches!(
            coach.require_any_role(Role::MANAGEMENT),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn player_is_not_staff() {
        let player = user(Role::Player);
        assert!(!player.is_staff());
        assert!(player.require_any_role(Role::STAFF).is_err());
    }
}
