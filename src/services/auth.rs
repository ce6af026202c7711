// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        rbac_repo::RbacRepository,
        user_repo::{NewUser, UserRepository},
    },
    models::auth::{Claims, LoginResponse, Profile, RegisterUserPayload, User},
    services::inventory_service::blank_to_none,
};

pub const DEFAULT_ROLE: &str = "COMERCIAL";
pub const ADMIN_ROLE: &str = "ADMINISTRADOR";
const TOKEN_DAYS: i64 = 7;

/// Hash bcrypt fora do executor assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, rbac_repo: RbacRepository, jwt_secret: String) -> Self {
        Self { user_repo, rbac_repo, jwt_secret }
    }

    /// Autocadastro: entra sempre com o cargo de menor privilégio.
    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<String, AppError> {
        let role = self
            .rbac_repo
            .find_role_by_name(DEFAULT_ROLE)
            .await?
            .ok_or(AppError::RoleNotFound)?;

        let password_hash = hash_password(&payload.password).await?;

        let user = self
            .user_repo
            .create_user(
                self.rbac_repo.pool(),
                NewUser {
                    username: payload.username.trim(),
                    email: payload.email.trim(),
                    password_hash: &password_hash,
                    full_name: blank_to_none(payload.full_name.as_deref()),
                    phone: blank_to_none(payload.phone.as_deref()),
                    role_id: role.id,
                    is_active: true,
                    created_by: None,
                },
            )
            .await?;

        tracing::info!("✅ Usuário {} registrado como {}", user.username, role.name);
        self.create_token(user.id)
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self
            .user_repo
            .find_by_username(username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AppError::InactiveUser);
        }

        self.user_repo.touch_last_login(user.id).await?;
        let token = self.create_token(user.id)?;
        let profile = self.profile(user).await?;

        Ok(LoginResponse { token, profile })
    }

    /// Usuário com cargo, permissões e módulos.
    pub async fn profile(&self, user: User) -> Result<Profile, AppError> {
        let role = self
            .rbac_repo
            .find_role_by_id(self.rbac_repo.pool(), user.role_id)
            .await?
            .ok_or(AppError::RoleNotFound)?;
        Ok(Profile::new(user, role))
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(self.rbac_repo.pool(), token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.is_active {
            return Err(AppError::InactiveUser);
        }
        Ok(user)
    }

    /// Cria o administrador na primeira subida, se houver senha configurada e nenhum usuário.
    pub async fn ensure_admin(&self, username: &str, email: &str, password: Option<&str>) -> Result<(), AppError> {
        let Some(password) = password.filter(|p| !p.is_empty()) else {
            return Ok(());
        };
        if self.user_repo.exists_any().await? {
            return Ok(());
        }

        let role = self
            .rbac_repo
            .find_role_by_name(ADMIN_ROLE)
            .await?
            .ok_or(AppError::RoleNotFound)?;
        let password_hash = hash_password(password).await?;

        self.user_repo
            .create_user(
                self.rbac_repo.pool(),
                NewUser {
                    username,
                    email,
                    password_hash: &password_hash,
                    full_name: Some("Administrador"),
                    phone: None,
                    role_id: role.id,
                    is_active: true,
                    created_by: None,
                },
            )
            .await?;

        tracing::info!("✅ Administrador '{}' criado", username);
        Ok(())
    }

    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_DAYS);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/backoffice_test")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            RbacRepository::new(pool),
            "segredo-de-teste".into(),
        )
    }

    #[tokio::test]
    async fn token_round_trip_keeps_subject() {
        let service = service();
        let user_id = Uuid::new_v4();
        let token = service.create_token(user_id).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret("segredo-de-teste".as_ref()),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, user_id);
        assert_eq!(data.claims.exp - data.claims.iat, (TOKEN_DAYS * 24 * 3600) as usize);
    }

    #[tokio::test]
    async fn garbage_token_is_rejected_before_the_database() {
        let result = service().validate_token("nao-e-um-jwt").await;
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("secreta1").await.unwrap();
        assert!(verify_password("secreta1", &hashed).await.unwrap());
        assert!(!verify_password("outra", &hashed).await.unwrap());
    }
}
