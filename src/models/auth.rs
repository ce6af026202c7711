// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{
    audit::AppModule,
    rbac::{Permission, Role},
};

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    #[schema(example = "admin")]
    pub username: String,

    #[schema(example = "admin@butacors.com")]
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub role_id: Uuid,
    pub last_login: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Nome usado nos PDFs e na bitácora.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}

// Linha da listagem de usuários (usuário + cargo)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithRole {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub role_name: String,
    pub role_display_name: String,
}

fn validate_username(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-') {
        return Ok(());
    }
    let mut err = ValidationError::new("username");
    err.message = Some("O usuário só pode conter letras, números, '.', '-' e '_'.".into());
    Err(err)
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(
        length(min = 3, max = 80, message = "O usuário deve ter entre 3 e 80 caracteres."),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,

    #[validate(must_match(other = "password", message = "As senhas não coincidem."))]
    pub confirm_password: String,

    pub full_name: Option<String>,
    pub phone: Option<String>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "O usuário é obrigatório."))]
    pub username: String,

    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Criação de usuário pelo administrador
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(
        length(min = 3, max = 80, message = "O usuário deve ter entre 3 e 80 caracteres."),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,

    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role_id: Uuid,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

// Edição de usuário pelo administrador. A senha só muda se vier preenchida.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,

    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role_id: Uuid,
    pub is_active: bool,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Perfil do usuário logado: cargo, permissões concedidas e módulos visíveis
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user: User,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub modules: Vec<AppModule>,
}

impl Profile {
    pub fn new(user: User, role: Role) -> Self {
        let permissions = role.flags.granted();
        let modules = role.flags.accessible_modules();
        Self { user, role, permissions, modules }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub profile: Profile,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, password: &str, confirm: &str) -> RegisterUserPayload {
        RegisterUserPayload {
            username: username.into(),
            email: "ana@butacors.com".into(),
            password: password.into(),
            confirm_password: confirm.into(),
            full_name: None,
            phone: None,
        }
    }

    #[test]
    fn register_requires_matching_passwords() {
        let errors = register("ana", "secreta1", "secreta2").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("confirm_password"));
        assert!(register("ana", "secreta1", "secreta1").validate().is_ok());
    }

    #[test]
    fn register_rejects_odd_usernames() {
        let errors = register("ana maria", "secreta1", "secreta1").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
    }

    #[test]
    fn update_password_is_optional() {
        let payload = UpdateUserPayload {
            email: "ana@butacors.com".into(),
            full_name: None,
            phone: None,
            role_id: Uuid::new_v4(),
            is_active: true,
            password: None,
        };
        assert!(payload.validate().is_ok());

        let short = UpdateUserPayload { password: Some("123".into()), ..payload };
        assert!(short.validate().is_err());
    }
}
