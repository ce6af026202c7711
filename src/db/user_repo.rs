// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_db_error, map_delete_error, AppError},
    models::auth::{User, UserWithRole},
};

fn unique_violation(constraint: &str) -> Option<AppError> {
    match constraint {
        "users_username_key" => Some(AppError::UsernameAlreadyExists),
        "users_email_key" => Some(AppError::EmailAlreadyExists),
        _ => None,
    }
}

// Dados de um usuário novo, já com a senha em hash
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub role_id: Uuid,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo nome de login
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(maybe_user)
    }

    pub async fn find_with_role<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<UserWithRole>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, UserWithRole>(
            r#"
            SELECT u.*, r.name AS role_name, r.display_name AS role_display_name
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.id = $1
            "#,
        )
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_users<'e, E>(&self, executor: E) -> Result<Vec<UserWithRole>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let users = sqlx::query_as::<_, UserWithRole>(
            r#"
            SELECT u.*, r.name AS role_name, r.display_name AS role_display_name
            FROM users u
            JOIN roles r ON r.id = u.role_id
            ORDER BY u.username
            "#,
        )
            .fetch_all(executor)
            .await?;
        Ok(users)
    }

    // Cria um novo usuário, com tratamento de erro específico para duplicados
    pub async fn create_user<'e, E>(&self, executor: E, new_user: NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                username, email, password_hash, full_name, phone,
                role_id, is_active, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(new_user.username)
            .bind(new_user.email)
            .bind(new_user.password_hash)
            .bind(new_user.full_name)
            .bind(new_user.phone)
            .bind(new_user.role_id)
            .bind(new_user.is_active)
            .bind(new_user.created_by)
            .fetch_one(executor)
            .await
            .map_err(|e| map_db_error(e, unique_violation))?;

        Ok(user)
    }

    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        email: &str,
        full_name: Option<&str>,
        phone: Option<&str>,
        role_id: Uuid,
        is_active: bool,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2, full_name = $3, phone = $4, role_id = $5,
                is_active = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(email)
            .bind(full_name)
            .bind(phone)
            .bind(role_id)
            .bind(is_active)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_db_error(e, unique_violation))?;

        Ok(user)
    }

    pub async fn update_password<'e, E>(&self, executor: E, id: Uuid, password_hash: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_active<'e, E>(&self, executor: E, id: Uuid, is_active: bool) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
            .bind(id)
            .bind(is_active)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_user<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(map_delete_error)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn exists_any(&self) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
