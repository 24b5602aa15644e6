use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::models::validation::{validate_email, validate_name, validate_phone, validate_username};
use crate::models::{CreateUser, UpdateUser, User, UserResponse};
use crate::services::ServiceError;

/// Admin-facing user management.
#[derive(Debug, Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_user(&self, user_data: CreateUser) -> Result<UserResponse, ServiceError> {
        validate_username(&user_data.username).map_err(ServiceError::validation)?;
        validate_email(&user_data.email).map_err(ServiceError::validation)?;
        validate_name(&user_data.first_name).map_err(ServiceError::validation)?;
        validate_name(&user_data.last_name).map_err(ServiceError::validation)?;
        if let Some(phone) = &user_data.phone {
            validate_phone(phone).map_err(ServiceError::validation)?;
        }
        self.ensure_unique(&user_data.username, &user_data.email, None)
            .await?;

        let password_hash =
            hash_password(&user_data.password).map_err(ServiceError::validation)?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, password_hash, role, first_name, last_name, phone, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&user_data.username)
        .bind(&user_data.email)
        .bind(&password_hash)
        .bind(&user_data.role)
        .bind(&user_data.first_name)
        .bind(&user_data.last_name)
        .bind(&user_data.phone)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(username = %user.username, "user created");
        Ok(UserResponse::from(user))
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<UserResponse, ServiceError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        Ok(UserResponse::from(user))
    }

    pub async fn update_user(
        &self,
        user_id: Uuid,
        user_data: UpdateUser,
    ) -> Result<UserResponse, ServiceError> {
        if let Some(email) = &user_data.email {
            validate_email(email).map_err(ServiceError::validation)?;
            self.ensure_email_free(email, Some(user_id)).await?;
        }
        if let Some(phone) = &user_data.phone {
            validate_phone(phone).map_err(ServiceError::validation)?;
        }

        // Password is only re-hashed when a new one is supplied.
        let password_hash = match &user_data.password {
            Some(password) => {
                Some(hash_password(password).map_err(ServiceError::validation)?)
            }
            None => None,
        };

        let user = sqlx::query_as::<_, User>(
            "UPDATE users
             SET email = COALESCE($2, email),
                 password_hash = COALESCE($3, password_hash),
                 first_name = COALESCE($4, first_name),
                 last_name = COALESCE($5, last_name),
                 phone = COALESCE($6, phone),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(user_id)
        .bind(&user_data.email)
        .bind(&password_hash)
        .bind(&user_data.first_name)
        .bind(&user_data.last_name)
        .bind(&user_data.phone)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ServiceError::NotFound("User"))?;

        Ok(UserResponse::from(user))
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("User"));
        }
        tracing::info!(%user_id, "user deleted");
        Ok(())
    }

    pub async fn list_users(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserResponse>, ServiceError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    async fn ensure_unique(
        &self,
        username: &str,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let taken = sqlx::query(
            "SELECT 1 FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(username)
        .bind(exclude)
        .fetch_optional(&self.db)
        .await?;
        if taken.is_some() {
            return Err(ServiceError::conflict("Username already exists"));
        }

        self.ensure_email_free(email, exclude).await
    }

    async fn ensure_email_free(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let taken =
            sqlx::query("SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2)")
                .bind(email)
                .bind(exclude)
                .fetch_optional(&self.db)
                .await?;
        if taken.is_some() {
            return Err(ServiceError::conflict("Email already exists"));
        }
        Ok(())
    }
}
