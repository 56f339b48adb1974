use fitness_core::model::{Email, User, UserId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_user_row, user_id_from_i64, write_err};
use crate::repository::{NewUserRecord, StorageError, UserRepository};

const USER_COLUMNS: &str = "id, username, email, full_name, password_hash, created_at";

impl SqliteRepository {
    async fn fetch_user_by(&self, column: &str, value: &str) -> Result<Option<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_user_row).transpose()
    }
}

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, user: NewUserRecord) -> Result<UserId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO users (username, email, full_name, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(user.full_name)
        .bind(user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        user_id_from_i64(res.last_insert_rowid())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("user_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_user_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        self.fetch_user_by("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        self.fetch_user_by("email", email).await
    }

    async fn update_profile(
        &self,
        id: UserId,
        full_name: Option<String>,
        email: &Email,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE users SET full_name = ?1, email = ?2 WHERE id = ?3")
            .bind(full_name)
            .bind(email.as_str())
            .bind(id_to_i64("user_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(write_err)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), StorageError> {
        let res = sqlx::query("UPDATE users SET password_hash = ?1 WHERE id = ?2")
            .bind(password_hash)
            .bind(id_to_i64("user_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn count_users(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        u64::try_from(count).map_err(|_| StorageError::Serialization("count overflow".into()))
    }
}
