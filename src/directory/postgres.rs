use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{UserDirectory, UserLookup};
use crate::error::Error;
use crate::types::{DEFAULT_ROLE, UserId};
use crate::user::{User, UserData};

const SELECT_BY_EMAIL: &str = "SELECT id, first_name, last_name, user_name, email, phone, \
                               password_hash FROM users WHERE email = $1";
const SELECT_BY_ID: &str = "SELECT id, first_name, last_name, user_name, email, phone, \
                            password_hash FROM users WHERE id = $1";

/// Postgres-backed [`UserDirectory`] over the `users` table.
pub struct PgUserDirectory {
    pool: PgPool,
    // Serializes profile updates across all accounts.
    update_lock: Mutex<()>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    user_name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id.to_string()),
            first_name: row.first_name,
            last_name: row.last_name,
            user_name: row.user_name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            roles: vec![DEFAULT_ROLE.to_owned()],
        }
    }
}

impl PgUserDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            update_lock: Mutex::new(()),
        }
    }

    /// Open a connection pool to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if the database cannot be reached.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        tracing::info!("connected to postgres user directory");
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Ids that are not UUIDs cannot exist in the table.
fn parse_id(id: &UserId) -> Result<Uuid, Error> {
    Uuid::parse_str(id.as_str()).map_err(|_| Error::UserNotFound)
}

impl UserDirectory for PgUserDirectory {
    #[tracing::instrument(skip_all, fields(operation = "user directory: create"))]
    async fn create(&self, user: &UserData) -> Result<UserId, Error> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO users (first_name, last_name, user_name, email, phone, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.user_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                tracing::warn!("email already registered");
                Error::UserAlreadyExists
            } else {
                tracing::error!(error = %e, "failed to insert user");
                Error::Database(e)
            }
        })?;

        tracing::info!(user_id = %id, "user created");
        Ok(UserId(id.to_string()))
    }

    #[tracing::instrument(skip_all, fields(operation = "user directory: find"))]
    async fn find(&self, lookup: UserLookup<'_>) -> Result<User, Error> {
        let query = match lookup {
            UserLookup::Email(email) => {
                sqlx::query_as::<_, UserRow>(SELECT_BY_EMAIL)
                    .bind(email)
                    .fetch_optional(&self.pool)
                    .await
            }
            UserLookup::Id(id) => {
                let id = parse_id(id)?;
                sqlx::query_as::<_, UserRow>(SELECT_BY_ID)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
            }
        };

        let row = query
            .inspect_err(|e| tracing::error!(error = %e, "user lookup failed"))?
            .ok_or_else(|| {
                tracing::warn!("user not found");
                Error::UserNotFound
            })?;

        Ok(row.into())
    }

    #[tracing::instrument(skip_all, fields(operation = "user directory: update", user_id = %id))]
    async fn update(&self, id: &UserId, user: &UserData) -> Result<(), Error> {
        let uuid = parse_id(id)?;
        let _guard = self.update_lock.lock().await;

        let result = sqlx::query(
            "UPDATE users SET first_name = $1, last_name = $2, user_name = $3, email = $4, \
             phone = $5, password_hash = $6 WHERE id = $7",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.user_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(uuid)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                tracing::warn!("email already registered");
                Error::UserAlreadyExists
            } else {
                tracing::error!(error = %e, "failed to update user");
                Error::Database(e)
            }
        })?;

        if result.rows_affected() == 0 {
            tracing::warn!("user not found on update");
            return Err(Error::UserNotFound);
        }

        tracing::info!("user updated");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(operation = "user directory: delete", user_id = %id))]
    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        let uuid = parse_id(id)?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to delete user"))?;

        if result.rows_affected() == 0 {
            tracing::warn!("user not found for deletion");
            return Err(Error::UserNotFound);
        }

        tracing::info!("user deleted");
        Ok(())
    }
}
