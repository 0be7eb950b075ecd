//! User persistence behind the [`UserDirectory`] capability.

pub mod memory;
pub mod postgres;

use std::future::Future;

use crate::error::Error;
use crate::types::UserId;
use crate::user::{User, UserData};

pub use memory::MemoryUserDirectory;
pub use postgres::PgUserDirectory;

/// How to find a user.
#[derive(Debug, Clone, Copy)]
pub enum UserLookup<'a> {
    Email(&'a str),
    Id(&'a UserId),
}

/// User CRUD with domain errors.
///
/// Implementations report [`Error::UserAlreadyExists`] on email uniqueness violations and
/// [`Error::UserNotFound`] when the target user does not exist. Updates of the same
/// account must be serialized.
pub trait UserDirectory: Send + Sync + 'static {
    /// Insert a user and return its newly assigned id.
    fn create(&self, user: &UserData) -> impl Future<Output = Result<UserId, Error>> + Send;

    fn find(&self, lookup: UserLookup<'_>) -> impl Future<Output = Result<User, Error>> + Send;

    /// Overwrite every field of an existing user.
    fn update(
        &self,
        id: &UserId,
        user: &UserData,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    fn delete(&self, id: &UserId) -> impl Future<Output = Result<(), Error>> + Send;
}
