use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::{InsertUser, UpdateUser},
        schema::UserEntity,
    },
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError>;

    /// Any user other than `exclude` holding the given email or CIN.
    async fn find_duplicate(
        &self,
        email: Option<&str>,
        cin: Option<&str>,
        exclude: Option<&Uuid>,
    ) -> Result<Option<UserEntity>, error::SystemError>;

    async fn find_employees_by_cins(
        &self,
        cins: &[String],
    ) -> Result<Vec<UserEntity>, error::SystemError>;
    async fn list_employees(&self) -> Result<Vec<UserEntity>, error::SystemError>;
    async fn count_admins(&self) -> Result<i64, error::SystemError>;
    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError>;
    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError>;
    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError>;
}
