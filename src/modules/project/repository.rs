use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        project::{
            model::{InsertProject, UpdateProject},
            schema::ProjectEntity,
        },
        user::schema::UserEntity,
    },
};

#[async_trait::async_trait]
pub trait ProjectRepository {
    async fn list(&self) -> Result<Vec<ProjectEntity>, error::SystemError>;
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<ProjectEntity>, error::SystemError>;
    async fn find_members(&self, project_id: &Uuid) -> Result<Vec<UserEntity>, error::SystemError>;
    /// Projects the given employee is assigned to.
    async fn find_by_member(&self, user_id: &Uuid)
        -> Result<Vec<ProjectEntity>, error::SystemError>;

    async fn create(&self, project: &InsertProject) -> Result<ProjectEntity, error::SystemError>;
    async fn update(
        &self,
        id: &Uuid,
        project: &UpdateProject,
    ) -> Result<ProjectEntity, error::SystemError>;
    /// Deletes the project with its tasks and assignments.
    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError>;
}
