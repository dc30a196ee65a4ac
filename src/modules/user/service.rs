use futures_util::future::try_join_all;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::ENV;
use crate::api::error;
use crate::modules::media::{
    DirectoryPair, ImagePipeline, IncomingFile, PathResolver, StoredImage, UploadArtifact,
};
use crate::modules::project::repository::ProjectRepository;
use crate::modules::user::model::{
    CreateEmployeeModel, EmployeeDetailsResponse, EmployeeListItem, EmployeeProject,
    EmployeeResponse, InsertUser, SignInModel, UpdateEmployeeModel, UpdateUser,
};
use crate::modules::user::{
    repository::UserRepository,
    schema::{UserEntity, UserRole},
};
use crate::utils::{Claims, hash_password, verify_password};

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    projects: Arc<dyn ProjectRepository + Send + Sync>,
    photos: ImagePipeline,
    logo_dirs: DirectoryPair,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        projects: Arc<dyn ProjectRepository + Send + Sync>,
        photos: ImagePipeline,
        logo_dirs: DirectoryPair,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, projects, photos, logo_dirs }
    }

    pub fn photos(&self) -> &ImagePipeline {
        &self.photos
    }

    pub async fn sign_in(&self, user: SignInModel) -> Result<String, error::SystemError> {
        let user_entity = self
            .repo
            .find_by_email(&user.email)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Invalid email or password"))?;

        let valid = verify_password(&user_entity.hash_password, &user.password)?;
        if !valid {
            return Err(error::SystemError::unauthorized("Invalid email or password"));
        }

        let access_token =
            Claims::new(&user_entity.id, &user_entity.role, ENV.access_token_expiration)
                .encode(ENV.jwt_secret.as_ref())?;

        info!("User {} signed in", user_entity.id);
        Ok(access_token)
    }

    /// Creates the first admin account when none exists yet.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<(), error::SystemError> {
        if self.repo.count_admins().await? > 0 {
            return Ok(());
        }

        let admin = InsertUser {
            name: "Administrator".to_string(),
            email: email.to_string(),
            hash_password: hash_password(password)?,
            role: UserRole::Admin,
            position: None,
            cin: None,
            photo: None,
        };
        let created = self.repo.create(&admin).await?;
        info!("Seeded admin account {}", created.email);
        Ok(())
    }

    async fn find_employee(&self, id: &Uuid) -> Result<UserEntity, error::SystemError> {
        self.repo
            .find_by_id(id)
            .await?
            .filter(|u| u.role == UserRole::Employee)
            .ok_or_else(|| error::SystemError::not_found("Employee not found"))
    }

    /// Rejects an email or CIN another user already holds.
    async fn ensure_unique(
        &self,
        email: Option<&str>,
        cin: Option<&str>,
        exclude: Option<&Uuid>,
    ) -> Result<(), error::SystemError> {
        let Some(existing) = self.repo.find_duplicate(email, cin, exclude).await? else {
            return Ok(());
        };

        if email.is_some_and(|e| existing.email.eq_ignore_ascii_case(e)) {
            return Err(error::SystemError::conflict("Email already exists"));
        }
        Err(error::SystemError::conflict("CIN already exists"))
    }

    pub async fn list_employees(
        &self,
        resolver: &PathResolver,
    ) -> Result<Vec<EmployeeListItem>, error::SystemError> {
        let employees = self.repo.list_employees().await?;
        let projects =
            try_join_all(employees.iter().map(|e| self.projects.find_by_member(&e.id))).await?;

        let photos = self.photos.urls(resolver);
        let logos = resolver.for_dirs(&self.logo_dirs);

        Ok(employees
            .into_iter()
            .zip(projects)
            .map(|(employee, projects)| EmployeeListItem {
                employee: EmployeeResponse::build(employee, &photos),
                projects: projects
                    .iter()
                    .filter_map(|p| logos.original(p.logo.as_deref()))
                    .collect(),
            })
            .collect())
    }

    pub async fn get_employee(
        &self,
        id: Uuid,
        resolver: &PathResolver,
    ) -> Result<EmployeeDetailsResponse, error::SystemError> {
        let employee = self.find_employee(&id).await?;
        let projects = self.projects.find_by_member(&employee.id).await?;

        let logos = resolver.for_dirs(&self.logo_dirs);
        Ok(EmployeeDetailsResponse {
            employee: EmployeeResponse::build(employee, &self.photos.urls(resolver)),
            projects: projects.into_iter().map(|p| EmployeeProject::build(p, &logos)).collect(),
        })
    }

    async fn insert(
        &self,
        employee: CreateEmployeeModel,
        photo: Option<StoredImage>,
    ) -> Result<UserEntity, error::SystemError> {
        self.ensure_unique(Some(&employee.email), Some(&employee.cin), None).await?;

        let insert = InsertUser {
            name: employee.name,
            email: employee.email,
            hash_password: hash_password(&employee.password)?,
            role: UserRole::Employee,
            position: employee.position,
            cin: Some(employee.cin),
            photo,
        };
        self.repo.create(&insert).await
    }

    pub async fn create_employee(
        &self,
        employee: CreateEmployeeModel,
        photo: Option<IncomingFile>,
        resolver: &PathResolver,
    ) -> Result<EmployeeResponse, error::SystemError> {
        let artifact = self.photos.process_optional(photo).await?;
        let stored = artifact.as_ref().map(UploadArtifact::stored);

        let outcome = self.insert(employee, stored).await;

        let entity = UploadArtifact::settle(artifact, outcome).await?;
        info!("Employee {} created", entity.id);
        Ok(EmployeeResponse::build(entity, &self.photos.urls(resolver)))
    }

    async fn save(
        &self,
        id: &Uuid,
        employee: UpdateEmployeeModel,
        photo: Option<Option<StoredImage>>,
    ) -> Result<UserEntity, error::SystemError> {
        self.ensure_unique(employee.email.as_deref(), employee.cin.as_deref(), Some(id)).await?;

        let hash_password = employee.password.as_deref().map(hash_password).transpose()?;

        let update = UpdateUser {
            name: employee.name,
            email: employee.email,
            hash_password,
            position: employee.position,
            cin: employee.cin,
            photo,
        };
        self.repo.update(id, &update).await
    }

    pub async fn update_employee(
        &self,
        id: Uuid,
        employee: UpdateEmployeeModel,
        photo: Option<IncomingFile>,
        resolver: &PathResolver,
    ) -> Result<EmployeeResponse, error::SystemError> {
        if employee.remove_photo && photo.is_some() {
            return Err(error::SystemError::bad_request(
                "Cannot upload a new photo and remove the photo in the same request",
            ));
        }

        let existing = self.find_employee(&id).await?;

        let artifact = self.photos.process_optional(photo).await?;
        let photo_change = match &artifact {
            Some(artifact) => Some(Some(artifact.stored())),
            None if employee.remove_photo => Some(None),
            None => None,
        };
        let replaces_photo = photo_change.is_some();

        let outcome = self.save(&id, employee, photo_change).await;

        let entity = UploadArtifact::settle(artifact, outcome).await?;

        if replaces_photo {
            self.photos
                .retire(existing.profile_photo.as_deref(), existing.profile_photo_thumb.as_deref())
                .await;
        }
        info!("Employee {} updated", entity.id);
        Ok(EmployeeResponse::build(entity, &self.photos.urls(resolver)))
    }

    pub async fn delete_employee(&self, id: Uuid) -> Result<(), error::SystemError> {
        let existing = self.find_employee(&id).await?;

        if !self.repo.delete(&id).await? {
            return Err(error::SystemError::not_found("Employee not found"));
        }

        self.photos
            .retire(existing.profile_photo.as_deref(), existing.profile_photo_thumb.as_deref())
            .await;
        info!("Employee {} deleted", id);
        Ok(())
    }
}
