use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::{
    media::{path::ImageUrls, FormData, StoredImage},
    project::schema::ProjectEntity,
    user::schema::{UserEntity, UserRole},
};

#[derive(Deserialize, Validate)]
pub struct SignInModel {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub access_token: String,
}

#[derive(Debug, Validate)]
pub struct CreateEmployeeModel {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[validate(length(min = 1, message = "CIN cannot be empty"))]
    pub cin: String,
    #[validate(length(min = 1, message = "Position cannot be empty"))]
    pub position: Option<String>,
}

impl From<&FormData> for CreateEmployeeModel {
    fn from(form: &FormData) -> Self {
        Self {
            name: form.text("name").unwrap_or_default(),
            email: form.text("email").unwrap_or_default(),
            password: form.text("password").unwrap_or_default(),
            cin: form.text("cin").unwrap_or_default(),
            position: form.text("position"),
        }
    }
}

#[derive(Debug, Default, Validate)]
pub struct UpdateEmployeeModel {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: Option<String>,
    #[validate(length(min = 1, message = "CIN cannot be empty"))]
    pub cin: Option<String>,
    pub position: Option<String>,
    pub remove_photo: bool,
}

impl From<&FormData> for UpdateEmployeeModel {
    fn from(form: &FormData) -> Self {
        Self {
            name: form.text("name"),
            email: form.text("email"),
            password: form.text("password"),
            cin: form.text("cin"),
            position: form.text("position"),
            remove_photo: form.flag("removePhoto"),
        }
    }
}

pub struct InsertUser {
    pub name: String,
    pub email: String,
    pub hash_password: String,
    pub role: UserRole,
    pub position: Option<String>,
    pub cin: Option<String>,
    pub photo: Option<StoredImage>,
}

/// `photo`: `None` leaves it, `Some(None)` clears it, `Some(Some(_))` replaces it.
#[derive(Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub hash_password: Option<String>,
    pub position: Option<String>,
    pub cin: Option<String>,
    pub photo: Option<Option<StoredImage>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub position: Option<String>,
    pub cin: Option<String>,
    pub profile_photo: Option<String>,
    pub profile_photo_thumb: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl EmployeeResponse {
    pub fn build(entity: UserEntity, photos: &ImageUrls<'_>) -> Self {
        EmployeeResponse {
            profile_photo: photos.original(entity.profile_photo.as_deref()),
            profile_photo_thumb: photos.thumbnail(entity.profile_photo_thumb.as_deref()),
            id: entity.id,
            name: entity.name,
            email: entity.email,
            role: entity.role,
            position: entity.position,
            cin: entity.cin,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmployeeListItem {
    #[serde(flatten)]
    pub employee: EmployeeResponse,
    /// Logo URLs of the projects the employee is assigned to.
    pub projects: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProject {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub logo_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl EmployeeProject {
    pub fn build(project: ProjectEntity, logos: &ImageUrls<'_>) -> Self {
        EmployeeProject {
            logo_url: logos.original(project.logo.as_deref()),
            thumbnail_url: logos.thumbnail(project.thumbnail.as_deref()),
            id: project.id,
            name: project.name,
            company: project.company,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EmployeeDetailsResponse {
    #[serde(flatten)]
    pub employee: EmployeeResponse,
    pub projects: Vec<EmployeeProject>,
}
