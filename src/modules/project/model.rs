use chrono::NaiveDate;
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    api::error,
    modules::{
        media::{path::ImageUrls, FormData, StoredImage},
        project::schema::{ProjectEntity, ProjectPriority, ProjectStatus},
        user::schema::UserEntity,
    },
};

pub const ASSIGNED_CINS_FIELD: &str = "assignedEmployeesCINs";

/// Accepts `YYYY-MM-DD` or a full ISO timestamp.
fn parse_date(form: &FormData, key: &str) -> Result<Option<NaiveDate>, error::Error> {
    let Some(raw) = form.text(key) else {
        return Ok(None);
    };
    let day = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| error::Error::bad_request(format!("Invalid date for '{key}': {raw}")))
}

fn parse_enum<T: FromStr<Err = String>>(
    form: &FormData,
    key: &str,
) -> Result<Option<T>, error::Error> {
    form.text(key).map(|v| v.parse::<T>()).transpose().map_err(error::Error::bad_request)
}

pub const DATE_ORDER_MESSAGE: &str = "End date cannot be before start date";

/// False only when both dates are known and the end precedes the start.
pub fn dates_in_order(start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    !matches!((start, end), (Some(start), Some(end)) if end < start)
}

fn check_dates(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    if dates_in_order(start, end) {
        return Ok(());
    }
    Err(ValidationError::new("date_order").with_message(DATE_ORDER_MESSAGE.into()))
}

fn validate_create_dates(model: &CreateProjectModel) -> Result<(), ValidationError> {
    check_dates(model.start_date, model.end_date)
}

fn validate_update_dates(model: &UpdateProjectModel) -> Result<(), ValidationError> {
    check_dates(model.start_date, model.end_date)
}

#[derive(Debug, Validate)]
#[validate(schema(function = "validate_create_dates"))]
pub struct CreateProjectModel {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Company is required"))]
    pub company: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub priority: Option<ProjectPriority>,
    pub assigned_cins: Option<Vec<String>>,
}

impl TryFrom<&FormData> for CreateProjectModel {
    type Error = error::Error;

    fn try_from(form: &FormData) -> Result<Self, Self::Error> {
        Ok(Self {
            name: form.text("name").unwrap_or_default(),
            description: form.text("description"),
            company: form.text("company").unwrap_or_default(),
            city: form.text("city").unwrap_or_default(),
            start_date: parse_date(form, "startDate")?,
            end_date: parse_date(form, "endDate")?,
            priority: parse_enum(form, "priority")?,
            assigned_cins: form.list(ASSIGNED_CINS_FIELD),
        })
    }
}

#[derive(Debug, Default, Validate)]
#[validate(schema(function = "validate_update_dates"))]
pub struct UpdateProjectModel {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Company cannot be empty"))]
    pub company: Option<String>,
    #[validate(length(min = 1, message = "City cannot be empty"))]
    pub city: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    #[validate(range(min = 0, max = 100, message = "Progression must be between 0 and 100"))]
    pub progression: Option<i32>,
    /// `Some(vec![])` clears the assignments.
    pub assigned_cins: Option<Vec<String>>,
    pub remove_logo: bool,
}

impl TryFrom<&FormData> for UpdateProjectModel {
    type Error = error::Error;

    fn try_from(form: &FormData) -> Result<Self, Self::Error> {
        let progression = form
            .text("progression")
            .map(|v| v.parse::<i32>())
            .transpose()
            .map_err(|_| error::Error::bad_request("Progression must be an integer"))?;

        Ok(Self {
            name: form.text("name"),
            description: form.text("description"),
            company: form.text("company"),
            city: form.text("city"),
            start_date: parse_date(form, "startDate")?,
            end_date: parse_date(form, "endDate")?,
            status: parse_enum(form, "status")?,
            priority: parse_enum(form, "priority")?,
            progression,
            assigned_cins: form.list(ASSIGNED_CINS_FIELD),
            remove_logo: form.flag("removeLogo"),
        })
    }
}

pub struct InsertProject {
    pub name: String,
    pub description: Option<String>,
    pub company: String,
    pub city: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub priority: ProjectPriority,
    pub logo: Option<StoredImage>,
    pub member_ids: Vec<Uuid>,
}

/// `logo`: `None` leaves it, `Some(None)` clears it, `Some(Some(_))` replaces it.
/// `member_ids`: `None` leaves the assignments untouched.
#[derive(Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<ProjectPriority>,
    pub progression: Option<i32>,
    pub logo: Option<Option<StoredImage>>,
    pub member_ids: Option<Vec<Uuid>>,
}

/// A project together with the employees assigned to it.
pub struct ProjectDetail {
    pub project: ProjectEntity,
    pub members: Vec<UserEntity>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMember {
    pub name: String,
    pub position: Option<String>,
    pub profile_photo: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCardResponse {
    pub id: Uuid,
    pub name: String,
    pub company: String,
    pub city: String,
    pub priority: ProjectPriority,
    pub status: ProjectStatus,
    pub progression: i32,
    pub logo_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub assigned_employees: Vec<CardMember>,
}

impl ProjectCardResponse {
    pub fn build(detail: ProjectDetail, logos: &ImageUrls<'_>, photos: &ImageUrls<'_>) -> Self {
        let ProjectDetail { project, members } = detail;
        ProjectCardResponse {
            logo_url: logos.original(project.logo.as_deref()),
            thumbnail_url: logos.thumbnail(project.thumbnail.as_deref()),
            id: project.id,
            name: project.name,
            company: project.company,
            city: project.city,
            priority: project.priority,
            status: project.status,
            progression: project.progression,
            assigned_employees: members
                .into_iter()
                .map(|m| CardMember {
                    profile_photo: photos.thumbnail(m.profile_photo_thumb.as_deref()),
                    name: m.name,
                    position: m.position,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: Uuid,
    pub name: String,
    pub position: Option<String>,
    pub cin: Option<String>,
    pub profile_photo: Option<String>,
    pub profile_photo_thumb: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub company: String,
    pub city: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub priority: ProjectPriority,
    pub status: ProjectStatus,
    pub progression: i32,
    pub logo: Option<String>,
    pub thumbnail: Option<String>,
    pub logo_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub assigned_employees: Vec<ProjectMember>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ProjectResponse {
    pub fn build(detail: ProjectDetail, logos: &ImageUrls<'_>, photos: &ImageUrls<'_>) -> Self {
        let ProjectDetail { project, members } = detail;
        ProjectResponse {
            logo_url: logos.original(project.logo.as_deref()),
            thumbnail_url: logos.thumbnail(project.thumbnail.as_deref()),
            id: project.id,
            name: project.name,
            description: project.description,
            company: project.company,
            city: project.city,
            start_date: project.start_date,
            end_date: project.end_date,
            priority: project.priority,
            status: project.status,
            progression: project.progression,
            logo: project.logo,
            thumbnail: project.thumbnail,
            assigned_employees: members
                .into_iter()
                .map(|m| ProjectMember {
                    profile_photo: photos.original(m.profile_photo.as_deref()),
                    profile_photo_thumb: photos.thumbnail(m.profile_photo_thumb.as_deref()),
                    id: m.id,
                    name: m.name,
                    position: m.position,
                    cin: m.cin,
                })
                .collect(),
            updated_at: project.updated_at,
        }
    }
}
