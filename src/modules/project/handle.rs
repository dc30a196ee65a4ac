use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpRequest};
use uuid::Uuid;

use crate::api::{error, success};
use crate::modules::media::PathResolver;
use crate::modules::project::{
    model::{self, CreateProjectModel, UpdateProjectModel},
    service::ProjectService,
};
use crate::utils::validate;

#[get("/cards")]
pub async fn get_project_cards(
    project_service: web::Data<ProjectService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<model::ProjectCardResponse>>, error::Error> {
    let resolver = PathResolver::from_request(&req);
    let cards = project_service.list_cards(&resolver).await?;
    Ok(success::Success::ok(Some(cards)).message("Projects retrieved successfully"))
}

#[get("/{id:[0-9a-fA-F-]{36}}")]
pub async fn get_project(
    project_service: web::Data<ProjectService>,
    project_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<model::ProjectResponse>, error::Error> {
    let resolver = PathResolver::from_request(&req);
    let project = project_service.get_project(project_id.into_inner(), &resolver).await?;
    Ok(success::Success::ok(Some(project)).message("Project retrieved successfully"))
}

#[post("")]
pub async fn create_project(
    project_service: web::Data<ProjectService>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<success::Success<model::ProjectResponse>, error::Error> {
    let mut form = project_service.logos().read_form(payload).await?;
    let project = CreateProjectModel::try_from(&form)?;
    validate(&project)?;

    let resolver = PathResolver::from_request(&req);
    let created = project_service.create_project(project, form.take_file(), &resolver).await?;
    Ok(success::Success::created(Some(created)).message("Project created successfully"))
}

#[put("/{id:[0-9a-fA-F-]{36}}")]
pub async fn update_project(
    project_service: web::Data<ProjectService>,
    project_id: web::Path<Uuid>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<success::Success<model::ProjectResponse>, error::Error> {
    let mut form = project_service.logos().read_form(payload).await?;
    let project = UpdateProjectModel::try_from(&form)?;
    validate(&project)?;

    let resolver = PathResolver::from_request(&req);
    let updated = project_service
        .update_project(project_id.into_inner(), project, form.take_file(), &resolver)
        .await?;
    Ok(success::Success::ok(Some(updated)).message("Project updated successfully"))
}

#[delete("/{id:[0-9a-fA-F-]{36}}")]
pub async fn delete_project(
    project_service: web::Data<ProjectService>,
    project_id: web::Path<Uuid>,
) -> Result<success::Success<()>, error::Error> {
    project_service.delete_project(project_id.into_inner()).await?;
    Ok(success::Success::no_content())
}
