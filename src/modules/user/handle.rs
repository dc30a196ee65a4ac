use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpRequest};
use uuid::Uuid;

use crate::api::{error, success};
use crate::modules::media::PathResolver;
use crate::modules::user::{
    model::{self, CreateEmployeeModel, UpdateEmployeeModel},
    service::UserService,
};
use crate::utils::{validate, ValidatedJson};

#[post("/signin")]
pub async fn sign_in(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignInModel>,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let access_token = user_service.sign_in(user_data.0).await?;
    let response = model::SignInResponse { access_token };
    Ok(success::Success::ok(Some(response)).message("Signin successful"))
}

#[get("")]
pub async fn get_employees(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<Vec<model::EmployeeListItem>>, error::Error> {
    let resolver = PathResolver::from_request(&req);
    let employees = user_service.list_employees(&resolver).await?;
    Ok(success::Success::ok(Some(employees)).message("Employees retrieved successfully"))
}

#[get("/{id:[0-9a-fA-F-]{36}}")]
pub async fn get_employee(
    user_service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<model::EmployeeDetailsResponse>, error::Error> {
    let resolver = PathResolver::from_request(&req);
    let employee = user_service.get_employee(user_id.into_inner(), &resolver).await?;
    Ok(success::Success::ok(Some(employee)).message("Employee retrieved successfully"))
}

#[post("")]
pub async fn create_employee(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<success::Success<model::EmployeeResponse>, error::Error> {
    let mut form = user_service.photos().read_form(payload).await?;
    let employee = CreateEmployeeModel::from(&form);
    validate(&employee)?;

    let resolver = PathResolver::from_request(&req);
    let created = user_service.create_employee(employee, form.take_file(), &resolver).await?;
    Ok(success::Success::created(Some(created)).message("Employee created successfully"))
}

#[put("/{id:[0-9a-fA-F-]{36}}")]
pub async fn update_employee(
    user_service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<success::Success<model::EmployeeResponse>, error::Error> {
    let mut form = user_service.photos().read_form(payload).await?;
    let employee = UpdateEmployeeModel::from(&form);
    validate(&employee)?;

    let resolver = PathResolver::from_request(&req);
    let updated = user_service
        .update_employee(user_id.into_inner(), employee, form.take_file(), &resolver)
        .await?;
    Ok(success::Success::ok(Some(updated)).message("Employee updated successfully"))
}

#[delete("/{id:[0-9a-fA-F-]{36}}")]
pub async fn delete_employee(
    user_service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<()>, error::Error> {
    user_service.delete_employee(user_id.into_inner()).await?;
    Ok(success::Success::no_content())
}
