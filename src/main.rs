use actix_cors::Cors;
use actix_web::{
    self, App, HttpServer,
    http::header,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::connect_database,
    middlewares::{authentication, authorization},
    modules::{
        media::{ImagePipeline, StorageLayout, UploadProfile},
        project::{repository_pg::ProjectRepositoryPg, service::ProjectService},
        user::{repository_pg::UserRepositoryPg, schema::UserRole, service::UserService},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let layout = StorageLayout::new(&ENV.public_dir);
    let logo_profile = UploadProfile::project_logo();
    let photo_profile = UploadProfile::user_photo();

    layout.ensure(&[&logo_profile.directories, &photo_profile.directories]).await.map_err(|e| {
        log::error!("Cannot create upload directories under {}: {e}", ENV.public_dir);
        e
    })?;

    log::info!("Serving uploads from {}", layout.root().display());

    let logo_dirs = logo_profile.directories.clone();
    let photo_dirs = photo_profile.directories.clone();
    let logos = ImagePipeline::new(logo_profile, layout.clone());
    let photos = ImagePipeline::new(photo_profile, layout.clone());

    let db_pool = connect_database().await.map_err(|e| {
        log::error!("{e}");
        std::io::Error::other("Database connection error")
    })?;

    let user_repo = Arc::new(UserRepositoryPg::new(db_pool.clone()));
    let project_repo = Arc::new(ProjectRepositoryPg::new(db_pool.clone()));

    let user_service =
        UserService::with_dependencies(user_repo.clone(), project_repo.clone(), photos, logo_dirs);
    let project_service =
        ProjectService::with_dependencies(project_repo, user_repo, logos, photo_dirs);

    if let (Some(email), Some(password)) = (&ENV.admin_email, &ENV.admin_password) {
        user_service.ensure_admin(email, password).await.map_err(|e| {
            log::error!("Admin seed failed: {e}");
            std::io::Error::other("Admin seed error")
        })?;
    }

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&ENV.frontend_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(project_service.clone()))
            .service(health_check)
            .service(modules::media::route::public_files(&layout))
            .service(
                web::scope("/api").configure(modules::user::route::public_api_configure).service(
                    web::scope("/admin")
                        .wrap(from_fn(authorization(vec![UserRole::Admin])))
                        .wrap(from_fn(authentication))
                        .configure(modules::user::route::configure)
                        .configure(modules::project::route::configure),
                ),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
