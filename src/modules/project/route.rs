use crate::modules::project::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/projects")
            .service(get_project_cards)
            .service(get_project)
            .service(create_project)
            .service(update_project)
            .service(delete_project),
    );
}
