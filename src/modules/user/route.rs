use crate::modules::user::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/auth").service(sign_in));
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/employees")
            .service(get_employees)
            .service(get_employee)
            .service(create_employee)
            .service(update_employee)
            .service(delete_employee),
    );
}
