pub struct Env {
    pub jwt_secret: String,
    pub access_token_expiration: u64,
    pub database_url: String,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    pub public_dir: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Env {
    fn new() -> Self {
        let jwt_secret = std::env::var("SECRET_KEY")
            .expect("SECRET_KEY must be set in .env file or environment variable");

        let access_token_expiration = std::env::var("ACCESS_TOKEN_EXPIRATION")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<u64>()
            .expect("ACCESS_TOKEN_EXPIRATION must be a valid u64 integer");

        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set in .env file or environment variable");

        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let ip = std::env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .expect("PORT must be a valid u16 integer");

        let public_dir = std::env::var("PUBLIC_DIR").unwrap_or_else(|_| "public".to_string());

        let admin_email = std::env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty());
        let admin_password = std::env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty());

        Env {
            jwt_secret,
            access_token_expiration,
            database_url,
            frontend_url,
            ip,
            port,
            public_dir,
            admin_email,
            admin_password,
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

pub const PROJECT_LOGO_FIELD: &str = "logo";
pub const PROJECT_LOGO_MAX_SIZE: usize = 5 * 1024 * 1024;
pub const USER_PHOTO_FIELD: &str = "profilePhoto";
pub const USER_PHOTO_MAX_SIZE: usize = 3 * 1024 * 1024;
pub const THUMBNAIL_QUALITY: u8 = 80;
