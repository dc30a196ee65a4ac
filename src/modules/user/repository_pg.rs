use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::{InsertUser, UpdateUser},
        repository::UserRepository,
        schema::{UserEntity, UserRole},
    },
};

#[derive(Clone)]
pub struct UserRepositoryPg {
    pool: sqlx::PgPool,
}

impl UserRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryPg {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError> {
        let user =
            sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE lower(email) = lower($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    async fn find_duplicate(
        &self,
        email: Option<&str>,
        cin: Option<&str>,
        exclude: Option<&Uuid>,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        if email.is_none() && cin.is_none() {
            return Ok(None);
        }

        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT * FROM users
            WHERE (
                    ($1::text IS NOT NULL AND lower(email) = lower($1))
                 OR ($2::text IS NOT NULL AND cin = $2)
                  )
              AND ($3::uuid IS NULL OR id <> $3)
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(cin)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_employees_by_cins(
        &self,
        cins: &[String],
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        if cins.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, UserEntity>(
            "SELECT * FROM users WHERE cin = ANY($1) AND role = $2",
        )
        .bind(cins)
        .bind(UserRole::Employee)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn list_employees(&self) -> Result<Vec<UserEntity>, error::SystemError> {
        let users =
            sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE role = $1 ORDER BY name")
                .bind(UserRole::Employee)
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }

    async fn count_admins(&self) -> Result<i64, error::SystemError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(UserRole::Admin)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let entity = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users
                (id, name, email, hash_password, role, position, cin, profile_photo, profile_photo_thumb)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.hash_password)
        .bind(&user.role)
        .bind(&user.position)
        .bind(&user.cin)
        .bind(user.photo.as_ref().map(|p| &p.original))
        .bind(user.photo.as_ref().map(|p| &p.thumbnail))
        .fetch_one(&self.pool)
        .await?;
        Ok(entity)
    }

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError> {
        let photo = user.photo.as_ref().and_then(|v| v.as_ref());
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
        UPDATE users
        SET
            name                = COALESCE($2, name),
            email               = COALESCE($3, email),
            hash_password       = COALESCE($4, hash_password),
            position            = COALESCE($5, position),
            cin                 = COALESCE($6, cin),
            profile_photo       = CASE WHEN $7::boolean THEN $8 ELSE profile_photo END,
            profile_photo_thumb = CASE WHEN $7::boolean THEN $9 ELSE profile_photo_thumb END,
            updated_at          = NOW()
        WHERE id = $1
        RETURNING *
        "#,
        )
        .bind(id)
        .bind(&user.name) // $2: Option<String>
        .bind(&user.email) // $3: Option<String>
        .bind(&user.hash_password) // $4: Option<String>
        .bind(&user.position) // $5: Option<String>
        .bind(&user.cin) // $6: Option<String>
        .bind(user.photo.is_some()) // $7: bool - was the photo touched?
        .bind(photo.map(|p| &p.original)) // $8: Option<&String>
        .bind(photo.map(|p| &p.thumbnail)) // $9: Option<&String>
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| error::SystemError::not_found("Employee not found"))?;

        Ok(user)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        let rows = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}
