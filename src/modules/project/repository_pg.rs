use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        project::{
            model::{InsertProject, UpdateProject},
            repository::ProjectRepository,
            schema::ProjectEntity,
        },
        user::schema::UserEntity,
    },
};

#[derive(Clone)]
pub struct ProjectRepositoryPg {
    pool: sqlx::PgPool,
}

impl ProjectRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn replace_members(
        &self,
        project_id: &Uuid,
        member_ids: &[Uuid],
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), error::SystemError> {
        sqlx::query("DELETE FROM project_employees WHERE project_id = $1")
            .bind(project_id)
            .execute(tx.as_mut())
            .await?;

        if member_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO project_employees (project_id, user_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(member_ids)
        .execute(tx.as_mut())
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ProjectRepository for ProjectRepositoryPg {
    async fn list(&self) -> Result<Vec<ProjectEntity>, error::SystemError> {
        let projects =
            sqlx::query_as::<_, ProjectEntity>("SELECT * FROM projects ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(projects)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<ProjectEntity>, error::SystemError> {
        let project = sqlx::query_as::<_, ProjectEntity>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn find_members(&self, project_id: &Uuid) -> Result<Vec<UserEntity>, error::SystemError> {
        let members = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT u.* FROM users u
            JOIN project_employees pe ON pe.user_id = u.id
            WHERE pe.project_id = $1
            ORDER BY u.name
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn find_by_member(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ProjectEntity>, error::SystemError> {
        let projects = sqlx::query_as::<_, ProjectEntity>(
            r#"
            SELECT p.* FROM projects p
            JOIN project_employees pe ON pe.project_id = p.id
            WHERE pe.user_id = $1
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn create(&self, project: &InsertProject) -> Result<ProjectEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));

        let entity = sqlx::query_as::<_, ProjectEntity>(
            r#"
            INSERT INTO projects
                (id, name, description, company, city, start_date, end_date, priority, logo, thumbnail)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.company)
        .bind(&project.city)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.priority)
        .bind(project.logo.as_ref().map(|l| &l.original))
        .bind(project.logo.as_ref().map(|l| &l.thumbnail))
        .fetch_one(tx.as_mut())
        .await?;

        self.replace_members(&entity.id, &project.member_ids, &mut tx).await?;

        tx.commit().await?;
        Ok(entity)
    }

    async fn update(
        &self,
        id: &Uuid,
        project: &UpdateProject,
    ) -> Result<ProjectEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;
        let logo = project.logo.as_ref().and_then(|v| v.as_ref());

        let entity = sqlx::query_as::<_, ProjectEntity>(
            r#"
            UPDATE projects
            SET
                name        = COALESCE($2, name),
                description = COALESCE($3, description),
                company     = COALESCE($4, company),
                city        = COALESCE($5, city),
                start_date  = COALESCE($6, start_date),
                end_date    = COALESCE($7, end_date),
                status      = COALESCE($8, status),
                priority    = COALESCE($9, priority),
                progression = COALESCE($10, progression),
                logo        = CASE WHEN $11::boolean THEN $12 ELSE logo END,
                thumbnail   = CASE WHEN $11::boolean THEN $13 ELSE thumbnail END,
                updated_at  = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.company)
        .bind(&project.city)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.status)
        .bind(project.priority)
        .bind(project.progression)
        .bind(project.logo.is_some())
        .bind(logo.map(|l| &l.original))
        .bind(logo.map(|l| &l.thumbnail))
        .fetch_optional(tx.as_mut())
        .await?
        .ok_or_else(|| error::SystemError::not_found("Project not found"))?;

        if let Some(member_ids) = &project.member_ids {
            self.replace_members(id, member_ids, &mut tx).await?;
        }

        tx.commit().await?;
        Ok(entity)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(id)
            .execute(tx.as_mut())
            .await?;

        let rows = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(tx.as_mut())
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(rows > 0)
    }
}
