use futures_util::future::try_join_all;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::media::{
    DirectoryPair, ImagePipeline, IncomingFile, PathResolver, StoredImage, UploadArtifact,
};
use crate::modules::project::{
    model::{
        dates_in_order, CreateProjectModel, InsertProject, ProjectCardResponse, ProjectDetail,
        ProjectResponse, UpdateProject, UpdateProjectModel, DATE_ORDER_MESSAGE,
    },
    repository::ProjectRepository,
    schema::{ProjectEntity, ProjectPriority},
};
use crate::modules::user::repository::UserRepository;

#[derive(Clone)]
pub struct ProjectService {
    repo: Arc<dyn ProjectRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
    logos: ImagePipeline,
    photo_dirs: DirectoryPair,
}

impl ProjectService {
    pub fn with_dependencies(
        repo: Arc<dyn ProjectRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
        logos: ImagePipeline,
        photo_dirs: DirectoryPair,
    ) -> Self {
        info!("ProjectService initialized with dependencies");
        ProjectService { repo, users, logos, photo_dirs }
    }

    pub fn logos(&self) -> &ImagePipeline {
        &self.logos
    }

    fn card(&self, detail: ProjectDetail, resolver: &PathResolver) -> ProjectCardResponse {
        ProjectCardResponse::build(
            detail,
            &self.logos.urls(resolver),
            &resolver.for_dirs(&self.photo_dirs),
        )
    }

    fn response(&self, detail: ProjectDetail, resolver: &PathResolver) -> ProjectResponse {
        ProjectResponse::build(
            detail,
            &self.logos.urls(resolver),
            &resolver.for_dirs(&self.photo_dirs),
        )
    }

    /// Maps CINs to employee ids. Every CIN must match an employee.
    async fn resolve_cins(&self, cins: &[String]) -> Result<Vec<Uuid>, error::SystemError> {
        let mut unique: Vec<String> = Vec::with_capacity(cins.len());
        for cin in cins {
            if !unique.contains(cin) {
                unique.push(cin.clone());
            }
        }

        let found = self.users.find_employees_by_cins(&unique).await?;

        let missing: Vec<String> = unique
            .into_iter()
            .filter(|cin| !found.iter().any(|u| u.cin.as_deref() == Some(cin.as_str())))
            .collect();
        if !missing.is_empty() {
            return Err(error::SystemError::MissingCins(missing));
        }

        Ok(found.into_iter().map(|u| u.id).collect())
    }

    async fn insert(
        &self,
        project: CreateProjectModel,
        logo: Option<StoredImage>,
    ) -> Result<ProjectEntity, error::SystemError> {
        let member_ids = match &project.assigned_cins {
            Some(cins) => self.resolve_cins(cins).await?,
            None => Vec::new(),
        };

        let insert = InsertProject {
            name: project.name,
            description: project.description,
            company: project.company,
            city: project.city,
            start_date: project.start_date,
            end_date: project.end_date,
            priority: project.priority.unwrap_or(ProjectPriority::Medium),
            logo,
            member_ids,
        };
        self.repo.create(&insert).await
    }

    async fn save(
        &self,
        id: &Uuid,
        project: UpdateProjectModel,
        logo: Option<Option<StoredImage>>,
    ) -> Result<ProjectEntity, error::SystemError> {
        let member_ids = match &project.assigned_cins {
            Some(cins) => Some(self.resolve_cins(cins).await?),
            None => None,
        };

        let update = UpdateProject {
            name: project.name,
            description: project.description,
            company: project.company,
            city: project.city,
            start_date: project.start_date,
            end_date: project.end_date,
            status: project.status,
            priority: project.priority,
            progression: project.progression,
            logo,
            member_ids,
        };
        self.repo.update(id, &update).await
    }

    async fn detail(&self, id: &Uuid) -> Result<ProjectDetail, error::SystemError> {
        let project = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Project not found"))?;
        let members = self.repo.find_members(&project.id).await?;
        Ok(ProjectDetail { project, members })
    }

    pub async fn list_cards(
        &self,
        resolver: &PathResolver,
    ) -> Result<Vec<ProjectCardResponse>, error::SystemError> {
        let projects = self.repo.list().await?;

        let members =
            try_join_all(projects.iter().map(|p| self.repo.find_members(&p.id))).await?;

        Ok(projects
            .into_iter()
            .zip(members)
            .map(|(project, members)| self.card(ProjectDetail { project, members }, resolver))
            .collect())
    }

    pub async fn get_project(
        &self,
        id: Uuid,
        resolver: &PathResolver,
    ) -> Result<ProjectResponse, error::SystemError> {
        let detail = self.detail(&id).await?;
        Ok(self.response(detail, resolver))
    }

    pub async fn create_project(
        &self,
        project: CreateProjectModel,
        logo: Option<IncomingFile>,
        resolver: &PathResolver,
    ) -> Result<ProjectResponse, error::SystemError> {
        let artifact = self.logos.process_optional(logo).await?;
        let stored = artifact.as_ref().map(UploadArtifact::stored);

        let outcome = self.insert(project, stored).await;

        let entity = UploadArtifact::settle(artifact, outcome).await?;
        info!("Project {} created", entity.id);

        let detail = self.detail(&entity.id).await?;
        Ok(self.response(detail, resolver))
    }

    pub async fn update_project(
        &self,
        id: Uuid,
        project: UpdateProjectModel,
        logo: Option<IncomingFile>,
        resolver: &PathResolver,
    ) -> Result<ProjectResponse, error::SystemError> {
        if project.remove_logo && logo.is_some() {
            return Err(error::SystemError::bad_request(
                "Cannot upload a new logo and remove the logo in the same request",
            ));
        }

        let existing = self
            .repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Project not found"))?;

        let start = project.start_date.or(existing.start_date);
        let end = project.end_date.or(existing.end_date);
        if !dates_in_order(start, end) {
            return Err(error::SystemError::bad_request(DATE_ORDER_MESSAGE));
        }

        let artifact = self.logos.process_optional(logo).await?;
        let logo_change = match &artifact {
            Some(artifact) => Some(Some(artifact.stored())),
            None if project.remove_logo => Some(None),
            None => None,
        };
        let replaces_logo = logo_change.is_some();

        let outcome = self.save(&id, project, logo_change).await;

        let entity = UploadArtifact::settle(artifact, outcome).await?;

        if replaces_logo {
            self.logos.retire(existing.logo.as_deref(), existing.thumbnail.as_deref()).await;
        }
        info!("Project {} updated", entity.id);

        let members = self.repo.find_members(&entity.id).await?;
        Ok(self.response(ProjectDetail { project: entity, members }, resolver))
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<(), error::SystemError> {
        let existing = self
            .repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Project not found"))?;

        if !self.repo.delete(&id).await? {
            return Err(error::SystemError::not_found("Project not found"));
        }

        self.logos.retire(existing.logo.as_deref(), existing.thumbnail.as_deref()).await;
        info!("Project {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::media::{
        service::tests::{pipeline, png_file},
        UploadProfile,
    };
    use crate::modules::project::schema::ProjectStatus;
    use crate::test::{MemoryProjects, MemoryUsers};
    use std::path::Path;

    struct Fixture {
        service: ProjectService,
        projects: Arc<MemoryProjects>,
        users: Arc<MemoryUsers>,
        resolver: PathResolver,
    }

    async fn fixture(root: &Path) -> Fixture {
        let users = MemoryUsers::new();
        let projects = MemoryProjects::new(users.clone());
        let logos = pipeline(root, UploadProfile::project_logo()).await;
        let service = ProjectService::with_dependencies(
            projects.clone(),
            users.clone(),
            logos,
            DirectoryPair::for_entity("users"),
        );
        Fixture { service, projects, users, resolver: PathResolver::new("http", "localhost:8080") }
    }

    fn files(root: &Path, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(root.join(dir))
            .map(|d| {
                d.filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    fn create_model(cins: Option<Vec<&str>>) -> CreateProjectModel {
        CreateProjectModel {
            name: "Apollo".to_string(),
            description: None,
            company: "DevPu".to_string(),
            city: "Rabat".to_string(),
            start_date: None,
            end_date: None,
            priority: None,
            assigned_cins: cins.map(|c| c.into_iter().map(str::to_string).collect()),
        }
    }

    #[actix_web::test]
    async fn test_create_with_logo_stores_both_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let f = fixture(tmp.path()).await;
        f.users.seed_employee("Employé", "e@devpu.com", "E123456");

        let created = f
            .service
            .create_project(
                create_model(Some(vec!["E123456"])),
                Some(png_file("logo.png", 800, 600)),
                &f.resolver,
            )
            .await
            .unwrap();

        let stored = &f.projects.all()[0];
        let logo = stored.logo.clone().unwrap();
        let thumb = stored.thumbnail.clone().unwrap();
        assert!(logo.starts_with("uploads/projects/originals/project-"));
        assert!(thumb.starts_with("uploads/projects/thumbnails/thumb_"));
        assert!(tmp.path().join(&logo).exists());
        assert!(tmp.path().join(&thumb).exists());

        assert_eq!(created.logo_url, Some(format!("http://localhost:8080/public/{logo}")));
        assert_eq!(created.thumbnail_url, Some(format!("http://localhost:8080/public/{thumb}")));
        assert_eq!(created.priority, ProjectPriority::Medium);
        assert_eq!(created.assigned_employees.len(), 1);
    }

    #[actix_web::test]
    async fn test_unknown_cins_remove_uploaded_logo() {
        let tmp = tempfile::tempdir().unwrap();
        let f = fixture(tmp.path()).await;
        f.users.seed_employee("Employé", "e@devpu.com", "E123456");

        let err = f
            .service
            .create_project(
                create_model(Some(vec!["E123456", "X000000", "X000000"])),
                Some(png_file("logo.png", 400, 400)),
                &f.resolver,
            )
            .await
            .unwrap_err();

        match err {
            error::SystemError::MissingCins(missing) => assert_eq!(missing, vec!["X000000"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(f.projects.all().is_empty());
        assert!(files(tmp.path(), "uploads/projects/originals").is_empty());
        assert!(files(tmp.path(), "uploads/projects/thumbnails").is_empty());
    }

    #[actix_web::test]
    async fn test_replacing_logo_retires_old_pair_after_save() {
        let tmp = tempfile::tempdir().unwrap();
        let f = fixture(tmp.path()).await;

        let created = f
            .service
            .create_project(create_model(None), Some(png_file("a.png", 500, 500)), &f.resolver)
            .await
            .unwrap();
        let old = f.projects.all()[0].clone();

        let update = UpdateProjectModel {
            status: Some(ProjectStatus::InProgress),
            progression: Some(40),
            ..Default::default()
        };
        let updated = f
            .service
            .update_project(created.id, update, Some(png_file("b.png", 600, 300)), &f.resolver)
            .await
            .unwrap();

        let new = f.projects.all()[0].clone();
        assert_ne!(new.logo, old.logo);
        assert!(!tmp.path().join(old.logo.unwrap()).exists());
        assert!(!tmp.path().join(old.thumbnail.unwrap()).exists());
        assert!(tmp.path().join(new.logo.unwrap()).exists());
        assert!(tmp.path().join(new.thumbnail.unwrap()).exists());
        assert_eq!(updated.status, ProjectStatus::InProgress);
        assert_eq!(updated.progression, 40);
    }

    #[actix_web::test]
    async fn test_failed_save_keeps_old_pair_and_drops_new_one() {
        let tmp = tempfile::tempdir().unwrap();
        let f = fixture(tmp.path()).await;

        let created = f
            .service
            .create_project(create_model(None), Some(png_file("a.png", 500, 500)), &f.resolver)
            .await
            .unwrap();
        let originals = files(tmp.path(), "uploads/projects/originals");
        let thumbnails = files(tmp.path(), "uploads/projects/thumbnails");

        f.projects.fail_writes(true);
        let result = f
            .service
            .update_project(
                created.id,
                UpdateProjectModel::default(),
                Some(png_file("b.png", 500, 500)),
                &f.resolver,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(files(tmp.path(), "uploads/projects/originals"), originals);
        assert_eq!(files(tmp.path(), "uploads/projects/thumbnails"), thumbnails);
    }

    #[actix_web::test]
    async fn test_remove_logo_conflicts_with_new_file() {
        let tmp = tempfile::tempdir().unwrap();
        let f = fixture(tmp.path()).await;
        let created =
            f.service.create_project(create_model(None), None, &f.resolver).await.unwrap();

        let update = UpdateProjectModel { remove_logo: true, ..Default::default() };
        let err = f
            .service
            .update_project(created.id, update, Some(png_file("b.png", 100, 100)), &f.resolver)
            .await
            .unwrap_err();

        assert!(matches!(err, error::SystemError::BadRequest(_)));
        assert!(files(tmp.path(), "uploads/projects/originals").is_empty());
    }

    #[actix_web::test]
    async fn test_empty_cin_list_clears_assignments() {
        let tmp = tempfile::tempdir().unwrap();
        let f = fixture(tmp.path()).await;
        f.users.seed_employee("Employé", "e@devpu.com", "E123456");
        let created = f
            .service
            .create_project(create_model(Some(vec!["E123456"])), None, &f.resolver)
            .await
            .unwrap();

        let untouched = f
            .service
            .update_project(created.id, UpdateProjectModel::default(), None, &f.resolver)
            .await
            .unwrap();
        assert_eq!(untouched.assigned_employees.len(), 1);

        let update = UpdateProjectModel { assigned_cins: Some(Vec::new()), ..Default::default() };
        let cleared =
            f.service.update_project(created.id, update, None, &f.resolver).await.unwrap();
        assert!(cleared.assigned_employees.is_empty());
    }

    #[actix_web::test]
    async fn test_delete_retires_logo_and_lists_cards() {
        let tmp = tempfile::tempdir().unwrap();
        let f = fixture(tmp.path()).await;
        let employee = f.users.seed_employee("Employé", "e@devpu.com", "E123456");

        let created = f
            .service
            .create_project(create_model(None), Some(png_file("a.png", 320, 200)), &f.resolver)
            .await
            .unwrap();
        f.projects.assign(created.id, employee.id);

        let cards = f.service.list_cards(&f.resolver).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].assigned_employees[0].name, "Employé");

        f.service.delete_project(created.id).await.unwrap();
        assert!(f.projects.all().is_empty());
        assert!(files(tmp.path(), "uploads/projects/originals").is_empty());
        assert!(files(tmp.path(), "uploads/projects/thumbnails").is_empty());

        let err = f.service.delete_project(created.id).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }

    #[actix_web::test]
    async fn test_end_date_checked_against_stored_start() {
        let tmp = tempfile::tempdir().unwrap();
        let f = fixture(tmp.path()).await;
        let mut model = create_model(None);
        model.start_date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1);
        let created = f.service.create_project(model, None, &f.resolver).await.unwrap();

        let update = UpdateProjectModel {
            end_date: chrono::NaiveDate::from_ymd_opt(2024, 4, 1),
            ..Default::default()
        };
        let err = f
            .service
            .update_project(created.id, update, Some(png_file("b.png", 100, 100)), &f.resolver)
            .await
            .unwrap_err();

        assert!(matches!(err, error::SystemError::BadRequest(msg) if msg == DATE_ORDER_MESSAGE));
        assert_eq!(f.projects.all()[0].end_date, None);
        assert!(files(tmp.path(), "uploads/projects/originals").is_empty());

        let update = UpdateProjectModel {
            end_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
            ..Default::default()
        };
        let updated =
            f.service.update_project(created.id, update, None, &f.resolver).await.unwrap();
        assert_eq!(updated.end_date, chrono::NaiveDate::from_ymd_opt(2024, 6, 1));
    }
}
