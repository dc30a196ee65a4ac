//! In-memory repositories for service-level tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use uuid::Uuid;

use crate::api::error;
use crate::modules::{
    project::{
        model::{InsertProject, UpdateProject},
        repository::ProjectRepository,
        schema::{ProjectEntity, ProjectStatus},
    },
    user::{
        model::{InsertUser, UpdateUser},
        repository::UserRepository,
        schema::{UserEntity, UserRole},
    },
};

fn write_failure() -> error::SystemError {
    error::SystemError::DatabaseError("simulated write failure".into())
}

#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<Vec<UserEntity>>,
    fail_writes: AtomicBool,
}

impl MemoryUsers {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writes(&self) -> Result<(), error::SystemError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        Ok(())
    }

    pub fn all(&self) -> Vec<UserEntity> {
        self.users.lock().unwrap().clone()
    }

    pub fn seed_employee(&self, name: &str, email: &str, cin: &str) -> UserEntity {
        let now = chrono::Utc::now();
        let user = UserEntity {
            id: Uuid::now_v7(),
            name: name.to_string(),
            email: email.to_string(),
            hash_password: "not-a-real-hash".to_string(),
            role: UserRole::Employee,
            position: None,
            cin: Some(cin.to_string()),
            profile_photo: None,
            profile_photo_thumb: None,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == *id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn find_duplicate(
        &self,
        email: Option<&str>,
        cin: Option<&str>,
        exclude: Option<&Uuid>,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| exclude != Some(&u.id))
            .find(|u| {
                email.is_some_and(|e| u.email.eq_ignore_ascii_case(e))
                    || (cin.is_some() && u.cin.as_deref() == cin)
            })
            .cloned())
    }

    async fn find_employees_by_cins(
        &self,
        cins: &[String],
    ) -> Result<Vec<UserEntity>, error::SystemError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| u.role == UserRole::Employee)
            .filter(|u| u.cin.as_ref().is_some_and(|c| cins.contains(c)))
            .cloned()
            .collect())
    }

    async fn list_employees(&self) -> Result<Vec<UserEntity>, error::SystemError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| u.role == UserRole::Employee).cloned().collect())
    }

    async fn count_admins(&self) -> Result<i64, error::SystemError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| u.role == UserRole::Admin).count() as i64)
    }

    async fn create(&self, user: &InsertUser) -> Result<UserEntity, error::SystemError> {
        self.check_writes()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(error::SystemError::conflict("Email already exists"));
        }
        if user.cin.is_some() && users.iter().any(|u| u.cin == user.cin) {
            return Err(error::SystemError::conflict("CIN already exists"));
        }

        let now = chrono::Utc::now();
        let entity = UserEntity {
            id: Uuid::now_v7(),
            name: user.name.clone(),
            email: user.email.clone(),
            hash_password: user.hash_password.clone(),
            role: user.role.clone(),
            position: user.position.clone(),
            cin: user.cin.clone(),
            profile_photo: user.photo.as_ref().map(|p| p.original.clone()),
            profile_photo_thumb: user.photo.as_ref().map(|p| p.thumbnail.clone()),
            created_at: now,
            updated_at: now,
        };
        users.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError> {
        self.check_writes()?;
        let mut users = self.users.lock().unwrap();
        let entity = users
            .iter_mut()
            .find(|u| u.id == *id)
            .ok_or_else(|| error::SystemError::not_found("Employee not found"))?;

        if let Some(name) = &user.name {
            entity.name = name.clone();
        }
        if let Some(email) = &user.email {
            entity.email = email.clone();
        }
        if let Some(hash) = &user.hash_password {
            entity.hash_password = hash.clone();
        }
        if let Some(position) = &user.position {
            entity.position = Some(position.clone());
        }
        if let Some(cin) = &user.cin {
            entity.cin = Some(cin.clone());
        }
        if let Some(photo) = &user.photo {
            entity.profile_photo = photo.as_ref().map(|p| p.original.clone());
            entity.profile_photo_thumb = photo.as_ref().map(|p| p.thumbnail.clone());
        }
        entity.updated_at = chrono::Utc::now();
        Ok(entity.clone())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        self.check_writes()?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != *id);
        Ok(users.len() < before)
    }
}

pub struct MemoryProjects {
    projects: Mutex<Vec<ProjectEntity>>,
    members: Mutex<Vec<(Uuid, Uuid)>>,
    users: Arc<MemoryUsers>,
    fail_writes: AtomicBool,
}

impl MemoryProjects {
    pub fn new(users: Arc<MemoryUsers>) -> Arc<Self> {
        Arc::new(Self {
            projects: Mutex::new(Vec::new()),
            members: Mutex::new(Vec::new()),
            users,
            fail_writes: AtomicBool::new(false),
        })
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<ProjectEntity> {
        self.projects.lock().unwrap().clone()
    }

    pub fn assign(&self, project_id: Uuid, user_id: Uuid) {
        self.members.lock().unwrap().push((project_id, user_id));
    }

    fn check_writes(&self) -> Result<(), error::SystemError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        Ok(())
    }

    fn set_members(&self, project_id: Uuid, member_ids: &[Uuid]) {
        let mut members = self.members.lock().unwrap();
        members.retain(|(p, _)| *p != project_id);
        members.extend(member_ids.iter().map(|u| (project_id, *u)));
    }
}

#[async_trait::async_trait]
impl ProjectRepository for MemoryProjects {
    async fn list(&self) -> Result<Vec<ProjectEntity>, error::SystemError> {
        let mut projects = self.all();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<ProjectEntity>, error::SystemError> {
        Ok(self.projects.lock().unwrap().iter().find(|p| p.id == *id).cloned())
    }

    async fn find_members(&self, project_id: &Uuid) -> Result<Vec<UserEntity>, error::SystemError> {
        let ids: Vec<Uuid> = self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == project_id)
            .map(|(_, u)| *u)
            .collect();
        Ok(self.users.all().into_iter().filter(|u| ids.contains(&u.id)).collect())
    }

    async fn find_by_member(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<ProjectEntity>, error::SystemError> {
        let ids: Vec<Uuid> = self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, u)| u == user_id)
            .map(|(p, _)| *p)
            .collect();
        Ok(self.all().into_iter().filter(|p| ids.contains(&p.id)).collect())
    }

    async fn create(&self, project: &InsertProject) -> Result<ProjectEntity, error::SystemError> {
        self.check_writes()?;
        let now = chrono::Utc::now();
        let entity = ProjectEntity {
            id: Uuid::now_v7(),
            name: project.name.clone(),
            description: project.description.clone(),
            company: project.company.clone(),
            city: project.city.clone(),
            start_date: project.start_date,
            end_date: project.end_date,
            priority: project.priority,
            status: ProjectStatus::Pending,
            progression: 0,
            logo: project.logo.as_ref().map(|l| l.original.clone()),
            thumbnail: project.logo.as_ref().map(|l| l.thumbnail.clone()),
            created_at: now,
            updated_at: now,
        };
        self.projects.lock().unwrap().push(entity.clone());
        self.set_members(entity.id, &project.member_ids);
        Ok(entity)
    }

    async fn update(
        &self,
        id: &Uuid,
        project: &UpdateProject,
    ) -> Result<ProjectEntity, error::SystemError> {
        self.check_writes()?;
        let entity = {
            let mut projects = self.projects.lock().unwrap();
            let entity = projects
                .iter_mut()
                .find(|p| p.id == *id)
                .ok_or_else(|| error::SystemError::not_found("Project not found"))?;

            if let Some(name) = &project.name {
                entity.name = name.clone();
            }
            if let Some(description) = &project.description {
                entity.description = Some(description.clone());
            }
            if let Some(company) = &project.company {
                entity.company = company.clone();
            }
            if let Some(city) = &project.city {
                entity.city = city.clone();
            }
            if project.start_date.is_some() {
                entity.start_date = project.start_date;
            }
            if project.end_date.is_some() {
                entity.end_date = project.end_date;
            }
            if let Some(status) = project.status {
                entity.status = status;
            }
            if let Some(priority) = project.priority {
                entity.priority = priority;
            }
            if let Some(progression) = project.progression {
                entity.progression = progression;
            }
            if let Some(logo) = &project.logo {
                entity.logo = logo.as_ref().map(|l| l.original.clone());
                entity.thumbnail = logo.as_ref().map(|l| l.thumbnail.clone());
            }
            entity.updated_at = chrono::Utc::now();
            entity.clone()
        };

        if let Some(member_ids) = &project.member_ids {
            self.set_members(*id, member_ids);
        }
        Ok(entity)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        self.check_writes()?;
        let mut projects = self.projects.lock().unwrap();
        let before = projects.len();
        projects.retain(|p| p.id != *id);
        self.members.lock().unwrap().retain(|(p, _)| p != id);
        Ok(projects.len() < before)
    }
}

pub const BOUNDARY: &str = "workforce-test-boundary";

/// One part of a hand-built `multipart/form-data` body.
pub enum Part<'a> {
    Text(&'a str, &'a [u8]),
    File { name: &'a str, filename: &'a str, content_type: &'a str, bytes: &'a [u8] },
}

/// Content type header value and body bytes for `parts`.
pub fn multipart_body(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value);
            }
            Part::File { name, filename, content_type, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
