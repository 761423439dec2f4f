#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use resource_hub::{
    AppConfig, AppState, MockStorageService,
    access::Role,
    auth::Claims,
    config::Env,
    models::{
        AdminDashboardStats, CreateResourceRequest, DesignStage, Flag, Resource, ResourceStatus,
        User,
    },
    repository::Repository,
};
use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

pub const STUDENT_ID: Uuid = Uuid::from_u128(1);
pub const FACULTY_ID: Uuid = Uuid::from_u128(2);
pub const ADMIN_ID: Uuid = Uuid::from_u128(3);
pub const SUPER_ADMIN_ID: Uuid = Uuid::from_u128(4);
pub const ROGUE_ID: Uuid = Uuid::from_u128(5);
pub const INACTIVE_ID: Uuid = Uuid::from_u128(6);

/// In-memory repository with the same visibility and transition rules as
/// the Postgres implementation.
#[derive(Default)]
pub struct MockRepo {
    pub users: Mutex<Vec<User>>,
    pub resources: Mutex<Vec<Resource>>,
    pub flags: Mutex<Vec<Flag>>,
    pub fail: bool,
}

impl MockRepo {
    /// One account per role, plus an unknown role and a deactivated admin.
    pub fn with_standard_users() -> Self {
        let repo = MockRepo::default();
        {
            let mut users = repo.users.lock().unwrap();
            users.push(user(STUDENT_ID, "student", true));
            users.push(user(FACULTY_ID, "Faculty", true));
            users.push(user(ADMIN_ID, "admin", true));
            users.push(user(SUPER_ADMIN_ID, "SuperAdmin", true));
            users.push(user(ROGUE_ID, "Superuser", true));
            users.push(user(INACTIVE_ID, "admin", false));
        }
        repo
    }

    pub fn failing() -> Self {
        MockRepo {
            fail: true,
            ..MockRepo::default()
        }
    }

    pub fn with_resources(self, resources: Vec<Resource>) -> Self {
        *self.resources.lock().unwrap() = resources;
        self
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.fail {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }
}

pub fn user(id: Uuid, role: &str, is_active: bool) -> User {
    User {
        id,
        email: format!("{}@uni.test", id.simple()),
        role: role.to_string(),
        is_active,
    }
}

pub fn resource(id: u128, owner_id: Uuid, stage: DesignStage, status: ResourceStatus) -> Resource {
    Resource {
        id: Uuid::from_u128(id),
        owner_id,
        title: format!("Resource {id}"),
        description: "Worksheet".to_string(),
        design_stage: stage.as_str().to_string(),
        file_key: format!("uploads/{id}.pdf"),
        status: status.as_str().to_string(),
        reviewed_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn list_approved_resources(
        &self,
        stage: Option<DesignStage>,
        search: Option<String>,
    ) -> Result<Vec<Resource>, sqlx::Error> {
        self.check()?;
        let search = search.map(|s| s.to_lowercase());
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == "approved")
            .filter(|r| stage.is_none_or(|s| r.design_stage == s.as_str()))
            .filter(|r| {
                search.as_ref().is_none_or(|s| {
                    r.title.to_lowercase().contains(s) || r.description.to_lowercase().contains(s)
                })
            })
            .cloned()
            .collect())
    }

    async fn get_approved_resource(&self, id: Uuid) -> Result<Option<Resource>, sqlx::Error> {
        self.check()?;
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && r.status == "approved")
            .cloned())
    }

    async fn get_my_resources(&self, owner_id: Uuid) -> Result<Vec<Resource>, sqlx::Error> {
        self.check()?;
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create_resource(
        &self,
        req: CreateResourceRequest,
        owner_id: Uuid,
    ) -> Result<Resource, sqlx::Error> {
        self.check()?;
        let created = Resource {
            id: Uuid::new_v4(),
            owner_id,
            title: req.title,
            description: req.description,
            design_stage: req.design_stage.as_str().to_string(),
            file_key: req.file_key,
            status: "pending".to_string(),
            reviewed_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.resources.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn flag_resource(
        &self,
        resource_id: Uuid,
        reporter_id: Uuid,
        reason: String,
    ) -> Result<Option<Flag>, sqlx::Error> {
        self.check()?;
        let title = self
            .resources
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == resource_id && r.status == "approved")
            .map(|r| r.title.clone());
        let Some(title) = title else {
            return Ok(None);
        };
        let flag = Flag {
            id: Uuid::new_v4(),
            resource_id,
            reporter_id,
            reason,
            resolved: false,
            created_at: Utc::now(),
            resource_title: Some(title),
        };
        self.flags.lock().unwrap().push(flag.clone());
        Ok(Some(flag))
    }

    async fn list_pending_resources(&self) -> Result<Vec<Resource>, sqlx::Error> {
        self.check()?;
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == "pending")
            .cloned()
            .collect())
    }

    async fn review_resource(
        &self,
        id: Uuid,
        status: ResourceStatus,
        reviewer_id: Uuid,
    ) -> Result<Option<Resource>, sqlx::Error> {
        self.check()?;
        let mut resources = self.resources.lock().unwrap();
        Ok(resources
            .iter_mut()
            .find(|r| r.id == id && r.status == "pending")
            .map(|r| {
                r.status = status.as_str().to_string();
                r.reviewed_by = Some(reviewer_id);
                r.clone()
            }))
    }

    async fn list_open_flags(&self) -> Result<Vec<Flag>, sqlx::Error> {
        self.check()?;
        Ok(self
            .flags
            .lock()
            .unwrap()
            .iter()
            .filter(|f| !f.resolved)
            .cloned()
            .collect())
    }

    async fn resolve_flag(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        self.check()?;
        let mut flags = self.flags.lock().unwrap();
        match flags.iter_mut().find(|f| f.id == id && !f.resolved) {
            Some(flag) => {
                flag.resolved = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_stats(&self) -> Result<AdminDashboardStats, sqlx::Error> {
        self.check()?;
        let resources = self.resources.lock().unwrap();
        Ok(AdminDashboardStats {
            total_resources: resources.len() as i64,
            total_users: self.users.lock().unwrap().len() as i64,
            pending_reviews: resources.iter().filter(|r| r.status == "pending").count() as i64,
            open_flags: self.flags.lock().unwrap().iter().filter(|f| !f.resolved).count() as i64,
        })
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        self.check()?;
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        self.check()?;
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        self.check()?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn update_user(
        &self,
        id: Uuid,
        role: Option<Role>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, sqlx::Error> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            if let Some(role) = role {
                u.role = role.as_str().to_string();
            }
            if let Some(is_active) = is_active {
                u.is_active = is_active;
            }
            u.clone()
        }))
    }
}

/// AppState over `repo` with the bypass header disabled and the test secret.
pub fn test_state(repo: MockRepo) -> AppState {
    state_in(Env::Production, repo)
}

pub fn state_in(env: Env, repo: MockRepo) -> AppState {
    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(Arc::new(repo), Arc::new(MockStorageService::new()), config)
}

/// HS256 session token for `user_id`, valid for `ttl_secs`.
pub fn token_for(user_id: Uuid, ttl_secs: u64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + ttl_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Token whose expiry is well past the default validation leeway.
pub fn expired_token_for(user_id: Uuid) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = Claims {
        sub: user_id,
        iat: (now - 7200) as usize,
        exp: (now - 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}
