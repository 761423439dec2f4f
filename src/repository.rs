use crate::access::Role;
use crate::models::{
    AdminDashboardStats, CreateResourceRequest, DesignStage, Flag, Resource, ResourceStatus, User,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Abstract contract for every persistence operation. Handlers and the
/// identity resolver only see `Arc<dyn Repository>`, so tests swap in mocks.
///
/// Database failures are returned rather than swallowed; the handler layer
/// turns them into a visible error response.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Public catalogue ---
    // Approved resources only, optionally filtered by stage and search text.
    async fn list_approved_resources(
        &self,
        stage: Option<DesignStage>,
        search: Option<String>,
    ) -> Result<Vec<Resource>, sqlx::Error>;
    async fn get_approved_resource(&self, id: Uuid) -> Result<Option<Resource>, sqlx::Error>;

    // --- Uploader actions ---
    async fn get_my_resources(&self, owner_id: Uuid) -> Result<Vec<Resource>, sqlx::Error>;
    // New resources always start in `pending`.
    async fn create_resource(
        &self,
        req: CreateResourceRequest,
        owner_id: Uuid,
    ) -> Result<Resource, sqlx::Error>;
    // Returns None unless the resource exists and is approved.
    async fn flag_resource(
        &self,
        resource_id: Uuid,
        reporter_id: Uuid,
        reason: String,
    ) -> Result<Option<Flag>, sqlx::Error>;

    // --- Moderation ---
    async fn list_pending_resources(&self) -> Result<Vec<Resource>, sqlx::Error>;
    // Moves a `pending` resource to `status`. None if it is missing or already reviewed.
    async fn review_resource(
        &self,
        id: Uuid,
        status: ResourceStatus,
        reviewer_id: Uuid,
    ) -> Result<Option<Resource>, sqlx::Error>;
    async fn list_open_flags(&self) -> Result<Vec<Flag>, sqlx::Error>;
    async fn resolve_flag(&self, id: Uuid) -> Result<bool, sqlx::Error>;
    async fn get_stats(&self) -> Result<AdminDashboardStats, sqlx::Error>;

    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn create_user(&self, user: User) -> Result<User, sqlx::Error>;
    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error>;
    // Partial update; omitted fields keep their value. None if the user does not exist.
    async fn update_user(
        &self,
        id: Uuid,
        role: Option<Role>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const RESOURCE_COLUMNS: &str = "id, owner_id, title, description, design_stage, file_key, \
     status, reviewed_by, created_at, updated_at";
const USER_COLUMNS: &str = "id, email, role, is_active";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_approved_resources
    ///
    /// Builds the filter with `QueryBuilder` so every user value is bound.
    /// `status = 'approved'` is part of the base query and cannot be dropped.
    async fn list_approved_resources(
        &self,
        stage: Option<DesignStage>,
        search: Option<String>,
    ) -> Result<Vec<Resource>, sqlx::Error> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE status = 'approved'"
        ));

        if let Some(stage) = stage {
            builder.push(" AND design_stage = ");
            builder.push_bind(stage.as_str());
        }

        if let Some(s) = search {
            let search_pattern = format!("%{}%", s);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(search_pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        builder
            .build_query_as::<Resource>()
            .fetch_all(&self.pool)
            .await
    }

    async fn get_approved_resource(&self, id: Uuid) -> Result<Option<Resource>, sqlx::Error> {
        sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1 AND status = 'approved'"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_my_resources(&self, owner_id: Uuid) -> Result<Vec<Resource>, sqlx::Error> {
        sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_resource(
        &self,
        req: CreateResourceRequest,
        owner_id: Uuid,
    ) -> Result<Resource, sqlx::Error> {
        sqlx::query_as::<_, Resource>(&format!(
            "INSERT INTO resources (id, owner_id, title, description, design_stage, file_key, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'pending', NOW(), NOW()) \
             RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.design_stage.as_str())
        .bind(req.file_key)
        .fetch_one(&self.pool)
        .await
    }

    /// flag_resource
    ///
    /// Inserts through a SELECT on approved `resources`, so a flag against a
    /// missing, pending or rejected resource inserts nothing and yields `None`.
    async fn flag_resource(
        &self,
        resource_id: Uuid,
        reporter_id: Uuid,
        reason: String,
    ) -> Result<Option<Flag>, sqlx::Error> {
        sqlx::query_as::<_, Flag>(
            r#"
            WITH inserted AS (
                INSERT INTO flags (id, resource_id, reporter_id, reason, resolved, created_at)
                SELECT $1, r.id, $3, $4, false, NOW() FROM resources r
                WHERE r.id = $2 AND r.status = 'approved'
                RETURNING id, resource_id, reporter_id, reason, resolved, created_at
            )
            SELECT i.id, i.resource_id, i.reporter_id, i.reason, i.resolved, i.created_at,
                   r.title AS resource_title
            FROM inserted i JOIN resources r ON i.resource_id = r.id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(resource_id)
        .bind(reporter_id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_pending_resources(&self) -> Result<Vec<Resource>, sqlx::Error> {
        sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE status = 'pending' ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// review_resource
    ///
    /// The `status = 'pending'` guard makes approve/reject a one-shot transition.
    async fn review_resource(
        &self,
        id: Uuid,
        status: ResourceStatus,
        reviewer_id: Uuid,
    ) -> Result<Option<Resource>, sqlx::Error> {
        sqlx::query_as::<_, Resource>(&format!(
            "UPDATE resources SET status = $1, reviewed_by = $2, updated_at = NOW() \
             WHERE id = $3 AND status = 'pending' \
             RETURNING {RESOURCE_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(reviewer_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_open_flags(&self) -> Result<Vec<Flag>, sqlx::Error> {
        sqlx::query_as::<_, Flag>(
            r#"
            SELECT f.id, f.resource_id, f.reporter_id, f.reason, f.resolved, f.created_at,
                   r.title AS resource_title
            FROM flags f
            JOIN resources r ON f.resource_id = r.id
            WHERE f.resolved = false
            ORDER BY f.created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn resolve_flag(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE flags SET resolved = true WHERE id = $1 AND resolved = false")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// get_stats
    ///
    /// All dashboard counters in one round trip.
    async fn get_stats(&self) -> Result<AdminDashboardStats, sqlx::Error> {
        let (total_resources, total_users, pending_reviews, open_flags): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM resources),
                    (SELECT COUNT(*) FROM profiles),
                    (SELECT COUNT(*) FROM resources WHERE status = 'pending'),
                    (SELECT COUNT(*) FROM flags WHERE resolved = false)
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(AdminDashboardStats {
            total_resources,
            total_users,
            pending_reviews,
            open_flags,
        })
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM profiles WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// create_user
    ///
    /// Mirrors an external auth account into `public.profiles`.
    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO profiles (id, email, role, is_active) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(user.email)
        .bind(user.role)
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM profiles ORDER BY email ASC"))
            .fetch_all(&self.pool)
            .await
    }

    /// update_user
    ///
    /// `COALESCE` keeps the stored value for every omitted field.
    async fn update_user(
        &self,
        id: Uuid,
        role: Option<Role>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE profiles SET role = COALESCE($2, role), is_active = COALESCE($3, is_active) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role.map(Role::as_str))
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
    }
}
