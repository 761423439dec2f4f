use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::access::{Role, RoleSource};

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A row of `public.profiles`. `role` is the raw token as stored; it is only
/// trusted after normalization through the access gate.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    // Deactivated accounts keep their row but can no longer sign in.
    pub is_active: bool,
}

/// DesignStage
///
/// Design-thinking stage a resource is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DesignStage {
    Empathize,
    Define,
    Ideate,
    Prototype,
    Test,
}

impl DesignStage {
    pub fn as_str(self) -> &'static str {
        match self {
            DesignStage::Empathize => "empathize",
            DesignStage::Define => "define",
            DesignStage::Ideate => "ideate",
            DesignStage::Prototype => "prototype",
            DesignStage::Test => "test",
        }
    }
}

/// ResourceStatus
///
/// Review state of a submission. Every resource starts `Pending`; only an
/// administrator moves it to `Approved` or `Rejected`, and only once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ResourceStatus {
    Pending,
    Approved,
    Rejected,
}

impl ResourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceStatus::Pending => "pending",
            ResourceStatus::Approved => "approved",
            ResourceStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource
///
/// A shared learning resource from `public.resources`. Only `approved` rows
/// are visible on public routes.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Resource {
    pub id: Uuid,
    // FK to public.profiles.id (uploader).
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    // One of the `DesignStage` tokens.
    pub design_stage: String,
    // S3 key returned by the presigned upload flow.
    pub file_key: String,
    // One of the `ResourceStatus` tokens.
    pub status: String,
    // Administrator who approved or rejected the submission.
    pub reviewed_by: Option<Uuid>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Flag
///
/// A moderation report against a resource, joined with the resource title.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Flag {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub reporter_id: Uuid,
    pub reason: String,
    pub resolved: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    // Loaded via a JOIN in the repository query.
    #[sqlx(default)]
    pub resource_title: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// CreateResourceRequest
///
/// Input payload for POST /resources. The file is uploaded beforehand through
/// the presigned URL flow and referenced by its key.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateResourceRequest {
    pub title: String,
    pub description: String,
    pub design_stage: DesignStage,
    pub file_key: String,
}

/// RegisterUserRequest
///
/// Input payload for POST /register. The password is forwarded to Supabase
/// and never stored or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
    #[ts(type = "string | { name: string }")]
    #[schema(value_type = String, example = "student")]
    pub role: RoleSource,
}

/// UpdateUserRequest
///
/// Body of PATCH /admin/users/{id}. Either field may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | { name: string } | null")]
    #[schema(value_type = Option<String>, example = "faculty")]
    pub role: Option<RoleSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// CreateFlagRequest
///
/// Input payload for POST /resources/{id}/flag.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateFlagRequest {
    pub reason: String,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived S3 upload URL (POST /upload/presigned).
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "journey_map.pdf")]
    pub filename: String,
    /// The MIME type the upload is constrained to.
    #[schema(example = "application/pdf")]
    pub file_type: String,
}

/// PresignedUrlResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to reference in `CreateResourceRequest::file_key`.
    pub resource_key: String,
}

// --- Dashboard & Profile Schemas (Output) ---

/// AdminDashboardStats
///
/// Output schema for GET /admin/stats.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_resources: i64,
    pub total_users: i64,
    /// Resources still awaiting review.
    pub pending_reviews: i64,
    /// Flags not yet resolved.
    pub open_flags: i64,
}

/// UserProfile
///
/// Output schema for GET /me, carrying the canonical role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}
