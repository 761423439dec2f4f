//! Fixed rows every environment starts from.
//!
//! Every statement is an upsert, so running the seed twice leaves the same
//! data behind.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{access::Role, models::DesignStage};

pub const SUPER_ADMIN_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);

/// (token, rank) for every role; rank follows the privilege order.
pub fn role_rows() -> Vec<(&'static str, i32)> {
    Role::ALL
        .iter()
        .zip(1..)
        .map(|(role, rank)| (role.as_str(), rank))
        .collect()
}

struct SampleResource {
    id: Uuid,
    title: &'static str,
    description: &'static str,
    stage: DesignStage,
    file_key: &'static str,
}

fn sample_resources() -> [SampleResource; 3] {
    [
        SampleResource {
            id: Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0101),
            title: "Interview guide template",
            description: "Question bank for first-round user interviews.",
            stage: DesignStage::Empathize,
            file_key: "seed/interview-guide.pdf",
        },
        SampleResource {
            id: Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0102),
            title: "How-might-we worksheet",
            description: "Reframing problem statements into opportunity questions.",
            stage: DesignStage::Define,
            file_key: "seed/how-might-we.pdf",
        },
        SampleResource {
            id: Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0103),
            title: "Usability test script",
            description: "Moderator script and observation sheet.",
            stage: DesignStage::Test,
            file_key: "seed/usability-script.pdf",
        },
    ]
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub roles: u64,
    pub users: u64,
    pub resources: u64,
    /// Profile holding the bootstrap super admin role.
    pub admin_id: Uuid,
}

/// Upserts the role table, the bootstrap super admin and the sample
/// resources inside one transaction.
///
/// When `admin_email` already belongs to a registered profile, that profile
/// is promoted and owns the samples instead of [`SUPER_ADMIN_ID`].
pub async fn run(pool: &PgPool, admin_email: &str) -> Result<SeedReport, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut report = SeedReport::default();

    for (name, rank) in role_rows() {
        report.roles += sqlx::query(
            "INSERT INTO roles (name, rank) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET rank = EXCLUDED.rank",
        )
        .bind(name)
        .bind(rank)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    let registered: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM profiles WHERE email = $1")
        .bind(admin_email)
        .fetch_optional(&mut *tx)
        .await?;

    report.admin_id = match registered {
        Some((id,)) => {
            report.users += sqlx::query(
                "UPDATE profiles SET role = $2, is_active = true WHERE id = $1",
            )
            .bind(id)
            .bind(Role::SuperAdmin.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
            id
        }
        None => {
            report.users += sqlx::query(
                "INSERT INTO profiles (id, email, role, is_active) VALUES ($1, $2, $3, true) \
                 ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, role = EXCLUDED.role, is_active = true",
            )
            .bind(SUPER_ADMIN_ID)
            .bind(admin_email)
            .bind(Role::SuperAdmin.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
            SUPER_ADMIN_ID
        }
    };

    for sample in sample_resources() {
        report.resources += sqlx::query(
            "INSERT INTO resources (id, owner_id, title, description, design_stage, file_key, status, reviewed_by) \
             VALUES ($1, $2, $3, $4, $5, $6, 'approved', $2) \
             ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title, description = EXCLUDED.description, \
             design_stage = EXCLUDED.design_stage, file_key = EXCLUDED.file_key",
        )
        .bind(sample.id)
        .bind(report.admin_id)
        .bind(sample.title)
        .bind(sample.description)
        .bind(sample.stage.as_str())
        .bind(sample.file_key)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    Ok(report)
}
