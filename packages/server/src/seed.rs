use sea_orm::*;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use tracing::info;

use crate::entity::{
    contest_application, contest_submission, giveaway_entry, points_transaction, role,
    role_permission,
};

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    // Member
    ("member", "contest:apply"),
    ("member", "giveaway:enter"),
    // Brand admin: runs contests and giveaways
    ("brand_admin", "contest:apply"),
    ("brand_admin", "contest:create"),
    ("brand_admin", "contest:manage"),
    ("brand_admin", "contest:judge"),
    ("brand_admin", "giveaway:enter"),
    ("brand_admin", "giveaway:manage"),
    ("brand_admin", "giveaway:draw"),
    ("brand_admin", "analytics:view"),
    // Bass admin: everything
    ("bass_admin", "contest:apply"),
    ("bass_admin", "contest:create"),
    ("bass_admin", "contest:manage"),
    ("bass_admin", "contest:judge"),
    ("bass_admin", "contest:delete"),
    ("bass_admin", "giveaway:enter"),
    ("bass_admin", "giveaway:manage"),
    ("bass_admin", "giveaway:draw"),
    ("bass_admin", "analytics:view"),
    ("bass_admin", "user:manage"),
    ("bass_admin", "points:adjust"),
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut roles_inserted = 0u32;
    for &name in role::ALL_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(role::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => roles_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => perms_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Ensure composite indexes exist.
///
/// Schema sync can't express multi-column uniqueness, so the one-row-per-user
/// rules are backed by unique indexes created here. Unlike the lookup
/// index, a failure here is fatal: handlers rely on these to map duplicate
/// inserts to 409.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let unique = [
        Index::create()
            .if_not_exists()
            .unique()
            .name("idx_application_contest_user")
            .table(contest_application::Entity)
            .col(contest_application::Column::ContestId)
            .col(contest_application::Column::UserId)
            .to_string(PostgresQueryBuilder),
        Index::create()
            .if_not_exists()
            .unique()
            .name("idx_submission_contest_user")
            .table(contest_submission::Entity)
            .col(contest_submission::Column::ContestId)
            .col(contest_submission::Column::UserId)
            .to_string(PostgresQueryBuilder),
        Index::create()
            .if_not_exists()
            .unique()
            .name("idx_entry_giveaway_user")
            .table(giveaway_entry::Entity)
            .col(giveaway_entry::Column::GiveawayId)
            .col(giveaway_entry::Column::UserId)
            .to_string(PostgresQueryBuilder),
    ];

    for stmt in unique {
        db.execute_unprepared(&stmt).await?;
    }
    info!("Ensured unique indexes exist");

    // History queries:
    // SELECT * FROM points_transaction WHERE user_id = ? ORDER BY created_at DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_points_user_created")
        .table(points_transaction::Entity)
        .col(points_transaction::Column::UserId)
        .col(points_transaction::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_points_user_created exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_points_user_created: {}", e);
        }
    }

    Ok(())
}
