use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use model::entities::user::{self, UserRole};
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, QueryFilter, Set};
use tracing::{debug, error, info, trace, warn};

use crate::auth::password::hash_password;
use crate::config::AppConfig;
use crate::handlers::auth::normalize_email;

pub async fn init_database(config: &AppConfig) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");
    debug!("Database URL: {}", config.database_url);

    let db: DatabaseConnection = match Database::connect(&config.database_url).await {
        Ok(connection) => {
            info!("Successfully connected to database");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", config.database_url, e);
            return Err(e.into());
        }
    };

    info!("Running database migrations");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run database migrations: {}", e);
        return Err(e.into());
    }
    info!("Database migrations completed successfully");

    match (std::env::var("SEED_ADMIN_EMAIL"), std::env::var("SEED_ADMIN_PASSWORD")) {
        (Ok(email), Ok(password)) => seed_super_admin(&db, &email, &password).await?,
        _ => debug!("SEED_ADMIN_EMAIL/SEED_ADMIN_PASSWORD not set, skipping admin seed"),
    }

    info!("Database initialization completed successfully!");
    Ok(())
}

async fn seed_super_admin(db: &DatabaseConnection, email: &str, password: &str) -> Result<()> {
    let email = normalize_email(email);
    let existing = user::Entity::find_active()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        warn!("User {} already exists, not seeding a super admin", email);
        return Ok(());
    }

    let password_hash = hash_password(password).context("hashing seed admin password")?;
    let admin = user::ActiveModel {
        name: Set("Administrator".to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(UserRole::SuperAdmin),
        group_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Seeded super admin {} with ID {}", admin.email, admin.id);
    Ok(())
}
