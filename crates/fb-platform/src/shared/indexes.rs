//! MongoDB Index Initialization
//!
//! Creates indexes for all collections on application startup.

use mongodb::{bson::doc, options::IndexOptions, Database, IndexModel};
use tracing::info;

/// Initialize all MongoDB indexes
pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    info!("Initializing MongoDB indexes...");

    create_user_indexes(db).await?;
    create_feature_indexes(db).await?;

    info!("MongoDB indexes initialized successfully");
    Ok(())
}

async fn create_user_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let users = db.collection::<mongodb::bson::Document>("users");

    // Username lookup (unique)
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "username": 1 })
                .options(IndexOptions::builder().unique(true).background(true).build())
                .build(),
        )
        .await?;

    // Email lookup (unique)
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).background(true).build())
                .build(),
        )
        .await?;

    info!("Created indexes on users");
    Ok(())
}

async fn create_feature_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    let features = db.collection::<mongodb::bson::Document>("features");

    // Embedded comment lookup, used by the positional comment edit
    features
        .create_index(
            IndexModel::builder()
                .keys(doc! { "comments._id": 1 })
                .options(IndexOptions::builder().background(true).build())
                .build(),
        )
        .await?;

    // Newest-first sorting
    features
        .create_index(
            IndexModel::builder()
                .keys(doc! { "createdAt": -1 })
                .options(IndexOptions::builder().background(true).build())
                .build(),
        )
        .await?;

    info!("Created indexes on features");
    Ok(())
}
