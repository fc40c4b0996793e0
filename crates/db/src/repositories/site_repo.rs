//! Repository for the `sites` table.

use sqlx::PgPool;

use crate::models::site::{CreateSite, Site};

const COLUMNS: &str = "id, site_id, site_name, location, latitude, longitude, city, state, created_at";

/// Read access to sites, plus an insert used by seeding and tests.
pub struct SiteRepo;

impl SiteRepo {
    /// Insert a new site, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSite) -> Result<Site, sqlx::Error> {
        let query = format!(
            "INSERT INTO sites (site_id, site_name, location, latitude, longitude, city, state)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Site>(&query)
            .bind(&input.site_id)
            .bind(&input.site_name)
            .bind(&input.location)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(&input.city)
            .bind(&input.state)
            .fetch_one(pool)
            .await
    }

    /// List all sites ordered by business key.
    pub async fn list(pool: &PgPool) -> Result<Vec<Site>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sites ORDER BY site_id");
        sqlx::query_as::<_, Site>(&query).fetch_all(pool).await
    }
}
