//! `IndexClient` — the search index write/read surface used by the
//! projector (C2) and the query API (C6).

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::document::ArtistDocument;
use crate::error::{Result, UpsertOutcome};

#[async_trait]
pub trait IndexClient: Send + Sync {
    /// Version-guarded replace: applies only if `doc.version` is strictly
    /// greater than the stored version, making the upsert idempotent under
    /// at-least-once delivery (§4.2).
    async fn upsert(&self, doc: &ArtistDocument) -> Result<UpsertOutcome>;

    /// Idempotent by definition (§4.2): deleting an absent document is not
    /// an error.
    async fn delete(&self, artist_id: Uuid) -> Result<()>;

    async fn get(&self, artist_id: Uuid) -> Result<Option<ArtistDocument>>;

    async fn search(&self, query: SearchQuery) -> Result<SearchResults>;
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub style: Option<String>,
    pub city: Option<String>,
    pub geohash_prefix: Option<String>,
    pub cursor: Option<Uuid>,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct SearchResults {
    pub items: Vec<ArtistDocument>,
    pub next_cursor: Option<Uuid>,
}

#[derive(Clone)]
pub struct PostgresIndexClient {
    pool: PgPool,
}

impl PostgresIndexClient {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl IndexClient for PostgresIndexClient {
    async fn upsert(&self, doc: &ArtistDocument) -> Result<UpsertOutcome> {
        let affected = sqlx::query(
            r#"
            INSERT INTO artist_search_index
                (artist_id, name, styles, geohash, city, search_terms, image_urls, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (artist_id) DO UPDATE SET
                name = EXCLUDED.name,
                styles = EXCLUDED.styles,
                geohash = EXCLUDED.geohash,
                city = EXCLUDED.city,
                search_terms = EXCLUDED.search_terms,
                image_urls = EXCLUDED.image_urls,
                version = EXCLUDED.version,
                updated_at = now()
            WHERE artist_search_index.version < EXCLUDED.version
            "#,
        )
        .bind(doc.artist_id)
        .bind(&doc.name)
        .bind(&doc.styles)
        .bind(&doc.geohash)
        .bind(&doc.city)
        .bind(&doc.search_terms)
        .bind(&doc.image_urls)
        .bind(doc.version)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            // Either the document already exists at this version or later
            // (stale event), or nothing was inserted because of a race
            // that another caller won. Distinguish by re-reading.
            let stored_version: Option<i64> =
                sqlx::query_scalar("SELECT version FROM artist_search_index WHERE artist_id = $1")
                    .bind(doc.artist_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if stored_version.is_some() && stored_version != Some(doc.version) {
                return Ok(UpsertOutcome::Stale);
            }
        }

        Ok(UpsertOutcome::Applied)
    }

    async fn delete(&self, artist_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM artist_search_index WHERE artist_id = $1")
            .bind(artist_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, artist_id: Uuid) -> Result<Option<ArtistDocument>> {
        let row: Option<(Uuid, String, Vec<String>, String, String, String, Vec<String>, i64)> =
            sqlx::query_as(
                "SELECT artist_id, name, styles, geohash, city, search_terms, image_urls, version
                 FROM artist_search_index WHERE artist_id = $1",
            )
            .bind(artist_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| ArtistDocument {
            artist_id: r.0,
            name: r.1,
            styles: r.2,
            geohash: r.3,
            city: r.4,
            search_terms: r.5,
            image_urls: r.6,
            version: r.7,
        }))
    }

    async fn search(&self, query: SearchQuery) -> Result<SearchResults> {
        let limit = query.limit.clamp(1, 50);
        let rows: Vec<(Uuid, String, Vec<String>, String, String, String, Vec<String>, i64)> =
            sqlx::query_as(
                r#"
                SELECT artist_id, name, styles, geohash, city, search_terms, image_urls, version
                FROM artist_search_index
                WHERE ($1::text IS NULL OR $1 = ANY(styles))
                  AND ($2::text IS NULL OR city ILIKE $2)
                  AND ($3::text IS NULL OR geohash LIKE $3 || '%')
                  AND ($4::uuid IS NULL OR artist_id > $4)
                ORDER BY artist_id
                LIMIT $5
                "#,
            )
            .bind(&query.style)
            .bind(query.city.as_ref().map(|c| format!("%{c}%")))
            .bind(&query.geohash_prefix)
            .bind(query.cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let next_cursor = rows.last().map(|r| r.0);
        let items = rows
            .into_iter()
            .map(|r| ArtistDocument {
                artist_id: r.0,
                name: r.1,
                styles: r.2,
                geohash: r.3,
                city: r.4,
                search_terms: r.5,
                image_urls: r.6,
                version: r.7,
            })
            .collect();

        Ok(SearchResults { items, next_cursor })
    }
}
