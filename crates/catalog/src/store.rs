//! `CatalogStore` — typed access to the single-table catalog (§4.1).

use std::collections::BTreeMap;

use chrono::Utc;
use core_common::geo::{style_shard_for_artist, STYLE_SHARD_COUNT};
use futures::future::join_all;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::change_event::ChangeEventType;
use crate::error::{CatalogError, Result, WriteOutcome};
use crate::record::{Artist, ArtistWithImages, PortfolioImage, Studio, Style};

#[derive(Clone)]
pub struct CatalogStore {
    pool: PgPool,
}

impl CatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CatalogError::Other(e.into()))?;
        self.seed_styles().await?;
        Ok(())
    }

    /// Upserts the built-in Style vocabulary (§3). Idempotent — re-running
    /// migrations just refreshes the same rows with the current list.
    async fn seed_styles(&self) -> Result<()> {
        for style in crate::style_seed::default_styles() {
            self.put_style(&style).await?;
        }
        Ok(())
    }

    /// Writes or replaces one Style reference row.
    pub async fn put_style(&self, style: &Style) -> Result<()> {
        let pk = style_pk(&style.id);
        let payload = serde_json::to_value(style).map_err(|e| CatalogError::Other(e.into()))?;
        sqlx::query(
            r#"
            INSERT INTO catalog_records (pk, sk, record_type, payload, version, updated_at)
            VALUES ($1, 'METADATA', 'STYLE', $2, 1, now())
            ON CONFLICT (pk, sk) DO UPDATE SET payload = EXCLUDED.payload, updated_at = now()
            "#,
        )
        .bind(&pk)
        .bind(&payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Single-style lookup by canonical id. Used by the projector to expand
    /// a document's styles into their aliases for `build_search_terms` (§4.2).
    pub async fn get_style(&self, id: &str) -> Result<Option<Style>> {
        let pk = style_pk(id);
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT payload FROM catalog_records WHERE pk = $1 AND sk = 'METADATA'")
                .bind(&pk)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(payload,)| serde_json::from_value(payload).map_err(|e| CatalogError::Other(e.into())))
            .transpose()
    }

    /// Full vocabulary, used by the worker to resolve scraped mentions
    /// (including aliases) to canonical style ids (§4.4).
    pub async fn list_styles(&self) -> Result<Vec<Style>> {
        let rows: Vec<(serde_json::Value,)> =
            sqlx::query_as("SELECT payload FROM catalog_records WHERE record_type = 'STYLE'")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(payload,)| serde_json::from_value(payload).map_err(|e| CatalogError::Other(e.into())))
            .collect()
    }

    /// Writes the Studio metadata record. Conditional on the existing row
    /// being absent or not already `opted_out` (§4.1) — rediscovery never
    /// silently reinstates a soft-deleted studio.
    pub async fn put_studio(&self, studio: &Studio) -> Result<()> {
        let pk = studio_pk(studio.id);
        let existing_opted_out: Option<bool> = sqlx::query_scalar(
            "SELECT (payload->>'opted_out')::boolean FROM catalog_records WHERE pk = $1 AND sk = 'METADATA'",
        )
        .bind(&pk)
        .fetch_optional(&self.pool)
        .await?;

        if existing_opted_out == Some(true) {
            return Ok(());
        }

        let payload = serde_json::to_value(studio).map_err(|e| CatalogError::Other(e.into()))?;
        sqlx::query(
            r#"
            INSERT INTO catalog_records (pk, sk, record_type, payload, version, gsi2_pk, gsi2_sk, updated_at)
            VALUES ($1, 'METADATA', 'STUDIO', $2, 1, $3, $4, now())
            ON CONFLICT (pk, sk) DO UPDATE SET
                payload = EXCLUDED.payload,
                gsi2_pk = EXCLUDED.gsi2_pk,
                gsi2_sk = EXCLUDED.gsi2_sk,
                updated_at = now()
            "#,
        )
        .bind(&pk)
        .bind(&payload)
        .bind(format!("STUDIONAME#{}", studio.name.to_lowercase()))
        .bind(&pk)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Transactionally writes the Artist metadata record, replaces the
    /// image child-set, and sets `last_scrape_run_id`. Guarded: no-ops
    /// (returns `AlreadyApplied`) if `scrape_run_id` matches the stored one
    /// (§3, §4.1, §8 "Idempotency of scrape application").
    pub async fn put_artist(
        &self,
        artist: &Artist,
        images: &[PortfolioImage],
        scrape_run_id: &str,
    ) -> Result<WriteOutcome> {
        if let Some(home_studio_id) = artist.home_studio_id {
            let exists: Option<(i64,)> = sqlx::query_as(
                "SELECT 1 FROM catalog_records WHERE pk = $1 AND sk = 'METADATA'",
            )
            .bind(studio_pk(home_studio_id))
            .fetch_optional(&self.pool)
            .await?;
            if exists.is_none() {
                return Err(CatalogError::HomeStudioMissing(home_studio_id));
            }
        }

        let pk = artist_pk(artist.id);
        let mut tx = self.pool.begin().await?;

        let current: Option<(i64, Option<String>)> = sqlx::query_as(
            "SELECT version, last_scrape_run_id FROM catalog_records
             WHERE pk = $1 AND sk = 'METADATA' FOR UPDATE",
        )
        .bind(&pk)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some((_, Some(stored_run_id))) = &current {
            if stored_run_id == scrape_run_id {
                tx.rollback().await?;
                return Ok(WriteOutcome::AlreadyApplied);
            }
        }

        let new_version = current.as_ref().map(|(v, _)| v + 1).unwrap_or(1);
        let event_type = if current.is_some() {
            ChangeEventType::Modify
        } else {
            ChangeEventType::Insert
        };

        let mut artist = artist.clone();
        artist.version = new_version;
        artist.last_successful_scrape_id = Some(scrape_run_id.to_string());
        artist.last_scrape_at = Some(Utc::now());

        self.write_artist_metadata(&mut tx, &artist, scrape_run_id, new_version)
            .await?;
        self.replace_style_memberships(&mut tx, &artist).await?;
        self.replace_images(&mut tx, artist.id, images).await?;
        self.emit_change_event(&mut tx, &pk, event_type, new_version, &artist, images)
            .await?;

        tx.commit().await?;
        Ok(WriteOutcome::Applied { version: new_version })
    }

    async fn write_artist_metadata(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        artist: &Artist,
        scrape_run_id: &str,
        version: i64,
    ) -> Result<()> {
        let pk = artist_pk(artist.id);
        let payload = serde_json::to_value(artist).map_err(|e| CatalogError::Other(e.into()))?;
        let gsi3 = artist
            .contact_handle
            .as_ref()
            .map(|h| format!("INSTAGRAM#{h}"));

        sqlx::query(
            r#"
            INSERT INTO catalog_records
                (pk, sk, record_type, payload, version, last_scrape_run_id, gsi2_pk, gsi2_sk, gsi3_pk, gsi3_sk, updated_at)
            VALUES ($1, 'METADATA', 'ARTIST', $2, $3, $4, $5, $6, $7, $6, now())
            ON CONFLICT (pk, sk) DO UPDATE SET
                payload = EXCLUDED.payload,
                version = EXCLUDED.version,
                last_scrape_run_id = EXCLUDED.last_scrape_run_id,
                gsi2_pk = EXCLUDED.gsi2_pk,
                gsi2_sk = EXCLUDED.gsi2_sk,
                gsi3_pk = EXCLUDED.gsi3_pk,
                gsi3_sk = EXCLUDED.gsi3_sk,
                updated_at = now()
            "#,
        )
        .bind(&pk)
        .bind(&payload)
        .bind(version)
        .bind(scrape_run_id)
        .bind(format!("ARTISTNAME#{}", artist.name.to_lowercase()))
        .bind(&pk)
        .bind(&gsi3)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn replace_style_memberships(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        artist: &Artist,
    ) -> Result<()> {
        let pk = artist_pk(artist.id);
        sqlx::query("DELETE FROM catalog_records WHERE pk = $1 AND sk LIKE 'STYLE#%'")
            .bind(&pk)
            .execute(&mut **tx)
            .await?;

        let shard = style_shard_for_artist(&artist.id);
        for style in &artist.styles {
            let sk = format!("STYLE#{style}");
            let gsi1_pk = format!("STYLE#{style}#SHARD#{shard}");
            let gsi1_sk = format!("GEOHASH#{}#ARTIST#{}", artist.geohash, artist.id);
            sqlx::query(
                r#"
                INSERT INTO catalog_records (pk, sk, record_type, payload, version, gsi1_pk, gsi1_sk, updated_at)
                VALUES ($1, $2, 'ARTIST_STYLE', $3, 1, $4, $5, now())
                "#,
            )
            .bind(&pk)
            .bind(&sk)
            .bind(serde_json::json!({"artist_id": artist.id, "style": style}))
            .bind(&gsi1_pk)
            .bind(&gsi1_sk)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn replace_images(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        artist_id: Uuid,
        images: &[PortfolioImage],
    ) -> Result<()> {
        let pk = artist_pk(artist_id);
        sqlx::query("DELETE FROM catalog_records WHERE pk = $1 AND sk LIKE 'IMAGE#%'")
            .bind(&pk)
            .execute(&mut **tx)
            .await?;

        for (n, image) in images.iter().enumerate() {
            let sk = format!("IMAGE#{n}");
            let payload = serde_json::to_value(image).map_err(|e| CatalogError::Other(e.into()))?;
            sqlx::query(
                r#"
                INSERT INTO catalog_records (pk, sk, record_type, payload, version, updated_at)
                VALUES ($1, $2, 'PORTFOLIO_IMAGE', $3, 1, now())
                "#,
            )
            .bind(&pk)
            .bind(&sk)
            .bind(&payload)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn emit_change_event(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        pk: &str,
        event_type: ChangeEventType,
        version: i64,
        artist: &Artist,
        images: &[PortfolioImage],
    ) -> Result<()> {
        let new_image = serde_json::to_value(ArtistWithImages {
            artist: artist.clone(),
            images: images.to_vec(),
        })
        .map_err(|e| CatalogError::Other(e.into()))?;

        let event_type_str = match event_type {
            ChangeEventType::Insert => "INSERT",
            ChangeEventType::Modify => "MODIFY",
            ChangeEventType::Remove => "REMOVE",
        };

        sqlx::query(
            r#"
            INSERT INTO catalog_change_events (event_type, pk, sk, version, payload)
            VALUES ($1, $2, 'METADATA', $3, $4)
            "#,
        )
        .bind(event_type_str)
        .bind(pk)
        .bind(version)
        .bind(if matches!(event_type, ChangeEventType::Remove) {
            None
        } else {
            Some(new_image)
        })
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Flips `opted_out`, clears the image set, and emits a synthetic
    /// `REMOVE` change event so the projector deletes the index document
    /// (§4.1, §8 "Opt-out invariant").
    pub async fn mark_opted_out(&self, artist_id: Uuid, _reason: &str) -> Result<()> {
        let pk = artist_pk(artist_id);
        let mut tx = self.pool.begin().await?;

        let current: Option<(serde_json::Value, i64)> = sqlx::query_as(
            "SELECT payload, version FROM catalog_records WHERE pk = $1 AND sk = 'METADATA' FOR UPDATE",
        )
        .bind(&pk)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((mut payload, version)) = current else {
            tx.rollback().await?;
            return Ok(());
        };

        let new_version = version + 1;
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("opted_out".to_string(), serde_json::Value::Bool(true));
            obj.insert("version".to_string(), serde_json::json!(new_version));
        }

        sqlx::query(
            "UPDATE catalog_records SET payload = $1, version = $2, updated_at = now()
             WHERE pk = $3 AND sk = 'METADATA'",
        )
        .bind(&payload)
        .bind(new_version)
        .bind(&pk)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM catalog_records WHERE pk = $1 AND (sk LIKE 'STYLE#%' OR sk LIKE 'IMAGE#%')")
            .bind(&pk)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO catalog_change_events (event_type, pk, sk, version, payload)
             VALUES ('REMOVE', $1, 'METADATA', $2, NULL)",
        )
        .bind(&pk)
        .bind(new_version)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Strongly consistent single-studio read. Used by the projector to
    /// resolve an artist's display city from its home studio (§4.2).
    pub async fn get_studio(&self, id: Uuid) -> Result<Option<Studio>> {
        let pk = studio_pk(id);
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT payload FROM catalog_records WHERE pk = $1 AND sk = 'METADATA'")
                .bind(&pk)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(payload,)| serde_json::from_value(payload).map_err(|e| CatalogError::Other(e.into())))
            .transpose()
    }

    /// Strongly consistent single-artist read.
    pub async fn get_artist(&self, id: Uuid) -> Result<Option<ArtistWithImages>> {
        let pk = artist_pk(id);
        let metadata: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT payload FROM catalog_records WHERE pk = $1 AND sk = 'METADATA'")
                .bind(&pk)
                .fetch_one(&self.pool)
                .await
                .map(Some)
                .or_else(|e| if matches!(e, sqlx::Error::RowNotFound) { Ok(None) } else { Err(e) })?;

        let Some((payload,)) = metadata else {
            return Ok(None);
        };
        let artist: Artist = serde_json::from_value(payload).map_err(|e| CatalogError::Other(e.into()))?;

        let image_rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT payload FROM catalog_records WHERE pk = $1 AND sk LIKE 'IMAGE#%' ORDER BY sk",
        )
        .bind(&pk)
        .fetch_all(&self.pool)
        .await?;

        let images = image_rows
            .into_iter()
            .map(|(p,)| serde_json::from_value(p).map_err(|e| CatalogError::Other(e.into())))
            .collect::<Result<Vec<PortfolioImage>>>()?;

        Ok(Some(ArtistWithImages { artist, images }))
    }

    /// Fans out across the `STYLE_SHARD_COUNT` logical partitions for
    /// `style` and merges results by artist id, avoiding a hot partition
    /// on popular styles (§4.1).
    pub async fn list_artists_by_style_and_geo(
        &self,
        style: &str,
        geohash_prefix: &str,
        cursor: Option<Uuid>,
        limit: usize,
    ) -> Result<(Vec<ArtistWithImages>, Option<Uuid>)> {
        let shard_queries = (0..STYLE_SHARD_COUNT).map(|shard| {
            let gsi1_pk = format!("STYLE#{style}#SHARD#{shard}");
            let geohash_prefix = geohash_prefix.to_string();
            let pool = self.pool.clone();
            async move {
                sqlx::query_as::<_, (String, String)>(
                    "SELECT pk, gsi1_sk FROM catalog_records
                     WHERE gsi1_pk = $1 AND gsi1_sk LIKE $2
                     ORDER BY gsi1_sk",
                )
                .bind(&gsi1_pk)
                .bind(format!("GEOHASH#{geohash_prefix}%"))
                .fetch_all(&pool)
                .await
            }
        });

        let shard_results = join_all(shard_queries).await;
        let mut merged: BTreeMap<Uuid, ()> = BTreeMap::new();
        for result in shard_results {
            for (pk, _gsi1_sk) in result? {
                if let Some(id) = pk.strip_prefix("ARTIST#").and_then(|s| Uuid::parse_str(s).ok()) {
                    merged.insert(id, ());
                }
            }
        }

        let mut ids: Vec<Uuid> = merged.into_keys().collect();
        if let Some(after) = cursor {
            ids.retain(|id| *id > after);
        }
        ids.truncate(limit);
        let next_cursor = ids.last().copied();

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(artist) = self.get_artist(id).await? {
                out.push(artist);
            }
        }
        Ok((out, next_cursor))
    }
}

pub fn artist_pk(id: Uuid) -> String {
    format!("ARTIST#{id}")
}

pub fn studio_pk(id: Uuid) -> String {
    format!("STUDIO#{id}")
}

pub fn style_pk(id: &str) -> String {
    format!("STYLE#{id}")
}
