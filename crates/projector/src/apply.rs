//! Turns one `catalog_change_events` row into an `IndexClient` call (§4.2).

use core_catalog::{ArtistWithImages, CatalogStore, ChangeEvent, ChangeEventType};
use core_index::{build_search_terms, ArtistDocument, IndexClient, UpsertOutcome};
use tracing::warn;
use uuid::Uuid;

use crate::error::{ProjectorError, Result};
use crate::metrics::ProjectorMetrics;

/// Applies a single change event to the search index.
///
/// `REMOVE` becomes an idempotent delete. `INSERT`/`MODIFY` decode the
/// event's `new_image`, resolve the artist's display city from its home
/// studio, and issue a version-guarded upsert — a stale or duplicate
/// delivery is dropped silently rather than treated as an error, but still
/// counted via `metrics` (§7, §8 "Index convergence").
pub async fn apply_event(
    event: &ChangeEvent,
    catalog: &CatalogStore,
    index: &dyn IndexClient,
    metrics: &ProjectorMetrics,
) -> Result<()> {
    let artist_id = parse_artist_id(&event.key.pk, event.seq)?;

    match event.event_type {
        ChangeEventType::Remove => {
            index.delete(artist_id).await?;
            Ok(())
        }
        ChangeEventType::Insert | ChangeEventType::Modify => {
            let Some(new_image) = &event.new_image else {
                return Err(ProjectorError::MalformedEvent {
                    seq: event.seq,
                    reason: "missing newImage on INSERT/MODIFY".to_string(),
                });
            };
            let with_images: ArtistWithImages = serde_json::from_value(new_image.clone())
                .map_err(|e| ProjectorError::MalformedEvent { seq: event.seq, reason: e.to_string() })?;

            if with_images.artist.opted_out {
                index.delete(artist_id).await?;
                return Ok(());
            }

            let city = match with_images.artist.home_studio_id {
                Some(studio_id) => catalog
                    .get_studio(studio_id)
                    .await
                    .map_err(|e| ProjectorError::Other(e.into()))?
                    .map(|s| s.city)
                    .unwrap_or_default(),
                None => String::new(),
            };

            let mut style_aliases = Vec::with_capacity(with_images.artist.styles.len());
            for style_id in &with_images.artist.styles {
                let aliases = catalog
                    .get_style(style_id)
                    .await
                    .map_err(|e| ProjectorError::Other(e.into()))?
                    .map(|s| s.aliases)
                    .unwrap_or_default();
                style_aliases.push(aliases);
            }

            let search_terms =
                build_search_terms(&with_images.artist.name, &with_images.artist.styles, &style_aliases);
            let doc = ArtistDocument {
                artist_id,
                name: with_images.artist.name,
                styles: with_images.artist.styles,
                geohash: with_images.artist.geohash,
                city,
                search_terms,
                image_urls: with_images.images.into_iter().map(|i| i.source_url).collect(),
                version: event.version,
            };

            match index.upsert(&doc).await? {
                UpsertOutcome::Applied => Ok(()),
                UpsertOutcome::Stale => {
                    metrics.record_stale_upsert();
                    warn!(artist_id = %artist_id, version = event.version, "dropped stale upsert (PreconditionFailed)");
                    Ok(())
                }
            }
        }
    }
}

fn parse_artist_id(pk: &str, seq: i64) -> Result<Uuid> {
    pk.strip_prefix("ARTIST#")
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| ProjectorError::MalformedEvent {
            seq,
            reason: format!("unparseable artist key {pk}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_artist_key() {
        let err = parse_artist_id("STUDIO#not-a-uuid", 1).unwrap_err();
        assert!(matches!(err, ProjectorError::MalformedEvent { seq: 1, .. }));
    }
}
