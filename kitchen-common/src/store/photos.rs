//! Fridge photo metadata and stored image cleanup

use super::{clean, Store};
use crate::db::models::FridgePhoto;
use crate::{Error, Result};
use std::path::{Component, Path};
use tracing::{info, warn};

/// URL prefix stored images are served under
const IMAGES_URL_PREFIX: &str = "images/";

/// File name inside the images directory that `image_path` refers to.
///
/// Accepts a bare name or one prefixed with `images/` or `/images/`.
/// Anything else (nested paths, `..`, absolute paths elsewhere) yields None.
pub fn stored_file_name(image_path: &str) -> Option<&str> {
    let trimmed = image_path.trim().trim_start_matches('/');
    let name = trimmed.strip_prefix(IMAGES_URL_PREFIX).unwrap_or(trimmed);

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Some(name),
        _ => None,
    }
}

impl Store {
    pub async fn list_photos(&self) -> Result<Vec<FridgePhoto>> {
        let photos = sqlx::query_as::<_, (i64, String, String, String)>(
            "SELECT id, image_path, location, created_at FROM fridge_photos ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(id, image_path, location, created_at)| FridgePhoto {
            id,
            image_path,
            location,
            created_at,
        })
        .collect();

        Ok(photos)
    }

    /// Record an uploaded photo; a blank location becomes `default_location`
    pub async fn add_photo(
        &self,
        image_path: &str,
        location: Option<String>,
        default_location: &str,
    ) -> Result<FridgePhoto> {
        let image_path = image_path.trim();
        if image_path.is_empty() {
            return Err(Error::InvalidInput("image_path required".to_string()));
        }
        let location = clean(location).unwrap_or_else(|| default_location.to_string());

        let (id, created_at): (i64, String) = sqlx::query_as(
            "INSERT INTO fridge_photos (image_path, location) VALUES (?, ?) RETURNING id, created_at",
        )
        .bind(image_path)
        .bind(&location)
        .fetch_one(&self.pool)
        .await?;

        info!("Added fridge photo {} ({})", id, image_path);
        Ok(FridgePhoto {
            id,
            image_path: image_path.to_string(),
            location,
            created_at,
        })
    }

    /// Delete a photo row and its stored file under `images_dir`.
    ///
    /// The row delete commits only after the file step; a file that cannot
    /// be removed leaves the row in place. An already missing file is not
    /// an error.
    pub async fn delete_photo(&self, id: i64, images_dir: &Path) -> Result<()> {
        let mut tx = self.begin_write().await?;

        let image_path: String =
            sqlx::query_scalar("DELETE FROM fridge_photos WHERE id = ? RETURNING image_path")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| Error::NotFound(format!("fridge photo {}", id)))?;

        match stored_file_name(&image_path) {
            Some(name) => {
                let file = images_dir.join(name);
                match tokio::fs::remove_file(&file).await {
                    Ok(()) => info!("Deleted fridge photo {} and {}", id, file.display()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        warn!("Fridge photo {} had no stored file at {}", id, file.display())
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => warn!(
                "Fridge photo {} path '{}' is outside the images directory; file left in place",
                id, image_path
            ),
        }

        tx.commit().await?;
        Ok(())
    }
}
