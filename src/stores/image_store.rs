use crate::core::error::StoreError;
use crate::models::image::{ImageLocation, NewImageLocation};
use crate::wal::wal::{Wal, WalOperation};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Submitted image locations; entries are immutable once stored
pub struct ImageStore {
    images: DashMap<u32, ImageLocation>,
    next_id: AtomicU32,
    wal: Arc<Wal>,
}

impl ImageStore {
    pub fn new(wal: Arc<Wal>) -> Self {
        Self {
            images: DashMap::new(),
            next_id: AtomicU32::new(1),
            wal,
        }
    }

    /// Persist a location owned by `user_id`
    pub fn insert(&self, user_id: u32, location: NewImageLocation) -> Result<ImageLocation, StoreError> {
        let image = ImageLocation {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id,
            latitude: location.latitude,
            longitude: location.longitude,
            image: location.image,
            created_at: Utc::now(),
        };

        self.wal
            .log_operation(&WalOperation::AddImage { image: image.clone() })
            .map_err(|e| StoreError::Persistence(e.to_string()))?;

        self.images.insert(image.id, image.clone());
        Ok(image)
    }

    pub fn get(&self, id: u32) -> Option<ImageLocation> {
        self.images.get(&id).map(|entry| entry.value().clone())
    }

    pub fn list_by_user(&self, user_id: u32) -> Vec<ImageLocation> {
        let mut images: Vec<ImageLocation> = self
            .images
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        images.sort_by_key(|image| image.id);
        images
    }

    /// Drop every location owned by a deleted user
    pub fn purge_user(&self, user_id: u32) -> usize {
        let before = self.images.len();
        self.images.retain(|_, image| image.user_id != user_id);
        before - self.images.len()
    }

    pub fn restore(&self, image: ImageLocation) {
        self.next_id.fetch_max(image.id + 1, Ordering::SeqCst);
        self.images.insert(image.id, image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
