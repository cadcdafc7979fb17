//! Formation mode and the photo list: the two inputs the scene reads each frame.

use crate::photo::{PhotoId, PhotoRef, PhotoSource};

/// Whether particles head for their scattered or their tree pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormationMode {
    /// Floating cloud.
    #[default]
    Scattered,
    /// Cone-shaped tree.
    Assembled,
}

impl FormationMode {
    /// The other mode.
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            FormationMode::Scattered => FormationMode::Assembled,
            FormationMode::Assembled => FormationMode::Scattered,
        }
    }

    #[inline]
    pub fn is_assembled(self) -> bool {
        self == FormationMode::Assembled
    }
}

/// Owns the formation mode and the ordered photo list.
///
/// Written by UI events, read by [`TreeScene::update`](crate::TreeScene::update)
/// at the start of each frame.
#[derive(Debug, Default)]
pub struct FormationController {
    mode: FormationMode,
    photos: Vec<PhotoRef>,
    next_id: u64,
}

impl FormationController {
    /// Scattered, with no photos.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `sources` in the given order.
    pub fn with_photos<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = PhotoSource>,
    {
        for source in sources {
            let photo = self.make_ref(source);
            self.photos.push(photo);
        }
        self
    }

    #[inline]
    pub fn mode(&self) -> FormationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: FormationMode) {
        if self.mode != mode {
            log::info!("formation: {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    /// Flip the mode and return the new one.
    pub fn toggle(&mut self) -> FormationMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    #[inline]
    pub fn photos(&self) -> &[PhotoRef] {
        &self.photos
    }

    /// Add a photo at the front of the list (newest first).
    pub fn add_photo(&mut self, source: PhotoSource) -> PhotoId {
        let photo = self.make_ref(source);
        let id = photo.id();
        log::info!("photo {} added: {}", id, photo.label());
        self.photos.insert(0, photo);
        id
    }

    /// Add several photos; the last one ends up first.
    pub fn add_photos<I>(&mut self, sources: I) -> Vec<PhotoId>
    where
        I: IntoIterator<Item = PhotoSource>,
    {
        sources.into_iter().map(|s| self.add_photo(s)).collect()
    }

    /// Remove a photo. Returns `false` if it was not in the list.
    pub fn remove_photo(&mut self, id: PhotoId) -> bool {
        let before = self.photos.len();
        self.photos.retain(|p| p.id() != id);
        self.photos.len() != before
    }

    pub fn clear_photos(&mut self) {
        self.photos.clear();
    }

    fn make_ref(&mut self, source: PhotoSource) -> PhotoRef {
        let id = PhotoId(self.next_id);
        self.next_id += 1;
        PhotoRef::new(id, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(tag: u8) -> PhotoSource {
        PhotoSource::Bytes(vec![tag])
    }

    #[test]
    fn test_default_is_scattered() {
        let controller = FormationController::new();
        assert_eq!(controller.mode(), FormationMode::Scattered);
        assert!(controller.photos().is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut controller = FormationController::new();
        assert_eq!(controller.toggle(), FormationMode::Assembled);
        assert!(controller.mode().is_assembled());
        assert_eq!(controller.toggle(), FormationMode::Scattered);
    }

    #[test]
    fn test_add_photo_prepends() {
        let mut controller = FormationController::new();
        let a = controller.add_photo(bytes(1));
        let b = controller.add_photo(bytes(2));
        let ids: Vec<_> = controller.photos().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![b, a]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_with_photos_keeps_order() {
        let controller = FormationController::new().with_photos([bytes(1), bytes(2), bytes(3)]);
        let tags: Vec<_> = controller
            .photos()
            .iter()
            .map(|p| match p.source() {
                PhotoSource::Bytes(b) => b[0],
                PhotoSource::File(_) => 0,
            })
            .collect();
        assert_eq!(tags, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut controller = FormationController::new();
        let ids = controller.add_photos([bytes(1), bytes(2)]);
        assert!(controller.remove_photo(ids[0]));
        assert!(!controller.remove_photo(ids[0]));
        assert_eq!(controller.photos().len(), 1);
        controller.clear_photos();
        assert!(controller.photos().is_empty());
    }
}
