//! Photo references and per-panel texture loading.
//!
//! Each panel decodes its own image on a background thread ([`PhotoLoader`])
//! and shows a placeholder until the pixels arrive. A panel whose image cannot
//! be read or decoded keeps the placeholder; its siblings are unaffected.
//!
//! # Supported Formats
//!
//! - PNG
//! - JPEG

use crate::config::Palette;
use crate::error::TextureError;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Photos larger than this on either side are downscaled before upload.
pub const MAX_PHOTO_SIZE: u32 = 1024;

/// Stable identity of a photo across list edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoId(pub(crate) u64);

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a photo's image data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    /// Image file on disk.
    File(PathBuf),
    /// Encoded image bytes held in memory.
    Bytes(Vec<u8>),
}

/// Opaque, cheaply cloned handle to one photo.
#[derive(Debug, Clone)]
pub struct PhotoRef {
    id: PhotoId,
    source: Arc<PhotoSource>,
}

impl PhotoRef {
    pub fn new(id: PhotoId, source: PhotoSource) -> Self {
        Self {
            id,
            source: Arc::new(source),
        }
    }

    #[inline]
    pub fn id(&self) -> PhotoId {
        self.id
    }

    #[inline]
    pub fn source(&self) -> &PhotoSource {
        &self.source
    }

    /// Short human-readable description for logs.
    pub fn label(&self) -> String {
        match self.source.as_ref() {
            PhotoSource::File(path) => path.display().to_string(),
            PhotoSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

impl PartialEq for PhotoRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PhotoRef {}

/// Decoded RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoTexture {
    /// Raw RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PhotoTexture {
    /// Read and decode a photo.
    pub fn load(source: &PhotoSource) -> Result<Self, TextureError> {
        let img = match source {
            PhotoSource::File(path) => {
                let bytes = std::fs::read(path)?;
                image::load_from_memory(&bytes)?
            }
            PhotoSource::Bytes(bytes) => image::load_from_memory(bytes)?,
        };

        let img = if img.width() > MAX_PHOTO_SIZE || img.height() > MAX_PHOTO_SIZE {
            img.thumbnail(MAX_PHOTO_SIZE, MAX_PHOTO_SIZE)
        } else {
            img
        };

        let rgba = img.into_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            data: rgba.into_raw(),
            width,
            height,
        })
    }

    /// A single-pixel texture of one colour.
    pub fn solid(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            data: vec![r, g, b, a],
            width: 1,
            height: 1,
        }
    }

    /// The neutral panel shown while a photo loads or after it fails.
    pub fn placeholder() -> Self {
        let [r, g, b, a] = Palette::PLACEHOLDER;
        Self::solid(r, g, b, a)
    }
}

/// What a panel shows in its frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelTexture {
    /// Still decoding.
    Loading,
    Loaded(PhotoTexture),
    /// The image was missing or broken.
    Placeholder,
}

impl PanelTexture {
    /// Load the image for `photo`, falling back to a placeholder.
    pub fn load(photo: &PhotoRef) -> Self {
        Self::from_result(PhotoTexture::load(photo.source()), photo)
    }

    /// Keep a decoded texture, or log the failure and use a placeholder.
    pub fn from_result(result: Result<PhotoTexture, TextureError>, photo: &PhotoRef) -> Self {
        match result {
            Ok(texture) => PanelTexture::Loaded(texture),
            Err(e) => {
                log::warn!("photo {} ({}): {}; showing placeholder", photo.id(), photo.label(), e);
                PanelTexture::Placeholder
            }
        }
    }

    /// The image failed to load for good.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, PanelTexture::Placeholder)
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        matches!(self, PanelTexture::Loading)
    }

    #[inline]
    pub fn texture(&self) -> Option<&PhotoTexture> {
        match self {
            PanelTexture::Loaded(texture) => Some(texture),
            PanelTexture::Loading | PanelTexture::Placeholder => None,
        }
    }
}

/// Decodes photos off the frame loop.
///
/// One worker thread takes requests in order and sends back a
/// [`PanelTexture`] per photo. If the thread can't be started, requests are
/// decoded on the caller's thread instead.
#[derive(Debug)]
pub struct PhotoLoader {
    jobs: Option<Sender<PhotoRef>>,
    done: Receiver<(PhotoId, PanelTexture)>,
    /// Results decoded inline when there is no worker.
    ready: VecDeque<(PhotoId, PanelTexture)>,
    pending: HashSet<PhotoId>,
}

impl PhotoLoader {
    pub fn new() -> Self {
        let (jobs_tx, jobs_rx) = crossbeam_channel::unbounded::<PhotoRef>();
        let (done_tx, done_rx) = crossbeam_channel::unbounded();

        let spawned = std::thread::Builder::new()
            .name("photo-decoder".into())
            .spawn(move || {
                while let Ok(photo) = jobs_rx.recv() {
                    let texture = PanelTexture::load(&photo);
                    if done_tx.send((photo.id(), texture)).is_err() {
                        break;
                    }
                }
            });
        let jobs = match spawned {
            Ok(_) => Some(jobs_tx),
            Err(e) => {
                log::warn!("photo decoder thread unavailable ({}); decoding inline", e);
                None
            }
        };

        Self {
            jobs,
            done: done_rx,
            ready: VecDeque::new(),
            pending: HashSet::new(),
        }
    }

    /// Queue `photo` for decoding.
    pub fn request(&mut self, photo: &PhotoRef) {
        self.pending.insert(photo.id());
        let unsent = match &self.jobs {
            Some(jobs) => match jobs.send(photo.clone()) {
                Ok(()) => return,
                Err(e) => e.into_inner(),
            },
            None => photo.clone(),
        };
        self.ready
            .push_back((unsent.id(), PanelTexture::load(&unsent)));
    }

    /// Photos requested but not yet handed back.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Hand every finished photo to `apply` without blocking.
    pub fn poll(&mut self, mut apply: impl FnMut(PhotoId, PanelTexture)) {
        while let Some((id, texture)) = self.ready.pop_front() {
            self.finish(id, texture, &mut apply);
        }
        loop {
            match self.done.try_recv() {
                Ok((id, texture)) => self.finish(id, texture, &mut apply),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.abandon(&mut apply);
                    break;
                }
            }
        }
    }

    /// Block until every requested photo has been handed to `apply`.
    pub fn wait(&mut self, mut apply: impl FnMut(PhotoId, PanelTexture)) {
        self.poll(&mut apply);
        while !self.pending.is_empty() {
            match self.done.recv() {
                Ok((id, texture)) => self.finish(id, texture, &mut apply),
                Err(_) => self.abandon(&mut apply),
            }
        }
    }

    fn finish(
        &mut self,
        id: PhotoId,
        texture: PanelTexture,
        apply: &mut impl FnMut(PhotoId, PanelTexture),
    ) {
        self.pending.remove(&id);
        apply(id, texture);
    }

    /// The worker is gone: whatever it still owed becomes a placeholder.
    fn abandon(&mut self, apply: &mut impl FnMut(PhotoId, PanelTexture)) {
        if !self.pending.is_empty() {
            log::warn!("photo decoder stopped with {} photo(s) pending", self.pending.len());
        }
        self.jobs = None;
        for id in self.pending.drain() {
            apply(id, PanelTexture::Placeholder);
        }
    }
}

impl Default for PhotoLoader {
    fn default() -> Self {
        Self::new()
    }
}
