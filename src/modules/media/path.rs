use actix_web::HttpRequest;

use crate::modules::media::model::DirectoryPair;

pub const PUBLIC_MOUNT: &str = "/public";

const CANONICAL_PREFIX: &str = "uploads/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Original,
    Thumbnail,
}

/// A stored image reference, classified once by naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredPath {
    /// `uploads/<entity>/<originals|thumbnails>/<name>`
    CanonicalPrefixed(String),
    /// Bare filename from before paths were stored with their directory.
    LegacyFlat(String),
}

impl StoredPath {
    pub fn classify(raw: &str) -> Self {
        let normalized = raw.trim().replace('\\', "/");
        let normalized = normalized.trim_start_matches('/');
        if normalized.starts_with(CANONICAL_PREFIX) {
            StoredPath::CanonicalPrefixed(normalized.to_string())
        } else {
            StoredPath::LegacyFlat(normalized.to_string())
        }
    }

    /// Path relative to the public root.
    pub fn relative(&self, dirs: &DirectoryPair, slot: ImageSlot) -> String {
        match self {
            StoredPath::CanonicalPrefixed(path) => path.clone(),
            StoredPath::LegacyFlat(name) => {
                let dir = match slot {
                    ImageSlot::Original => &dirs.originals,
                    ImageSlot::Thumbnail => &dirs.thumbnails,
                };
                format!("{dir}/{name}")
            }
        }
    }

    /// False when the reference could point outside the public root.
    pub fn is_contained(&self) -> bool {
        let raw = match self {
            StoredPath::CanonicalPrefixed(path) | StoredPath::LegacyFlat(path) => path,
        };
        !raw.is_empty() && raw.split('/').all(|segment| segment != ".." && segment != ".")
    }
}

/// Builds absolute URLs against the scheme and host the client used.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base_url: String,
}

impl PathResolver {
    pub fn new(scheme: &str, host: &str) -> Self {
        Self { base_url: format!("{scheme}://{host}{PUBLIC_MOUNT}") }
    }

    pub fn from_request(req: &HttpRequest) -> Self {
        let info = req.connection_info();
        Self::new(info.scheme(), info.host())
    }

    pub fn url(&self, stored: Option<&str>, dirs: &DirectoryPair, slot: ImageSlot) -> Option<String> {
        let stored = stored.filter(|s| !s.trim().is_empty())?;
        let relative = StoredPath::classify(stored).relative(dirs, slot);
        Some(format!("{}/{}", self.base_url, relative))
    }

    pub fn for_dirs<'a>(&'a self, dirs: &'a DirectoryPair) -> ImageUrls<'a> {
        ImageUrls { resolver: self, dirs }
    }
}

/// A resolver bound to one entity kind's directories.
#[derive(Debug, Clone, Copy)]
pub struct ImageUrls<'a> {
    resolver: &'a PathResolver,
    dirs: &'a DirectoryPair,
}

impl ImageUrls<'_> {
    pub fn original(&self, stored: Option<&str>) -> Option<String> {
        self.resolver.url(stored, self.dirs, ImageSlot::Original)
    }

    pub fn thumbnail(&self, stored: Option<&str>) -> Option<String> {
        self.resolver.url(stored, self.dirs, ImageSlot::Thumbnail)
    }
}
