pub mod artifact;
pub mod cleanup;
pub mod error;
pub mod form;
pub mod layout;
pub mod model;
pub mod path;
pub mod route;
pub mod service;
pub mod thumbnail;

pub use artifact::{StoredImage, UploadArtifact};
pub use form::FormData;
pub use layout::StorageLayout;
pub use model::{DirectoryPair, IncomingFile, UploadProfile};
pub use path::PathResolver;
pub use service::ImagePipeline;
