//! Error types surfaced by asset loading and scene assembly.
//!
//! Engine plumbing (GPU context, event loop) keeps using `anyhow`; these typed
//! errors exist so callers can tell a failed fetch from a malformed model or a
//! model that lacks one of the expected sub-meshes.

#[derive(Debug, thiserror::Error)]
pub enum AssetLoadError {
    #[error("could not read {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[cfg(target_arch = "wasm32")]
    #[error("could not fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid asset url {0}")]
    InvalidUrl(String),

    #[error("could not decode image {url}: {source}")]
    Image {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("could not parse model {url}: {source}")]
    Model {
        url: String,
        #[source]
        source: gltf::Error,
    },

    #[error(
        "{url} requires Draco decompression (decoder path `{decoder_path}`), export the model without mesh compression"
    )]
    UnsupportedCompression { url: String, decoder_path: String },

    #[error("{url} references buffer {index} which has no data")]
    MissingBuffer { url: String, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneGraphLookupError {
    #[error("the model has no child named `{0}`")]
    MissingNode(String),

    #[error("the model is already attached to the scene")]
    AlreadyAttached,
}
