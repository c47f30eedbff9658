use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("unsupported model `{name}`, expected one of: {supported}")]
    UnsupportedModel { name: String, supported: String },
    #[error("model file not found: {0:?}")]
    MissingWeights(PathBuf),
    #[error("failed to create onnx session: {0}")]
    Session(#[from] ort::Error),
    #[error("model warm-up run failed: {0}")]
    WarmUp(#[source] InferenceError),
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("cannot identify image file: {0}")]
    Decode(image::ImageError),
    #[error("model invocation failed: {0}")]
    Model(#[from] ort::Error),
    #[error("unexpected model output: {0}")]
    Output(String),
    #[error("failed to encode output image: {0}")]
    Encode(image::ImageError),
}

/// A loaded segmentation model that turns encoded image bytes into a PNG
/// whose background pixels are transparent.
///
/// Implementations are shared across requests and called from the blocking
/// thread pool, so they must tolerate concurrent calls.
pub trait ModelService: Send + Sync + 'static {
    fn model_name(&self) -> &str;

    fn remove_background(&self, image_data: &[u8]) -> Result<Vec<u8>, InferenceError>;
}
