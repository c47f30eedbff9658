use crate::model_service::{InferenceError, ModelService};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::{
    io::Cursor,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// Deterministic model double that counts its invocations.
#[derive(Clone)]
pub struct MockModelService {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl MockModelService {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelService for MockModelService {
    fn model_name(&self) -> &str {
        "mock-u2netp"
    }

    fn remove_background(&self, image_data: &[u8]) -> Result<Vec<u8>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(InferenceError::Output("mock model refused the image".to_string()));
        }

        let seed = image_data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([seed, seed, seed, 255]));
        image.put_pixel(0, 0, Rgba([0, 0, 0, 0]));

        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(InferenceError::Encode)?;
        Ok(buffer)
    }
}
