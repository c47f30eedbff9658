use crate::{
    config::ModelConfig,
    model_kind::ModelKind,
    model_service::{InferenceError, ModelLoadError, ModelService},
};
use image::{
    imageops, imageops::FilterType, DynamicImage, GrayImage, ImageDecoder, ImageFormat, RgbaImage,
};
use ndarray::{s, Array, ArrayViewD, Ix4};
#[cfg(feature = "cuda")]
use ort::execution_providers::CUDAExecutionProvider;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use parking_lot::Mutex;
use std::io::Cursor;

fn decode_image(image_data: &[u8]) -> Result<DynamicImage, InferenceError> {
    let image_reader = image::ImageReader::new(Cursor::new(image_data))
        .with_guessed_format()
        .map_err(|e| InferenceError::Decode(image::ImageError::IoError(e)))?;

    let mut decoder = image_reader.into_decoder().map_err(InferenceError::Decode)?;
    let orientation = decoder.orientation().map_err(InferenceError::Decode)?;

    let mut image = DynamicImage::from_decoder(decoder).map_err(InferenceError::Decode)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Resizes to the model resolution and lays the image out as a `1x3xSxS`
/// tensor, scaled by its brightest channel value then mean/std normalized.
fn preprocess(image: &DynamicImage, kind: &ModelKind) -> Array<f32, Ix4> {
    let size = kind.input_size;
    let img = image.resize_exact(size, size, FilterType::Lanczos3).to_rgb8();

    let max_value = img.as_raw().iter().copied().max().unwrap_or(0);
    let scale = (max_value as f32).max(1e-6);

    let mut input = Array::zeros((1, 3, size as usize, size as usize));
    for (x, y, pixel) in img.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for (c, value) in pixel.0.iter().enumerate() {
            input[[0, c, y, x]] = ((*value as f32) / scale - kind.mean[c]) / kind.std[c];
        }
    }

    input
}

/// Turns the raw network output into an 8-bit mask at the original image size.
fn postprocess_mask(
    prediction: ArrayViewD<f32>,
    width: u32,
    height: u32,
) -> Result<GrayImage, InferenceError> {
    let prediction = prediction
        .into_dimensionality::<Ix4>()
        .map_err(|e| InferenceError::Output(format!("expected a 4d mask tensor: {}", e)))?;

    let shape = prediction.shape();
    if shape[0] == 0 || shape[1] == 0 {
        return Err(InferenceError::Output(format!(
            "empty mask tensor with shape {:?}",
            shape
        )));
    }

    let mask = prediction.slice(s![0, 0, .., ..]);
    let (mask_height, mask_width) = mask.dim();

    let (min, max) = mask
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    let pixels = mask
        .iter()
        .map(|&v| {
            let normalized = if range > 0.0 { (v - min) / range } else { 0.0 };
            (normalized * 255.0) as u8
        })
        .collect::<Vec<u8>>();

    let mask = GrayImage::from_raw(mask_width as u32, mask_height as u32, pixels)
        .ok_or_else(|| InferenceError::Output("mask buffer size mismatch".to_string()))?;

    Ok(imageops::resize(&mask, width, height, FilterType::Lanczos3))
}

fn blend(channel: u8, alpha: u8) -> u8 {
    ((channel as u16 * alpha as u16 + 127) / 255) as u8
}

/// Composites the image over a transparent canvas through the mask.
fn naive_cutout(image: &RgbaImage, mask: &GrayImage) -> Result<RgbaImage, InferenceError> {
    if image.dimensions() != mask.dimensions() {
        return Err(InferenceError::Output(format!(
            "mask is {:?} but image is {:?}",
            mask.dimensions(),
            image.dimensions()
        )));
    }

    let mut cutout = image.clone();
    for (pixel, alpha) in cutout.pixels_mut().zip(mask.pixels()) {
        let alpha = alpha.0[0];
        for channel in pixel.0.iter_mut() {
            *channel = blend(*channel, alpha);
        }
    }

    Ok(cutout)
}

fn encode_png(image: RgbaImage) -> Result<Vec<u8>, InferenceError> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(InferenceError::Encode)?;
    Ok(buffer)
}

/// Everything after inference: mask the decoded image and encode it as PNG.
fn cutout_png(image: &DynamicImage, mask: &GrayImage) -> Result<Vec<u8>, InferenceError> {
    let cutout = naive_cutout(&image.to_rgba8(), mask)?;
    encode_png(cutout)
}

pub struct OrtModelService {
    session: Mutex<Session>,
    kind: ModelKind,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ModelLoadError> {
        let kind = ModelKind::from_name(&model_config.name)?;

        let model_path = model_config.get_path();
        if !model_path.exists() {
            return Err(ModelLoadError::MissingWeights(model_path));
        }

        tracing::info!("Loading {} model from {:?}", kind.name, model_path);

        let session = (|| -> Result<Session, ort::Error> {
            let builder = Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .with_intra_threads(model_config.intra_threads)?;
            #[cfg(feature = "cuda")]
            let builder =
                builder.with_execution_providers([CUDAExecutionProvider::default().build()])?;
            builder.commit_from_file(&model_path)
        })()?;

        let service = Self {
            session: Mutex::new(session),
            kind,
        };

        // warm up so a broken model fails at startup
        let size = kind.input_size as usize;
        service
            .run_inference(&Array::zeros((1, 3, size, size)), 1, 1)
            .map_err(ModelLoadError::WarmUp)?;

        tracing::info!("Model {} loaded successfully", kind.name);

        Ok(service)
    }

    fn run_inference(
        &self,
        input: &Array<f32, Ix4>,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, InferenceError> {
        let mut session = self.session.lock();

        let tensor_ref = TensorRef::from_array_view(input.view())?;
        let outputs = session.run(ort::inputs![tensor_ref])?;

        let prediction = outputs[0].try_extract_array::<f32>()?;
        tracing::debug!("Model output shape {:?}", prediction.shape());

        postprocess_mask(prediction, width, height)
    }
}

impl ModelService for OrtModelService {
    fn model_name(&self) -> &str {
        self.kind.name
    }

    fn remove_background(&self, image_data: &[u8]) -> Result<Vec<u8>, InferenceError> {
        let image = decode_image(image_data)?;
        let input = preprocess(&image, &self.kind);
        let mask = self.run_inference(&input, image.width(), image.height())?;
        cutout_png(&image, &mask)
    }
}
