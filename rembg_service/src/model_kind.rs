use crate::model_service::ModelLoadError;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Static description of a supported segmentation network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelKind {
    pub name: &'static str,
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

pub const SUPPORTED_MODELS: [ModelKind; 5] = [
    ModelKind {
        name: "u2net",
        input_size: 320,
        mean: IMAGENET_MEAN,
        std: IMAGENET_STD,
    },
    ModelKind {
        name: "u2netp",
        input_size: 320,
        mean: IMAGENET_MEAN,
        std: IMAGENET_STD,
    },
    ModelKind {
        name: "u2net_human_seg",
        input_size: 320,
        mean: IMAGENET_MEAN,
        std: IMAGENET_STD,
    },
    ModelKind {
        name: "silueta",
        input_size: 320,
        mean: IMAGENET_MEAN,
        std: IMAGENET_STD,
    },
    ModelKind {
        name: "isnet-general-use",
        input_size: 1024,
        mean: [0.5, 0.5, 0.5],
        std: [1.0, 1.0, 1.0],
    },
];

impl ModelKind {
    pub fn from_name(name: &str) -> Result<Self, ModelLoadError> {
        SUPPORTED_MODELS
            .iter()
            .find(|kind| kind.name == name)
            .copied()
            .ok_or_else(|| ModelLoadError::UnsupportedModel {
                name: name.to_string(),
                supported: SUPPORTED_MODELS
                    .iter()
                    .map(|kind| kind.name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
