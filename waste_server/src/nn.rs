use std::path::Path;

use anyhow::{bail, Context, Result};
use common::decision::{sigmoid, Prediction};
use image::{imageops::FilterType, RgbImage};
use tract_onnx::prelude::*;

use crate::error::ModelError;

type NnModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Width and height of the square network input.
pub const INPUT_SIZE: u32 = 128;

/// ImageNet channel statistics the backbone was trained with.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

pub trait InferModel: Send + Sync {
    /// Run one forward pass on a preprocessed `[1, 3, 128, 128]` batch.
    ///
    /// Returns the scalar emitted by the classification head.
    fn forward(&self, input: Tensor) -> Result<f32>;
}

/// MobileNetV2 with a single-output binary head, executed by tract on the CPU.
pub struct WasteClassifier {
    model: NnModel,
}

impl WasteClassifier {
    /// Build the runnable network from an ONNX checkpoint.
    ///
    /// The checkpoint carries the MobileNetV2 graph with its classifier replaced by
    /// `Linear(1280, 1)` followed by a sigmoid; parameters are bound to the graph nodes by
    /// name while importing. The input is pinned to `f32[1, 3, 128, 128]` before optimizing.
    pub fn from_checkpoint(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::MissingCheckpoint {
                path: path.to_owned(),
            });
        }

        log::info!("Building classifier from {} on cpu", path.display());
        let model = load_plan(path).map_err(|e| ModelError::CheckpointLoad {
            path: path.to_owned(),
            reason: format!("{e:#}"),
        })?;
        log::info!("Model loaded successfully!");

        Ok(Self { model })
    }
}

impl InferModel for WasteClassifier {
    fn forward(&self, input: Tensor) -> Result<f32> {
        let outputs = self.model.run(tvec!(input.into()))?;
        let output = outputs.first().context("model produced no output")?;

        match output.as_slice::<f32>()? {
            [value] => Ok(*value),
            values => bail!("expected one output value, got {}", values.len()),
        }
    }
}

fn load_plan(path: &Path) -> TractResult<NnModel> {
    let side = INPUT_SIZE as usize;
    let input_fact = InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side));
    let model = tract_onnx::onnx()
        .model_for_path(path)?
        .with_input_fact(0, input_fact)?
        .into_optimized()?;

    check_binary_head(&model)?;

    model.into_runnable()
}

/// Reject checkpoints whose head does not produce exactly one value per image.
fn check_binary_head(model: &TypedModel) -> TractResult<()> {
    if model.outputs.len() != 1 {
        bail!("expected a single output, found {}", model.outputs.len());
    }

    let fact = model.output_fact(0)?;
    match fact.shape.as_concrete() {
        Some([1] | [1, 1]) => Ok(()),
        Some(shape) => bail!("expected a single-output binary head, found output shape {shape:?}"),
        None => bail!("output shape {:?} is not fully determined", fact.shape),
    }
}

/// Turn an image of any size into the normalized NCHW batch of one the network expects.
///
/// The aspect ratio is not preserved.
pub fn preprocess(image: &RgbImage) -> Tensor {
    let resized: RgbImage =
        image::imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let side = INPUT_SIZE as usize;
    tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        (resized[(x as _, y as _)][c] as f32 / 255.0 - MEAN[c]) / STD[c]
    })
    .into()
}

/// Classify a single image.
///
/// The head already ends in a sigmoid and its output is squashed a second time here before
/// thresholding, so a real checkpoint yields probabilities in `(0.5, 0.731)`.
pub fn classify(model: &dyn InferModel, image: &RgbImage) -> Result<Prediction> {
    let head_output = model.forward(preprocess(image))?;
    let p = sigmoid(head_output as f64);
    log::debug!("Head output {head_output}, probability {p}");

    Ok(Prediction::from_probability(p))
}

#[cfg(test)]
mod test {
    use common::decision::Label;
    use image::Rgb;

    use super::*;

    struct ConstantModel(f32);

    impl InferModel for ConstantModel {
        fn forward(&self, input: Tensor) -> Result<f32> {
            assert_eq!(input.shape(), &[1, 3, 128, 128]);
            Ok(self.0)
        }
    }

    fn gradient_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_preprocess_shape_and_determinism() {
        let image = gradient_image(300, 200);

        let first = preprocess(&image);
        let second = preprocess(&image);

        assert_eq!(first.shape(), &[1, 3, 128, 128]);
        assert_eq!(first.datum_type(), f32::datum_type());
        assert_eq!(first, second);
    }

    #[test]
    fn test_preprocess_normalizes_channels() -> Result<()> {
        let image = RgbImage::from_pixel(64, 32, Rgb([255, 0, 128]));
        let tensor = preprocess(&image);
        let view = tensor.to_array_view::<f32>()?;

        let expected = [
            (1.0 - MEAN[0]) / STD[0],
            (0.0 - MEAN[1]) / STD[1],
            (128.0 / 255.0 - MEAN[2]) / STD[2],
        ];
        for (c, expected) in expected.iter().enumerate() {
            for (y, x) in [(0, 0), (64, 64), (127, 127)] {
                let value = view[[0, c, y, x]];
                assert!(
                    (value - expected).abs() < 1e-5,
                    "channel {c} at ({x}, {y}): {value} != {expected}"
                );
            }
        }

        Ok(())
    }

    #[test]
    fn test_classify_applies_second_squash() -> Result<()> {
        let image = gradient_image(300, 300);

        let raw = (0.1_f64 / 0.9).ln() as f32;
        let prediction = classify(&ConstantModel(raw), &image)?;
        assert_eq!(prediction.label, Label::Biodegradable);
        assert_eq!(prediction.confidence_text(), "90.00%");

        // A sigmoid head output of 0.0 is squashed to exactly 0.5.
        let prediction = classify(&ConstantModel(0.0), &image)?;
        assert_eq!(prediction.label, Label::NonBiodegradable);
        assert_eq!(prediction.confidence_text(), "50.00%");

        Ok(())
    }

    #[test]
    fn test_missing_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.onnx");

        assert!(matches!(
            WasteClassifier::from_checkpoint(&path),
            Err(ModelError::MissingCheckpoint { .. })
        ));
    }

    fn write_checkpoint(dir: &tempfile::TempDir, outputs: usize) -> std::path::PathBuf {
        let path = dir.path().join("mobilenet_v2_model.onnx");
        std::fs::write(&path, crate::onnx_graph::pooled_sigmoid_head(outputs)).unwrap();
        path
    }

    #[test]
    fn test_forward_through_onnx_checkpoint() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let classifier = WasteClassifier::from_checkpoint(write_checkpoint(&dir, 1))?;

        // A uniform image pools to its normalized pixel value per channel.
        let image = RgbImage::from_pixel(300, 300, Rgb([200, 120, 40]));
        let logit: f32 = [200.0_f32, 120.0, 40.0]
            .iter()
            .enumerate()
            .map(|(c, v)| (v / 255.0 - MEAN[c]) / STD[c] * crate::onnx_graph::HEAD_WEIGHTS[c])
            .sum();
        let expected = sigmoid(logit as f64);

        let head_output = classifier.forward(preprocess(&image))?;
        assert!(
            (head_output as f64 - expected).abs() < 1e-4,
            "{head_output} != {expected}"
        );

        let prediction = classify(&classifier, &image)?;
        assert_eq!(prediction.probability, sigmoid(head_output as f64));
        assert_eq!(prediction.label, Label::NonBiodegradable);
        assert!(prediction.confidence > 50.0 && prediction.confidence < 73.11);

        Ok(())
    }

    #[test]
    fn test_checkpoint_with_wide_head_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_checkpoint(&dir, 1000);

        let err = WasteClassifier::from_checkpoint(&path).err().unwrap();
        match &err {
            ModelError::CheckpointLoad { reason, .. } => {
                assert!(reason.contains("[1, 1000]"), "{reason}")
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_corrupt_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.onnx");
        std::fs::write(&path, b"not a model").unwrap();

        let err = WasteClassifier::from_checkpoint(&path).err().unwrap();
        assert!(matches!(err, ModelError::CheckpointLoad { .. }));
        assert!(err.hint().is_some());
    }
}
