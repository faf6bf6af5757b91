use crate::config::OnnxModelConfig;
use crate::image_classifier::interface::ImageClassifier;
use crate::image_classifier::preprocess::Preprocess;
use crate::library::logger::interface::Logger;
use std::path::Path;
use std::sync::Arc;
use tract_onnx::prelude::*;

pub struct ImageClassifierTractOnnx {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    preprocess: Preprocess,
    model_id: String,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl ImageClassifierTractOnnx {
    pub fn new(
        config: &OnnxModelConfig,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let logger = logger.with_namespace("image_classifier").with_namespace("onnx");
        let (width, height) = config.target_image_size;
        let preprocess = Preprocess {
            width,
            height,
            layout: config.layout,
            pixel_scale: config.pixel_scale,
            letterbox: config.letterbox,
        };

        logger.info(&format!(
            "Loading model {} with input shape {:?}...",
            config.model_path.display(),
            preprocess.input_shape()
        ));

        let model = tract_onnx::onnx()
            .model_for_path(&config.model_path)?
            .with_input_fact(0, f32::fact(preprocess.input_shape()).into())?
            .into_optimized()?
            .into_runnable()?;

        let model_id = config
            .model_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.model_path.display().to_string());

        logger.info("Model loaded");

        Ok(Self {
            model,
            preprocess,
            model_id,
            logger,
        })
    }
}

impl ImageClassifier for ImageClassifierTractOnnx {
    fn score(&self, image_path: &Path) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        let image = image::open(image_path)?;
        let input = self.preprocess.image_to_tensor(&image);

        let outputs = self.model.run(tvec!(input.into_tvalue()))?;
        let output = outputs
            .first()
            .ok_or("model produced no outputs")?
            .to_array_view::<f32>()?;
        let values: Vec<f32> = output.iter().copied().collect();

        let probability = probability_from_outputs(&values)?;
        self.logger
            .debug(&format!("Raw output {:?} -> {:.5}", values, probability));
        Ok(probability)
    }

    fn model_id(&self) -> String {
        self.model_id.clone()
    }
}

/// A single value is a probability, or a logit when it falls outside
/// `[0, 1]`. Two values are class logits and class 1 is the positive.
/// NaN or infinite outputs are errors.
pub fn probability_from_outputs(
    values: &[f32],
) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(format!("model produced a non-finite output: {}", bad).into());
    }
    match values {
        [p] if (0.0..=1.0).contains(p) => Ok(*p),
        [logit] => Ok(sigmoid(*logit)),
        [negative, positive] => {
            let max = negative.max(*positive);
            let e_neg = (negative - max).exp();
            let e_pos = (positive - max).exp();
            Ok(e_pos / (e_neg + e_pos))
        }
        other => Err(format!(
            "expected a model output with 1 or 2 values, got {}",
            other.len()
        )
        .into()),
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
