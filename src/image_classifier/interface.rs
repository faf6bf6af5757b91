use std::path::Path;

pub trait ImageClassifier {
    /// Probability in `[0, 1]` that the image at `image_path` is a positive.
    fn score(&self, image_path: &Path) -> Result<f32, Box<dyn std::error::Error + Send + Sync>>;
    fn model_id(&self) -> String;
}
