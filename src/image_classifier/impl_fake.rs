use crate::image_classifier::interface::ImageClassifier;
#[cfg(test)]
use parking_lot::Mutex;
use rand::distr::{Distribution, Uniform};
#[cfg(test)]
use std::collections::VecDeque;
use std::path::Path;
#[cfg(test)]
use std::path::PathBuf;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

enum FakeScores {
    Random,
    /// Played back in order. The last score repeats once the script runs out.
    #[cfg(test)]
    Scripted(Mutex<VecDeque<f32>>),
    #[cfg(test)]
    Failing,
}

pub struct ImageClassifierFake {
    scores: FakeScores,
    #[cfg(test)]
    calls: AtomicUsize,
    #[cfg(test)]
    last_path: Mutex<Option<PathBuf>>,
}

impl ImageClassifierFake {
    fn with_scores(scores: FakeScores) -> Self {
        Self {
            scores,
            #[cfg(test)]
            calls: AtomicUsize::new(0),
            #[cfg(test)]
            last_path: Mutex::new(None),
        }
    }

    pub fn random() -> Self {
        Self::with_scores(FakeScores::Random)
    }
}

#[cfg(test)]
impl ImageClassifierFake {
    pub fn scripted(scores: Vec<f32>) -> Self {
        Self::with_scores(FakeScores::Scripted(Mutex::new(scores.into())))
    }

    pub fn constant(score: f32) -> Self {
        Self::scripted(vec![score])
    }

    pub fn failing() -> Self {
        Self::with_scores(FakeScores::Failing)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_path(&self) -> Option<PathBuf> {
        self.last_path.lock().clone()
    }
}

impl ImageClassifier for ImageClassifierFake {
    fn score(&self, image_path: &Path) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        #[cfg(test)]
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_path.lock() = Some(image_path.to_path_buf());
        }
        #[cfg(not(test))]
        let _ = image_path;

        match &self.scores {
            FakeScores::Random => {
                let dist = Uniform::new_inclusive(0.0f32, 1.0)?;
                Ok(dist.sample(&mut rand::rng()))
            }
            #[cfg(test)]
            FakeScores::Scripted(scores) => {
                let mut scores = scores.lock();
                let score = scores.front().copied().ok_or("no scripted scores")?;
                if scores.len() > 1 {
                    scores.pop_front();
                }
                Ok(score)
            }
            #[cfg(test)]
            FakeScores::Failing => Err("fake classifier failure".into()),
        }
    }

    fn model_id(&self) -> String {
        "fake".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_scores_repeat_last() {
        let classifier = ImageClassifierFake::scripted(vec![0.1, 0.9]);
        let path = Path::new("/tmp/x.jpg");

        assert_eq!(classifier.score(path).unwrap(), 0.1);
        assert_eq!(classifier.score(path).unwrap(), 0.9);
        assert_eq!(classifier.score(path).unwrap(), 0.9);
        assert_eq!(classifier.calls(), 3);
        assert_eq!(classifier.last_path(), Some(path.to_path_buf()));
    }

    #[test]
    fn test_random_scores_are_probabilities() {
        let classifier = ImageClassifierFake::random();

        for _ in 0..100 {
            let score = classifier.score(Path::new("x")).unwrap();
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn test_failing_classifier_errors() {
        assert!(ImageClassifierFake::failing().score(Path::new("x")).is_err());
    }
}
