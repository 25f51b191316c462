use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::Array4;
use thiserror::Error;
use tract_onnx::prelude::*;

use crate::error::ServiceError;
use crate::models::{ArtifactSpec, Disease};
use crate::predict::{self, Prediction};
use crate::preprocess::INPUT_SIZE;

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("{0}")]
    Load(String),
}

/// A classifier turns a preprocessed image tensor into a probability vector
/// aligned with its disease's label list. Behind a trait so the HTTP layer
/// can be exercised without model artifacts on disk.
pub trait ImageClassifier: Send + Sync {
    fn probabilities(&self, input: &Array4<f32>) -> Result<Vec<f32>, ServiceError>;
}

/// ONNX classifier executed through tract's typed plan. The plan runs
/// through `&self`, so one instance serves concurrent requests unlocked.
pub struct TractClassifier {
    plan: TypedSimplePlan<TypedModel>,
}

impl TractClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let side = INPUT_SIZE as i64;
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| ModelLoadError::Load(format!("failed to read model: {e}")))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, side, side, 3)),
            )
            .map_err(|e| ModelLoadError::Load(format!("failed to fix input shape: {e}")))?
            .into_optimized()
            .map_err(|e| ModelLoadError::Load(format!("failed to optimize model: {e}")))?
            .into_runnable()
            .map_err(|e| ModelLoadError::Load(format!("failed to make model runnable: {e}")))?;

        Ok(TractClassifier { plan })
    }
}

impl ImageClassifier for TractClassifier {
    fn probabilities(&self, input: &Array4<f32>) -> Result<Vec<f32>, ServiceError> {
        let side = INPUT_SIZE as usize;
        let data = input
            .as_slice()
            .ok_or_else(|| ServiceError::Inference("input tensor is not contiguous".into()))?;

        let tensor = tract_ndarray::Array4::from_shape_vec((1, side, side, 3), data.to_vec())
            .map_err(|e| ServiceError::Inference(e.to_string()))?
            .into_tensor();

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| ServiceError::Inference(e.to_string()))?;

        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| ServiceError::Inference(e.to_string()))?;

        Ok(view.iter().copied().collect())
    }
}

/// One serving entry: a disease, its ordered labels, and the live model.
pub struct LoadedModel {
    pub disease: Disease,
    pub labels: &'static [&'static str],
    pub classifier: Box<dyn ImageClassifier>,
}

impl LoadedModel {
    pub fn predict(&self, input: &Array4<f32>) -> Result<Prediction, ServiceError> {
        let probabilities = self.classifier.probabilities(input)?;
        if probabilities.len() != self.labels.len() {
            return Err(ServiceError::Inference(format!(
                "model for {} returned {} probabilities for {} labels",
                self.disease,
                probabilities.len(),
                self.labels.len()
            )));
        }
        Ok(predict::postprocess(&probabilities, self.labels))
    }
}

/// The read-only serving set, built once at startup. A disease whose model
/// fails to load is logged and left out; the process keeps going.
pub struct ModelSet {
    models: HashMap<Disease, LoadedModel>,
}

impl ModelSet {
    pub fn load(models_dir: &Path) -> ModelSet {
        let mut loaded = Vec::new();
        for disease in Disease::ALL {
            match load_classifier(disease.artifact(models_dir)) {
                Ok(classifier) => {
                    tracing::info!("loaded model for {disease}");
                    loaded.push(LoadedModel {
                        disease,
                        labels: disease.labels(),
                        classifier,
                    });
                }
                Err(e) => {
                    tracing::error!("error loading model for {disease}: {e}");
                }
            }
        }
        ModelSet::from_loaded(loaded)
    }

    pub fn from_loaded(loaded: Vec<LoadedModel>) -> ModelSet {
        ModelSet {
            models: loaded.into_iter().map(|m| (m.disease, m)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&LoadedModel> {
        let disease = Disease::from_key(key)?;
        self.models.get(&disease)
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn serving_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.models.keys().map(|d| d.key()).collect();
        keys.sort_unstable();
        keys
    }
}

fn load_classifier(artifact: ArtifactSpec) -> Result<Box<dyn ImageClassifier>, ModelLoadError> {
    let graph = match &artifact {
        ArtifactSpec::Bundled(path) => path.clone(),
        ArtifactSpec::Split { graph, weights } => {
            // tract resolves external tensor data relative to the graph
            // file, but a missing blob should fail with the blob's path.
            if !weights.exists() {
                return Err(ModelLoadError::MissingArtifact(weights.clone()));
            }
            graph.clone()
        }
    };

    if !graph.exists() {
        return Err(ModelLoadError::MissingArtifact(graph));
    }

    Ok(Box::new(TractClassifier::load(&graph)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier(Vec<f32>);

    impl ImageClassifier for FixedClassifier {
        fn probabilities(&self, _input: &Array4<f32>) -> Result<Vec<f32>, ServiceError> {
            Ok(self.0.clone())
        }
    }

    fn fixed_model(disease: Disease, probabilities: Vec<f32>) -> LoadedModel {
        LoadedModel {
            disease,
            labels: disease.labels(),
            classifier: Box::new(FixedClassifier(probabilities)),
        }
    }

    #[test]
    fn empty_models_dir_leaves_an_empty_serving_set() {
        let dir = tempfile::tempdir().unwrap();
        let set = ModelSet::load(dir.path());
        assert!(set.is_empty());
        assert!(set.get("cancer").is_none());
    }

    #[test]
    fn split_artifact_with_missing_weights_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let graph = dir.path().join("model.onnx");
        std::fs::write(&graph, b"stub").unwrap();

        let err = load_classifier(ArtifactSpec::Split {
            graph,
            weights: dir.path().join("model.weights.bin"),
        })
        .err()
        .unwrap();
        assert!(matches!(err, ModelLoadError::MissingArtifact(_)));
    }

    #[test]
    fn unparseable_artifact_is_a_load_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cancer.onnx");
        std::fs::write(&path, b"not a protobuf").unwrap();

        let err = load_classifier(ArtifactSpec::Bundled(path)).err().unwrap();
        assert!(matches!(err, ModelLoadError::Load(_)));
    }

    #[test]
    fn predict_rejects_probability_label_length_mismatch() {
        let model = fixed_model(Disease::Cancer, vec![0.5, 0.5]);
        let input = Array4::zeros((1, 176, 176, 3));
        let err = model.predict(&input).unwrap_err();
        assert!(matches!(err, ServiceError::Inference(_)));
    }

    #[test]
    fn predict_runs_the_postprocessing_rule() {
        let model = fixed_model(Disease::Ms, vec![0.1, 0.1, 0.4, 0.4]);
        let input = Array4::zeros((1, 176, 176, 3));
        let prediction = model.predict(&input).unwrap();
        assert_eq!(prediction.label, "Positive");
    }

    #[test]
    fn serving_keys_are_sorted() {
        let set = ModelSet::from_loaded(vec![
            fixed_model(Disease::Ms, vec![0.25; 4]),
            fixed_model(Disease::Cancer, vec![0.25; 4]),
        ]);
        assert_eq!(set.serving_keys(), vec!["cancer", "ms"]);
    }
}
