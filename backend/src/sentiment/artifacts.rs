use super::classifier::{ClassifierArtifact, TextClassifier};
use super::error::ArtifactError;
use super::vectorizer::TfidfVectorizer;
use std::fs;
use std::path::Path;

fn read_artifact(path: &Path) -> Result<String, ArtifactError> {
    fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub fn load_vectorizer(path: impl AsRef<Path>) -> Result<TfidfVectorizer, ArtifactError> {
    let path = path.as_ref();
    let vectorizer = TfidfVectorizer::from_json(&read_artifact(path)?)?;
    log::info!("Loaded vectorizer from {}", path.display());
    Ok(vectorizer)
}

pub fn load_classifier(path: impl AsRef<Path>) -> Result<Box<dyn TextClassifier>, ArtifactError> {
    let path = path.as_ref();
    let classifier = ClassifierArtifact::from_json(&read_artifact(path)?)?.into_classifier();
    log::info!(
        "Loaded {} classifier ({} features) from {}",
        classifier.name(),
        classifier.n_features(),
        path.display()
    );
    Ok(classifier)
}
