//! Artifact directory holding the fitted vectorizer, the classifier and a
//! human-readable manifest.
//!
//! Both binary artifacts start with a fixed header: four magic bytes, a
//! big-endian `u16` format version and the big-endian `u32` vocabulary
//! fingerprint, followed by the bincode payload.

use {
    std::{fs, path::{Path, PathBuf}},
    byteorder::{BigEndian, ByteOrder},
    chrono::{DateTime, Utc},
    serde::{Serialize, Deserialize},
    tracing::info,
    crate::{
        classifier::Classifier,
        error::{Result, SentimentError},
        tfidf::FittedVectorizer,
    },
};

pub const VECTORIZER_FILE: &str = "vectorizer.bin";
pub const CLASSIFIER_FILE: &str = "classifier.bin";
pub const MANIFEST_FILE: &str = "manifest.json";

pub const FORMAT_VERSION: u16 = 1;

const VECTORIZER_MAGIC: &[u8; 4] = b"RSVT";
const CLASSIFIER_MAGIC: &[u8; 4] = b"RSCL";
const HEADER_LEN: usize = 10;

#[derive(Clone, Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ArtifactManifest {
    pub format_version: u16,
    pub created_at: DateTime<Utc>,
    pub fingerprint: String,
    pub vocabulary_size: usize,
    pub classes: Vec<String>,
    pub test_accuracy: Option<f64>,
}

impl ArtifactManifest {
    pub fn new(vectorizer: &FittedVectorizer, classifier: &Classifier) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            created_at: Utc::now(),
            fingerprint: format!("{:08x}", vectorizer.fingerprint()),
            vocabulary_size: vectorizer.vocabulary_size(),
            classes: classifier.classes().to_vec(),
            test_accuracy: None,
        }
    }

    pub fn with_test_accuracy(self, test_accuracy: f64) -> Self {
        Self {
            test_accuracy: Some(test_accuracy),
            ..self
        }
    }
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes both artifacts and a manifest. Refuses a pair that was not
    /// trained together.
    pub fn save(&self, vectorizer: &FittedVectorizer, classifier: &Classifier) -> Result<ArtifactManifest> {
        check_pair(vectorizer, classifier)?;

        fs::create_dir_all(&self.dir)?;

        let tag = vectorizer.fingerprint();
        self.write_blob(VECTORIZER_FILE, VECTORIZER_MAGIC, tag, &bincode::serialize(vectorizer)?)?;
        self.write_blob(CLASSIFIER_FILE, CLASSIFIER_MAGIC, tag, &bincode::serialize(classifier)?)?;

        let manifest = ArtifactManifest::new(vectorizer, classifier);
        self.write_manifest(&manifest)?;

        info!("saved artifacts to {} (fingerprint {})", self.dir.display(), manifest.fingerprint);

        Ok(manifest)
    }

    pub fn write_manifest(&self, manifest: &ArtifactManifest) -> Result<()> {
        let path = self.dir.join(MANIFEST_FILE);
        write_atomically(&path, &serde_json::to_vec_pretty(manifest)?)
    }

    pub fn read_manifest(&self) -> Result<ArtifactManifest> {
        let path = self.dir.join(MANIFEST_FILE);
        let bytes = fs::read(&path).map_err(|err| SentimentError::artifact(&path, err.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Loads the vectorizer and classifier and checks that they belong together.
    pub fn load(&self) -> Result<(FittedVectorizer, Classifier)> {
        let vectorizer = self.load_vectorizer()?;
        let classifier = self.load_classifier()?;

        check_pair(&vectorizer, &classifier)?;

        info!(
            "loaded artifacts from {}: {} terms, classes {:?}",
            self.dir.display(), vectorizer.vocabulary_size(), classifier.classes()
        );

        Ok((vectorizer, classifier))
    }

    pub fn load_vectorizer(&self) -> Result<FittedVectorizer> {
        let path = self.dir.join(VECTORIZER_FILE);
        let (tag, payload) = read_blob(&path, VECTORIZER_MAGIC)?;

        let vectorizer: FittedVectorizer = bincode::deserialize(payload.as_slice())
            .map_err(|err| SentimentError::artifact(&path, err.to_string()))?;
        if vectorizer.fingerprint() != tag {
            return Err(SentimentError::artifact(&path, format!(
                "header fingerprint {:08x} does not match vocabulary fingerprint {:08x}", tag, vectorizer.fingerprint()
            )));
        }

        Ok(vectorizer)
    }

    pub fn load_classifier(&self) -> Result<Classifier> {
        let path = self.dir.join(CLASSIFIER_FILE);
        let (tag, payload) = read_blob(&path, CLASSIFIER_MAGIC)?;

        let classifier: Classifier = bincode::deserialize(payload.as_slice())
            .map_err(|err| SentimentError::artifact(&path, err.to_string()))?;
        classifier.validate().map_err(|err| SentimentError::artifact(&path, err.to_string()))?;
        if classifier.vectorizer_fingerprint() != tag {
            return Err(SentimentError::artifact(&path, format!(
                "header fingerprint {:08x} does not match classifier fingerprint {:08x}",
                tag, classifier.vectorizer_fingerprint()
            )));
        }

        Ok(classifier)
    }

    fn write_blob(&self, name: &str, magic: &[u8; 4], tag: u32, payload: &[u8]) -> Result<()> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[..4].copy_from_slice(magic);
        BigEndian::write_u16(&mut bytes[4..6], FORMAT_VERSION);
        BigEndian::write_u32(&mut bytes[6..10], tag);
        bytes.extend_from_slice(payload);

        write_atomically(&self.dir.join(name), &bytes)
    }
}

fn check_pair(vectorizer: &FittedVectorizer, classifier: &Classifier) -> Result<()> {
    if classifier.vectorizer_fingerprint() != vectorizer.fingerprint() {
        return Err(SentimentError::ArtifactMismatch {
            expected: classifier.vectorizer_fingerprint(),
            actual: vectorizer.fingerprint(),
        });
    }
    if classifier.n_features() != vectorizer.vocabulary_size() {
        return Err(SentimentError::Serialization(format!(
            "classifier expects {} features but vectorizer produces {}",
            classifier.n_features(), vectorizer.vocabulary_size()
        )));
    }
    Ok(())
}

/// Returns the header tag and the payload after checking magic and version.
fn read_blob(path: &Path, magic: &[u8; 4]) -> Result<(u32, Vec<u8>)> {
    let mut bytes = fs::read(path).map_err(|err| SentimentError::artifact(path, err.to_string()))?;

    if bytes.len() < HEADER_LEN {
        return Err(SentimentError::artifact(path, "file is too short to hold an artifact header"));
    }
    if &bytes[..4] != magic {
        return Err(SentimentError::artifact(path, format!(
            "unexpected magic bytes, expected {:?}", String::from_utf8_lossy(magic)
        )));
    }

    let version = BigEndian::read_u16(&bytes[4..6]);
    if version != FORMAT_VERSION {
        return Err(SentimentError::artifact(path, format!(
            "unsupported format version {} (expected {})", version, FORMAT_VERSION
        )));
    }

    let tag = BigEndian::read_u32(&bytes[6..10]);
    let payload = bytes.split_off(HEADER_LEN);

    Ok((tag, payload))
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            classifier::LogisticRegression,
            config::ClassifierConfig,
            tfidf::TfidfVectorizer,
        },
    };

    fn corpus() -> Vec<&'static str> {
        vec![
            "great sound great value",
            "great sound love",
            "cheap cable broke fast",
            "cable broke again",
            "okay strings okay price",
            "okay price average",
        ]
    }

    fn trained() -> (FittedVectorizer, Classifier) {
        let vectorizer = TfidfVectorizer::new(100).fit(&corpus()).unwrap();
        let features = vectorizer.transform_batch(&corpus());
        let classes = vec!["Negative".to_owned(), "Neutral".to_owned(), "Positive".to_owned()];
        let classifier = LogisticRegression::new(&ClassifierConfig::default())
            .fit(&features, &[2, 2, 0, 0, 1, 1], &classes, vectorizer.fingerprint())
            .unwrap();

        (vectorizer, classifier)
    }

    #[test]
    fn save_then_load_gives_identical_models() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (vectorizer, classifier) = trained();

        let manifest = store.save(&vectorizer, &classifier).unwrap();
        let (loaded_vectorizer, loaded_classifier) = store.load().unwrap();

        assert_eq!(loaded_vectorizer, vectorizer);
        assert_eq!(loaded_classifier, classifier);
        assert_eq!(manifest.vocabulary_size, vectorizer.vocabulary_size());
        assert_eq!(manifest.fingerprint, format!("{:08x}", vectorizer.fingerprint()));
        assert_eq!(store.read_manifest().unwrap(), manifest);
    }

    #[test]
    fn header_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (vectorizer, classifier) = trained();
        store.save(&vectorizer, &classifier).unwrap();

        let bytes = fs::read(dir.path().join(VECTORIZER_FILE)).unwrap();

        assert_eq!(&bytes[..4], b"RSVT");
        assert_eq!(BigEndian::read_u16(&bytes[4..6]), FORMAT_VERSION);
        assert_eq!(BigEndian::read_u32(&bytes[6..10]), vectorizer.fingerprint());
    }

    #[test]
    fn mismatched_pair_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (vectorizer, classifier) = trained();
        store.save(&vectorizer, &classifier).unwrap();

        let other = TfidfVectorizer::new(100).fit(&["different words entirely", "more different words"]).unwrap();
        let other_store = ArtifactStore::new(dir.path().join("other"));
        fs::create_dir_all(other_store.dir()).unwrap();
        other_store.write_blob(VECTORIZER_FILE, VECTORIZER_MAGIC, other.fingerprint(), &bincode::serialize(&other).unwrap()).unwrap();
        fs::copy(dir.path().join(CLASSIFIER_FILE), other_store.dir().join(CLASSIFIER_FILE)).unwrap();

        let result = other_store.load();

        assert!(matches!(result, Err(SentimentError::ArtifactMismatch { .. })));
    }

    #[test]
    fn mismatched_pair_is_rejected_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let (_, classifier) = trained();
        let other = TfidfVectorizer::new(100).fit(&["different words entirely"]).unwrap();

        let result = ArtifactStore::new(dir.path()).save(&other, &classifier);

        assert!(matches!(result, Err(SentimentError::ArtifactMismatch { .. })));
    }

    #[test]
    fn missing_files_name_the_path() {
        let dir = tempfile::tempdir().unwrap();

        match ArtifactStore::new(dir.path()).load() {
            Err(SentimentError::Artifact { path, .. }) => assert!(path.ends_with(VECTORIZER_FILE)),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn corrupt_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (vectorizer, classifier) = trained();
        store.save(&vectorizer, &classifier).unwrap();

        let path = dir.path().join(CLASSIFIER_FILE);
        let mut bytes = fs::read(&path).unwrap();
        bytes[0] = b'X';
        fs::write(&path, bytes).unwrap();

        assert!(matches!(store.load_classifier(), Err(SentimentError::Artifact { .. })));
    }
}
