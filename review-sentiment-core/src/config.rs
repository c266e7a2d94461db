use {
    std::{fs::read_to_string, path::PathBuf},
    tracing::warn,
    serde::Deserialize,
};

#[derive(Deserialize, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub training: TrainingConfig,
    pub artifacts: Option<ArtifactsConfig>,
    pub service: Option<ServiceConfig>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct TrainingConfig {
    dataset_path: Option<PathBuf>,
    results_dir: Option<PathBuf>,
    rating_midpoint: Option<f64>,
    test_fraction: Option<f64>,
    seed: Option<u64>,
    #[serde(default)]
    pub vectorizer: VectorizerConfig,
    #[serde(default)]
    pub balancer: BalancerConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct VectorizerConfig {
    pub max_features: usize,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct BalancerConfig {
    pub k_neighbors: usize,
    pub adaptive_neighbors: bool,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ClassifierConfig {
    pub c: f64,
    pub max_iter: usize,
    pub tolerance: f64,
    pub learning_rate: f64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ArtifactsConfig {
    dir: Option<PathBuf>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServiceConfig {
    bind_address: Option<String>,
    allowed_origins: Option<Vec<String>>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            results_dir: None,
            rating_midpoint: None,
            test_fraction: None,
            seed: None,
            vectorizer: VectorizerConfig::default(),
            balancer: BalancerConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
        }
    }
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            adaptive_neighbors: true,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tolerance: 1e-4,
            learning_rate: 1.0,
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: None,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: None,
            allowed_origins: None,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        read_to_string("./config.toml")
            .or_else(|_| read_to_string("/config/config.toml"))
            .map_err(|err| err.to_string())
            .and_then(|v| Self::from_toml(&v))
            .unwrap_or_else(|err| {
                warn!("failed to read config, using defaults: {}", err);
                Config::default()
            })
    }

    pub fn from_toml(source: &str) -> Result<Self, String> {
        toml::from_str(source).map_err(|err| err.to_string())
    }

    pub fn artifacts(&self) -> ArtifactsConfig {
        self.artifacts.as_ref().cloned().unwrap_or_default()
    }

    pub fn service(&self) -> ServiceConfig {
        self.service.as_ref().cloned().unwrap_or_default()
    }
}

impl TrainingConfig {
    pub fn dataset_path(&self) -> PathBuf {
        self.dataset_path.clone().unwrap_or_else(|| PathBuf::from("Instruments_Reviews.csv"))
    }

    pub fn results_dir(&self) -> PathBuf {
        self.results_dir.clone().unwrap_or_else(|| PathBuf::from("results"))
    }

    /// Ratings above this are positive, below it negative.
    pub fn rating_midpoint(&self) -> f64 {
        self.rating_midpoint.unwrap_or(3.0)
    }

    pub fn test_fraction(&self) -> f64 {
        self.test_fraction.unwrap_or(0.25)
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(42)
    }
}

impl ArtifactsConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| PathBuf::from("results"))
    }
}

impl ServiceConfig {
    pub fn bind_address(&self) -> String {
        self.bind_address.as_ref().cloned().unwrap_or("0.0.0.0:8000".to_owned())
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        self.allowed_origins.as_ref().cloned().unwrap_or_else(|| vec!["http://localhost:3000".to_owned()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_falls_back_to_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.training.dataset_path(), PathBuf::from("Instruments_Reviews.csv"));
        assert_eq!(config.training.rating_midpoint(), 3.0);
        assert_eq!(config.training.test_fraction(), 0.25);
        assert_eq!(config.training.seed(), 42);
        assert_eq!(config.training.vectorizer.max_features, 5000);
        assert_eq!(config.training.balancer.k_neighbors, 5);
        assert_eq!(config.artifacts().dir(), PathBuf::from("results"));
        assert_eq!(config.service().allowed_origins(), vec!["http://localhost:3000".to_owned()]);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::from_toml(r#"
[training]
seed = 7

[training.balancer]
k_neighbors = 3
adaptive_neighbors = false

[service]
bind_address = "127.0.0.1:9000"
"#).unwrap();

        assert_eq!(config.training.seed(), 7);
        assert_eq!(config.training.balancer.k_neighbors, 3);
        assert!(!config.training.balancer.adaptive_neighbors);
        assert_eq!(config.training.classifier.max_iter, 1000);
        assert_eq!(config.service().bind_address(), "127.0.0.1:9000");
        assert_eq!(config.service().allowed_origins().len(), 1);
    }
}
