//! SMOTE oversampling for skewed class distributions.
//!
//! Every class smaller than the majority is topped up with synthetic rows that
//! lie on the segment between one of its samples and one of that sample's
//! nearest same-class neighbours. Original rows are never touched.

use {
    std::collections::BTreeMap,
    rand::{Rng, SeedableRng},
    rand_xoshiro::Xoshiro256PlusPlus,
    sprs::CsMat,
    tracing::{info, warn},
    crate::{
        config::BalancerConfig,
        error::{Result, SentimentError},
        features::{interpolate, squared_distance, stack_rows, to_row, FeatureRow},
    },
};

#[derive(Clone, Debug)]
pub struct Smote {
    k_neighbors: usize,
    adaptive_neighbors: bool,
    seed: u64,
}

impl Smote {
    pub fn new(config: &BalancerConfig, seed: u64) -> Self {
        Self {
            k_neighbors: config.k_neighbors,
            adaptive_neighbors: config.adaptive_neighbors,
            seed,
        }
    }

    /// Returns the original rows in their original order followed by the
    /// synthetic ones, with labels to match.
    pub fn fit_resample(&self, features: &CsMat<f64>, labels: &[usize]) -> Result<(CsMat<f64>, Vec<usize>)> {
        if features.rows() != labels.len() {
            return Err(SentimentError::configuration(format!(
                "balancer got {} rows but {} labels", features.rows(), labels.len()
            )));
        }
        if labels.is_empty() {
            return Err(SentimentError::configuration("cannot balance an empty dataset"));
        }
        if self.k_neighbors == 0 {
            return Err(SentimentError::configuration("balancer k_neighbors must be positive"));
        }

        let rows: Vec<FeatureRow> = features.outer_iterator().map(to_row).collect();

        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, label) in labels.iter().enumerate() {
            members.entry(*label).or_default().push(idx);
        }
        let majority = members.values().map(|m| m.len()).max().unwrap_or(0);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut synthetic_rows = Vec::new();
        let mut synthetic_labels = Vec::new();

        for (label, class_members) in &members {
            let needed = majority - class_members.len();
            if needed == 0 {
                continue;
            }

            let k = self.neighbors_for(*label, class_members.len())?;
            let neighbors = nearest_neighbors(&rows, class_members, k);

            for _ in 0..needed {
                let sample = rng.gen_range(0..class_members.len());
                let neighbor = neighbors[sample][rng.gen_range(0..k)];
                let gap: f64 = rng.gen();

                synthetic_rows.push(interpolate(&rows[class_members[sample]], &rows[neighbor], gap));
                synthetic_labels.push(*label);
            }

            info!("class {}: synthesized {} samples from {} originals", label, needed, class_members.len());
        }

        let mut balanced_labels = labels.to_vec();
        balanced_labels.extend(synthetic_labels);

        let balanced = stack_rows(features.cols(), rows.into_iter().chain(synthetic_rows));

        Ok((balanced, balanced_labels))
    }

    fn neighbors_for(&self, label: usize, class_size: usize) -> Result<usize> {
        if class_size < 2 {
            return Err(SentimentError::configuration(format!(
                "class {} has {} sample(s); at least 2 are needed to synthesize new ones", label, class_size
            )));
        }

        if class_size > self.k_neighbors {
            return Ok(self.k_neighbors);
        }

        if !self.adaptive_neighbors {
            return Err(SentimentError::configuration(format!(
                "class {} has {} samples, but k_neighbors = {} requires at least {}; \
                 lower k_neighbors or enable adaptive_neighbors",
                label, class_size, self.k_neighbors, self.k_neighbors + 1
            )));
        }

        warn!(
            "class {} has only {} samples, reducing k_neighbors from {} to {}",
            label, class_size, self.k_neighbors, class_size - 1
        );
        Ok(class_size - 1)
    }
}

/// For each member, the row indices of its `k` closest other members.
fn nearest_neighbors(rows: &[FeatureRow], class_members: &[usize], k: usize) -> Vec<Vec<usize>> {
    class_members
        .iter()
        .map(|&idx| {
            let mut distances: Vec<(f64, usize)> = class_members
                .iter()
                .filter(|&&other| other != idx)
                .map(|&other| (squared_distance(&rows[idx], &rows[other]), other))
                .collect();

            distances.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
            distances.into_iter().take(k).map(|(_, other)| other).collect()
        })
        .collect()
}
