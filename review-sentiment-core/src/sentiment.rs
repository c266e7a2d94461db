use {
    std::fmt,
    serde::{Serialize, Deserialize},
};

/// Variant order is the alphabetical order of the label names, which is also
/// the default class index order of a trained model.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

    pub fn from_rating(rating: f64, midpoint: f64) -> Self {
        if rating > midpoint {
            Sentiment::Positive
        } else if rating < midpoint {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
            Sentiment::Positive => "Positive",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|sentiment| sentiment.name() == name)
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
