use {
    serde::{Serialize, Deserialize},
    crate::{
        error::{Result, SentimentError},
        sentiment::Sentiment,
    },
};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Review {
    pub body: String,
    pub summary: String,
    pub rating: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CleanedReview {
    pub text: String,
    pub rating: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LabeledReview {
    pub text: String,
    pub sentiment: Sentiment,
}

impl Review {
    /// Missing text fields are expected to arrive here as empty strings.
    pub fn new(body: Option<String>, summary: Option<String>, rating: f64) -> Self {
        Self {
            body: body.unwrap_or_default(),
            summary: summary.unwrap_or_default(),
            rating,
        }
    }

    /// Like [`Review::new`], but takes the rating as raw text. A missing,
    /// non-numeric or non-finite rating is a data error.
    pub fn from_raw(body: Option<String>, summary: Option<String>, rating: Option<&str>) -> Result<Self> {
        Ok(Self::new(body, summary, parse_rating(rating)?))
    }

    pub fn combined_text(&self) -> String {
        format!("{} {}", self.body, self.summary)
    }

    pub fn cleaned(self, text: String) -> CleanedReview {
        CleanedReview {
            text,
            rating: self.rating,
        }
    }
}

impl CleanedReview {
    pub fn labeled(self, sentiment: Sentiment) -> LabeledReview {
        LabeledReview {
            text: self.text,
            sentiment,
        }
    }
}

fn parse_rating(value: Option<&str>) -> Result<f64> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())
        .ok_or_else(|| SentimentError::Data("rating is missing".to_owned()))?;

    value
        .parse::<f64>()
        .ok()
        .filter(|rating| rating.is_finite())
        .ok_or_else(|| SentimentError::Data(format!("rating {:?} is not a finite number", value)))
}
