pub mod balancing;
pub mod classifier;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod hasher;
pub mod lemmatization;
pub mod models;
pub mod normalization;
pub mod sentiment;
pub mod stopwords;
pub mod storage;
pub mod tfidf;
pub mod tokenization;
pub mod training;

pub use error::{Result, SentimentError};
