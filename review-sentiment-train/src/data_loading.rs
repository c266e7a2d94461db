use {
    std::{fs::File, io::Read, path::Path},
    anyhow::{Context, Result},
    csv::StringRecord,
    indicatif::ProgressBar,
    serde::Deserialize,
    tracing::{info, warn},
    review_sentiment_core::models::Review,
};

/// One csv row. Only these columns are read; anything else in the file is ignored.
#[derive(Deserialize, Debug)]
pub struct RawReview {
    #[serde(rename = "reviewText")]
    review_text: Option<String>,
    summary: Option<String>,
    overall: Option<String>,
}

pub struct LoadedReviews {
    pub reviews: Vec<Review>,
    pub skipped: usize,
}

pub fn load_reviews(path: &Path) -> Result<LoadedReviews> {
    info!("loading reviews from {}", path.display());

    let file = File::open(path).with_context(|| format!("failed to open dataset {}", path.display()))?;
    let size = file.metadata().map(|metadata| metadata.len()).unwrap_or(0);

    load_reviews_from_reader(file, ProgressBar::new(size))
}

/// Streams rows from `reader`; `pb` tracks the byte offset into the input.
pub fn load_reviews_from_reader<R: Read>(reader: R, pb: ProgressBar) -> Result<LoadedReviews> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers().context("failed to read csv headers")?.clone();

    for column in ["reviewText", "summary", "overall"] {
        if !headers.iter().any(|header| header == column) {
            anyhow::bail!("dataset is missing the {} column", column);
        }
    }

    let mut reviews = Vec::new();
    let mut skipped = 0;
    let mut record = StringRecord::new();
    let mut row = 0;

    loop {
        row += 1;

        match reader.read_record(&mut record) {
            Ok(true) => {},
            Ok(false) => break,
            Err(err) if err.is_io_error() => return Err(err).context("failed to read dataset"),
            Err(err) => {
                warn!("skipping row {}: {}", row, err);
                skipped += 1;
                continue;
            }
        }
        pb.set_position(reader.position().byte());

        let raw: RawReview = match record.deserialize(Some(&headers)) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("skipping row {}: {}", row, err);
                skipped += 1;
                continue;
            }
        };

        match Review::from_raw(raw.review_text, raw.summary, raw.overall.as_deref()) {
            Ok(review) => reviews.push(review),
            Err(err) => {
                warn!("skipping row {}: {}", row, err);
                skipped += 1;
            }
        }
    }

    pb.finish();

    info!("loaded {} reviews, skipped {}", reviews.len(), skipped);

    Ok(LoadedReviews {
        reviews,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(data: &str) -> Result<LoadedReviews> {
        load_reviews_from_reader(data.as_bytes(), ProgressBar::hidden())
    }

    #[test]
    fn reads_known_columns_and_ignores_others() {
        let data = "reviewerID,reviewText,summary,overall\n\
                    A1,\"Great strings, sound bright\",Five Stars,5.0\n\
                    A2,,Meh,3\n";

        let loaded = load(data).unwrap();

        assert_eq!(loaded.skipped, 0);
        assert_eq!(loaded.reviews.len(), 2);
        assert_eq!(loaded.reviews[0].body, "Great strings, sound bright");
        assert_eq!(loaded.reviews[0].rating, 5.0);
        assert_eq!(loaded.reviews[1].body, "");
        assert_eq!(loaded.reviews[1].summary, "Meh");
    }

    #[test]
    fn rows_without_usable_rating_are_skipped() {
        let data = "reviewText,summary,overall\n\
                    fine,ok,\n\
                    bad,awful,not a number\n\
                    good,nice,4\n";

        let loaded = load(data).unwrap();

        assert_eq!(loaded.skipped, 2);
        assert_eq!(loaded.reviews.len(), 1);
        assert_eq!(loaded.reviews[0].rating, 4.0);
    }

    #[test]
    fn ragged_rows_are_skipped_and_loading_continues() {
        let data = "reviewText,summary,overall\n\
                    short row\n\
                    good,nice,5\n";

        let loaded = load(data).unwrap();

        assert_eq!(loaded.skipped, 1);
        assert_eq!(loaded.reviews.len(), 1);
    }

    #[test]
    fn progress_follows_bytes_read() {
        let data = "reviewText,summary,overall\ngood,nice,5\n";
        let pb = ProgressBar::hidden();

        load_reviews_from_reader(data.as_bytes(), pb.clone()).unwrap();

        assert_eq!(pb.position(), data.len() as u64);
    }

    #[test]
    fn missing_column_is_an_error() {
        let data = "reviewText,overall\nfine,3\n";

        assert!(load(data).is_err());
    }
}
