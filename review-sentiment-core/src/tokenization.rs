use {
    once_cell::sync::Lazy,
    regex::Regex,
};

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("url pattern is valid"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digits pattern is valid"));

/// Lowercases and strips urls, ascii punctuation and digit runs. Every removed
/// span is replaced with a space so neighbouring words never merge.
pub fn clean_text(text: &str) -> String {
    let text = text.to_lowercase();
    let text = URL.replace_all(&text, " ");
    let text: String = text
        .chars()
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect();

    DIGITS.replace_all(&text, " ").into_owned()
}

pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(|token| token.to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_is_replaced_not_deleted() {
        assert_eq!(tokenize(&clean_text("Great,sound!Really")), vec!["great", "sound", "really"]);
    }

    #[test]
    fn urls_and_digits_are_removed() {
        let cleaned = clean_text("See https://example.com/a?b=1 and www.shop.com for 25 picks");

        assert_eq!(tokenize(&cleaned), vec!["see", "and", "for", "picks"]);
    }

    #[test]
    fn digits_inside_words_split_them() {
        assert_eq!(tokenize(&clean_text("mp3player")), vec!["mp", "player"]);
    }

    #[test]
    fn newlines_are_whitespace() {
        assert_eq!(tokenize(&clean_text("one\ntwo\r\nthree")), vec!["one", "two", "three"]);
    }
}
