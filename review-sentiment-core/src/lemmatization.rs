/// Plural forms that suffix rules get wrong, and words that only look plural.
const EXCEPTIONS: &[(&str, &str)] = &[
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("lives", "life"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("movies", "movie"),
    ("cookies", "cookie"),
    ("ties", "tie"),
    ("lies", "lie"),
    ("pies", "pie"),
    ("dies", "die"),
    ("series", "series"),
    ("species", "species"),
    ("news", "news"),
    ("lens", "lens"),
    ("always", "always"),
    ("perhaps", "perhaps"),
    ("sometimes", "sometimes"),
    ("afterwards", "afterwards"),
    ("towards", "towards"),
    ("besides", "besides"),
    ("whereas", "whereas"),
    ("bias", "bias"),
    ("canvas", "canvas"),
    ("atlas", "atlas"),
    ("alias", "alias"),
    ("christmas", "christmas"),
    ("goes", "go"),
];

/// Reduces an inflected noun to its base form. The output is a fixed point:
/// lemmatizing a lemma returns it unchanged.
pub fn lemmatize(token: &str) -> String {
    if let Some((_, lemma)) = EXCEPTIONS.iter().find(|(form, _)| *form == token) {
        return (*lemma).to_owned();
    }

    if token.chars().count() <= 3 {
        return token.to_owned();
    }

    if token.ends_with("sses") {
        return strip(token, "es");
    }

    if token.ends_with("ies") && token.len() > 4 {
        return format!("{}y", strip(token, "ies"));
    }

    if ["xes", "ches", "shes"].iter().any(|suffix| token.ends_with(suffix)) {
        return strip(token, "es");
    }

    if ["ss", "us", "is"].iter().any(|suffix| token.ends_with(suffix)) {
        return token.to_owned();
    }

    if token.ends_with('s') {
        return strip(token, "s");
    }

    token.to_owned()
}

// suffixes are ascii, so the cut is always on a char boundary
fn strip(token: &str, suffix: &str) -> String {
    token[..token.len() - suffix.len()].to_owned()
}
