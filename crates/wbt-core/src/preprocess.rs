use unicode_normalization::UnicodeNormalization;

pub trait TextNormalizer {
    /// Reduces raw recognizer output to the canonical recognized text:
    /// NFKC, alphabetic characters only, lowercase
    fn normalize(&self, raw: &str) -> String {
        raw.nfkc()
            .filter(|c| c.is_alphabetic())
            .flat_map(char::to_lowercase)
            .collect()
    }
}

pub struct LetterNormalizer;
impl TextNormalizer for LetterNormalizer {}
