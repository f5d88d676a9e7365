//! Language identification
//!
//! Detection sits behind a trait so the quality filter can be exercised with
//! a deterministic detector in tests and swapped for another backend.

use whatlang::Lang;

/// Identifies the language of a piece of text
pub trait LanguageDetector: Send + Sync {
    /// ISO 639-1 code (falling back to 639-3 where no two-letter code exists),
    /// or `None` when the text cannot be classified
    fn detect(&self, text: &str) -> Option<String>;
}

/// `whatlang`-backed detector
#[derive(Debug, Clone)]
pub struct WhatlangDetector {
    min_confidence: f64,
}

impl WhatlangDetector {
    #[must_use]
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<String> {
        let info = whatlang::detect(text)?;
        if !info.is_reliable() || info.confidence() < self.min_confidence {
            tracing::trace!(
                lang = info.lang().code(),
                confidence = info.confidence(),
                reliable = info.is_reliable(),
                "Language detection ambiguous"
            );
            return None;
        }
        Some(iso_639_1(info.lang()).to_string())
    }
}

/// Map whatlang's ISO 639-3 languages to two-letter codes
fn iso_639_1(lang: Lang) -> &'static str {
    match lang {
        Lang::Eng => "en",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Spa => "es",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Nld => "nl",
        Lang::Swe => "sv",
        Lang::Dan => "da",
        Lang::Nob => "nb",
        Lang::Fin => "fi",
        Lang::Pol => "pl",
        Lang::Ces => "cs",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Tur => "tr",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Cmn => "zh",
        Lang::Ara => "ar",
        Lang::Heb => "he",
        Lang::Hin => "hi",
        other => other.code(),
    }
}
