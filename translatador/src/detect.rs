//! Language detection
//!
//! The engine reports a detection as one packed `u64`: the language id in the
//! low byte and the `f32` confidence bits in the 32 bits above it.

use crate::engine::SharedEngine;
use crate::error::Result;
use serde::{Deserialize, Serialize};

macro_rules! languages {
    ($($variant:ident => $code:literal,)*) => {
        /// A language the detector can report, identified by its ISO 639-3 code
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum DetectedLanguage {
            $($variant,)*
        }

        impl DetectedLanguage {
            /// Every language, indexed by engine id
            pub const ALL: &'static [DetectedLanguage] = &[$(DetectedLanguage::$variant,)*];

            /// ISO 639-3 code of this language
            pub fn code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)*
                }
            }
        }
    };
}

languages! {
    Esperanto => "epo",
    English => "eng",
    Russian => "rus",
    Mandarin => "cmn",
    Spanish => "spa",
    Portuguese => "por",
    Italian => "ita",
    Bengali => "ben",
    French => "fra",
    German => "deu",
    Ukrainian => "ukr",
    Georgian => "kat",
    Arabic => "ara",
    Hindi => "hin",
    Japanese => "jpn",
    Hebrew => "heb",
    Yiddish => "yid",
    Polish => "pol",
    Amharic => "amh",
    Javanese => "jav",
    Korean => "kor",
    Bokmal => "nob",
    Danish => "dan",
    Swedish => "swe",
    Finnish => "fin",
    Turkish => "tur",
    Dutch => "nld",
    Hungarian => "hun",
    Czech => "ces",
    Greek => "ell",
    Bulgarian => "bul",
    Belarusian => "bel",
    Marathi => "mar",
    Kannada => "kan",
    Romanian => "ron",
    Slovene => "slv",
    Croatian => "hrv",
    Serbian => "srp",
    Macedonian => "mkd",
    Lithuanian => "lit",
    Latvian => "lav",
    Estonian => "est",
    Tamil => "tam",
    Vietnamese => "vie",
    Urdu => "urd",
    Thai => "tha",
    Gujarati => "guj",
    Uzbek => "uzb",
    Punjabi => "pan",
    Azerbaijani => "aze",
    Indonesian => "ind",
    Telugu => "tel",
    Persian => "pes",
    Malayalam => "mal",
    Oriya => "ori",
    Burmese => "mya",
    Nepali => "nep",
    Sinhalese => "sin",
    Khmer => "khm",
    Turkmen => "tuk",
    Akan => "aka",
    Zulu => "zul",
    Shona => "sna",
    Afrikaans => "afr",
    Latin => "lat",
    Slovak => "slk",
    Catalan => "cat",
    Tagalog => "tgl",
    Armenian => "hye",
}

impl DetectedLanguage {
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|lang| lang.code() == code)
    }
}

/// Detected language + confidence pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// `None` when the engine reported an id outside the language table
    pub language: Option<DetectedLanguage>,
    pub confidence: f32,
}

impl Detection {
    /// Confidence at or above which a detection is considered reliable
    pub const RELIABLE_CONFIDENCE: f32 = 0.9;

    pub fn is_reliable(&self) -> bool {
        self.confidence >= Self::RELIABLE_CONFIDENCE
    }

    /// Pack a language id and confidence the way the engine reports them
    pub fn pack(language_id: u8, confidence: f32) -> u64 {
        (language_id as u64) | ((confidence.to_bits() as u64) << 8)
    }

    /// Decode a packed detection. The confidence is reinterpreted bit-for-bit.
    pub fn unpack(packed: u64) -> Self {
        let language = DetectedLanguage::from_id((packed & 0xff) as u8);
        let confidence = f32::from_bits(((packed >> 8) & 0xffff_ffff) as u32);
        Self {
            language,
            confidence,
        }
    }
}

/// Detects the language of a string. Thread-safe.
#[derive(Clone)]
pub struct LanguageDetector {
    engine: SharedEngine,
}

impl LanguageDetector {
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }

    /// Detector over the process-wide native engine, loading it if needed
    pub fn native() -> Result<Self> {
        Ok(Self::new(crate::loader::shared_engine()?))
    }

    pub fn detect(&self, text: &str) -> Result<Detection> {
        let packed = self.engine.detect_language(text)?;
        Ok(Detection::unpack(packed))
    }
}
