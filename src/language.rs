//! Target languages for speech synthesis.
//!
//! The backend has a voice model for a fixed set of languages. The client
//! only uses the table for display: a code outside the set is rendered as
//! [`Language::Unknown`] but is still sent as-is, so the backend stays the
//! authority on what it can synthesise.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A language code as chosen by the user or reported by the backend.
///
/// Not restricted to [`Language`]: an unknown code is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve to the display entry, falling back to [`Language::Unknown`].
    pub fn language(&self) -> Language {
        Language::from_code(&self.0)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Language> for LanguageCode {
    fn from(l: Language) -> Self {
        Self::new(l.code())
    }
}

/// Languages the backend has a voice model for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Belarusian,
    Bulgarian,
    Bengali,
    Catalan,
    Chinese,
    Czech,
    Danish,
    German,
    Greek,
    English,
    Spanish,
    Estonian,
    Persian,
    Finnish,
    French,
    Irish,
    Croatian,
    Hungarian,
    Italian,
    Japanese,
    Lithuanian,
    Latvian,
    Maltese,
    Dutch,
    Polish,
    Portuguese,
    Romanian,
    Slovak,
    Slovenian,
    Swedish,
    Turkish,
    Ukrainian,
    /// Fallback for any code outside the table.
    Unknown,
}

impl Language {
    /// Every supported language, in menu order. Excludes [`Language::Unknown`].
    pub const ALL: [Language; 32] = [
        Language::Belarusian,
        Language::Bulgarian,
        Language::Bengali,
        Language::Catalan,
        Language::Chinese,
        Language::Czech,
        Language::Danish,
        Language::German,
        Language::Greek,
        Language::English,
        Language::Spanish,
        Language::Estonian,
        Language::Persian,
        Language::Finnish,
        Language::French,
        Language::Irish,
        Language::Croatian,
        Language::Hungarian,
        Language::Italian,
        Language::Japanese,
        Language::Lithuanian,
        Language::Latvian,
        Language::Maltese,
        Language::Dutch,
        Language::Polish,
        Language::Portuguese,
        Language::Romanian,
        Language::Slovak,
        Language::Slovenian,
        Language::Swedish,
        Language::Turkish,
        Language::Ukrainian,
    ];

    pub fn from_code(code: &str) -> Language {
        BY_CODE
            .get(code.trim().to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(Language::Unknown)
    }

    /// Wire code, e.g. `fr` or `zh-cn`. Empty for [`Language::Unknown`].
    pub fn code(self) -> &'static str {
        match self {
            Language::Belarusian => "be",
            Language::Bulgarian => "bg",
            Language::Bengali => "bn",
            Language::Catalan => "ca",
            Language::Chinese => "zh-cn",
            Language::Czech => "cs",
            Language::Danish => "da",
            Language::German => "de",
            Language::Greek => "el",
            Language::English => "en",
            Language::Spanish => "es",
            Language::Estonian => "et",
            Language::Persian => "fa",
            Language::Finnish => "fi",
            Language::French => "fr",
            Language::Irish => "ga",
            Language::Croatian => "hr",
            Language::Hungarian => "hu",
            Language::Italian => "it",
            Language::Japanese => "ja",
            Language::Lithuanian => "lt",
            Language::Latvian => "lv",
            Language::Maltese => "mt",
            Language::Dutch => "nl",
            Language::Polish => "pl",
            Language::Portuguese => "pt",
            Language::Romanian => "ro",
            Language::Slovak => "sk",
            Language::Slovenian => "sl",
            Language::Swedish => "sv",
            Language::Turkish => "tr",
            Language::Ukrainian => "uk",
            Language::Unknown => "",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Belarusian => "Belarusian",
            Language::Bulgarian => "Bulgarian",
            Language::Bengali => "Bengali",
            Language::Catalan => "Catalan",
            Language::Chinese => "Chinese",
            Language::Czech => "Czech",
            Language::Danish => "Danish",
            Language::German => "German",
            Language::Greek => "Greek",
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::Estonian => "Estonian",
            Language::Persian => "Persian",
            Language::Finnish => "Finnish",
            Language::French => "French",
            Language::Irish => "Irish",
            Language::Croatian => "Croatian",
            Language::Hungarian => "Hungarian",
            Language::Italian => "Italian",
            Language::Japanese => "Japanese",
            Language::Lithuanian => "Lithuanian",
            Language::Latvian => "Latvian",
            Language::Maltese => "Maltese",
            Language::Dutch => "Dutch",
            Language::Polish => "Polish",
            Language::Portuguese => "Portuguese",
            Language::Romanian => "Romanian",
            Language::Slovak => "Slovak",
            Language::Slovenian => "Slovenian",
            Language::Swedish => "Swedish",
            Language::Turkish => "Turkish",
            Language::Ukrainian => "Ukrainian",
            Language::Unknown => "Unknown",
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            Language::Belarusian => "🇧🇾",
            Language::Bulgarian => "🇧🇬",
            Language::Bengali => "🇧🇩",
            Language::Catalan => "🇦🇩",
            Language::Chinese => "🇨🇳",
            Language::Czech => "🇨🇿",
            Language::Danish => "🇩🇰",
            Language::German => "🇩🇪",
            Language::Greek => "🇬🇷",
            Language::English => "🇬🇧",
            Language::Spanish => "🇪🇸",
            Language::Estonian => "🇪🇪",
            Language::Persian => "🇮🇷",
            Language::Finnish => "🇫🇮",
            Language::French => "🇫🇷",
            Language::Irish => "🇮🇪",
            Language::Croatian => "🇭🇷",
            Language::Hungarian => "🇭🇺",
            Language::Italian => "🇮🇹",
            Language::Japanese => "🇯🇵",
            Language::Lithuanian => "🇱🇹",
            Language::Latvian => "🇱🇻",
            Language::Maltese => "🇲🇹",
            Language::Dutch => "🇳🇱",
            Language::Polish => "🇵🇱",
            Language::Portuguese => "🇵🇹",
            Language::Romanian => "🇷🇴",
            Language::Slovak => "🇸🇰",
            Language::Slovenian => "🇸🇮",
            Language::Swedish => "🇸🇪",
            Language::Turkish => "🇹🇷",
            Language::Ukrainian => "🇺🇦",
            Language::Unknown => "❓",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.flag(), self.name())
    }
}

static BY_CODE: Lazy<HashMap<&'static str, Language>> =
    Lazy::new(|| Language::ALL.iter().map(|l| (l.code(), *l)).collect());
