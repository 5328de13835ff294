use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Editions of the site. Each one has its own sections and tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

pub const LANGUAGES: [Language; 2] = [Language::Ru, Language::En];

pub const RU_SECTIONS: [&str; 6] = ["news", "articles", "shapito", "razbor", "games", "podcasts"];

pub const EN_SECTIONS: [&str; 1] = ["news"];

pub const RU_TAGS: [&str; 7] = [
    "новости",
    "истории",
    "разбор",
    "шапито",
    "игры",
    "подкасты",
    "партнерский материал",
];

pub const EN_TAGS: [&str; 3] = ["news", "like it or not", "games"];

lazy_static! {
    static ref RU_TAG_INDEX: HashMap<&'static str, &'static str> = HashMap::from([
        ("новости", "news"),
        ("истории", "articles"),
        ("шапито", "shapito"),
        ("разбор", "razbor"),
        ("игры", "games"),
        ("подкасты", "podcasts"),
        ("партнерский материал", "news"),
    ]);

    static ref EN_TAG_INDEX: HashMap<&'static str, &'static str> = HashMap::from([
        ("news", "news"),
        ("games", "news"),
        ("like it or not", "news"),
    ]);
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    pub fn sections(&self) -> &'static [&'static str] {
        match self {
            Language::Ru => &RU_SECTIONS,
            Language::En => &EN_SECTIONS,
        }
    }

    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            Language::Ru => &RU_TAGS,
            Language::En => &EN_TAGS,
        }
    }

    /// Returns the section whose listing carries articles with `tag`.
    pub fn section_for_tag(&self, tag: &str) -> Option<&'static str> {
        let index: &HashMap<&'static str, &'static str> = match self {
            Language::Ru => &*RU_TAG_INDEX,
            Language::En => &*EN_TAG_INDEX,
        };
        index.get(tag).copied()
    }

    /// Like [`Language::section_for_tag`], failing with `Error::UnknownTag`.
    pub fn require_section_for_tag(&self, tag: &str) -> Result<&'static str> {
        self.section_for_tag(tag).ok_or_else(|| Error::UnknownTag {
            tag: tag.to_string(),
            language: self.as_str().to_string(),
        })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ru" => Ok(Language::Ru),
            "en" => Ok(Language::En),
            other => Err(Error::Config(format!("Unsupported language: {}", other))),
        }
    }
}
