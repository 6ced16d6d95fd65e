//!
//! src/record.rs  Andrew Belles  Oct 19th, 2026
//!
//! Row type of the genre seed dataset and the cell encodings
//! that do not map onto a plain csv value
//!

use std::{fmt, str::FromStr};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::SeederError;

/// Column order of the persisted dataset, matches field order below
pub const COLUMNS: [&str; 24] = [
    "name", "track_id", "album", "artist", "artist_id", "release_date", "length",
    "popularity", "artist_pop", "artist_genres", "artist_followers", "acousticness",
    "danceability", "energy", "instrumentalness", "liveness", "loudness",
    "speechiness", "tempo", "valence", "key", "mode", "time_signature", "genre"
];

/// One observation of a track under a seed genre.
/// (track_id, genre) is unique within a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFeatureRecord {
    pub name: String,
    pub track_id: String,
    pub album: String,
    pub artist: String,
    pub artist_id: String,
    pub release_date: String,
    pub length: u64,
    pub popularity: u32,
    pub artist_pop: u32,
    pub artist_genres: GenreSet,
    pub artist_followers: u64,
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub valence: f64,
    pub key: PitchClass,
    pub mode: Mode,
    pub time_signature: u8,
    pub genre: String
}

impl TrackFeatureRecord {
    pub fn dedup_key(&self) -> (String, String) {
        (self.track_id.clone(), self.genre.clone())
    }
}

///
/// Artist genre tags. Stored in service order, compared as a set.
/// Cell form is a bracketed quoted list: ['dance pop', 'pop']
///
#[derive(Debug, Clone, Default)]
pub struct GenreSet(Vec<String>);

impl GenreSet {
    pub fn new(genres: impl IntoIterator<Item = String>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for genre in genres {
            if !unique.contains(&genre) {
                unique.push(genre);
            }
        }
        Self(unique)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn sorted(&self) -> Vec<&str> {
        let mut genres: Vec<&str> = self.0.iter().map(String::as_str).collect();
        genres.sort_unstable();
        genres
    }
}

impl PartialEq for GenreSet {
    fn eq(&self, other: &Self) -> bool {
        self.sorted() == other.sorted()
    }
}

impl From<Vec<String>> for GenreSet {
    fn from(genres: Vec<String>) -> Self {
        Self::new(genres)
    }
}

/// Single quotes unless the genre has a ' and no ", the way Python's repr
/// picks. Backslashes and the chosen quote are escaped either way
fn write_quoted(f: &mut fmt::Formatter<'_>, genre: &str) -> fmt::Result {
    let quote = if genre.contains('\'') && !genre.contains('"') { '"' } else { '\'' };
    write!(f, "{quote}")?;
    for c in genre.chars() {
        if c == quote || c == '\\' {
            write!(f, "\\")?;
        }
        write!(f, "{c}")?;
    }
    write!(f, "{quote}")
}

impl fmt::Display for GenreSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, genre) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_quoted(f, genre)?;
        }
        f.write_str("]")
    }
}

impl FromStr for GenreSet {
    type Err = SeederError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |why: &str| SeederError::Parse(format!("genre list {s:?}: {why}"));

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(GenreSet::default());
        }
        let inner = trimmed.strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| malformed("not bracketed"))?;

        let mut genres = Vec::new();
        let mut chars = inner.chars().peekable();
        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            let quote = match chars.next() {
                None => break,
                Some(q @ ('\'' | '"')) => q,
                Some(c) => return Err(malformed(&format!("unexpected {c:?}")))
            };

            let mut genre = String::new();
            loop {
                match chars.next() {
                    None => return Err(malformed("unterminated quote")),
                    Some('\\') => match chars.next() {
                        Some(c) => genre.push(c),
                        None => return Err(malformed("dangling escape"))
                    },
                    Some(c) if c == quote => break,
                    Some(c) => genre.push(c)
                }
            }
            genres.push(genre);

            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            match chars.next() {
                None => break,
                Some(',') => continue,
                Some(c) => return Err(malformed(&format!("unexpected {c:?}")))
            }
        }
        Ok(GenreSet::new(genres))
    }
}

impl Serialize for GenreSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GenreSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Pitch class 0..=11, None when the service could not detect one (-1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchClass(Option<u8>);

impl PitchClass {
    pub const UNKNOWN: PitchClass = PitchClass(None);

    pub fn from_service(key: i32) -> Self {
        match u8::try_from(key) {
            Ok(k) if k <= 11 => PitchClass(Some(k)),
            _ => PitchClass::UNKNOWN
        }
    }

    pub fn value(self) -> Option<u8> {
        self.0
    }
}

impl FromStr for PitchClass {
    type Err = SeederError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "-1" | "unknown" => Ok(PitchClass::UNKNOWN),
            other => match other.parse::<u8>() {
                Ok(k) if k <= 11 => Ok(PitchClass(Some(k))),
                _ => Err(SeederError::Parse(format!("key out of range: {other:?}")))
            }
        }
    }
}

impl Serialize for PitchClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(k) => serializer.serialize_i8(k as i8),
            None => serializer.serialize_i8(-1)
        }
    }
}

impl<'de> Deserialize<'de> for PitchClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Minor,
    Major
}

impl Mode {
    pub fn from_service(mode: i32) -> Result<Self, SeederError> {
        match mode {
            0 => Ok(Mode::Minor),
            1 => Ok(Mode::Major),
            other => Err(SeederError::Parse(format!("mode must be 0 or 1, got {other}")))
        }
    }
}

impl FromStr for Mode {
    type Err = SeederError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" | "minor" => Ok(Mode::Minor),
            "1" | "major" => Ok(Mode::Major),
            other => Err(SeederError::Parse(format!("mode must be 0 or 1, got {other:?}")))
        }
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Mode::Minor => serializer.serialize_u8(0),
            Mode::Major => serializer.serialize_u8(1)
        }
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
