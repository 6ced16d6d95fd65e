//!
//! src/sink.rs  Andrew Belles  Oct 19th, 2026
//!
//! Optional archive of the raw json the seeder pulled from the service,
//! pruned and written as zstd so a run can be audited after the fact
//!

use std::{fs, path::{Path, PathBuf}};
use serde_json::Value;

use crate::errors::SeederError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawType {
    Recommendations,
    Track,
    AudioFeatures,
    Artist
}

impl RawType {
    pub fn as_str(self) -> &'static str {
        match self {
            RawType::Recommendations => "recommendations",
            RawType::Track => "track",
            RawType::AudioFeatures => "audio-features",
            RawType::Artist => "artist"
        }
    }
}

/// Presentation keys that carry nothing the dataset uses
const PRUNED_KEYS: [&str; 6] = [
    "available_markets", "images", "href", "uri", "external_urls", "preview_url"
];

#[derive(Debug)]
pub struct RawArchive {
    root: PathBuf,
    level: i32
}

impl RawArchive {
    pub fn new(root: impl AsRef<Path>, level: i32) -> Self {
        Self { root: root.as_ref().to_path_buf(), level: level.clamp(0, 21) }
    }

    pub fn write_json(&self, kind: RawType, key: &str, mut json: Value) ->
        Result<PathBuf, SeederError> {

        Self::drop_keys_recursive(&mut json, &PRUNED_KEYS);

        let path = self.root.join(Self::rel_path(kind, &Self::sanitize_key(key)));
        let parent = path.parent()
            .ok_or_else(|| SeederError::Dataset(
                format!("archive path has no parent: {}", path.display())
            ))?;

        fs::create_dir_all(parent).map_err(|e| SeederError::Dataset(
            format!("create dir {}: {e}", parent.display())
        ))?;

        let temp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| SeederError::Dataset(
                format!("tempfile in {}: {e}", parent.display())
            ))?;

        {
            let mut enc = zstd::stream::write::Encoder::new(temp.as_file(), self.level)
                .map_err(|e| SeederError::Dataset(format!("zstd encoder: {e}")))?;

            serde_json::to_writer(&mut enc, &json)?;
            enc.finish().map_err(|e| SeederError::Dataset(format!("zstd finish: {e}")))?;
        }

        temp.persist(&path).map_err(|e|
            SeederError::Dataset(format!("persist {}: {e}", path.display())))?;

        Ok(path)
    }

    fn rel_path(kind: RawType, sanitized_key: &str) -> PathBuf {
        PathBuf::from("raw/spotify")
            .join(kind.as_str())
            .join(format!("{sanitized_key}.json.zst"))
    }

    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    fn drop_keys_recursive(v: &mut Value, keys: &[&str]) {
        match v {
            Value::Object(map) => {
                for key in keys {
                    map.remove(*key);
                }
                for val in map.values_mut() {
                    Self::drop_keys_recursive(val, keys);
                }
            }
            Value::Array(arr) => {
                for element in arr {
                    Self::drop_keys_recursive(element, keys);
                }
            }
            _ => {}
        }
    }
}
