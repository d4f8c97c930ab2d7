use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

use crate::{Error, InternalResult};

/// Read-only settings threaded through one evaluation.
///
/// An operator that receives an explicit locale argument overrides the
/// locale for its own call only; siblings keep seeing these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOptions {
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Output pattern used by date/time operators when no format argument is given.
    #[serde(default = "default_date_time_format")]
    pub date_time_format: String,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            date_time_format: default_date_time_format(),
        }
    }
}

impl EvaluationOptions {
    pub fn from_file<P: AsRef<Path>>(path: P) -> InternalResult<Self> {
        from_file(path)
    }

    pub fn from_json(s: &str) -> InternalResult<Self> {
        from_str(s)
    }

    pub fn with_locale<S: Into<String>>(&self, locale: S) -> Self {
        Self {
            locale: locale.into(),
            ..self.clone()
        }
    }
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> InternalResult<T> {
    let file = File::open(path)
        .map_err(|e| Error::Config(format!("Failed to open options file: {}", e)))?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| Error::Config(format!("Failed to parse options file: {}", e)))?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> InternalResult<T> {
    let config = serde_json::from_str(s)
        .map_err(|e| Error::Config(format!("Failed to parse options: {}", e)))?;
    Ok(config)
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_date_time_format() -> String {
    crate::functions::datetime::DEFAULT_DATE_TIME_FORMAT.to_string()
}
