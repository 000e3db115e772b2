use std::fmt;

#[derive(Debug)]
pub enum InstrumentError {
    Config(ConfigError),
    Json(serde_json::Error),
    Audio(String),
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    InvalidFrequency { id: String, frequency: f64 },
    InvalidOffset { id: String, offset: u8 },
    WrongPrefix { id: String, expected: &'static str },
    DuplicateControl { id: String },
    PitchOutOfRange { string: String, semitone: String, frequency: f64 },
    InvalidTone { field: &'static str, value: f64 },
}

impl fmt::Display for InstrumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentError::Config(e) => write!(f, "Config error: {e}"),
            InstrumentError::Json(e) => write!(f, "JSON error: {e}"),
            InstrumentError::Audio(msg) => write!(f, "Audio error: {msg}"),
        }
    }
}

impl std::error::Error for InstrumentError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidFrequency { id, frequency } => {
                write!(f, "String '{id}' has invalid frequency {frequency}")
            }
            ConfigError::InvalidOffset { id, offset } => {
                write!(f, "Semitone '{id}' has invalid offset {offset}")
            }
            ConfigError::WrongPrefix { id, expected } => {
                write!(f, "Control '{id}' must start with '{expected}'")
            }
            ConfigError::DuplicateControl { id } => write!(f, "Control '{id}' is defined twice"),
            ConfigError::PitchOutOfRange { string, semitone, frequency } => {
                write!(f, "'{string}' with '{semitone}' reaches {frequency:.1} Hz, above the playable range")
            }
            ConfigError::InvalidTone { field, value } => {
                write!(f, "Tone setting '{field}' has invalid value {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for InstrumentError {
    fn from(e: ConfigError) -> Self {
        InstrumentError::Config(e)
    }
}

impl From<serde_json::Error> for InstrumentError {
    fn from(e: serde_json::Error) -> Self {
        InstrumentError::Json(e)
    }
}
