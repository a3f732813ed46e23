//! Structured configuration documents: JSON, TOML and YAML.

pub mod json;
pub mod toml;
pub mod yaml;

pub use self::json::JsonDocument;
pub use self::toml::TomlDocument;
pub use self::yaml::{Annotation, MapEntry, Mapping, Scalar, SeqItem, Sequence, YamlDocument, YamlNode};
