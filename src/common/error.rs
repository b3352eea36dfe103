use thiserror::Error;

use super::model::{Feature, ModelType};
use super::uuid::{ModelUuid, ViewUuid};

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("no model element {0}")]
    UnknownElement(ModelUuid),
    #[error("{model_type:?} has no feature `{}`", .feature.name())]
    UnknownFeature {
        model_type: ModelType,
        feature: Feature,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("empty watch path")]
    Empty,
    #[error("unknown path root `{0}`")]
    UnknownRoot(String),
    #[error("unknown model type `{0}`")]
    UnknownType(String),
    #[error("{context:?} has no feature `{name}`")]
    UnknownFeature { name: String, context: ModelType },
    #[error("`{0}` is an attribute and cannot be traversed")]
    TraversesAttribute(String),
    #[error("malformed path segment `{0}`")]
    Malformed(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum DiagramError {
    #[error("no diagram item {0}")]
    UnknownItem(ViewUuid),
    #[error("no presentation represents {0:?}")]
    NoPresentation(ModelType),
    #[error("placing {child} inside {parent} would create a containment cycle")]
    ContainmentCycle { child: ViewUuid, parent: ViewUuid },
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading configuration failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing configuration failed: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid colour `{value}` for `{field}`")]
    InvalidColor { field: &'static str, value: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum LocalizationError {
    #[error("invalid language tag `{0}`")]
    InvalidLanguageTag(String),
    #[error("language {0} not supported")]
    UnsupportedLanguage(String),
    #[error("parsing language {language} failed: {message}")]
    Resource { language: String, message: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("writing SVG failed: {0}")]
    Io(#[from] std::io::Error),
}
