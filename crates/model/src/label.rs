use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown label: {0}")]
pub struct UnknownLabel(pub String);

/// How an extraction was derived from its sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FactLabel {
    NounBased,
    VerbBased,
    Unknown,
}

impl FactLabel {
    pub fn from_external(raw: &str) -> Result<Self, UnknownLabel> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NOUN_BASED" => Ok(Self::NounBased),
            "VERB_BASED" => Ok(Self::VerbBased),
            "UNKNOWN" => Ok(Self::Unknown),
            _ => Err(UnknownLabel(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NounBased => "NOUN_BASED",
            Self::VerbBased => "VERB_BASED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Discourse-relation tag carried by a context link.
///
/// The extraction service reports these as free-form strings with several
/// spellings per relation; `from_external` folds the known aliases onto one
/// tag and refuses anything it does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContextLabel {
    Unknown,
    // coordinations
    Contrast,
    List,
    Disjunction,
    // subordinations
    Attribution,
    Background,
    Cause,
    Result,
    Condition,
    Elaboration,
    Purpose,
    TemporalAfter,
    TemporalBefore,
    // sentence simplification
    NounBased,
    Spatial,
    Temporal,
}

impl ContextLabel {
    pub fn from_external(raw: &str) -> Result<Self, UnknownLabel> {
        let normalized = raw.trim().to_ascii_uppercase();
        Ok(match normalized.as_str() {
            "UNKNOWN" | "UNKNOWN_COORDINATION" | "UNKNOWN_SUBORDINATION" => Self::Unknown,
            "CONTRAST" => Self::Contrast,
            "LIST" => Self::List,
            "DISJUNCTION" => Self::Disjunction,
            "ATTRIBUTION" => Self::Attribution,
            "BACKGROUND" => Self::Background,
            "CAUSE" | "CAUSE_C" => Self::Cause,
            "RESULT" | "RESULT_C" => Self::Result,
            "CONDITION" => Self::Condition,
            "ELABORATION" => Self::Elaboration,
            "PURPOSE" => Self::Purpose,
            "TEMPORAL_AFTER" | "TEMPORAL_AFTER_C" => Self::TemporalAfter,
            "TEMPORAL_BEFORE" | "TEMPORAL_BEFORE_C" => Self::TemporalBefore,
            "NOUN_BASED" => Self::NounBased,
            "SPATIAL" => Self::Spatial,
            "TEMPORAL" | "TEMPORAL_TIME" | "TEMPORAL_DURATION" | "TEMPORAL_DATE"
            | "TEMPORAL_SET" => Self::Temporal,
            _ => return Err(UnknownLabel(raw.to_string())),
        })
    }

    /// The relation read in the opposite direction, where one exists.
    pub fn inverse(&self) -> Option<ContextLabel> {
        match self {
            Self::Cause => Some(Self::Result),
            Self::Result => Some(Self::Cause),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Contrast => "CONTRAST",
            Self::List => "LIST",
            Self::Disjunction => "DISJUNCTION",
            Self::Attribution => "ATTRIBUTION",
            Self::Background => "BACKGROUND",
            Self::Cause => "CAUSE",
            Self::Result => "RESULT",
            Self::Condition => "CONDITION",
            Self::Elaboration => "ELABORATION",
            Self::Purpose => "PURPOSE",
            Self::TemporalAfter => "TEMPORAL_AFTER",
            Self::TemporalBefore => "TEMPORAL_BEFORE",
            Self::NounBased => "NOUN_BASED",
            Self::Spatial => "SPATIAL",
            Self::Temporal => "TEMPORAL",
        }
    }
}
