//! Typed payloads, one per behavior type

use crate::reader::{ObjectReader, SchemaEnum};
use chrono::{DateTime, Utc};
use cuesheet_core::{ClipId, PayloadValidationError, Timestamp};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Pragmatic address check: one `@`, no whitespace, a dotted domain.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

/// Canonical hyphenated UUID; braced, `urn:` and unhyphenated forms are rejected.
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid pattern is valid")
});

/// Parse a clip id written in hyphenated UUID form.
fn parse_clip_id(s: &str) -> Option<ClipId> {
    if !UUID_RE.is_match(s) {
        return None;
    }
    s.parse().ok()
}

/// Whether `s` is a syntactically valid email address.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s) && !s.contains("..")
}

macro_rules! schema_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl SchemaEnum for $name {
            const VARIANTS: &'static [&'static str] = &[$($wire),+];

            fn from_variant(s: &str) -> Option<Self> {
                match s {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

schema_enum!(
    /// What a research clip looks for.
    ResearchTarget {
        Contacts => "contacts",
        Playlists => "playlists",
        Opportunities => "opportunities",
        General => "general",
    }
);

schema_enum!(
    /// Kind of analysis an insight clip runs.
    AnalysisKind {
        Bottleneck => "bottleneck",
        Performance => "performance",
        Sentiment => "sentiment",
        Workflow => "workflow",
    }
);

schema_enum!(
    /// Mood recorded by a story clip.
    StorySentiment {
        Excited => "excited",
        Worried => "worried",
        Blocked => "blocked",
        Breakthrough => "breakthrough",
        Reflective => "reflective",
    }
);

// ============================================================================
// PAYLOADS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchPayload {
    pub query: String,
    pub target_type: ResearchTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<Number>,
}

impl ResearchPayload {
    pub(crate) fn read(reader: &ObjectReader<'_>) -> Result<Self, PayloadValidationError> {
        Ok(Self {
            query: reader.required_str("query")?,
            target_type: reader.required_enum("targetType")?,
            sources: reader.optional_str_list("sources")?,
            max_results: reader.optional_number("maxResults")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningPayload {
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<String>>,
    pub generate_sequence: bool,
}

impl PlanningPayload {
    pub(crate) fn read(reader: &ObjectReader<'_>) -> Result<Self, PayloadValidationError> {
        Ok(Self {
            goal: reader.required_str("goal")?,
            context: reader.optional_str("context")?,
            constraints: reader.optional_str_list("constraints")?,
            generate_sequence: reader.bool_or("generateSequence", true)?,
        })
    }
}

/// Follow-up payload. Whether enough identifying information is present
/// (contact id vs email) is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowupPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
    pub include_assets: bool,
}

impl FollowupPayload {
    pub(crate) fn read(reader: &ObjectReader<'_>) -> Result<Self, PayloadValidationError> {
        let contact_email = reader.optional_str("contactEmail")?;
        if let Some(email) = &contact_email {
            if !is_valid_email(email) {
                return Err(reader.error(reader.path("contactEmail"), "Invalid email"));
            }
        }

        Ok(Self {
            contact_id: reader.optional_str("contactId")?,
            contact_email,
            previous_message_id: reader.optional_str("previousMessageId")?,
            custom_message: reader.optional_str("customMessage")?,
            include_assets: reader.bool_or("includeAssets", false)?,
        })
    }
}

/// Closed time window, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    fn read(reader: &ObjectReader<'_>) -> Result<Self, PayloadValidationError> {
        let start = read_instant(reader, "start")?;
        let end = read_instant(reader, "end")?;
        if start > end {
            return Err(reader.error(
                reader.path("end"),
                "Range end must not be before range start",
            ));
        }
        Ok(Self { start, end })
    }
}

fn read_instant(reader: &ObjectReader<'_>, key: &str) -> Result<Timestamp, PayloadValidationError> {
    let raw = reader.required_str(key)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| reader.error(reader.path(key), "Invalid datetime"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    pub analysis_type: AnalysisKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    pub include_recommendations: bool,
}

impl AnalysisPayload {
    pub(crate) fn read(reader: &ObjectReader<'_>) -> Result<Self, PayloadValidationError> {
        let time_range = match reader.optional_object("timeRange")? {
            Some(range) => Some(TimeRange::read(&range)?),
            None => None,
        };

        Ok(Self {
            analysis_type: reader.required_enum("analysisType")?,
            time_range,
            include_recommendations: reader.bool_or("includeRecommendations", true)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPayload {
    pub sentiment: StorySentiment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_clip_ids: Option<Vec<ClipId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeform_text: Option<String>,
}

impl StoryPayload {
    pub(crate) fn read(reader: &ObjectReader<'_>) -> Result<Self, PayloadValidationError> {
        let linked_clip_ids = match reader.optional_str_list("linkedClipIds")? {
            Some(raw) => Some(
                raw.iter()
                    .enumerate()
                    .map(|(i, id)| {
                        parse_clip_id(id).ok_or_else(|| {
                            reader.error(format!("{}[{}]", reader.path("linkedClipIds"), i), "Invalid uuid")
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };

        Ok(Self {
            sentiment: reader.required_enum("sentiment")?,
            linked_clip_ids,
            freeform_text: reader.optional_str("freeformText")?,
        })
    }
}
