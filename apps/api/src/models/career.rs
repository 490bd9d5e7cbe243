//! Career paths and development actions produced by the recommendation and plan stages.
//!
//! Backend output is only trusted to be syntactically valid JSON. Qualitative fields are
//! parsed into closed tiers with an `Other` escape, and `matchScore` is read leniently so
//! an out-of-range or oddly typed score degrades display instead of failing extraction.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Qualitative tier used by `growthPotential` and `interestAlignment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tier {
    High,
    Medium,
    Low,
    /// Any label the backend returned that is not one of the known tiers.
    Other(String),
}

/// Display hint shared by tiers and score bands. `Neutral` is the fallback style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Positive,
    Caution,
    Negative,
    Neutral,
}

impl Tier {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Tier::High,
            "medium" => Tier::Medium,
            "low" => Tier::Low,
            _ => Tier::Other(raw.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Tier::High => "High",
            Tier::Medium => "Medium",
            Tier::Low => "Low",
            Tier::Other(raw) => raw,
        }
    }

    pub fn tone(&self) -> BadgeTone {
        match self {
            Tier::High => BadgeTone::Positive,
            Tier::Medium => BadgeTone::Caution,
            Tier::Low => BadgeTone::Negative,
            Tier::Other(_) => BadgeTone::Neutral,
        }
    }
}

impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Tier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Tier::parse(&raw))
    }
}

/// Kind of development step. Unknown kinds are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionType {
    Training,
    Mentorship,
    ProjectAssignment,
    Shadowing,
    Certification,
    Other(String),
}

impl ActionType {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw
            .trim()
            .to_ascii_lowercase()
            .replace(['_', '-'], " ");
        match normalized.as_str() {
            "training" => ActionType::Training,
            "mentorship" => ActionType::Mentorship,
            "project assignment" => ActionType::ProjectAssignment,
            "shadowing" => ActionType::Shadowing,
            "certification" => ActionType::Certification,
            _ => ActionType::Other(raw.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ActionType::Training => "Training",
            ActionType::Mentorship => "Mentorship",
            ActionType::ProjectAssignment => "Project Assignment",
            ActionType::Shadowing => "Shadowing",
            ActionType::Certification => "Certification",
            ActionType::Other(raw) => raw,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ActionType::Training => "🎓",
            ActionType::Mentorship => "🤝",
            ActionType::ProjectAssignment => "💼",
            ActionType::Shadowing => "👀",
            ActionType::Certification => "📜",
            ActionType::Other(_) => "💡",
        }
    }
}

impl Serialize for ActionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ActionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ActionType::parse(&raw))
    }
}

/// Coarse banding of a match score for display: >= 75 strong, >= 50 moderate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Strong,
    Moderate,
    Weak,
}

impl ScoreBand {
    pub fn for_score(score: i64) -> Self {
        if score >= 75 {
            ScoreBand::Strong
        } else if score >= 50 {
            ScoreBand::Moderate
        } else {
            ScoreBand::Weak
        }
    }

    pub fn tone(self) -> BadgeTone {
        match self {
            ScoreBand::Strong => BadgeTone::Positive,
            ScoreBand::Moderate => BadgeTone::Caution,
            ScoreBand::Weak => BadgeTone::Negative,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerPath {
    /// Empty when the backend omitted it; the id allocator fills it in.
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub skills_to_develop: Vec<String>,
    pub estimated_time_to_reach: String,
    #[serde(deserialize_with = "deserialize_match_score")]
    pub match_score: i64,
    pub growth_potential: Tier,
    pub interest_alignment: Tier,
    /// Set when the backend score was unreadable or fell outside 0..=100 and was clamped.
    #[serde(default, skip_serializing_if = "is_false")]
    pub match_score_adjusted: bool,
}

impl CareerPath {
    /// Clamps `match_score` into 0..=100. Returns true if the score changed.
    pub fn clamp_match_score(&mut self) -> bool {
        let clamped = self.match_score.clamp(0, 100);
        if clamped == self.match_score {
            return false;
        }
        self.match_score = clamped;
        self.match_score_adjusted = true;
        true
    }

    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::for_score(self.match_score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentAction {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    pub action_type: ActionType,
    pub description: String,
    pub suggested_resource: String,
    pub estimated_effort: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Accepts a string, a number, or null. Anything else fails the whole object.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) => s.trim().to_string(),
        Some(RawId::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

/// Stand-in for a `matchScore` that is present but unreadable (`null`, `"N/A"`, a bool,
/// a non-finite number). It sits below the valid range, so clamping turns it into a
/// flagged 0 instead of failing the whole list.
pub const UNREADABLE_SCORE: i64 = i64::MIN;

/// Accepts integers, floats (rounded) and numeric strings such as `"85"` or `"85%"`.
/// Range is not checked here; the recommender clamps. A missing key is still an error.
fn deserialize_match_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawScore {
        Int(i64),
        Float(f64),
        Text(String),
        Unreadable(de::IgnoredAny),
    }

    let rounded = |value: f64| {
        if value.is_finite() {
            value.round() as i64
        } else {
            UNREADABLE_SCORE
        }
    };

    Ok(match RawScore::deserialize(deserializer)? {
        RawScore::Int(n) => n,
        RawScore::Float(f) => rounded(f),
        RawScore::Text(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .map(rounded)
            .unwrap_or(UNREADABLE_SCORE),
        RawScore::Unreadable(_) => UNREADABLE_SCORE,
    })
}
