//! Danger scale, modifiers and classification results.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Highest ordinal on the danger scale
pub const MAX_DANGER_LEVEL: u8 = 5;

/// Ordinal danger rating, 0 (very low) to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DangerLevel(u8);

impl DangerLevel {
    pub fn new(level: u8) -> Option<Self> {
        (level <= MAX_DANGER_LEVEL).then_some(Self(level))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Maps a bulletin `mainValue` to the scale.
    ///
    /// Anything outside the five published levels (`no_rating`, `no_snow`,
    /// typos) is undefined.
    pub fn from_main_value(value: &str) -> Option<Self> {
        let level = match value.trim() {
            "low" => 1,
            "moderate" => 2,
            "considerable" => 3,
            "high" => 4,
            "very_high" => 5,
            _ => return None,
        };
        Some(Self(level))
    }

    /// One step lower, floored at 0.
    pub fn decremented(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl TryFrom<u8> for DangerLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level).ok_or_else(|| format!("danger level {} out of range 0..=5", level))
    }
}

impl From<DangerLevel> for u8 {
    fn from(level: DangerLevel) -> Self {
        level.0
    }
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sub-level qualifier refining a danger level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingModifier {
    Minus,
    Neutral,
    Plus,
}

impl RatingModifier {
    /// Parses a bulletin subdivision (`minus`, `neutral`, `plus`).
    pub fn from_subdivision(value: &str) -> Option<Self> {
        match value.trim() {
            "minus" => Some(RatingModifier::Minus),
            "neutral" => Some(RatingModifier::Neutral),
            "plus" => Some(RatingModifier::Plus),
            _ => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            RatingModifier::Minus => "-",
            RatingModifier::Neutral => "=",
            RatingModifier::Plus => "+",
        }
    }
}

/// Rating of a classified couloir.
///
/// Serializes as the bare ordinal, or as the string `"NaN"` when the couloir
/// could not be rated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingLabel {
    NaN,
    Level(DangerLevel),
}

impl RatingLabel {
    pub fn level(&self) -> Option<DangerLevel> {
        match self {
            RatingLabel::NaN => None,
            RatingLabel::Level(level) => Some(*level),
        }
    }

    /// Map colour for this rating.
    pub fn color(&self) -> &'static str {
        match self.level().map(|l| l.value()) {
            Some(0) => "#009933",
            Some(1) => "#CCFF66",
            Some(2) => "#FFFF00",
            Some(3) => "#FF9900",
            Some(4) => "#FF0000",
            Some(5) => "#800000",
            _ => "gray",
        }
    }
}

impl From<Option<DangerLevel>> for RatingLabel {
    fn from(level: Option<DangerLevel>) -> Self {
        level.map_or(RatingLabel::NaN, RatingLabel::Level)
    }
}

impl fmt::Display for RatingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingLabel::NaN => write!(f, "NaN"),
            RatingLabel::Level(level) => write!(f, "{}", level),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WireLabel {
    Level(u8),
    Text(String),
}

impl Serialize for RatingLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RatingLabel::NaN => WireLabel::Text("NaN".to_string()).serialize(serializer),
            RatingLabel::Level(level) => WireLabel::Level(level.value()).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for RatingLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match WireLabel::deserialize(deserializer)? {
            WireLabel::Level(level) => DangerLevel::new(level)
                .map(RatingLabel::Level)
                .ok_or_else(|| serde::de::Error::custom(format!("danger level {} out of range", level))),
            WireLabel::Text(text) if text == "NaN" => Ok(RatingLabel::NaN),
            WireLabel::Text(text) => Err(serde::de::Error::custom(format!(
                "invalid rating label: {:?}",
                text
            ))),
        }
    }
}

/// Why a couloir got its rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rationale {
    OutOfCoverage,
    Unchanged,
    FavorableAspect,
    FavorableElevation,
}

impl Rationale {
    pub fn message(&self) -> &'static str {
        match self {
            Rationale::OutOfCoverage => "out of bulletin coverage",
            Rationale::Unchanged => "rating unchanged",
            Rationale::FavorableAspect => "favorable aspect reduces danger",
            Rationale::FavorableElevation => "favorable elevation reduces danger",
        }
    }
}

impl fmt::Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Derived rating of one couloir. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub rating: RatingLabel,
    pub modifier_suffix: String,
    pub rationale: Rationale,
}

impl ClassificationResult {
    pub fn out_of_coverage() -> Self {
        Self {
            rating: RatingLabel::NaN,
            modifier_suffix: String::new(),
            rationale: Rationale::OutOfCoverage,
        }
    }

    /// Rating with its suffix, e.g. `"2+"` or `"NaN"`.
    pub fn display_rating(&self) -> String {
        match self.rating {
            RatingLabel::NaN => self.rating.to_string(),
            RatingLabel::Level(_) => format!("{}{}", self.rating, self.modifier_suffix),
        }
    }

    pub fn color(&self) -> &'static str {
        self.rating.color()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_value_mapping() {
        assert_eq!(DangerLevel::from_main_value("low").unwrap().value(), 1);
        assert_eq!(DangerLevel::from_main_value("very_high").unwrap().value(), 5);
        assert!(DangerLevel::from_main_value("no_rating").is_none());
        assert!(DangerLevel::from_main_value("").is_none());
    }

    #[test]
    fn test_decrement_floors_at_zero() {
        let zero = DangerLevel::new(0).unwrap();
        assert_eq!(zero.decremented(), zero);
        assert_eq!(DangerLevel::new(3).unwrap().decremented().value(), 2);
        assert!(DangerLevel::new(6).is_none());
    }

    #[test]
    fn test_modifier_suffixes() {
        assert_eq!(RatingModifier::from_subdivision("plus").unwrap().suffix(), "+");
        assert_eq!(RatingModifier::from_subdivision("neutral").unwrap().suffix(), "=");
        assert_eq!(RatingModifier::from_subdivision("minus").unwrap().suffix(), "-");
        assert!(RatingModifier::from_subdivision("").is_none());
    }

    #[test]
    fn test_rating_label_wire_format() {
        let nan = serde_json::to_value(RatingLabel::NaN).unwrap();
        assert_eq!(nan, serde_json::json!("NaN"));

        let two = RatingLabel::Level(DangerLevel::new(2).unwrap());
        assert_eq!(serde_json::to_value(two).unwrap(), serde_json::json!(2));

        let parsed: RatingLabel = serde_json::from_str("\"NaN\"").unwrap();
        assert_eq!(parsed, RatingLabel::NaN);
        assert!(serde_json::from_str::<RatingLabel>("9").is_err());
    }

    #[test]
    fn test_colors() {
        assert_eq!(RatingLabel::NaN.color(), "gray");
        assert_eq!(RatingLabel::Level(DangerLevel::new(0).unwrap()).color(), "#009933");
        assert_eq!(RatingLabel::Level(DangerLevel::new(5).unwrap()).color(), "#800000");
    }

    #[test]
    fn test_display_rating() {
        let result = ClassificationResult {
            rating: RatingLabel::Level(DangerLevel::new(2).unwrap()),
            modifier_suffix: "+".to_string(),
            rationale: Rationale::FavorableAspect,
        };
        assert_eq!(result.display_rating(), "2+");
        assert_eq!(ClassificationResult::out_of_coverage().display_rating(), "NaN");
    }
}
