use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Kind of health measurement. The unit is fixed per known type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetricType {
    Steps,
    Water,
    Sleep,
    Calories,
    /// A stored name outside the known set, kept verbatim.
    Unrecognized(String),
}

impl MetricType {
    pub const ALL: [MetricType; 4] = [
        MetricType::Steps,
        MetricType::Water,
        MetricType::Sleep,
        MetricType::Calories,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            MetricType::Steps => "Steps",
            MetricType::Water => "Water",
            MetricType::Sleep => "Sleep",
            MetricType::Calories => "Calories",
            MetricType::Unrecognized(raw) => raw,
        }
    }

    pub fn from_stored(raw: String) -> Self {
        match Self::ALL.into_iter().find(|t| t.as_str() == raw) {
            Some(known) => known,
            None => MetricType::Unrecognized(raw),
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricType::Steps => "steps",
            MetricType::Water => "L",
            MetricType::Sleep => "hours",
            MetricType::Calories => "kcal",
            MetricType::Unrecognized(_) => "",
        }
    }

    /// Largest value accepted when logging an entry of this type.
    pub fn max_value(&self) -> f64 {
        match self {
            MetricType::Steps => 100_000.0,
            MetricType::Water => 20.0,
            MetricType::Sleep => 24.0,
            MetricType::Calories => 20_000.0,
            MetricType::Unrecognized(_) => f64::MAX,
        }
    }

    /// Steps and calories are whole counts; water and sleep allow fractions.
    pub fn requires_integer(&self) -> bool {
        matches!(self, MetricType::Steps | MetricType::Calories)
    }
}

impl Default for MetricType {
    fn default() -> Self {
        MetricType::Unrecognized(String::new())
    }
}

impl Serialize for MetricType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MetricType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .map(Self::from_stored)
            .unwrap_or_default())
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "steps" => Ok(MetricType::Steps),
            "water" => Ok(MetricType::Water),
            "sleep" => Ok(MetricType::Sleep),
            "calories" => Ok(MetricType::Calories),
            _ => Err(format!(
                "Invalid metric type '{}'. Valid options: steps, water, sleep, calories",
                s
            )),
        }
    }
}
