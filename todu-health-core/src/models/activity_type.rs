use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActivityType {
    Running,
    Cycling,
    Gym,
    Swimming,
    Yoga,
    Walking,
    Other,
    /// A stored name outside the known set, kept verbatim. Empty when the
    /// stored record has no type at all.
    Unrecognized(String),
}

impl ActivityType {
    pub const ALL: [ActivityType; 7] = [
        ActivityType::Running,
        ActivityType::Cycling,
        ActivityType::Gym,
        ActivityType::Swimming,
        ActivityType::Yoga,
        ActivityType::Walking,
        ActivityType::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::Running => "Running",
            ActivityType::Cycling => "Cycling",
            ActivityType::Gym => "Gym",
            ActivityType::Swimming => "Swimming",
            ActivityType::Yoga => "Yoga",
            ActivityType::Walking => "Walking",
            ActivityType::Other => "Other",
            ActivityType::Unrecognized(raw) => raw,
        }
    }

    /// Maps a stored name back to its type. Matching is exact so that a
    /// rewrite never changes what was stored.
    pub fn from_stored(raw: String) -> Self {
        match Self::ALL.into_iter().find(|t| t.as_str() == raw) {
            Some(known) => known,
            None => ActivityType::Unrecognized(raw),
        }
    }
}

impl Default for ActivityType {
    fn default() -> Self {
        ActivityType::Unrecognized(String::new())
    }
}

impl Serialize for ActivityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActivityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .map(Self::from_stored)
            .unwrap_or_default())
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "running" => Ok(ActivityType::Running),
            "cycling" => Ok(ActivityType::Cycling),
            "gym" => Ok(ActivityType::Gym),
            "swimming" => Ok(ActivityType::Swimming),
            "yoga" => Ok(ActivityType::Yoga),
            "walking" => Ok(ActivityType::Walking),
            "other" => Ok(ActivityType::Other),
            _ => Err(format!(
                "Invalid activity type '{}'. Valid options: running, cycling, gym, swimming, yoga, walking, other",
                s
            )),
        }
    }
}
