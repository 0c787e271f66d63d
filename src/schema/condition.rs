use serde::{Deserialize, Serialize};
use std::fmt;

/// Verb-transitivity variant assigned to a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListCondition {
    Intransitive,
    Ditransitive,
}

impl ListCondition {
    pub const ALL: [ListCondition; 2] = [ListCondition::Intransitive, ListCondition::Ditransitive];

    /// Returns the label written to participant files.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Intransitive => "intransitive",
            Self::Ditransitive => "ditransitive",
        }
    }
}

impl fmt::Display for ListCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which frame (counterbalancing version) a participant receives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameLabel(pub String);

impl FrameLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameLabel {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_condition_labels() {
        assert_eq!(ListCondition::Intransitive.label(), "intransitive");
        assert_eq!(ListCondition::Ditransitive.to_string(), "ditransitive");
    }

    #[test]
    fn frame_label_display() {
        assert_eq!(FrameLabel::from("a").to_string(), "a");
    }
}
