use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ScenarioId);
id_newtype!(ChildId);

/// The two ordered child collections a scenario owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildKind {
    Question,
    EndingGuidance,
}

impl ChildKind {
    pub const ALL: [ChildKind; 2] = [ChildKind::Question, ChildKind::EndingGuidance];

    /// Path segment of the collection on the admin API.
    pub fn collection(self) -> &'static str {
        match self {
            ChildKind::Question => "questions",
            ChildKind::EndingGuidance => "ending_guidances",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChildKind::Question => "question",
            ChildKind::EndingGuidance => "ending guidance",
        }
    }

    /// Questions carry an `is_active` flag that the backend overwrites on update.
    pub fn has_active_flag(self) -> bool {
        matches!(self, ChildKind::Question)
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
