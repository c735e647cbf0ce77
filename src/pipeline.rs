use std::fmt;
use std::str::FromStr;

use crate::comments::strip_comments;
use crate::spaces::compact_whitespace;

/// One named text-to-text pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Remove comments, keeping line numbers.
    Comments,
    /// Remove indentation and blanks around operators.
    Spaces,
}

impl Stage {
    /// Every stage, in the order they must run.
    pub const ALL: [Stage; 2] = [Stage::Comments, Stage::Spaces];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Comments => "comments",
            Stage::Spaces => "spaces",
        }
    }

    pub fn apply(self, text: &str) -> String {
        match self {
            Stage::Comments => strip_comments(text),
            Stage::Spaces => compact_whitespace(text),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown optimization module: {0}")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

/// Ordered list of stages, each one fed with the output of the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Keeps `stages` in the given order. An empty pipeline returns its input.
    pub fn new(stages: impl IntoIterator<Item = Stage>) -> Self {
        Self {
            stages: stages.into_iter().collect(),
        }
    }

    /// Comments first, then spaces.
    pub fn all() -> Self {
        Self::new(Stage::ALL)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn run(&self, text: &str) -> String {
        run_pipeline(text, &self.stages)
    }
}

/// Apply `stages` left to right: the first sees `text`, each next one sees
/// the output of the one before.
pub fn run_pipeline(text: &str, stages: &[Stage]) -> String {
    stages
        .iter()
        .fold(text.to_owned(), |acc, stage| stage.apply(&acc))
}
