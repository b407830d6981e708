//! TaQL styles (`using style ...`).
//!
//! A style selects indexing conventions: 0- or 1-based, end inclusive or
//! exclusive, C or Fortran axis order. `python` and `glish` are shorthands
//! for complete sets.

use serde::{Deserialize, Serialize};

use crate::error::{CommandError, CommandResult};

/// A single style keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKeyword {
    /// base0, endexcl, C order
    Python,
    /// base1, endincl, Fortran order
    Glish,
    Base0,
    Base1,
    EndIncl,
    EndExcl,
    Fortran,
    C,
}

impl StyleKeyword {
    /// Parse a keyword, case insensitive
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "python" => Some(Self::Python),
            "glish" => Some(Self::Glish),
            "base0" => Some(Self::Base0),
            "base1" => Some(Self::Base1),
            "endincl" => Some(Self::EndIncl),
            "endexcl" => Some(Self::EndExcl),
            "fortran" => Some(Self::Fortran),
            "c" => Some(Self::C),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Glish => "glish",
            Self::Base0 => "base0",
            Self::Base1 => "base1",
            Self::EndIncl => "endincl",
            Self::EndExcl => "endexcl",
            Self::Fortran => "fortran",
            Self::C => "c",
        }
    }
}

/// A comma-separated combination of style keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStyle {
    pub keywords: Vec<StyleKeyword>,
}

impl QueryStyle {
    /// Parse a style string such as `python` or `base1, endexcl`
    pub fn parse(input: &str) -> CommandResult<Self> {
        let keywords = input
            .split(',')
            .map(|word| {
                StyleKeyword::parse(word).ok_or_else(|| CommandError::InvalidStyle(input.to_string()))
            })
            .collect::<CommandResult<Vec<_>>>()?;
        Ok(Self { keywords })
    }

    pub fn python() -> Self {
        Self {
            keywords: vec![StyleKeyword::Python],
        }
    }

    /// The `using style` clause that prefixes a command
    pub fn clause(&self) -> String {
        let words: Vec<&str> = self.keywords.iter().map(StyleKeyword::as_str).collect();
        format!("using style {}", words.join(","))
    }
}
