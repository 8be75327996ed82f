use std::fs;
use std::io;
use std::path::Path;

/// Text output of one simulation run, held as lines.
///
/// `origin` names where the text came from (usually a file path) so that extraction
/// failures can point at the offending run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    origin: String,
    lines: Vec<String>,
}

impl Artifact {
    pub fn from_text(origin: impl Into<String>, text: &str) -> Self {
        Self {
            origin: origin.into(),
            lines: text.lines().map(str::to_owned).collect(),
        }
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(path.display().to_string(), &text))
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The atom count carried as the first token of the first line, if the artifact has one.
    pub fn leading_atom_count(&self) -> Option<usize> {
        self.lines
            .first()
            .and_then(|line| line.split_whitespace().next())
            .and_then(|token| token.parse().ok())
    }
}
