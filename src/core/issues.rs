//! Severity-levelled issues collected while resolving and aggregating taxes.

use serde::{Deserialize, Serialize};

/// Issue severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// What went wrong (or what was noteworthy) for a single issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// A percentage was derived from the subtotal amounts.
    DerivedPercentage,
    /// A category was declared again with a different percentage; the first one was kept.
    ConflictingDeclaration,
    /// No percentage declared and the taxable base is zero.
    ZeroBaseDerivation,
    /// Neither a percentage nor both subtotal amounts are present.
    MissingPercentageAndAmounts,
    /// Tax amount and taxable base have opposite signs.
    NegativeDerivedPercentage,
    /// A line or allowance/charge references a category without a percentage.
    UnresolvedCategory,
    /// Amounts were aggregated into the unresolved bucket.
    UnresolvedBucket,
    /// A declared document total differs from the recomputed one.
    TotalMismatch,
}

impl IssueKind {
    /// Severity recorded for this kind of issue.
    pub fn severity(&self) -> Severity {
        match self {
            Self::DerivedPercentage => Severity::Info,
            Self::ConflictingDeclaration | Self::TotalMismatch => Severity::Warning,
            Self::ZeroBaseDerivation
            | Self::MissingPercentageAndAmounts
            | Self::NegativeDerivedPercentage
            | Self::UnresolvedCategory
            | Self::UnresolvedBucket => Severity::Error,
        }
    }
}

/// A single issue with a locator pointing at the offending element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
    /// Document locator (e.g. "tax_subtotals[1]", "lines[3]").
    pub context: String,
}

impl ConversionIssue {
    /// Create an issue whose severity follows from its kind.
    pub fn new(kind: IssueKind, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            message: message.into(),
            context: context.into(),
        }
    }
}

impl std::fmt::Display for ConversionIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

/// Ordered, append-only collection of [`ConversionIssue`]s.
///
/// Identical issues are kept every time they are appended; each one points
/// at a different location in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSink {
    issues: Vec<ConversionIssue>,
}

impl IssueSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, issue: ConversionIssue) {
        log::debug!("conversion issue: {issue}");
        self.issues.push(issue);
    }

    /// Highest severity present, `None` when the sink is empty.
    pub fn most_severe(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.severity).max()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// All issues in insertion order.
    pub fn all(&self) -> &[ConversionIssue] {
        &self.issues
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConversionIssue> {
        self.issues.iter()
    }

    /// Number of issues with exactly the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.most_severe() == Some(Severity::Error)
    }

    pub fn first_error(&self) -> Option<&ConversionIssue> {
        self.issues.iter().find(|i| i.severity == Severity::Error)
    }

    /// Issues of the given kind, in insertion order.
    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &ConversionIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}

impl<'a> IntoIterator for &'a IssueSink {
    type Item = &'a ConversionIssue;
    type IntoIter = std::slice::Iter<'a, ConversionIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}
