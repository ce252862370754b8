use std::fmt;
use std::num::NonZeroU32;

use propstore_model::ObjectId;
use rust_decimal::Decimal;

/// One step of an aggregation pipeline.
///
/// Stores translate each variant into their native stage form; count
/// derivation filters on the variant tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(MatchPredicate),
    Join(JoinStage),
    Cleanup(CleanupStage),
    SizeGuard(SizeGuardStage),
    Skip(u64),
    Limit(u64),
    Count(CountStage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Match,
    Join,
    Cleanup,
    SizeGuard,
    Skip,
    Limit,
    Count,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Match => "match",
            StageKind::Join => "join",
            StageKind::Cleanup => "cleanup",
            StageKind::SizeGuard => "size_guard",
            StageKind::Skip => "skip",
            StageKind::Limit => "limit",
            StageKind::Count => "count",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Match(_) => StageKind::Match,
            Stage::Join(_) => StageKind::Join,
            Stage::Cleanup(_) => StageKind::Cleanup,
            Stage::SizeGuard(_) => StageKind::SizeGuard,
            Stage::Skip(_) => StageKind::Skip,
            Stage::Limit(_) => StageKind::Limit,
            Stage::Count(_) => StageKind::Count,
        }
    }

    /// Skip and limit are the only stages that depend on the requested page.
    pub fn is_pagination(&self) -> bool {
        matches!(self, Stage::Skip(_) | Stage::Limit(_))
    }
}

/// Filter predicate of a match stage. Terms are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchPredicate {
    /// Explicit match-everything marker; assemblers emit no stage for it.
    All,
    Terms(Vec<MatchTerm>),
}

impl MatchPredicate {
    pub fn is_all(&self) -> bool {
        match self {
            MatchPredicate::All => true,
            MatchPredicate::Terms(terms) => terms.is_empty(),
        }
    }

    pub fn terms(&self) -> &[MatchTerm] {
        match self {
            MatchPredicate::All => &[],
            MatchPredicate::Terms(terms) => terms,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchTerm {
    /// Case-insensitive literal substring match on a string field.
    Contains { field: &'static str, needle: String },
    /// Inclusive decimal range; at least one bound is set.
    Range {
        field: &'static str,
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
    /// Equality on the store identity.
    IdEquals(ObjectId),
    /// Equality on a string field, used for business-key lookups.
    KeyEquals { field: &'static str, value: String },
}

/// Bounded lookup of related records for every primary record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStage {
    pub from: String,
    pub local_field: &'static str,
    pub foreign_field: &'static str,
    pub output: &'static str,
    /// At most this many related records are attached per primary record.
    pub cap: NonZeroU32,
}

/// Post-join normalisation of the joined arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupStage {
    pub rules: Vec<CleanupRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupRule {
    /// Replace a 0-or-1 element array with its element, or null.
    First { field: &'static str },
    /// Keep elements whose `flag` is `true`, then truncate to `cap`.
    KeepFlagged {
        field: &'static str,
        flag: &'static str,
        cap: NonZeroU32,
    },
    /// Truncate to `cap` elements.
    Truncate {
        field: &'static str,
        cap: NonZeroU32,
    },
}

impl CleanupRule {
    pub fn field(&self) -> &'static str {
        match self {
            CleanupRule::First { field }
            | CleanupRule::KeepFlagged { field, .. }
            | CleanupRule::Truncate { field, .. } => field,
        }
    }
}

/// Excludes composed documents whose serialized size exceeds `max_bytes`.
/// Lossy: dropped documents are reported, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeGuardStage {
    pub max_bytes: u64,
}

/// Terminal reduction into a single `{ <output>: n }` document. Like the
/// store's native count, it yields no document at all when nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountStage {
    pub output: &'static str,
}

/// Ordered stages bound to the collection they run against.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    collection: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            stages: Vec::new(),
        }
    }

    pub fn with_stages(collection: impl Into<String>, stages: Vec<Stage>) -> Self {
        Self {
            collection: collection.into(),
            stages,
        }
    }

    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn extend(&mut self, stages: impl IntoIterator<Item = Stage>) {
        self.stages.extend(stages);
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(Stage::kind).collect()
    }

    pub fn count_stage(&self) -> Option<&CountStage> {
        match self.stages.last() {
            Some(Stage::Count(count)) => Some(count),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
