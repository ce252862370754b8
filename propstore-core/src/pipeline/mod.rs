//! Typed aggregation pipelines and the pure builders that produce them.

pub mod assembler;
pub mod factory;
pub mod filter;
pub mod native;
pub mod relations;
pub mod stage;

pub use assembler::PipelineAssembler;
pub use factory::{COUNT_FIELD, StageFactory};
pub use filter::{FilterCompiler, ListingFilter};
pub use relations::{JoinTopology, Presentation, Relation};
pub use stage::{
    CleanupRule, CleanupStage, CountStage, JoinStage, MatchPredicate,
    MatchTerm, Pipeline, SizeGuardStage, Stage, StageKind,
};
