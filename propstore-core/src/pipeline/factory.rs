use std::num::NonZeroU32;

use propstore_model::ObjectId;

use crate::page::PageRequest;

use super::relations::{JoinTopology, Presentation, Relation};
use super::stage::{
    CleanupRule, CleanupStage, CountStage, JoinStage, MatchPredicate,
    MatchTerm, SizeGuardStage, Stage,
};

/// Field holding the result of a count stage.
pub const COUNT_FIELD: &str = "count";

/// Builders for individual pipeline stages. Pure; no I/O.
#[derive(Debug, Clone, Copy)]
pub struct StageFactory;

impl StageFactory {
    /// `None` for [`MatchPredicate::All`] so no empty match is emitted.
    pub fn matching(predicate: &MatchPredicate) -> Option<Stage> {
        if predicate.is_all() {
            None
        } else {
            Some(Stage::Match(predicate.clone()))
        }
    }

    pub fn id_match(id: ObjectId) -> Stage {
        Stage::Match(MatchPredicate::Terms(vec![MatchTerm::IdEquals(id)]))
    }

    pub fn key_match(field: &'static str, value: impl Into<String>) -> Stage {
        Stage::Match(MatchPredicate::Terms(vec![MatchTerm::KeyEquals {
            field,
            value: value.into(),
        }]))
    }

    /// Bounded join: at most `cap` related records per primary record.
    pub fn join(
        from: impl Into<String>,
        local_field: &'static str,
        foreign_field: &'static str,
        output: &'static str,
        cap: NonZeroU32,
    ) -> Stage {
        Stage::Join(JoinStage {
            from: from.into(),
            local_field,
            foreign_field,
            output,
            cap,
        })
    }

    pub fn relation_join(relation: &Relation) -> Stage {
        Self::join(
            relation.collection.clone(),
            relation.local_field,
            relation.foreign_field,
            relation.output,
            relation.join_cap,
        )
    }

    /// One rule per relation, shaped by its presentation. `None` when the
    /// topology has no relations.
    pub fn cleanup(topology: &JoinTopology) -> Option<Stage> {
        if topology.is_empty() {
            return None;
        }

        let rules = topology
            .relations()
            .iter()
            .map(|relation| match relation.presentation {
                Presentation::Single => CleanupRule::First {
                    field: relation.output,
                },
                Presentation::Flagged { flag, cap } => CleanupRule::KeepFlagged {
                    field: relation.output,
                    flag,
                    cap,
                },
                Presentation::Truncated { cap } => CleanupRule::Truncate {
                    field: relation.output,
                    cap,
                },
            })
            .collect();

        Some(Stage::Cleanup(CleanupStage { rules }))
    }

    pub fn size_guard(max_bytes: u64) -> Stage {
        Stage::SizeGuard(SizeGuardStage { max_bytes })
    }

    /// `[Skip((page - 1) * page_size), Limit(page_size)]`.
    ///
    /// [`PageRequest`] guarantees page >= 1 and page_size >= 1; the
    /// arithmetic is meaningless otherwise.
    pub fn pagination(page: PageRequest) -> [Stage; 2] {
        [Stage::Skip(page.skip()), Stage::Limit(page.limit())]
    }

    pub fn count() -> Stage {
        Stage::Count(CountStage {
            output: COUNT_FIELD,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryLimits;
    use crate::pipeline::StageKind;

    #[test]
    fn match_all_emits_no_stage() {
        assert!(StageFactory::matching(&MatchPredicate::All).is_none());
        assert!(
            StageFactory::matching(&MatchPredicate::Terms(Vec::new())).is_none()
        );
    }

    #[test]
    fn pagination_skips_previous_pages() {
        let page = PageRequest::new(3, 10).unwrap();
        assert_eq!(
            StageFactory::pagination(page),
            [Stage::Skip(20), Stage::Limit(10)]
        );

        let first = PageRequest::new(1, 25).unwrap();
        assert_eq!(
            StageFactory::pagination(first),
            [Stage::Skip(0), Stage::Limit(25)]
        );
    }

    #[test]
    fn cleanup_rules_follow_topology_order() {
        let topology = JoinTopology::listing_details(&QueryLimits::default());
        let Some(Stage::Cleanup(cleanup)) = StageFactory::cleanup(&topology)
        else {
            panic!("expected cleanup stage");
        };

        let fields: Vec<_> = cleanup.rules.iter().map(CleanupRule::field).collect();
        assert_eq!(fields, ["Owner", "Images", "Traces"]);
        assert!(matches!(cleanup.rules[0], CleanupRule::First { .. }));
        assert!(matches!(
            cleanup.rules[1],
            CleanupRule::KeepFlagged { flag: "Enabled", .. }
        ));
    }

    #[test]
    fn empty_topology_needs_no_cleanup() {
        assert!(StageFactory::cleanup(&JoinTopology::none()).is_none());
    }

    #[test]
    fn relation_join_carries_cap() {
        let relation = Relation::images(
            "PropertyImages",
            NonZeroU32::new(12).unwrap(),
            NonZeroU32::new(4).unwrap(),
        );
        let stage = StageFactory::relation_join(&relation);
        assert_eq!(stage.kind(), StageKind::Join);
        let Stage::Join(join) = stage else { unreachable!() };
        assert_eq!(join.cap.get(), 12);
        assert_eq!(join.from, "PropertyImages");
    }
}
