use std::num::NonZeroU32;

use propstore_model::ObjectId;

use crate::config::QueryLimits;
use crate::page::PageRequest;

use super::factory::StageFactory;
use super::relations::JoinTopology;
use super::stage::{MatchPredicate, Pipeline, Stage};

/// Composes stages into complete pipelines for one primary collection.
///
/// Stage order of a data pipeline is fixed: match, joins, cleanup, size
/// guard, skip, limit. The match stage is omitted for a match-all predicate;
/// joins, cleanup and the size guard are omitted for an empty topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineAssembler {
    collection: String,
    topology: JoinTopology,
    size_ceiling_bytes: u64,
}

impl PipelineAssembler {
    pub fn new(
        collection: impl Into<String>,
        topology: JoinTopology,
        size_ceiling_bytes: u64,
    ) -> Self {
        Self {
            collection: collection.into(),
            topology,
            size_ceiling_bytes,
        }
    }

    /// Listings joined with owner, enabled images and traces.
    pub fn listing_details(limits: &QueryLimits) -> Self {
        Self::new(
            limits.collections.listings.clone(),
            JoinTopology::listing_details(limits),
            limits.size_ceiling_bytes,
        )
    }

    /// Listings without any joins.
    pub fn listings(limits: &QueryLimits) -> Self {
        Self::new(
            limits.collections.listings.clone(),
            JoinTopology::none(),
            limits.size_ceiling_bytes,
        )
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn topology(&self) -> &JoinTopology {
        &self.topology
    }

    pub fn data_pipeline(
        &self,
        predicate: &MatchPredicate,
        page: PageRequest,
    ) -> Pipeline {
        let mut pipeline = Pipeline::new(self.collection.clone());
        pipeline.extend(StageFactory::matching(predicate));
        self.push_joins(&mut pipeline);
        pipeline.extend(StageFactory::pagination(page));
        pipeline
    }

    /// Mirror of `data` without pagination, terminated by a count.
    ///
    /// Every other stage is carried over verbatim, including joins and the
    /// size guard, so the count covers exactly the documents the data
    /// pipeline could page through.
    pub fn count_pipeline(data: &Pipeline) -> Pipeline {
        let mut stages: Vec<Stage> = data
            .stages()
            .iter()
            .filter(|stage| !stage.is_pagination())
            .cloned()
            .collect();
        stages.push(StageFactory::count());
        Pipeline::with_stages(data.collection(), stages)
    }

    /// Identity match followed by the join chain; no pagination.
    pub fn single_pipeline(&self, id: ObjectId) -> Pipeline {
        let mut pipeline = Pipeline::new(self.collection.clone());
        pipeline.push(StageFactory::id_match(id));
        self.push_joins(&mut pipeline);
        pipeline
    }

    /// Bounded lookup of records in `collection` whose `field` equals
    /// `value`.
    pub fn related_pipeline(
        collection: impl Into<String>,
        field: &'static str,
        value: impl Into<String>,
        cap: NonZeroU32,
    ) -> Pipeline {
        Pipeline::with_stages(
            collection,
            vec![
                StageFactory::key_match(field, value),
                Stage::Limit(u64::from(cap.get())),
            ],
        )
    }

    fn push_joins(&self, pipeline: &mut Pipeline) {
        if self.topology.is_empty() {
            return;
        }

        pipeline.extend(
            self.topology
                .relations()
                .iter()
                .map(StageFactory::relation_join),
        );
        pipeline.extend(StageFactory::cleanup(&self.topology));
        pipeline.push(StageFactory::size_guard(self.size_ceiling_bytes));
    }
}
