//! Rendering of typed stages into the store's native aggregation syntax.
//!
//! Adapters that talk to a real document store send these documents as-is;
//! the executor also logs them at debug level.

use regex::escape;
use serde_json::{Map, Value, json};

use super::stage::{
    CleanupRule, JoinStage, MatchPredicate, MatchTerm, Pipeline, Stage,
};

impl Stage {
    pub fn to_document(&self) -> Value {
        match self {
            Stage::Match(predicate) => {
                json!({ "$match": predicate_document(predicate) })
            }
            Stage::Join(join) => json!({ "$lookup": lookup_document(join) }),
            Stage::Cleanup(cleanup) => {
                let fields: Map<String, Value> = cleanup
                    .rules
                    .iter()
                    .map(|rule| {
                        (rule.field().to_string(), cleanup_expression(rule))
                    })
                    .collect();
                json!({ "$addFields": fields })
            }
            Stage::SizeGuard(guard) => json!({
                "$match": {
                    "$expr": {
                        "$lte": [{ "$bsonSize": "$$ROOT" }, guard.max_bytes]
                    }
                }
            }),
            Stage::Skip(n) => json!({ "$skip": n }),
            Stage::Limit(n) => json!({ "$limit": n }),
            Stage::Count(count) => json!({ "$count": count.output }),
        }
    }
}

impl Pipeline {
    pub fn to_documents(&self) -> Vec<Value> {
        self.stages().iter().map(Stage::to_document).collect()
    }

    /// Compact single-line JSON, for logs.
    pub fn to_native_string(&self) -> String {
        Value::Array(self.to_documents()).to_string()
    }
}

fn predicate_document(predicate: &MatchPredicate) -> Value {
    let mut doc = Map::new();
    for term in predicate.terms() {
        let (field, condition) = term_condition(term);
        doc.insert(field.to_string(), condition);
    }
    Value::Object(doc)
}

fn term_condition(term: &MatchTerm) -> (&'static str, Value) {
    match term {
        MatchTerm::Contains { field, needle } => (
            *field,
            json!({ "$regex": escape(needle), "$options": "i" }),
        ),
        MatchTerm::Range { field, min, max } => {
            let mut bounds = Map::new();
            if let Some(min) = min {
                bounds.insert(
                    "$gte".into(),
                    json!({ "$numberDecimal": min.to_string() }),
                );
            }
            if let Some(max) = max {
                bounds.insert(
                    "$lte".into(),
                    json!({ "$numberDecimal": max.to_string() }),
                );
            }
            (*field, Value::Object(bounds))
        }
        MatchTerm::IdEquals(id) => {
            (propstore_model::fields::ID, json!({ "$oid": id.to_hex() }))
        }
        MatchTerm::KeyEquals { field, value } => (*field, json!(value)),
    }
}

/// A missing or null local key joins nothing; without the guard `$expr`
/// would pair it with every foreign record that also lacks the field.
fn lookup_document(join: &JoinStage) -> Value {
    json!({
        "from": join.from,
        "let": {
            "key": { "$ifNull": [format!("${}", join.local_field), null] }
        },
        "pipeline": [
            {
                "$match": {
                    "$expr": {
                        "$and": [
                            { "$ne": ["$$key", null] },
                            { "$eq": [format!("${}", join.foreign_field), "$$key"] }
                        ]
                    }
                }
            },
            { "$limit": join.cap.get() }
        ],
        "as": join.output,
    })
}

fn cleanup_expression(rule: &CleanupRule) -> Value {
    match rule {
        CleanupRule::First { field } => json!({
            "$ifNull": [{ "$arrayElemAt": [format!("${field}"), 0] }, null]
        }),
        CleanupRule::KeepFlagged { field, flag, cap } => json!({
            "$slice": [
                {
                    "$filter": {
                        "input": format!("${field}"),
                        "as": "item",
                        "cond": { "$eq": [format!("$$item.{flag}"), true] }
                    }
                },
                cap.get()
            ]
        }),
        CleanupRule::Truncate { field, cap } => {
            json!({ "$slice": [format!("${field}"), cap.get()] })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryLimits;
    use crate::page::PageRequest;
    use crate::pipeline::{
        FilterCompiler, ListingFilter, PipelineAssembler, StageFactory,
    };
    use rust_decimal::Decimal;

    #[test]
    fn text_terms_render_as_escaped_case_insensitive_regex() {
        let predicate =
            FilterCompiler::compile(&ListingFilter::new().name("a+b (c)"));
        let doc = StageFactory::matching(&predicate).unwrap().to_document();

        assert_eq!(
            doc,
            json!({ "$match": { "Name": { "$regex": r"a\+b \(c\)", "$options": "i" } } })
        );
    }

    #[test]
    fn price_range_renders_exact_decimals() {
        let predicate = FilterCompiler::compile(
            &ListingFilter::new()
                .price_between(Decimal::new(1000050, 2), Decimal::new(2, 0)),
        );
        let doc = StageFactory::matching(&predicate).unwrap().to_document();

        assert_eq!(
            doc,
            json!({
                "$match": {
                    "Price": {
                        "$gte": { "$numberDecimal": "10000.50" },
                        "$lte": { "$numberDecimal": "2" }
                    }
                }
            })
        );
    }

    #[test]
    fn joins_render_as_capped_lookups() {
        let limits = QueryLimits::default();
        let assembler = PipelineAssembler::listing_details(&limits);
        let pipeline = assembler
            .data_pipeline(&MatchPredicate::All, PageRequest::new(2, 10).unwrap());
        let docs = pipeline.to_documents();

        assert_eq!(docs[0]["$lookup"]["from"], "Owners");
        assert_eq!(docs[0]["$lookup"]["let"]["key"]["$ifNull"][0], "$IdOwner");
        let condition = &docs[0]["$lookup"]["pipeline"][0]["$match"]["$expr"];
        assert_eq!(condition["$and"][0]["$ne"], json!(["$$key", null]));
        assert_eq!(condition["$and"][1]["$eq"], json!(["$IdOwner", "$$key"]));
        assert_eq!(docs[0]["$lookup"]["pipeline"][1]["$limit"], 1);
        assert_eq!(docs[1]["$lookup"]["as"], "Images");
        assert_eq!(docs[1]["$lookup"]["pipeline"][1]["$limit"], 20);

        let cleanup = &docs[3]["$addFields"];
        assert_eq!(cleanup["Images"]["$slice"][1], 10);
        assert_eq!(cleanup["Traces"]["$slice"][1], 20);

        assert_eq!(
            docs[4]["$match"]["$expr"]["$lte"][1],
            limits.size_ceiling_bytes
        );
        assert_eq!(docs[5], json!({ "$skip": 10 }));
        assert_eq!(docs[6], json!({ "$limit": 10 }));
    }

    #[test]
    fn count_renders_named_output() {
        assert_eq!(
            StageFactory::count().to_document(),
            json!({ "$count": "count" })
        );
    }
}
