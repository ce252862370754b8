use propstore_model::fields;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::stage::{MatchPredicate, MatchTerm};

/// Optional listing criteria collected from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingFilter {
    pub name: Option<String>,
    pub address: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ListingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring of the listing name. The value is matched
    /// literally: `"Casa.*"` looks for that text, not a pattern.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Case-insensitive literal substring of the listing address.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn min_price(mut self, min: Decimal) -> Self {
        self.min_price = Some(min);
        self
    }

    pub fn max_price(mut self, max: Decimal) -> Self {
        self.max_price = Some(max);
        self
    }

    /// Inclusive price range
    pub fn price_between(self, min: Decimal, max: Decimal) -> Self {
        self.min_price(min).max_price(max)
    }

    /// Copy with blank strings dropped and the rest trimmed.
    pub fn normalized(&self) -> Self {
        Self {
            name: non_blank(self.name.as_deref()),
            address: non_blank(self.address.as_deref()),
            min_price: self.min_price,
            max_price: self.max_price,
        }
    }

    pub fn is_empty(&self) -> bool {
        FilterCompiler::compile(self).is_all()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Translates [`ListingFilter`] into a single match predicate.
#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler;

impl FilterCompiler {
    /// Blank criteria contribute nothing; with no terms left the result is
    /// [`MatchPredicate::All`].
    pub fn compile(filter: &ListingFilter) -> MatchPredicate {
        let filter = filter.normalized();
        let mut terms = Vec::new();

        if let Some(name) = filter.name {
            terms.push(MatchTerm::Contains {
                field: fields::listing::NAME,
                needle: name,
            });
        }

        if let Some(address) = filter.address {
            terms.push(MatchTerm::Contains {
                field: fields::listing::ADDRESS,
                needle: address,
            });
        }

        if filter.min_price.is_some() || filter.max_price.is_some() {
            terms.push(MatchTerm::Range {
                field: fields::listing::PRICE,
                min: filter.min_price,
                max: filter.max_price,
            });
        }

        if terms.is_empty() {
            MatchPredicate::All
        } else {
            MatchPredicate::Terms(terms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    #[test]
    fn no_criteria_matches_everything() {
        assert_eq!(
            FilterCompiler::compile(&ListingFilter::new()),
            MatchPredicate::All
        );
    }

    #[test]
    fn blank_strings_are_not_provided() {
        let filter = ListingFilter::new().name("   ").address("");
        assert_eq!(FilterCompiler::compile(&filter), MatchPredicate::All);
        assert!(filter.is_empty());
    }

    #[test]
    fn text_criteria_are_trimmed_substrings() {
        let filter = ListingFilter::new().name("  casa ").address("Calle");
        let predicate = FilterCompiler::compile(&filter);

        assert_eq!(
            predicate.terms(),
            &[
                MatchTerm::Contains {
                    field: "Name",
                    needle: "casa".into()
                },
                MatchTerm::Contains {
                    field: "Address",
                    needle: "Calle".into()
                },
            ]
        );
    }

    #[test]
    fn both_price_bounds_form_one_range() {
        let filter =
            ListingFilter::new().price_between(dec("100000"), dec("250000.50"));
        let predicate = FilterCompiler::compile(&filter);

        assert_eq!(
            predicate.terms(),
            &[MatchTerm::Range {
                field: "Price",
                min: Some(dec("100000")),
                max: Some(dec("250000.50")),
            }]
        );
    }

    #[test]
    fn single_price_bound_applies_alone() {
        let predicate =
            FilterCompiler::compile(&ListingFilter::new().max_price(dec("5")));
        assert_eq!(
            predicate.terms(),
            &[MatchTerm::Range {
                field: "Price",
                min: None,
                max: Some(dec("5")),
            }]
        );
    }

    #[test]
    fn compilation_is_deterministic() {
        let filter = ListingFilter::new()
            .name("azul")
            .min_price(dec("10"))
            .address("norte");
        assert_eq!(
            FilterCompiler::compile(&filter),
            FilterCompiler::compile(&filter.clone())
        );
    }
}
