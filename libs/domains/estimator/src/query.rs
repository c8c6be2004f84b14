//! OData filter construction for the Azure Retail Prices API.
//!
//! A [`CatalogQuery`] is a conjunction of [`Predicate`]s. The catalog cannot
//! filter on reservation term length, so reservation queries only pin the
//! price type and leave the term to [`crate::resolver`].

use std::fmt;

use crate::error::{EstimatorError, EstimatorResult};
use crate::models::{OsType, PricedResource, VirtualMachine};

pub const SERVICE_VIRTUAL_MACHINES: &str = "Virtual Machines";
pub const SKU_SPOT: &str = "Spot";
pub const SKU_LOW_PRIORITY: &str = "Low Priority";
pub const PRODUCT_WINDOWS: &str = "Windows";

/// A single filter term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `field eq 'value'`
    Eq { field: &'static str, value: String },
    /// `contains(field, 'needle')`, or `... eq false` when `expected` is false
    Contains {
        field: &'static str,
        needle: String,
        expected: bool,
    },
}

impl Predicate {
    pub fn eq(field: &'static str, value: impl Into<String>) -> Self {
        Predicate::Eq {
            field,
            value: value.into(),
        }
    }

    pub fn contains(field: &'static str, needle: impl Into<String>) -> Self {
        Predicate::Contains {
            field,
            needle: needle.into(),
            expected: true,
        }
    }

    pub fn not_contains(field: &'static str, needle: impl Into<String>) -> Self {
        Predicate::Contains {
            field,
            needle: needle.into(),
            expected: false,
        }
    }
}

/// OData string literals escape a single quote by doubling it
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Eq { field, value } => write!(f, "{} eq {}", field, quote(value)),
            Predicate::Contains {
                field,
                needle,
                expected: true,
            } => write!(f, "contains({}, {})", field, quote(needle)),
            Predicate::Contains {
                field,
                needle,
                expected: false,
            } => write!(f, "contains({}, {}) eq false", field, quote(needle)),
        }
    }
}

/// Conjunction of predicates sent to the price catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    predicates: Vec<Predicate>,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn contains_predicate(&self, predicate: &Predicate) -> bool {
        self.predicates.contains(predicate)
    }

    /// Render as an OData `$filter` expression
    pub fn filter(&self) -> String {
        self.predicates
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filter())
    }
}

impl PricedResource {
    /// Build the catalog query that targets this resource's price records
    pub fn catalog_query(&self) -> EstimatorResult<CatalogQuery> {
        match self {
            PricedResource::VirtualMachine(vm) => vm.catalog_query(),
        }
    }
}

impl VirtualMachine {
    pub fn catalog_query(&self) -> EstimatorResult<CatalogQuery> {
        let mut query = CatalogQuery::new()
            .and(Predicate::eq("serviceName", SERVICE_VIRTUAL_MACHINES))
            .and(Predicate::eq("armRegionName", &self.location))
            .and(Predicate::eq("armSkuName", &self.size));

        query = match (self.spot, self.low_priority) {
            (true, true) => {
                return Err(EstimatorError::ConflictingPriority {
                    address: self.address.clone(),
                });
            }
            (true, false) => query.and(Predicate::contains("skuName", SKU_SPOT)),
            (false, true) => query.and(Predicate::contains("skuName", SKU_LOW_PRIORITY)),
            (false, false) => query
                .and(Predicate::not_contains("skuName", SKU_SPOT))
                .and(Predicate::not_contains("skuName", SKU_LOW_PRIORITY)),
        };

        query = match self.os {
            OsType::Windows => query.and(Predicate::contains("productName", PRODUCT_WINDOWS)),
            OsType::Linux => query.and(Predicate::not_contains("productName", PRODUCT_WINDOWS)),
        };

        Ok(query.and(Predicate::eq("priceType", self.billing_scheme.price_type())))
    }
}
