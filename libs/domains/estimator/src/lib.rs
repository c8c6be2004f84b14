//! Estimator Domain
//!
//! Prices the resource changes of a Terraform plan against the Azure Retail
//! Prices API and projects hourly, monthly and yearly cost.
//!
//! # Flow
//!
//! ```text
//! PlanDocument
//!     │
//! ┌───▼──────────────┐
//! │ ResourceRegistry │  ← (provider, type) → PricedResource | unsupported
//! └───┬──────────────┘
//!     │ per resource
//! ┌───▼──────────────┐   ┌──────────────┐
//! │ CatalogQuery     │──▶│ PriceCatalog │  ← Azure Retail Prices API
//! └──────────────────┘   └──────┬───────┘
//!                               │ items
//!                        ┌──────▼───────┐
//!                        │   resolver   │  ← billing scheme, reservation term
//!                        └──────┬───────┘
//!                        ┌──────▼───────┐
//!                        │CostAggregator│  → EstimateResult
//!                        └──────────────┘
//! ```

pub mod aggregator;
pub mod catalog;
pub mod error;
pub mod handlers;
pub mod models;
pub mod query;
pub mod registry;
pub mod reporter;
pub mod resolver;
pub mod service;

// Re-export commonly used types
pub use aggregator::CostAggregator;
pub use catalog::{AzureRetailCatalog, AzureRetailCatalogConfig, PriceCatalog};
pub use error::{CatalogError, CatalogResult, EstimatorError, EstimatorResult};
pub use models::{
    BillingScheme, CatalogItem, EstimateOptions, EstimateResult, OsType, PlanDocument,
    PricedResource, ResolutionStatus, ResourceChange, ResourceEstimate, TotalEstimate,
    VirtualMachine, HOURS_PER_MONTH, HOURS_PER_YEAR,
};
pub use query::{CatalogQuery, Predicate};
pub use registry::{AZURERM_PROVIDER, Classification, ResourceRegistry, SkipReason};
pub use reporter::{EstimateReporter, NoopReporter, TracingReporter};
pub use resolver::{Resolution, resolve_unit_price};
pub use service::{EstimatorService, EstimatorSettings};
