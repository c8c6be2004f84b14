use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

/// Hours billed per month. Monthly cost is always `hourly * HOURS_PER_MONTH`.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Hours billed per year. Yearly cost is always `hourly * HOURS_PER_YEAR`.
pub const HOURS_PER_YEAR: f64 = 8760.0;

// ============================================================================
// Plan input
// ============================================================================

/// The subset of `terraform show -json` output the estimator reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlanDocument {
    #[serde(default)]
    pub resource_changes: Vec<ResourceChange>,
}

/// One declared creation or modification of a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResourceChange {
    pub address: String,
    /// `managed` for resources, `data` for data sources
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(alias = "provider")]
    pub provider_name: String,
    #[serde(default)]
    pub change: Change,
}

fn default_mode() -> String {
    "managed".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Change {
    #[serde(default)]
    pub actions: Vec<String>,
    /// Untyped after-state attributes; decoded per resource type by the registry
    #[serde(default)]
    #[schema(value_type = Object)]
    pub after: serde_json::Value,
}

impl ResourceChange {
    /// True when the change only destroys the resource
    pub fn is_delete_only(&self) -> bool {
        self.change.actions.len() == 1 && self.change.actions[0] == "delete"
    }

    pub fn is_data_source(&self) -> bool {
        self.mode == "data"
    }
}

// ============================================================================
// Billing
// ============================================================================

/// Pricing model applied to every priced resource of a request
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum BillingScheme {
    #[default]
    #[serde(rename = "consumption")]
    #[strum(to_string = "consumption")]
    OnDemand,
    #[serde(rename = "devtestconsumption")]
    #[strum(to_string = "devtestconsumption")]
    DevTestOnDemand,
    #[serde(rename = "reservation1yr")]
    #[strum(to_string = "reservation1yr")]
    Reservation1Year,
    #[serde(rename = "reservation3yr")]
    #[strum(to_string = "reservation3yr")]
    Reservation3Year,
}

impl BillingScheme {
    pub fn is_reservation(&self) -> bool {
        matches!(
            self,
            BillingScheme::Reservation1Year | BillingScheme::Reservation3Year
        )
    }

    /// Catalog `priceType` value for this scheme
    pub fn price_type(&self) -> &'static str {
        match self {
            BillingScheme::OnDemand => "Consumption",
            BillingScheme::DevTestOnDemand => "DevTestConsumption",
            BillingScheme::Reservation1Year | BillingScheme::Reservation3Year => "Reservation",
        }
    }

    /// Catalog `reservationTerm` label, for reservation schemes only
    pub fn reservation_term_label(&self) -> Option<&'static str> {
        match self {
            BillingScheme::Reservation1Year => Some("1 Year"),
            BillingScheme::Reservation3Year => Some("3 Years"),
            _ => None,
        }
    }

    /// Hours covered by one reservation term price
    pub fn reservation_hours(&self) -> Option<f64> {
        match self {
            BillingScheme::Reservation1Year => Some(HOURS_PER_YEAR),
            BillingScheme::Reservation3Year => Some(3.0 * HOURS_PER_YEAR),
            _ => None,
        }
    }
}

/// Request-level options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EstimateOptions {
    /// consumption, devtestconsumption, reservation1yr or reservation3yr
    #[serde(default)]
    pub pricing_scheme: BillingScheme,
}

impl EstimateOptions {
    pub fn with_scheme(pricing_scheme: BillingScheme) -> Self {
        Self { pricing_scheme }
    }
}

// ============================================================================
// Priced resources
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OsType {
    #[default]
    Linux,
    Windows,
}

/// A virtual machine (or a homogeneous group of them) to be priced
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualMachine {
    pub address: String,
    pub size: String,
    pub location: String,
    pub os: OsType,
    pub spot: bool,
    pub low_priority: bool,
    /// Number of identical instances; scales the price, never the catalog lookup
    pub count: f64,
    pub billing_scheme: BillingScheme,
}

impl VirtualMachine {
    /// A single regular-priority Linux instance billed on demand
    pub fn new(address: impl Into<String>, size: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            size: size.into(),
            location: location.into(),
            os: OsType::Linux,
            spot: false,
            low_priority: false,
            count: 1.0,
            billing_scheme: BillingScheme::OnDemand,
        }
    }
}

/// Everything the estimator knows how to price
#[derive(Debug, Clone, PartialEq)]
pub enum PricedResource {
    VirtualMachine(VirtualMachine),
}

impl PricedResource {
    pub fn address(&self) -> &str {
        match self {
            PricedResource::VirtualMachine(vm) => &vm.address,
        }
    }

    pub fn billing_scheme(&self) -> BillingScheme {
        match self {
            PricedResource::VirtualMachine(vm) => vm.billing_scheme,
        }
    }

    /// Multiplier applied to the resolved unit price
    pub fn quantity(&self) -> f64 {
        match self {
            PricedResource::VirtualMachine(vm) => vm.count,
        }
    }
}

// ============================================================================
// Catalog records
// ============================================================================

/// One price record from the Azure Retail Prices API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub unit_price: f64,
    #[serde(default)]
    pub retail_price: f64,
    /// "1 Year" / "3 Years" on reservation items, absent otherwise
    #[serde(default)]
    pub reservation_term: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub arm_region_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub arm_sku_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sku_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit_of_measure: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub price_type: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One page of the catalog response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogPage {
    #[serde(rename = "Items", default)]
    pub items: Vec<CatalogItem>,
    #[serde(rename = "NextPageLink", default)]
    pub next_page_link: Option<String>,
}

// ============================================================================
// Estimate output
// ============================================================================

/// Outcome of resolving one resource's price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResolutionStatus {
    /// A catalog item was selected
    Resolved,
    /// The catalog returned nothing for the query
    NoCatalogItems,
    /// Items came back but none carried the requested reservation term
    NoMatchingReservationTerm,
    /// The catalog call failed
    CatalogUnavailable,
    /// The after-state could not be decoded for this resource type
    AttributeSchemaMismatch,
}

impl ResolutionStatus {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionStatus::Resolved)
    }
}

/// Cost breakdown for a single resource change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResourceEstimate {
    pub address: String,
    pub resource_type: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub hourly_cost: f64,
    pub status: ResolutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TotalEstimate {
    pub hourly_cost: f64,
    pub monthly_cost: f64,
    pub yearly_cost: f64,
}

impl TotalEstimate {
    /// Project monthly and yearly totals from an hourly total
    pub fn from_hourly(hourly_cost: f64) -> Self {
        Self {
            hourly_cost,
            monthly_cost: hourly_cost * HOURS_PER_MONTH,
            yearly_cost: hourly_cost * HOURS_PER_YEAR,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EstimateResult {
    pub total_estimate: TotalEstimate,
    pub unsupported_resources: Vec<String>,
    #[serde(default)]
    pub resources: Vec<ResourceEstimate>,
}

impl EstimateResult {
    /// Resources whose price could not be determined (priced at zero)
    pub fn unresolved(&self) -> impl Iterator<Item = &ResourceEstimate> {
        self.resources.iter().filter(|r| !r.status.is_resolved())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_billing_scheme_parsing() {
        assert_eq!(BillingScheme::from_str("consumption").unwrap(), BillingScheme::OnDemand);
        assert_eq!(
            BillingScheme::from_str("Reservation1Yr").unwrap(),
            BillingScheme::Reservation1Year
        );
        assert_eq!(
            BillingScheme::from_str("devtestconsumption").unwrap(),
            BillingScheme::DevTestOnDemand
        );
        assert!(BillingScheme::from_str("spot").is_err());
        assert_eq!(BillingScheme::Reservation3Year.to_string(), "reservation3yr");
    }

    #[test]
    fn test_billing_scheme_reservation_details() {
        assert_eq!(BillingScheme::Reservation1Year.reservation_term_label(), Some("1 Year"));
        assert_eq!(BillingScheme::Reservation3Year.reservation_term_label(), Some("3 Years"));
        assert_eq!(BillingScheme::OnDemand.reservation_term_label(), None);
        assert_eq!(BillingScheme::Reservation3Year.reservation_hours(), Some(26280.0));
        assert_eq!(BillingScheme::DevTestOnDemand.price_type(), "DevTestConsumption");
    }

    #[test]
    fn test_total_estimate_is_exact_multiple_of_hourly() {
        let total = TotalEstimate::from_hourly(0.123);
        assert_eq!(total.monthly_cost, 0.123 * 730.0);
        assert_eq!(total.yearly_cost, 0.123 * 8760.0);
    }

    #[test]
    fn test_resource_change_decoding() {
        let change: ResourceChange = serde_json::from_value(serde_json::json!({
            "address": "azurerm_linux_virtual_machine.web",
            "type": "azurerm_linux_virtual_machine",
            "provider_name": "registry.terraform.io/hashicorp/azurerm",
            "change": { "actions": ["create"], "after": { "size": "Standard_B1s" } }
        }))
        .unwrap();

        assert_eq!(change.mode, "managed");
        assert_eq!(change.resource_type, "azurerm_linux_virtual_machine");
        assert!(!change.is_delete_only());
        assert_eq!(change.change.after["size"], "Standard_B1s");
    }

    #[test]
    fn test_catalog_item_tolerates_nulls() {
        let item: CatalogItem = serde_json::from_value(serde_json::json!({
            "unitPrice": 0.0104,
            "armSkuName": null,
            "reservationTerm": "1 Year",
            "type": "Reservation"
        }))
        .unwrap();

        assert_eq!(item.arm_sku_name, "");
        assert_eq!(item.reservation_term.as_deref(), Some("1 Year"));
        assert_eq!(item.price_type, "Reservation");
    }

    #[test]
    fn test_estimate_options_default_to_consumption() {
        let options: EstimateOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.pricing_scheme, BillingScheme::OnDemand);
    }
}
