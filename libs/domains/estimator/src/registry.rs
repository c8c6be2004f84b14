//! Resource classification.
//!
//! Routing is an explicit map from (provider, resource type) to a constructor
//! that decodes the after-state into a [`PricedResource`]. Supporting a new
//! resource type means registering one more constructor; aggregation is
//! untouched.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{EstimatorError, EstimatorResult};
use crate::models::{EstimateOptions, OsType, PricedResource, ResourceChange, VirtualMachine};

/// Registry address of the AzureRM provider
pub const AZURERM_PROVIDER: &str = "registry.terraform.io/hashicorp/azurerm";

/// Builds a priced resource from a resource change
pub type ResourceConstructor =
    fn(&ResourceChange, &EstimateOptions) -> EstimatorResult<PricedResource>;

/// Why a change was left out without being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Provider is not one the registry prices
    ForeignProvider,
    /// Data sources are read, not provisioned
    DataSource,
    /// The resource is being destroyed
    Deleted,
}

/// Outcome of classifying one change
#[derive(Debug)]
pub enum Classification {
    Skipped(SkipReason),
    /// Target provider, but no constructor for the resource type
    Unsupported,
    Priced(PricedResource),
    /// Known resource type whose attributes failed to decode
    Invalid(EstimatorError),
}

pub struct ResourceRegistry {
    constructors: HashMap<(String, String), ResourceConstructor>,
}

impl ResourceRegistry {
    /// An empty registry that prices nothing
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registry with every Azure resource type the estimator knows
    pub fn azure() -> Self {
        let mut registry = Self::new();
        registry.register(AZURERM_PROVIDER, "azurerm_linux_virtual_machine", linux_virtual_machine);
        registry.register(AZURERM_PROVIDER, "azurerm_windows_virtual_machine", windows_virtual_machine);
        registry.register(
            AZURERM_PROVIDER,
            "azurerm_linux_virtual_machine_scale_set",
            linux_virtual_machine_scale_set,
        );
        registry.register(
            AZURERM_PROVIDER,
            "azurerm_windows_virtual_machine_scale_set",
            windows_virtual_machine_scale_set,
        );
        registry
    }

    pub fn register(&mut self, provider: &str, resource_type: &str, constructor: ResourceConstructor) {
        self.constructors.insert(
            (normalize_provider(provider).into_owned(), resource_type.to_string()),
            constructor,
        );
    }

    /// Whether changes from `provider` are classified at all
    pub fn is_target_provider(&self, provider: &str) -> bool {
        let provider = normalize_provider(provider);
        self.constructors.keys().any(|(p, _)| *p == provider)
    }

    /// Registered (provider, resource type) pairs, sorted
    pub fn supported_types(&self) -> Vec<(&str, &str)> {
        let mut types: Vec<_> = self
            .constructors
            .keys()
            .map(|(p, t)| (p.as_str(), t.as_str()))
            .collect();
        types.sort_unstable();
        types
    }

    pub fn classify(&self, change: &ResourceChange, options: &EstimateOptions) -> Classification {
        if !self.is_target_provider(&change.provider_name) {
            return Classification::Skipped(SkipReason::ForeignProvider);
        }
        if change.is_data_source() {
            return Classification::Skipped(SkipReason::DataSource);
        }
        if change.is_delete_only() {
            return Classification::Skipped(SkipReason::Deleted);
        }

        let key = (
            normalize_provider(&change.provider_name).into_owned(),
            change.resource_type.clone(),
        );
        match self.constructors.get(&key) {
            None => Classification::Unsupported,
            Some(constructor) => match constructor(change, options) {
                Ok(resource) => Classification::Priced(resource),
                Err(e) => Classification::Invalid(e),
            },
        }
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::azure()
    }
}

/// Older Terraform releases report bare provider names such as `azurerm`
fn normalize_provider(provider: &str) -> Cow<'_, str> {
    if provider.contains('/') {
        Cow::Borrowed(provider)
    } else {
        Cow::Owned(format!("registry.terraform.io/hashicorp/{}", provider))
    }
}

/// Decode the after-state of `change` into a typed attribute struct
fn decode_after<T: DeserializeOwned>(change: &ResourceChange) -> EstimatorResult<T> {
    T::deserialize(&change.change.after).map_err(|e| EstimatorError::AttributeSchemaMismatch {
        address: change.address.clone(),
        resource_type: change.resource_type.clone(),
        details: e.to_string(),
    })
}

// ============================================================================
// Virtual machines
// ============================================================================

/// `priority` attribute of VMs and scale sets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
enum VmPriority {
    #[default]
    Regular,
    Spot,
    /// Legacy scale-set value for low-priority capacity
    Low,
}

#[derive(Debug, Deserialize)]
struct VirtualMachineAttributes {
    location: String,
    size: String,
    #[serde(default)]
    priority: Option<VmPriority>,
}

#[derive(Debug, Deserialize)]
struct ScaleSetAttributes {
    location: String,
    sku: String,
    #[serde(default)]
    instances: Option<u32>,
    #[serde(default)]
    priority: Option<VmPriority>,
}

fn virtual_machine(
    change: &ResourceChange,
    options: &EstimateOptions,
    os: OsType,
    size: String,
    location: String,
    priority: Option<VmPriority>,
    count: u32,
) -> PricedResource {
    let priority = priority.unwrap_or_default();
    PricedResource::VirtualMachine(VirtualMachine {
        address: change.address.clone(),
        size,
        location,
        os,
        spot: priority == VmPriority::Spot,
        low_priority: priority == VmPriority::Low,
        count: f64::from(count),
        billing_scheme: options.pricing_scheme,
    })
}

fn single_vm(change: &ResourceChange, options: &EstimateOptions, os: OsType) -> EstimatorResult<PricedResource> {
    let attrs: VirtualMachineAttributes = decode_after(change)?;
    Ok(virtual_machine(change, options, os, attrs.size, attrs.location, attrs.priority, 1))
}

fn scale_set(change: &ResourceChange, options: &EstimateOptions, os: OsType) -> EstimatorResult<PricedResource> {
    let attrs: ScaleSetAttributes = decode_after(change)?;
    Ok(virtual_machine(
        change,
        options,
        os,
        attrs.sku,
        attrs.location,
        attrs.priority,
        attrs.instances.unwrap_or(1),
    ))
}

fn linux_virtual_machine(change: &ResourceChange, options: &EstimateOptions) -> EstimatorResult<PricedResource> {
    single_vm(change, options, OsType::Linux)
}

fn windows_virtual_machine(change: &ResourceChange, options: &EstimateOptions) -> EstimatorResult<PricedResource> {
    single_vm(change, options, OsType::Windows)
}

fn linux_virtual_machine_scale_set(
    change: &ResourceChange,
    options: &EstimateOptions,
) -> EstimatorResult<PricedResource> {
    scale_set(change, options, OsType::Linux)
}

fn windows_virtual_machine_scale_set(
    change: &ResourceChange,
    options: &EstimateOptions,
) -> EstimatorResult<PricedResource> {
    scale_set(change, options, OsType::Windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillingScheme, Change};
    use serde_json::json;

    fn change(provider: &str, resource_type: &str, after: serde_json::Value) -> ResourceChange {
        ResourceChange {
            address: format!("{}.this", resource_type),
            mode: "managed".to_string(),
            resource_type: resource_type.to_string(),
            provider_name: provider.to_string(),
            change: Change {
                actions: vec!["create".to_string()],
                after,
            },
        }
    }

    fn priced(classification: Classification) -> VirtualMachine {
        match classification {
            Classification::Priced(PricedResource::VirtualMachine(vm)) => vm,
            other => panic!("expected a priced VM, got {:?}", other),
        }
    }

    #[test]
    fn test_linux_vm_defaults() {
        let registry = ResourceRegistry::azure();
        let c = change(
            AZURERM_PROVIDER,
            "azurerm_linux_virtual_machine",
            json!({ "location": "westeurope", "size": "Standard_B2s", "name": "web" }),
        );

        let vm = priced(registry.classify(&c, &EstimateOptions::default()));
        assert_eq!(vm.address, "azurerm_linux_virtual_machine.this");
        assert_eq!(vm.size, "Standard_B2s");
        assert_eq!(vm.location, "westeurope");
        assert_eq!(vm.os, OsType::Linux);
        assert!(!vm.spot);
        assert!(!vm.low_priority);
        assert_eq!(vm.count, 1.0);
        assert_eq!(vm.billing_scheme, BillingScheme::OnDemand);
    }

    #[test]
    fn test_windows_spot_vm_with_reservation_scheme() {
        let registry = ResourceRegistry::azure();
        let c = change(
            AZURERM_PROVIDER,
            "azurerm_windows_virtual_machine",
            json!({ "location": "eastus", "size": "Standard_D4s_v3", "priority": "Spot" }),
        );

        let options = EstimateOptions::with_scheme(BillingScheme::Reservation1Year);
        let vm = priced(registry.classify(&c, &options));
        assert_eq!(vm.os, OsType::Windows);
        assert!(vm.spot);
        assert_eq!(vm.billing_scheme, BillingScheme::Reservation1Year);
    }

    #[test]
    fn test_scale_set_reads_sku_and_instances() {
        let registry = ResourceRegistry::azure();
        let c = change(
            AZURERM_PROVIDER,
            "azurerm_linux_virtual_machine_scale_set",
            json!({ "location": "eastus", "sku": "Standard_F2s_v2", "instances": 3, "priority": "Low" }),
        );

        let vm = priced(registry.classify(&c, &EstimateOptions::default()));
        assert_eq!(vm.size, "Standard_F2s_v2");
        assert_eq!(vm.count, 3.0);
        assert!(vm.low_priority);
        assert!(!vm.spot);
    }

    #[test]
    fn test_null_priority_and_instances_use_defaults() {
        let registry = ResourceRegistry::azure();
        let c = change(
            AZURERM_PROVIDER,
            "azurerm_windows_virtual_machine_scale_set",
            json!({ "location": "eastus", "sku": "Standard_F2s_v2", "instances": null, "priority": null }),
        );

        let vm = priced(registry.classify(&c, &EstimateOptions::default()));
        assert_eq!(vm.count, 1.0);
        assert!(!vm.spot && !vm.low_priority);
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let registry = ResourceRegistry::azure();
        let c = change(AZURERM_PROVIDER, "azurerm_storage_account", json!({}));

        assert!(matches!(
            registry.classify(&c, &EstimateOptions::default()),
            Classification::Unsupported
        ));
    }

    #[test]
    fn test_foreign_provider_is_skipped() {
        let registry = ResourceRegistry::azure();
        let c = change(
            "registry.terraform.io/hashicorp/aws",
            "azurerm_linux_virtual_machine",
            json!({ "location": "eastus", "size": "Standard_B1s" }),
        );

        assert!(matches!(
            registry.classify(&c, &EstimateOptions::default()),
            Classification::Skipped(SkipReason::ForeignProvider)
        ));
    }

    #[test]
    fn test_bare_provider_name_is_normalized() {
        let registry = ResourceRegistry::azure();
        let c = change(
            "azurerm",
            "azurerm_linux_virtual_machine",
            json!({ "location": "eastus", "size": "Standard_B1s" }),
        );

        assert!(registry.is_target_provider("azurerm"));
        priced(registry.classify(&c, &EstimateOptions::default()));
    }

    #[test]
    fn test_delete_and_data_changes_are_skipped() {
        let registry = ResourceRegistry::azure();

        let mut deleted = change(AZURERM_PROVIDER, "azurerm_linux_virtual_machine", json!(null));
        deleted.change.actions = vec!["delete".to_string()];
        assert!(matches!(
            registry.classify(&deleted, &EstimateOptions::default()),
            Classification::Skipped(SkipReason::Deleted)
        ));

        let mut data = change(AZURERM_PROVIDER, "azurerm_resource_group", json!({}));
        data.mode = "data".to_string();
        assert!(matches!(
            registry.classify(&data, &EstimateOptions::default()),
            Classification::Skipped(SkipReason::DataSource)
        ));
    }

    #[test]
    fn test_replacement_is_still_priced() {
        let registry = ResourceRegistry::azure();
        let mut c = change(
            AZURERM_PROVIDER,
            "azurerm_linux_virtual_machine",
            json!({ "location": "eastus", "size": "Standard_B1s" }),
        );
        c.change.actions = vec!["delete".to_string(), "create".to_string()];

        priced(registry.classify(&c, &EstimateOptions::default()));
    }

    #[test]
    fn test_missing_size_is_schema_mismatch() {
        let registry = ResourceRegistry::azure();
        let c = change(
            AZURERM_PROVIDER,
            "azurerm_linux_virtual_machine",
            json!({ "location": "eastus" }),
        );

        match registry.classify(&c, &EstimateOptions::default()) {
            Classification::Invalid(EstimatorError::AttributeSchemaMismatch { details, .. }) => {
                assert!(details.contains("size"));
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_shape_is_schema_mismatch() {
        let registry = ResourceRegistry::azure();
        let wrong_type = change(
            AZURERM_PROVIDER,
            "azurerm_linux_virtual_machine",
            json!({ "location": 42, "size": "Standard_B1s" }),
        );
        let bad_priority = change(
            AZURERM_PROVIDER,
            "azurerm_linux_virtual_machine",
            json!({ "location": "eastus", "size": "Standard_B1s", "priority": "Urgent" }),
        );
        let null_after = change(AZURERM_PROVIDER, "azurerm_linux_virtual_machine", json!(null));

        for c in [wrong_type, bad_priority, null_after] {
            assert!(matches!(
                registry.classify(&c, &EstimateOptions::default()),
                Classification::Invalid(EstimatorError::AttributeSchemaMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_custom_registration() {
        fn fixed(change: &ResourceChange, _: &EstimateOptions) -> EstimatorResult<PricedResource> {
            Ok(PricedResource::VirtualMachine(VirtualMachine::new(
                &change.address,
                "Standard_A1",
                "eastus",
            )))
        }

        let mut registry = ResourceRegistry::new();
        assert!(!registry.is_target_provider(AZURERM_PROVIDER));

        registry.register(AZURERM_PROVIDER, "azurerm_custom", fixed);
        let c = change(AZURERM_PROVIDER, "azurerm_custom", json!(null));
        assert_eq!(priced(registry.classify(&c, &EstimateOptions::default())).size, "Standard_A1");
        assert_eq!(registry.supported_types(), vec![(AZURERM_PROVIDER, "azurerm_custom")]);
    }
}
