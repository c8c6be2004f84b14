use crate::models::{BillingScheme, CatalogItem, ResolutionStatus};

/// The unit price chosen for one resource, or why none could be chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Hourly price of one instance; zero when unresolved
    pub unit_price: f64,
    pub status: ResolutionStatus,
}

impl Resolution {
    pub fn resolved(unit_price: f64) -> Self {
        Self {
            unit_price,
            status: ResolutionStatus::Resolved,
        }
    }

    pub fn unresolved(status: ResolutionStatus) -> Self {
        Self {
            unit_price: 0.0,
            status,
        }
    }

    /// Contribution of `quantity` instances to the hourly total
    pub fn hourly_cost(&self, quantity: f64) -> f64 {
        self.unit_price * quantity
    }
}

/// Pick the hourly unit price for `scheme` out of the catalog items returned
/// for its query.
///
/// Non-reservation schemes take the first item as authoritative. Reservation
/// schemes take the first item whose term matches the scheme, and convert its
/// price (quoted for the whole term) to an hourly rate.
pub fn resolve_unit_price(items: &[CatalogItem], scheme: BillingScheme) -> Resolution {
    let Some(first) = items.first() else {
        return Resolution::unresolved(ResolutionStatus::NoCatalogItems);
    };

    let (Some(term), Some(term_hours)) = (scheme.reservation_term_label(), scheme.reservation_hours())
    else {
        return Resolution::resolved(first.unit_price);
    };

    items
        .iter()
        .find(|item| item.reservation_term.as_deref() == Some(term))
        .map(|item| Resolution::resolved(item.unit_price / term_hours))
        .unwrap_or_else(|| Resolution::unresolved(ResolutionStatus::NoMatchingReservationTerm))
}
