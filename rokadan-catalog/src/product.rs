use serde::{Deserialize, Serialize};
use rokadan_shared::{CabinId, ServiceId};

/// A rentable cabin as published by the catalog.
///
/// Prices are whole currency units; the catalog owns these records and the
/// reservation engine only reads them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cabin {
    pub id: CabinId,
    pub name: String,
    pub nightly_price: i64,
    /// Maximum number of guests, adults and children together
    pub capacity: u32,
    pub description: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl Cabin {
    pub fn new(name: impl Into<String>, nightly_price: i64, capacity: u32) -> Self {
        Self {
            id: CabinId::new(),
            name: name.into(),
            nightly_price,
            capacity,
            description: None,
            featured: false,
        }
    }

    /// Whether a party of this size fits
    pub fn fits(&self, adults: u32, children: u32) -> bool {
        adults.saturating_add(children) <= self.capacity
    }
}

/// Optional add-on (breakfast, pool, quincho...) charged per day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub price: i64,
    pub description: Option<String>,
}

impl Service {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            id: ServiceId::new(),
            name: name.into(),
            price,
            description: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cabin_fits_counts_children() {
        let cabin = Cabin::new("El Pinar", 25000, 4);
        assert!(cabin.fits(2, 2));
        assert!(!cabin.fits(4, 1));
        assert!(cabin.fits(1, 0));
    }

    #[test]
    fn test_cabin_featured_defaults_to_false() {
        let json = serde_json::json!({
            "id": CabinId::new(),
            "name": "La Montaña",
            "nightly_price": 32000,
            "capacity": 6,
            "description": null
        });
        let cabin: Cabin = serde_json::from_value(json).unwrap();
        assert!(!cabin.featured);
    }
}
