use serde::{Deserialize, Serialize};
use rokadan_shared::ServiceId;
use crate::product::Service;

/// A selected service and how many days it is booked for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItem {
    pub service: Service,
    pub days: u32,
}

impl CartItem {
    pub fn subtotal(&self) -> i64 {
        self.service.price * i64::from(self.days)
    }
}

/// Price snapshot of a cart line, stored inside a reservation.
///
/// Later catalog price changes never reach a placed reservation because the
/// unit price is copied here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtraLine {
    pub service_id: ServiceId,
    pub name: String,
    pub days: u32,
    pub unit_price: i64,
}

impl ExtraLine {
    pub fn subtotal(&self) -> i64 {
        self.unit_price * i64::from(self.days)
    }
}

/// Session-local selection of add-on services, in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceCart {
    items: Vec<CartItem>,
}

impl ServiceCart {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a service for one day. Adding a service already in the cart is
    /// refused and leaves the cart untouched.
    pub fn add(&mut self, service: Service) -> Result<(), CartError> {
        if self.position(&service.id).is_some() {
            return Err(CartError::DuplicateItem(service.id));
        }

        self.items.push(CartItem { service, days: 1 });
        Ok(())
    }

    /// Set the number of days for a service, never below one
    pub fn set_days(&mut self, service_id: &ServiceId, days: i32) -> Result<(), CartError> {
        let index = self.position(service_id)
            .ok_or(CartError::NotFound(*service_id))?;

        self.items[index].days = days.max(1) as u32;
        Ok(())
    }

    pub fn remove(&mut self, service_id: &ServiceId) -> Result<CartItem, CartError> {
        let index = self.position(service_id)
            .ok_or(CartError::NotFound(*service_id))?;

        Ok(self.items.remove(index))
    }

    pub fn get(&self, service_id: &ServiceId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.service.id == *service_id)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total(&self) -> i64 {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Ordered price snapshot for handoff into a reservation. The cart keeps
    /// its contents; clearing is up to the caller once the reservation exists.
    pub fn snapshot(&self) -> Vec<ExtraLine> {
        self.items.iter()
            .map(|item| ExtraLine {
                service_id: item.service.id,
                name: item.service.name.clone(),
                days: item.days,
                unit_price: item.service.price,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, service_id: &ServiceId) -> Option<usize> {
        self.items.iter().position(|item| item.service.id == *service_id)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Service already in cart: {0}")]
    DuplicateItem(ServiceId),

    #[error("Service not in cart: {0}")]
    NotFound(ServiceId),
}
