use serde::{Deserialize, Serialize};
use crate::cart::ExtraLine;

/// Price breakdown of a stay
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StayQuote {
    pub nights: i64,
    /// Nightly price times nights
    pub lodging: i64,
    /// Sum of every extra line
    pub extras: i64,
    pub total: i64,
}

impl StayQuote {
    /// Quote a stay from the nightly price snapshot and the extras snapshot.
    pub fn compute(nightly_price: i64, nights: i64, extras: &[ExtraLine]) -> Self {
        let lodging = nightly_price * nights;
        let extras: i64 = extras.iter().map(ExtraLine::subtotal).sum();

        Self {
            nights,
            lodging,
            extras,
            total: lodging + extras,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rokadan_shared::ServiceId;

    #[test]
    fn test_two_nights_with_pool() {
        let extras = vec![ExtraLine {
            service_id: ServiceId::new(),
            name: "Piscina".to_string(),
            days: 1,
            unit_price: 10000,
        }];

        let quote = StayQuote::compute(25000, 2, &extras);

        assert_eq!(quote.lodging, 50000);
        assert_eq!(quote.extras, 10000);
        assert_eq!(quote.total, 60000);
    }

    #[test]
    fn test_no_extras() {
        let quote = StayQuote::compute(32000, 5, &[]);
        assert_eq!(quote.extras, 0);
        assert_eq!(quote.total, 160000);
    }
}
