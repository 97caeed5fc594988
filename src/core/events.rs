//! In-memory purchase event collector

use crate::core::traits::EventSink;
use crate::types::{PropertySold, RegistryError};

/// In-memory event collector
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<PropertySold>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, oldest first
    pub fn events(&self) -> &[PropertySold] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take every recorded event, leaving the log empty
    pub fn drain(&mut self) -> Vec<PropertySold> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: PropertySold) -> Result<(), RegistryError> {
        self.events.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn sale(id: u64) -> PropertySold {
        PropertySold {
            id,
            previous_owner: 1,
            new_owner: 2,
            price_paid: Decimal::new(100, 0),
        }
    }

    #[test]
    fn test_event_log_keeps_emission_order() {
        let mut log = EventLog::new();

        log.emit(sale(1)).unwrap();
        log.emit(sale(2)).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0].id, 1);
        assert_eq!(log.events()[1].id, 2);

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());
    }
}
