use chrono::{DateTime, Utc};
use tycoon_core::{EconomyError, MarketEvent};
use tycoon_econ::RandomSource;

use crate::schedule::IntervalGate;

/// Draws the current market event from a fixed table on a timer.
#[derive(Clone, Debug)]
pub struct EventGenerator {
    table: Vec<MarketEvent>,
    gate: IntervalGate,
    current: Option<MarketEvent>,
}

impl EventGenerator {
    /// An empty table is a fatal configuration error.
    pub fn new(
        table: Vec<MarketEvent>,
        interval_secs: u64,
        start: DateTime<Utc>,
    ) -> Result<Self, EconomyError> {
        if table.is_empty() {
            return Err(EconomyError::Configuration(
                "market events table is empty".to_string(),
            ));
        }
        Ok(Self {
            table,
            gate: IntervalGate::new(interval_secs, start),
            current: None,
        })
    }

    pub fn table(&self) -> &[MarketEvent] {
        &self.table
    }

    /// The drawn event, until a price tick consumes it.
    pub fn current(&self) -> Option<&MarketEvent> {
        self.current.as_ref()
    }

    pub(crate) fn pending_mut(&mut self) -> &mut Option<MarketEvent> {
        &mut self.current
    }

    /// Replace the current event with a uniform draw once the interval elapses.
    pub fn advance(
        &mut self,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> Option<&MarketEvent> {
        if !self.gate.try_fire(now) {
            return None;
        }
        let idx = rng.pick(self.table.len());
        self.current = self.table.get(idx).cloned();
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use tycoon_econ::ScriptedSource;

    fn event(name: &str) -> MarketEvent {
        MarketEvent {
            name: name.to_string(),
            affected_subtypes: vec!["Lumber".to_string()],
            impact: Decimal::new(10, 0),
            news_message: format!("{name}!"),
        }
    }

    #[test]
    fn empty_table_is_fatal() {
        assert!(matches!(
            EventGenerator::new(vec![], 900, Utc::now()),
            Err(EconomyError::Configuration(_))
        ));
    }

    #[test]
    fn draw_overwrites_unconsumed_event() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut gen = EventGenerator::new(vec![event("Boom"), event("Bust")], 900, start).unwrap();
        let mut rng = ScriptedSource::new().with_picks([0, 1]);
        assert!(gen.advance(start + Duration::seconds(899), &mut rng).is_none());
        assert!(gen.current().is_none());
        let first = gen.advance(start + Duration::seconds(900), &mut rng).unwrap();
        assert_eq!(first.name, "Boom");
        gen.advance(start + Duration::seconds(1800), &mut rng);
        assert_eq!(gen.current().unwrap().name, "Bust");
    }
}
