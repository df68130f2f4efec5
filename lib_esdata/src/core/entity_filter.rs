//! # Entity Filter
//!
//! Decides whether a flight plan event is relevant. The rules run in order and
//! stop at the first failure:
//!
//! 1. the host reports the flight plan as valid (fully received);
//! 2. unless update-all mode is on, the local operator must be tracking it;
//! 3. origin or destination must be a Swedish aerodrome (`ES` prefix).
//!
//! The periodic self snapshot is not subject to this filter.

use crate::model::{EntityId, FlightPlan};

/// ICAO prefix of the aerodromes the relay cares about.
pub const RELEVANT_PREFIX: &str = "ES";

/// Returns `true` if events for `fp` should be recorded.
pub fn is_in_scope(fp: &FlightPlan, update_all: bool) -> bool {
    if !fp.valid {
        return false;
    }
    if EntityId::parse(&fp.callsign).is_none() {
        return false;
    }
    if !update_all && !fp.tracked_by_me {
        return false;
    }
    is_relevant_airport(&fp.origin) || is_relevant_airport(&fp.destination)
}

fn is_relevant_airport(icao: &str) -> bool {
    icao.trim().starts_with(RELEVANT_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(origin: &str, destination: &str, tracked: bool) -> FlightPlan {
        FlightPlan {
            callsign: "SAS123".into(),
            valid: true,
            tracked_by_me: tracked,
            origin: origin.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }

    #[test]
    fn invalid_flight_plan_is_out() {
        let mut plan = fp("ESSA", "EKCH", true);
        plan.valid = false;
        assert!(!is_in_scope(&plan, true));
    }

    #[test]
    fn ownership_rule_depends_on_update_all() {
        let plan = fp("ESSA", "EKCH", false);
        assert!(!is_in_scope(&plan, false));
        assert!(is_in_scope(&plan, true));
        assert!(is_in_scope(&fp("ESSA", "EKCH", true), false));
    }

    #[test]
    fn either_end_may_be_swedish() {
        assert!(is_in_scope(&fp("EKCH", "ESGG", true), false));
        assert!(is_in_scope(&fp("ESSA", "", true), false));
        assert!(!is_in_scope(&fp("EKCH", "ENGM", true), true));
        // Prefix match is case-sensitive, like the ICAO codes the host reports.
        assert!(!is_in_scope(&fp("essa", "ENGM", true), true));
    }

    #[test]
    fn missing_fields_are_out() {
        assert!(!is_in_scope(&fp("", "", true), true));
        let mut plan = fp("ESSA", "ESGG", true);
        plan.callsign = String::new();
        assert!(!is_in_scope(&plan, true));
    }
}
