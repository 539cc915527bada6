//! Bounded-confidence opinion assimilation and tolerance radicalisation.

use opinet_data::{Medium, User};

/// Whether `opinion` lies inside the actor's confidence bound.
#[must_use]
pub fn within_confidence(actor: &User, opinion: f64) -> bool {
    (actor.opinion - opinion).abs() <= actor.tolerance
}

/// User-user update. The actor moves towards `reference` by its
/// susceptibility when the gap is within tolerance. Returns whether the
/// actor's opinion was touched.
pub fn opinion(actor: &mut User, reference: f64) -> bool {
    if !within_confidence(actor, reference) {
        return false;
    }
    actor.opinion += actor.susceptibility * (reference - actor.opinion);
    true
}

/// User-medium update, additionally scaled by the medium's persuasiveness.
pub fn opinion_from_medium(actor: &mut User, medium: &Medium) -> bool {
    if !within_confidence(actor, medium.opinion) {
        return false;
    }
    actor.opinion += actor.susceptibility * medium.persuasiveness * (medium.opinion - actor.opinion);
    true
}

/// Tolerance shrinks when the opinion moved away from the centre and grows
/// when it moved towards it; `radicalisation == 0` leaves it untouched.
pub fn tolerance(actor: &mut User, previous_opinion: f64, radicalisation: f64) {
    let x = (previous_opinion - 0.5).abs();
    let y = (actor.opinion - 0.5).abs();
    let r = 1.0 + radicalisation * (y.powi(2) - x.powi(2));
    actor.tolerance = actor.tolerance.powf(r);
}
