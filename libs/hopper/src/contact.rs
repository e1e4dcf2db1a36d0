//! Contact sensing: engine contact notifications to sensed flags.

use serde::{Deserialize, Serialize};

/// Resolves avatar body identities for contact events.
///
/// The active foot changes on every leg swap, so the sensor asks for it
/// again on each event instead of caching it.
pub trait ContactBodies {
    type Body: PartialEq;

    fn foot(&self, leg: usize) -> Option<Self::Body>;
    fn chassis(&self) -> Self::Body;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSensor {
    foot_in_contact: bool,
    chassis_in_contact: bool,
}

impl ContactSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn foot_in_contact(&self) -> bool {
        self.foot_in_contact
    }

    pub fn chassis_in_contact(&self) -> bool {
        self.chassis_in_contact
    }

    pub fn begin_contact<C: ContactBodies>(
        &mut self,
        a: &C::Body,
        b: &C::Body,
        active_leg: usize,
        bodies: &C,
    ) {
        self.apply(a, b, active_leg, bodies, true);
    }

    pub fn end_contact<C: ContactBodies>(
        &mut self,
        a: &C::Body,
        b: &C::Body,
        active_leg: usize,
        bodies: &C,
    ) {
        self.apply(a, b, active_leg, bodies, false);
    }

    /// Override the foot flag (scenario drivers and replays).
    pub fn set_foot_in_contact(&mut self, in_contact: bool) {
        self.foot_in_contact = in_contact;
    }

    fn apply<C: ContactBodies>(
        &mut self,
        a: &C::Body,
        b: &C::Body,
        active_leg: usize,
        bodies: &C,
        touching: bool,
    ) {
        if let Some(foot) = bodies.foot(active_leg) {
            if *a == foot || *b == foot {
                self.foot_in_contact = touching;
            }
        }

        let chassis = bodies.chassis();
        if *a == chassis || *b == chassis {
            self.chassis_in_contact = touching;
        }
    }
}
