use crate::control::ControlParams;
use crate::error::HopperError;

/// Sequencing policy over per-hop control parameters.
///
/// The controller reads [`ControlProvider::current`] every tick and calls
/// [`ControlProvider::advance`] once per liftoff. Advancing past the last
/// entry keeps the last entry current.
pub trait ControlProvider {
    fn current(&self) -> &ControlParams;

    fn current_index(&self) -> usize;

    fn advance(&mut self);

    /// Random access; `None` beyond the end.
    fn control_at(&self, index: usize) -> Option<&ControlParams>;

    fn len(&self) -> usize;

    fn reset(&mut self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parameters the next hop will use.
    fn upcoming(&self) -> &ControlParams {
        self.control_at(self.current_index() + 1)
            .unwrap_or_else(|| self.current())
    }
}

/// Ordered list of control parameters plus a cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlSequence {
    controls: Vec<ControlParams>,
    index: usize,
}

impl ControlSequence {
    pub fn new(controls: Vec<ControlParams>) -> Result<Self, HopperError> {
        if controls.is_empty() {
            return Err(HopperError::EmptySequence);
        }
        Ok(Self { controls, index: 0 })
    }

    /// Parse a JSON array of parameter objects.
    pub fn from_json(json: &str) -> Result<Self, HopperError> {
        let controls: Vec<ControlParams> = serde_json::from_str(json)?;
        Self::new(controls)
    }

    pub fn controls(&self) -> &[ControlParams] {
        &self.controls
    }

    fn last_index(&self) -> usize {
        self.controls.len() - 1
    }
}

impl Default for ControlSequence {
    fn default() -> Self {
        Self {
            controls: vec![ControlParams::default()],
            index: 0,
        }
    }
}

impl ControlProvider for ControlSequence {
    fn current(&self) -> &ControlParams {
        // index never passes last_index() and controls is never empty
        &self.controls[self.index]
    }

    fn current_index(&self) -> usize {
        self.index
    }

    fn advance(&mut self) {
        if self.index < self.last_index() {
            self.index += 1;
        } else {
            log::debug!(
                "control sequence exhausted, repeating entry {}",
                self.index
            );
        }
    }

    fn control_at(&self, index: usize) -> Option<&ControlParams> {
        self.controls.get(index)
    }

    fn len(&self) -> usize {
        self.controls.len()
    }

    fn reset(&mut self) {
        self.index = 0;
    }
}
