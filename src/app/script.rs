use crate::character::MovementInput;
use crate::config::ScriptStep;

/// Plays a list of timed input segments back by elapsed time.
pub(crate) struct InputScript<'a> {
    steps: &'a [ScriptStep],
    total: f32,
}

impl<'a> InputScript<'a> {
    pub(crate) fn new(steps: &'a [ScriptStep]) -> Self {
        let total = steps.iter().map(|step| step.seconds.max(0.0)).sum();
        Self { steps, total }
    }

    /// Segment active at `t`. Past the end the character stands still.
    pub(crate) fn step_at(&self, t: f32) -> Option<&'a ScriptStep> {
        if t >= self.total {
            return None;
        }
        let mut start = 0.0;
        for step in self.steps {
            let end = start + step.seconds.max(0.0);
            if t < end {
                return Some(step);
            }
            start = end;
        }
        None
    }

    pub(crate) fn input_at(&self, t: f32) -> MovementInput {
        self.step_at(t)
            .map(|step| MovementInput { forward: step.forward, right: step.right, sprint: step.sprint })
            .unwrap_or_default()
    }

    pub(crate) fn orbit_rate_at(&self, t: f32) -> f32 {
        self.step_at(t).map_or(0.0, |step| step.orbit)
    }
}
