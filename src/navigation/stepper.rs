use serde::Serialize;
use utoipa::ToSchema;

use crate::geo::Coordinate;
use crate::routing::Instruction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    Active,
    Exhausted,
}

/// When a position change moves the stepper on to the next instruction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StepPolicy {
    /// Every position change surfaces the next instruction.
    #[default]
    Permissive,
    /// Move on only once within `radius_m` of the current step's reference point;
    /// otherwise the current instruction is announced again.
    Arrival { radius_m: f64 },
}

impl StepPolicy {
    pub fn from_arrival_radius(radius_m: Option<f64>) -> Self {
        match radius_m {
            Some(radius_m) => StepPolicy::Arrival { radius_m },
            None => StepPolicy::Permissive,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Moved on; carries the newly current instruction.
    Advanced(Instruction),
    /// Still on the same step; carries it for re-announcement.
    Repeated(Instruction),
    /// Moved past the final instruction on this call.
    Exhausted,
    /// Nothing happened: already exhausted, or the position sits on the current
    /// step's reference point.
    Idle,
}

/// Walks a route's instructions in order. The index only ever grows.
#[derive(Debug, Clone)]
pub struct DirectionStepper {
    instructions: Vec<Instruction>,
    index: usize,
    phase: StepPhase,
    policy: StepPolicy,
}

impl DirectionStepper {
    pub fn new(instructions: Vec<Instruction>, policy: StepPolicy) -> Self {
        let mut stepper = Self {
            instructions,
            index: 0,
            phase: StepPhase::Active,
            policy,
        };
        stepper.reset();
        stepper
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn current(&self) -> Option<&Instruction> {
        match self.phase {
            StepPhase::Active => self.instructions.get(self.index),
            StepPhase::Exhausted => None,
        }
    }

    /// Back to the first instruction. An empty instruction list is exhausted at once.
    pub fn reset(&mut self) {
        self.index = 0;
        self.phase = if self.is_empty() {
            StepPhase::Exhausted
        } else {
            StepPhase::Active
        };
    }

    /// Reset and surface the first instruction immediately, before any movement.
    pub fn start(&mut self) -> Option<Instruction> {
        self.reset();
        self.current().cloned()
    }

    pub fn advance(&mut self, position: &Coordinate) -> StepOutcome {
        let Some(current) = self.current() else {
            return StepOutcome::Idle;
        };
        let distance = position.distance_to(&current.reference_point);

        match self.policy {
            // Standing on the reference point is not movement past it.
            StepPolicy::Permissive if distance <= 0.0 => return StepOutcome::Idle,
            StepPolicy::Arrival { radius_m } if distance > radius_m => {
                log::debug!(
                    "step {} still {:.0} m away, repeating",
                    current.index,
                    distance
                );
                return StepOutcome::Repeated(current.clone());
            }
            _ => {}
        }

        self.index += 1;
        match self.instructions.get(self.index) {
            Some(next) => StepOutcome::Advanced(next.clone()),
            None => {
                self.phase = StepPhase::Exhausted;
                StepOutcome::Exhausted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn instructions(n: usize) -> Vec<Instruction> {
        (0..n)
            .map(|i| Instruction {
                index: i,
                text: format!("step {i}"),
                reference_point: c(0.0, i as f64 * 0.01),
            })
            .collect()
    }

    #[test]
    fn start_surfaces_first_instruction() {
        let mut stepper = DirectionStepper::new(instructions(3), StepPolicy::Permissive);
        let first = stepper.start().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(stepper.index(), 0);
        assert_eq!(stepper.phase(), StepPhase::Active);
    }

    #[test]
    fn three_steps_exhaust_on_third_advance() {
        let mut stepper = DirectionStepper::new(instructions(3), StepPolicy::Permissive);
        stepper.start();
        let here = c(1.0, 1.0);

        assert!(matches!(stepper.advance(&here), StepOutcome::Advanced(i) if i.index == 1));
        assert_eq!(stepper.phase(), StepPhase::Active);
        assert!(matches!(stepper.advance(&here), StepOutcome::Advanced(i) if i.index == 2));
        assert_eq!(stepper.phase(), StepPhase::Active);
        assert_eq!(stepper.advance(&here), StepOutcome::Exhausted);
        assert_eq!(stepper.index(), 3);
        assert_eq!(stepper.phase(), StepPhase::Exhausted);

        assert_eq!(stepper.advance(&here), StepOutcome::Idle);
        assert_eq!(stepper.index(), 3);
        assert_eq!(stepper.current(), None);
    }

    #[test]
    fn permissive_holds_on_the_reference_point() {
        let mut stepper = DirectionStepper::new(instructions(3), StepPolicy::Permissive);
        stepper.start();

        assert_eq!(stepper.advance(&c(0.0, 0.0)), StepOutcome::Idle);
        assert_eq!(stepper.index(), 0);
        assert_eq!(stepper.current().map(|i| i.index), Some(0));

        assert!(matches!(
            stepper.advance(&c(0.0, 0.001)),
            StepOutcome::Advanced(i) if i.index == 1
        ));
        assert_eq!(stepper.advance(&c(0.0, 0.01)), StepOutcome::Idle);
        assert_eq!(stepper.index(), 1);
    }

    #[test]
    fn index_never_decreases() {
        let mut stepper = DirectionStepper::new(
            instructions(5),
            StepPolicy::Arrival { radius_m: 100.0 },
        );
        stepper.start();
        let track = [
            c(0.0, 0.0),
            c(0.0, 0.5),
            c(0.0, 0.01),
            c(0.0, 0.0),
            c(0.0, 0.02),
            c(0.0, 0.03),
            c(0.0, 0.04),
            c(0.0, 0.0),
            c(0.0, 0.04),
        ];
        let mut last = stepper.index();
        for point in &track {
            stepper.advance(point);
            assert!(stepper.index() >= last);
            last = stepper.index();
        }
        assert_eq!(stepper.phase(), StepPhase::Exhausted);
    }

    #[test]
    fn arrival_policy_repeats_until_close() {
        let mut stepper = DirectionStepper::new(
            instructions(2),
            StepPolicy::Arrival { radius_m: 50.0 },
        );
        stepper.start();

        let far = c(1.0, 0.0);
        assert!(matches!(stepper.advance(&far), StepOutcome::Repeated(i) if i.index == 0));
        assert_eq!(stepper.index(), 0);

        assert!(matches!(
            stepper.advance(&c(0.0, 0.0)),
            StepOutcome::Advanced(i) if i.index == 1
        ));
    }

    #[test]
    fn reset_returns_to_first_step_from_any_state() {
        let mut stepper = DirectionStepper::new(instructions(2), StepPolicy::Permissive);
        stepper.start();
        let here = c(1.0, 1.0);
        stepper.advance(&here);
        stepper.advance(&here);
        assert_eq!(stepper.phase(), StepPhase::Exhausted);

        stepper.reset();
        assert_eq!(stepper.index(), 0);
        assert_eq!(stepper.phase(), StepPhase::Active);

        stepper.advance(&here);
        stepper.reset();
        assert_eq!(stepper.index(), 0);
        assert_eq!(stepper.phase(), StepPhase::Active);
    }

    #[test]
    fn empty_route_is_exhausted_immediately() {
        let mut stepper = DirectionStepper::new(Vec::new(), StepPolicy::Permissive);
        assert_eq!(stepper.start(), None);
        assert_eq!(stepper.advance(&c(0.0, 0.0)), StepOutcome::Idle);
    }

    #[test]
    fn policy_from_optional_radius() {
        assert_eq!(StepPolicy::from_arrival_radius(None), StepPolicy::Permissive);
        assert_eq!(
            StepPolicy::from_arrival_radius(Some(25.0)),
            StepPolicy::Arrival { radius_m: 25.0 }
        );
    }
}
