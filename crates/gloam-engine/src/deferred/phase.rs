//! Per-frame pass ordering.
//!
//! A frame is `Geometry → Lighting → Forward → PostProcess`, each phase opened
//! and closed exactly once. The tracker never blocks a call: a violation is
//! logged and recorded, then the tracker resyncs to what the caller did.

use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PipelinePhase {
    Idle,
    Geometry,
    Lighting,
    Forward,
    PostProcess,
}

impl PipelinePhase {
    /// Phase that must be opened after this one.
    pub const fn next(self) -> PipelinePhase {
        match self {
            PipelinePhase::Idle | PipelinePhase::PostProcess => PipelinePhase::Geometry,
            PipelinePhase::Geometry => PipelinePhase::Lighting,
            PipelinePhase::Lighting => PipelinePhase::Forward,
            PipelinePhase::Forward => PipelinePhase::PostProcess,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PhaseViolation {
    /// `begin` while another (or the same) phase is still open.
    BeginWhileOpen {
        requested: PipelinePhase,
        open: PipelinePhase,
    },
    /// `begin` out of the fixed frame order.
    OutOfOrder {
        requested: PipelinePhase,
        expected: PipelinePhase,
    },
    /// `end` for a phase that is not open.
    EndWithoutBegin {
        requested: PipelinePhase,
        open: Option<PipelinePhase>,
    },
}

impl fmt::Display for PhaseViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseViolation::BeginWhileOpen { requested, open } => {
                write!(f, "begin {requested:?} while {open:?} is still open")
            }
            PhaseViolation::OutOfOrder {
                requested,
                expected,
            } => write!(f, "begin {requested:?} out of order (expected {expected:?})"),
            PhaseViolation::EndWithoutBegin { requested, open } => match open {
                Some(open) => write!(f, "end {requested:?} while {open:?} is open"),
                None => write!(f, "end {requested:?} with no phase open"),
            },
        }
    }
}

/// Violations kept for inspection; later ones are only logged.
const MAX_RECORDED: usize = 64;

#[derive(Debug, Clone)]
pub struct PhaseTracker {
    last: PipelinePhase,
    open: Option<PipelinePhase>,
    violations: Vec<PhaseViolation>,
    frames: u64,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            last: PipelinePhase::Idle,
            open: None,
            violations: Vec::new(),
            frames: 0,
        }
    }

    /// Open phase, or `Idle` between phases.
    pub fn current(&self) -> PipelinePhase {
        self.open.unwrap_or(PipelinePhase::Idle)
    }

    /// Most recently opened phase in this frame (`Idle` at frame boundaries).
    pub fn last(&self) -> PipelinePhase {
        self.last
    }

    pub fn violations(&self) -> &[PhaseViolation] {
        &self.violations
    }

    pub fn take_violations(&mut self) -> Vec<PhaseViolation> {
        std::mem::take(&mut self.violations)
    }

    /// Completed `PostProcess` phases.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn violate(&mut self, v: PhaseViolation) {
        log::error!("pipeline phase violation: {v}");
        if self.violations.len() < MAX_RECORDED {
            self.violations.push(v);
        }
    }

    pub fn begin(&mut self, phase: PipelinePhase) {
        if let Some(open) = self.open {
            self.violate(PhaseViolation::BeginWhileOpen {
                requested: phase,
                open,
            });
        } else if phase != self.last.next() {
            self.violate(PhaseViolation::OutOfOrder {
                requested: phase,
                expected: self.last.next(),
            });
        }
        self.open = Some(phase);
        self.last = phase;
    }

    pub fn end(&mut self, phase: PipelinePhase) {
        if self.open != Some(phase) {
            self.violate(PhaseViolation::EndWithoutBegin {
                requested: phase,
                open: self.open,
            });
        }
        self.open = None;
        if phase == PipelinePhase::PostProcess {
            self.last = PipelinePhase::Idle;
            self.frames += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelinePhase::*;

    fn run_frame(t: &mut PhaseTracker) {
        for p in [Geometry, Lighting, Forward, PostProcess] {
            t.begin(p);
            assert_eq!(t.current(), p);
            t.end(p);
        }
    }

    // ── valid sequences ───────────────────────────────────────────────────

    #[test]
    fn repeated_frames_are_clean() {
        let mut t = PhaseTracker::new();
        for _ in 0..3 {
            run_frame(&mut t);
        }
        assert!(t.violations().is_empty());
        assert_eq!(t.frames(), 3);
        assert_eq!(t.current(), Idle);
        assert_eq!(t.last(), Idle);
    }

    // ── violations ────────────────────────────────────────────────────────

    #[test]
    fn double_begin_is_detected() {
        let mut t = PhaseTracker::new();
        t.begin(Geometry);
        t.begin(Geometry);
        assert_eq!(
            t.violations(),
            &[PhaseViolation::BeginWhileOpen {
                requested: Geometry,
                open: Geometry
            }]
        );
    }

    #[test]
    fn skipping_a_phase_is_out_of_order() {
        let mut t = PhaseTracker::new();
        t.begin(Geometry);
        t.end(Geometry);
        t.begin(Forward);
        assert_eq!(
            t.violations(),
            &[PhaseViolation::OutOfOrder {
                requested: Forward,
                expected: Lighting
            }]
        );
    }

    #[test]
    fn end_without_begin_is_detected() {
        let mut t = PhaseTracker::new();
        t.end(Lighting);
        assert_eq!(
            t.violations(),
            &[PhaseViolation::EndWithoutBegin {
                requested: Lighting,
                open: None
            }]
        );
    }

    #[test]
    fn tracker_resyncs_after_violation() {
        let mut t = PhaseTracker::new();
        t.begin(Lighting); // out of order, but now Lighting is open
        t.end(Lighting);
        t.begin(Forward);
        t.end(Forward);
        t.begin(PostProcess);
        t.end(PostProcess);
        assert_eq!(t.violations().len(), 1);
        run_frame(&mut t);
        assert_eq!(t.violations().len(), 1);
    }

    #[test]
    fn recorded_violations_are_capped() {
        let mut t = PhaseTracker::new();
        for _ in 0..(MAX_RECORDED + 10) {
            t.end(Geometry);
        }
        assert_eq!(t.violations().len(), MAX_RECORDED);
        assert_eq!(t.take_violations().len(), MAX_RECORDED);
        assert!(t.violations().is_empty());
    }
}
