//! Neon and street-lamp flicker
//!
//! Every flicker target runs its own endless cycle. A cycle draws one
//! uniform sample and picks a behavior:
//!
//! ```text
//! r > blackout_above                  blackout: 0 now, "on" after 300..800 ms
//! stutter_above < r <= blackout_above stutter:  dim, then restore/redim/on at +1/+2/+3 steps
//! r <= stutter_above                  steady:   "on"
//! ```
//!
//! The next cycle starts `base_interval + uniform(0, jitter)` later, with a
//! fresh jitter each time, so targets drift apart and never settle into a
//! visible rhythm. Periods shorter than [`MIN_PERIOD`] are raised to it.
//!
//! Random samples are drawn in a fixed order, which tests rely on: the
//! first period's jitter when the target is scheduled, then per cycle the
//! behavior sample, the blackout delay (blackout only) and the next jitter.

use crate::render::MaterialRef;
use crate::scheduler::{Scheduler, MIN_PERIOD};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::time::Duration;

/// Highest emissive intensity the flicker engine ever writes
pub const MAX_EMISSIVE_INTENSITY: f32 = 1.5;

/// Intensities and thresholds of one flicker target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlickerProfile {
    /// Nominal "on" intensity
    pub on: f32,
    /// Intensity at the start of a stutter
    pub dim: f32,
    /// Intensity of the second dip of a stutter
    pub redim: f32,
    /// Intensity the first stutter recovery reaches; `on` when unset
    pub restore: Option<f32>,
    /// Samples above this black out
    pub blackout_above: f32,
    /// Samples above this (and not blacking out) stutter
    pub stutter_above: f32,
    /// Shortest blackout
    pub blackout_min_ms: u64,
    /// Blackouts last less than this (equal to the minimum for a fixed length)
    pub blackout_max_ms: u64,
    /// Spacing of the stutter writes
    pub stutter_step_ms: u64,
}

impl FlickerProfile {
    /// Profile of a single neon sign
    pub fn neon_sign() -> Self {
        Self {
            on: 1.5,
            dim: 0.2,
            redim: 0.3,
            restore: None,
            blackout_above: 0.8,
            stutter_above: 0.5,
            blackout_min_ms: 300,
            blackout_max_ms: 800,
            stutter_step_ms: 100,
        }
    }

    /// Profile of the street lamps, flickered as one group
    pub fn street_lamp() -> Self {
        Self {
            on: 1.0,
            dim: 0.2,
            redim: 0.3,
            restore: Some(0.8),
            blackout_above: 0.9,
            stutter_above: 0.6,
            blackout_min_ms: 500,
            blackout_max_ms: 500,
            stutter_step_ms: 100,
        }
    }

    /// Check that intensities and thresholds are consistent
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=MAX_EMISSIVE_INTENSITY).contains(&self.on) {
            return Err(format!("on must be in [0, {MAX_EMISSIVE_INTENSITY}]"));
        }
        if !(0.0..=self.on).contains(&self.dim) || !(0.0..=self.on).contains(&self.redim) {
            return Err("dim and redim must be in [0, on]".to_string());
        }
        if !(0.0..=self.on).contains(&self.restore_level()) {
            return Err("restore must be in [0, on]".to_string());
        }
        if !(0.0 <= self.stutter_above && self.stutter_above <= self.blackout_above && self.blackout_above <= 1.0) {
            return Err("thresholds must satisfy 0 <= stutter_above <= blackout_above <= 1".to_string());
        }
        if self.blackout_max_ms < self.blackout_min_ms {
            return Err("blackout_max_ms must not be below blackout_min_ms".to_string());
        }
        Ok(())
    }

    /// Level of the first stutter recovery
    pub fn restore_level(&self) -> f32 {
        self.restore.unwrap_or(self.on)
    }

    /// Clamp an intensity into what this target may show
    pub fn clamp(&self, intensity: f32) -> f32 {
        intensity.clamp(0.0, self.on.min(MAX_EMISSIVE_INTENSITY))
    }

    /// Blackout length for sample `u`
    pub fn blackout_duration(&self, u: f32) -> Duration {
        let span = self.blackout_max_ms.saturating_sub(self.blackout_min_ms);
        Duration::from_millis(self.blackout_min_ms + scale_ms(span, u))
    }
}

impl Default for FlickerProfile {
    fn default() -> Self {
        Self::neon_sign()
    }
}

/// What a flicker cycle does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlickerBehavior {
    /// Off, then back on after a random delay
    Blackout,
    /// Dim, on, dim, on in quick succession
    Stutter,
    /// Plain "on"
    Steady,
}

/// Pick the behavior for sample `r`
pub fn choose_flicker_behavior(r: f32, profile: &FlickerProfile) -> FlickerBehavior {
    if r > profile.blackout_above {
        FlickerBehavior::Blackout
    } else if r > profile.stutter_above {
        FlickerBehavior::Stutter
    } else {
        FlickerBehavior::Steady
    }
}

/// Whether a target is one material or many
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A single material, such as one sign
    Solo,
    /// Several materials written together
    Group,
}

/// Materials flickered as a unit
#[derive(Debug, Clone, PartialEq)]
pub struct FlickerTarget {
    /// Name for logs
    pub name: String,
    /// Solo or group
    pub kind: TargetKind,
    /// Materials written on every change
    pub materials: Vec<MaterialRef>,
    /// Intensities and thresholds
    pub profile: FlickerProfile,
}

impl FlickerTarget {
    /// Target of one material
    pub fn solo(name: impl Into<String>, material: MaterialRef, profile: FlickerProfile) -> Self {
        Self {
            name: name.into(),
            kind: TargetKind::Solo,
            materials: vec![material],
            profile,
        }
    }

    /// Target of several materials; may be empty
    pub fn group(name: impl Into<String>, materials: Vec<MaterialRef>, profile: FlickerProfile) -> Self {
        Self {
            name: name.into(),
            kind: TargetKind::Group,
            materials,
            profile,
        }
    }
}

/// What the flicker cycle needs from its surroundings
pub trait FlickerHost {
    /// Write emissive intensity to one material
    fn write_emissive(&mut self, material: MaterialRef, intensity: f32);

    /// Uniform sample in `[0, 1)`
    fn random_unit(&mut self) -> f32;
}

struct FlickerCycle {
    target: FlickerTarget,
    base_interval: Duration,
    jitter: Duration,
}

/// Start the endless flicker cycle of `target`
///
/// The first cycle runs one period after the current time.
pub fn schedule_flicker<H>(
    scheduler: &mut dyn Scheduler<H>,
    target: FlickerTarget,
    base_interval: Duration,
    jitter: Duration,
) where
    H: FlickerHost + 'static,
{
    log::debug!(
        "Flicker `{}` scheduled: {} material(s), every {:?} + up to {:?}",
        target.name,
        target.materials.len(),
        base_interval,
        jitter
    );

    let cycle = Rc::new(FlickerCycle {
        target,
        base_interval,
        jitter,
    });

    // The first period needs a random draw, which needs the host
    scheduler.after(Duration::ZERO, Box::new(move |host, s| arm_next_cycle(host, s, cycle)));
}

fn arm_next_cycle<H>(host: &mut H, scheduler: &mut dyn Scheduler<H>, cycle: Rc<FlickerCycle>)
where
    H: FlickerHost + 'static,
{
    let jitter_ms = u64::try_from(cycle.jitter.as_millis()).unwrap_or(u64::MAX);
    let period = cycle.base_interval + Duration::from_millis(scale_ms(jitter_ms, host.random_unit()));
    let period = period.max(MIN_PERIOD);

    scheduler.after(period, Box::new(move |host, s| run_cycle(host, s, cycle)));
}

fn run_cycle<H>(host: &mut H, scheduler: &mut dyn Scheduler<H>, cycle: Rc<FlickerCycle>)
where
    H: FlickerHost + 'static,
{
    let profile = &cycle.target.profile;
    let behavior = choose_flicker_behavior(host.random_unit(), profile);
    log::trace!("Flicker `{}`: {behavior:?}", cycle.target.name);

    match behavior {
        FlickerBehavior::Blackout => {
            write_target(host, &cycle.target, 0.0);
            let delay = profile.blackout_duration(host.random_unit());
            let on = profile.on;
            write_later(scheduler, &cycle, delay, on);
        }
        FlickerBehavior::Stutter => {
            write_target(host, &cycle.target, profile.dim);
            let step = Duration::from_millis(profile.stutter_step_ms);
            for (n, level) in (1u32..).zip([profile.restore_level(), profile.redim, profile.on]) {
                write_later(scheduler, &cycle, step * n, level);
            }
        }
        FlickerBehavior::Steady => write_target(host, &cycle.target, profile.on),
    }

    arm_next_cycle(host, scheduler, cycle);
}

fn write_later<H>(scheduler: &mut dyn Scheduler<H>, cycle: &Rc<FlickerCycle>, delay: Duration, intensity: f32)
where
    H: FlickerHost + 'static,
{
    let cycle = Rc::clone(cycle);
    scheduler.after(delay, Box::new(move |host, _| write_target(host, &cycle.target, intensity)));
}

fn write_target<H: FlickerHost + ?Sized>(host: &mut H, target: &FlickerTarget, intensity: f32) {
    let intensity = target.profile.clamp(intensity);
    for &material in &target.materials {
        host.write_emissive(material, intensity);
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn scale_ms(span_ms: u64, u: f32) -> u64 {
    let scaled = (span_ms as f64 * f64::from(u.clamp(0.0, 1.0))).floor() as u64;
    // u < 1 keeps us below the span; guard float rounding at the top end
    scaled.min(span_ms.saturating_sub(1))
}
