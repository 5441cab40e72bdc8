//! Policy evaluation and directive application
//!
//! Evaluation is a pure function of the current inputs. Precedence, most
//! restrictive first:
//! 1. acute pressure (emergency cleanup active, or thermal critical)
//! 2. poor level, memory pressure above the aggressive threshold, or any
//!    non-nominal thermal state
//! 3. fair level, memory pressure above the moderate threshold, or low battery
//! 4. the active context's own defaults
//!
//! The power mode is layered on top and can only tighten the result.

use super::directives::*;
use crate::config::PolicyThresholds;
use crate::models::{ActivityContext, PerformanceLevel, PowerMode, ThermalState};
use crate::subsystems::Subsystems;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything the policy depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyInputs {
    pub level: PerformanceLevel,
    pub context: ActivityContext,
    pub power_mode: PowerMode,
    pub memory_pressure: f64,
    pub thermal: ThermalState,
    pub battery_level: f32,
    pub acute_pressure: bool,
}

/// The rule that selected the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyReason {
    AcutePressure,
    ThermalCritical,
    PoorPerformance,
    HighMemoryPressure,
    ThermalElevated,
    FairPerformance,
    ModerateMemoryPressure,
    LowBattery,
    PowerMode,
    ContextDefault,
}

impl PolicyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyReason::AcutePressure => "acute_pressure",
            PolicyReason::ThermalCritical => "thermal_critical",
            PolicyReason::PoorPerformance => "poor_performance",
            PolicyReason::HighMemoryPressure => "high_memory_pressure",
            PolicyReason::ThermalElevated => "thermal_elevated",
            PolicyReason::FairPerformance => "fair_performance",
            PolicyReason::ModerateMemoryPressure => "moderate_memory_pressure",
            PolicyReason::LowBattery => "low_battery",
            PolicyReason::PowerMode => "power_mode",
            PolicyReason::ContextDefault => "context_default",
        }
    }
}

/// Result of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyDecision {
    pub reason: PolicyReason,
    pub directives: OptimizationDirectiveSet,
}

/// Computes and applies directive sets
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    thresholds: PolicyThresholds,
    active: Option<OptimizationDirectiveSet>,
    applications: u64,
}

impl PolicyEngine {
    pub fn new(thresholds: PolicyThresholds) -> Self {
        Self {
            thresholds,
            active: None,
            applications: 0,
        }
    }

    /// Pick the profile by precedence, before the power-mode overlay
    pub fn select_profile(&self, inputs: &PolicyInputs) -> (PolicyProfile, PolicyReason) {
        let t = &self.thresholds;

        if inputs.acute_pressure {
            return (PolicyProfile::Aggressive, PolicyReason::AcutePressure);
        }
        if inputs.thermal == ThermalState::Critical {
            return (PolicyProfile::Aggressive, PolicyReason::ThermalCritical);
        }
        if inputs.level == PerformanceLevel::Poor {
            return (PolicyProfile::Aggressive, PolicyReason::PoorPerformance);
        }
        if inputs.memory_pressure > t.aggressive_memory_pressure {
            return (PolicyProfile::Aggressive, PolicyReason::HighMemoryPressure);
        }
        if inputs.thermal != ThermalState::Nominal {
            return (PolicyProfile::Aggressive, PolicyReason::ThermalElevated);
        }
        if inputs.level == PerformanceLevel::Fair {
            return (PolicyProfile::Moderate, PolicyReason::FairPerformance);
        }
        if inputs.memory_pressure > t.moderate_memory_pressure {
            return (PolicyProfile::Moderate, PolicyReason::ModerateMemoryPressure);
        }
        if inputs.battery_level < t.low_battery_level {
            return (PolicyProfile::Moderate, PolicyReason::LowBattery);
        }
        (PolicyProfile::Normal, PolicyReason::ContextDefault)
    }

    /// Pure evaluation: inputs to a full directive set
    pub fn evaluate(&self, inputs: &PolicyInputs) -> PolicyDecision {
        let (mut profile, mut reason) = self.select_profile(inputs);

        let floor = power_mode_floor(inputs.power_mode);
        if floor > profile {
            profile = floor;
            reason = PolicyReason::PowerMode;
        }

        let mut directives = match profile {
            PolicyProfile::Aggressive => aggressive_profile(inputs.context),
            PolicyProfile::Moderate => moderate_profile(inputs.context),
            PolicyProfile::Normal => context_defaults(inputs.context),
        };
        apply_power_overlay(&mut directives, inputs.power_mode);

        PolicyDecision { reason, directives }
    }

    /// Push a directive set to every subsystem.
    ///
    /// Returns false, without calling any subsystem, when the set equals the
    /// one already applied.
    pub fn apply(&mut self, directives: &OptimizationDirectiveSet, subsystems: &mut Subsystems) -> bool {
        if self.active.as_ref() == Some(directives) {
            debug!(profile = %directives.profile, "Directive set unchanged, skipping");
            return false;
        }

        subsystems.animation.apply(&directives.animation);
        subsystems.view.apply(&directives.view);
        subsystems.cache.apply(&directives.cache);
        subsystems.rendering.apply(&directives.rendering);

        self.active = Some(*directives);
        self.applications += 1;
        true
    }

    /// The last applied directive set
    pub fn active(&self) -> Option<&OptimizationDirectiveSet> {
        self.active.as_ref()
    }

    pub fn applications(&self) -> u64 {
        self.applications
    }

    /// Forget the applied set so the next evaluation is pushed unconditionally
    pub fn invalidate(&mut self) {
        self.active = None;
    }
}

/// Minimum profile a power mode imposes
fn power_mode_floor(mode: PowerMode) -> PolicyProfile {
    match mode {
        PowerMode::Normal | PowerMode::Conservative => PolicyProfile::Normal,
        PowerMode::Aggressive | PowerMode::Extreme => PolicyProfile::Aggressive,
    }
}

/// Tighten animation and update cadence for stricter power modes
fn apply_power_overlay(directives: &mut OptimizationDirectiveSet, mode: PowerMode) {
    let (animation_cap, frequency_cap) = match mode {
        PowerMode::Normal => return,
        PowerMode::Conservative => (AnimationComplexity::Reduced, UpdateFrequency::Standard),
        PowerMode::Aggressive => (AnimationComplexity::Disabled, UpdateFrequency::Reduced),
        PowerMode::Extreme => (AnimationComplexity::Disabled, UpdateFrequency::Minimal),
    };

    let animation = &mut directives.animation;
    animation.complexity = animation.complexity.max(animation_cap);
    animation.update_frequency = animation.update_frequency.max(frequency_cap);
}

fn aggressive_profile(context: ActivityContext) -> OptimizationDirectiveSet {
    OptimizationDirectiveSet {
        profile: PolicyProfile::Aggressive,
        animation: AnimationDirective {
            complexity: AnimationComplexity::Disabled,
            update_frequency: if context == ActivityContext::Idle {
                UpdateFrequency::Minimal
            } else {
                UpdateFrequency::Reduced
            },
        },
        view: ViewDirective {
            mode: RenderMode::Performance,
            background_safe: context == ActivityContext::Sync,
        },
        cache: CacheDirective {
            policy: CachePolicy::Aggressive,
            preload: None,
        },
        rendering: RenderingDirective {
            fidelity: RenderFidelity::Low,
            map_shortcuts: true,
        },
    }
}

fn moderate_profile(context: ActivityContext) -> OptimizationDirectiveSet {
    let defaults = context_defaults(context);

    OptimizationDirectiveSet {
        profile: PolicyProfile::Moderate,
        animation: AnimationDirective {
            complexity: defaults.animation.complexity.max(AnimationComplexity::Reduced),
            update_frequency: defaults.animation.update_frequency.max(UpdateFrequency::Standard),
        },
        view: ViewDirective {
            mode: RenderMode::Balanced,
            background_safe: defaults.view.background_safe,
        },
        cache: CacheDirective {
            policy: defaults.cache.policy.max(CachePolicy::Normal),
            preload: defaults.cache.preload,
        },
        rendering: RenderingDirective {
            fidelity: defaults.rendering.fidelity.max(RenderFidelity::Medium),
            map_shortcuts: defaults.rendering.map_shortcuts,
        },
    }
}

/// Normal-profile directives tailored to each context
fn context_defaults(context: ActivityContext) -> OptimizationDirectiveSet {
    let (animation, view, cache, rendering) = match context {
        // Pause non-essential animation and refresh rarely
        ActivityContext::Idle => (
            AnimationDirective {
                complexity: AnimationComplexity::Reduced,
                update_frequency: UpdateFrequency::Minimal,
            },
            ViewDirective::default(),
            CacheDirective::default(),
            RenderingDirective::default(),
        ),
        // Smooth scrolling through holes: keep scorecard data warm
        ActivityContext::Scorecard => (
            AnimationDirective {
                complexity: AnimationComplexity::Full,
                update_frequency: UpdateFrequency::Standard,
            },
            ViewDirective::default(),
            CacheDirective {
                policy: CachePolicy::Retain,
                preload: Some(CacheRegion::Scorecards),
            },
            RenderingDirective::default(),
        ),
        ActivityContext::Navigation => (
            AnimationDirective {
                complexity: AnimationComplexity::Full,
                update_frequency: UpdateFrequency::Realtime,
            },
            ViewDirective::default(),
            CacheDirective {
                policy: CachePolicy::Retain,
                preload: Some(CacheRegion::MapTiles),
            },
            RenderingDirective {
                fidelity: RenderFidelity::High,
                map_shortcuts: true,
            },
        ),
        // Real-time metric animation must stay smooth
        ActivityContext::HealthTracking => (
            AnimationDirective {
                complexity: AnimationComplexity::Full,
                update_frequency: UpdateFrequency::Realtime,
            },
            ViewDirective::default(),
            CacheDirective {
                policy: CachePolicy::Normal,
                preload: Some(CacheRegion::HealthMetrics),
            },
            RenderingDirective::default(),
        ),
        // Background-safe rendering over interactivity
        ActivityContext::Sync => (
            AnimationDirective {
                complexity: AnimationComplexity::Reduced,
                update_frequency: UpdateFrequency::Reduced,
            },
            ViewDirective {
                mode: RenderMode::Normal,
                background_safe: true,
            },
            CacheDirective {
                policy: CachePolicy::Aggressive,
                preload: None,
            },
            RenderingDirective {
                fidelity: RenderFidelity::Medium,
                map_shortcuts: false,
            },
        ),
        ActivityContext::Menu => (
            AnimationDirective::default(),
            ViewDirective::default(),
            CacheDirective::default(),
            RenderingDirective::default(),
        ),
    };

    OptimizationDirectiveSet {
        profile: PolicyProfile::Normal,
        animation,
        view,
        cache,
        rendering,
    }
}
