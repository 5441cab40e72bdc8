//! Optimization directive types
//!
//! A directive set is recomputed wholesale on every evaluation and handed to
//! the downstream subsystems as one unit. Each enum is ordered from least to
//! most restrictive, so `max` picks the stricter of two settings.

use serde::{Deserialize, Serialize};

/// Which precedence rule produced a directive set
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PolicyProfile {
    /// Context-tailored defaults
    #[default]
    Normal,
    /// Reduced animation, balanced rendering
    Moderate,
    /// Everything non-essential off
    Aggressive,
}

impl PolicyProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyProfile::Normal => "normal",
            PolicyProfile::Moderate => "moderate",
            PolicyProfile::Aggressive => "aggressive",
        }
    }
}

impl std::fmt::Display for PolicyProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AnimationComplexity {
    #[default]
    Full,
    Reduced,
    Disabled,
}

/// How often views refresh their content
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UpdateFrequency {
    Realtime,
    #[default]
    Standard,
    Reduced,
    Minimal,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Normal,
    Balanced,
    Performance,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Keep warm entries for the active context
    Retain,
    #[default]
    Normal,
    Aggressive,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RenderFidelity {
    #[default]
    High,
    Medium,
    Low,
}

/// Cache region warmed ahead of use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheRegion {
    MapTiles,
    Scorecards,
    HealthMetrics,
}

impl CacheRegion {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheRegion::MapTiles => "map_tiles",
            CacheRegion::Scorecards => "scorecards",
            CacheRegion::HealthMetrics => "health_metrics",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationDirective {
    pub complexity: AnimationComplexity,
    pub update_frequency: UpdateFrequency,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDirective {
    pub mode: RenderMode,
    /// Prefer rendering paths that are safe while background work runs
    pub background_safe: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDirective {
    pub policy: CachePolicy,
    pub preload: Option<CacheRegion>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderingDirective {
    pub fidelity: RenderFidelity,
    pub map_shortcuts: bool,
}

/// Full directive set for the four downstream subsystems
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationDirectiveSet {
    pub profile: PolicyProfile,
    pub animation: AnimationDirective,
    pub view: ViewDirective,
    pub cache: CacheDirective,
    pub rendering: RenderingDirective,
}

impl OptimizationDirectiveSet {
    /// Human-readable list of optimizations in effect, for reports and logs
    pub fn active_optimizations(&self) -> Vec<String> {
        let mut active = Vec::new();

        match self.animation.complexity {
            AnimationComplexity::Full => {}
            AnimationComplexity::Reduced => active.push("reduced_animations".to_string()),
            AnimationComplexity::Disabled => active.push("animations_disabled".to_string()),
        }
        match self.animation.update_frequency {
            UpdateFrequency::Realtime => active.push("realtime_updates".to_string()),
            UpdateFrequency::Standard => {}
            UpdateFrequency::Reduced => active.push("reduced_update_frequency".to_string()),
            UpdateFrequency::Minimal => active.push("minimal_update_frequency".to_string()),
        }
        match self.view.mode {
            RenderMode::Normal => {}
            RenderMode::Balanced => active.push("balanced_rendering".to_string()),
            RenderMode::Performance => active.push("performance_rendering".to_string()),
        }
        if self.view.background_safe {
            active.push("background_safe_rendering".to_string());
        }
        match self.cache.policy {
            CachePolicy::Retain => active.push("cache_retention".to_string()),
            CachePolicy::Normal => {}
            CachePolicy::Aggressive => active.push("aggressive_cache_eviction".to_string()),
        }
        if let Some(region) = self.cache.preload {
            active.push(format!("preload_{}", region.as_str()));
        }
        match self.rendering.fidelity {
            RenderFidelity::High => {}
            RenderFidelity::Medium => active.push("medium_fidelity".to_string()),
            RenderFidelity::Low => active.push("low_fidelity".to_string()),
        }
        if self.rendering.map_shortcuts {
            active.push("map_rendering_shortcuts".to_string());
        }

        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restrictiveness_ordering() {
        assert_eq!(
            AnimationComplexity::Full.max(AnimationComplexity::Disabled),
            AnimationComplexity::Disabled
        );
        assert!(UpdateFrequency::Minimal > UpdateFrequency::Realtime);
        assert!(PolicyProfile::Aggressive > PolicyProfile::Moderate);
        assert!(RenderFidelity::Low > RenderFidelity::High);
    }

    #[test]
    fn test_default_set_has_no_active_optimizations() {
        assert!(OptimizationDirectiveSet::default()
            .active_optimizations()
            .is_empty());
    }

    #[test]
    fn test_active_optimizations_lists_non_defaults() {
        let set = OptimizationDirectiveSet {
            profile: PolicyProfile::Aggressive,
            animation: AnimationDirective {
                complexity: AnimationComplexity::Disabled,
                update_frequency: UpdateFrequency::Reduced,
            },
            view: ViewDirective {
                mode: RenderMode::Performance,
                background_safe: false,
            },
            cache: CacheDirective {
                policy: CachePolicy::Aggressive,
                preload: Some(CacheRegion::MapTiles),
            },
            rendering: RenderingDirective {
                fidelity: RenderFidelity::Low,
                map_shortcuts: true,
            },
        };

        let active = set.active_optimizations();
        assert_eq!(
            active,
            vec![
                "animations_disabled",
                "reduced_update_frequency",
                "performance_rendering",
                "aggressive_cache_eviction",
                "preload_map_tiles",
                "low_fidelity",
                "map_rendering_shortcuts",
            ]
        );
    }
}
