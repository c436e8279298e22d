//! Severity bands for headline probabilities.
//!
//! Pure, total mapping from a probability value to one of five display
//! bands. Boundary values belong to the higher band (>=, not >). The
//! display classes are passed through to the rendering surface untouched.

use serde::{Deserialize, Serialize};

/// Discrete severity band for a headline probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Classify a probability (0–100 scale) into a band.
    pub fn from_probability(p: f64) -> Self {
        if p >= 85.0 {
            Severity::Critical
        } else if p >= 70.0 {
            Severity::High
        } else if p >= 55.0 {
            Severity::Medium
        } else if p >= 40.0 {
            Severity::Low
        } else {
            Severity::Info
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Info => "Info",
        }
    }

    /// CSS class set for the badge form of the band.
    pub fn badge_class(&self) -> &'static str {
        match self {
            Severity::Critical => "bg-red-600 text-white",
            Severity::High => "bg-orange-500 text-white",
            Severity::Medium => "bg-yellow-400 text-slate-900",
            Severity::Low => "bg-slate-200 text-slate-900",
            Severity::Info => "bg-slate-100 text-slate-700",
        }
    }

    /// CSS class for the large accent rendering (top-event figure).
    pub fn accent_class(&self) -> &'static str {
        match self {
            Severity::Critical => "text-red-500",
            Severity::High => "text-orange-500",
            Severity::Medium => "text-yellow-400",
            Severity::Low => "text-slate-400",
            Severity::Info => "text-slate-500",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_closed_below() {
        assert_eq!(Severity::from_probability(85.0), Severity::Critical);
        assert_eq!(Severity::from_probability(84.999), Severity::High);
        assert_eq!(Severity::from_probability(70.0), Severity::High);
        assert_eq!(Severity::from_probability(69.999), Severity::Medium);
        assert_eq!(Severity::from_probability(55.0), Severity::Medium);
        assert_eq!(Severity::from_probability(54.999), Severity::Low);
        assert_eq!(Severity::from_probability(40.0), Severity::Low);
        assert_eq!(Severity::from_probability(39.999), Severity::Info);
    }

    #[test]
    fn extremes_map_to_outer_bands() {
        assert_eq!(Severity::from_probability(100.0), Severity::Critical);
        assert_eq!(Severity::from_probability(0.0), Severity::Info);
    }

    #[test]
    fn every_band_carries_display_classes() {
        for p in [90.0, 75.0, 60.0, 45.0, 10.0] {
            let sev = Severity::from_probability(p);
            assert!(!sev.badge_class().is_empty());
            assert!(!sev.accent_class().is_empty());
            assert!(!sev.label().is_empty());
        }
    }
}
