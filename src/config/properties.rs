//! Property surface for host UIs: labelled values with declared bounds.
//!
//! Setting a property clamps numeric input into its domain instead of failing,
//! so a configuration edited through this surface is always in range.

use glam::DVec3;

use super::{ArchiveValue, DynamicsMode, IntegrationMode, SimulationConfig, SolverMode};
use crate::utils::numeric::FloatingNumber;

/// Domain a numeric property is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyBound {
    Unbounded,
    NonNegative,
    /// Strictly positive. Non-positive input is rejected, there is no
    /// sensible value to clamp to.
    Positive,
    AtLeastOne,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: &'static str,
    pub label: &'static str,
    pub value: ArchiveValue,
    pub bound: PropertyBound,
}

impl Property {
    fn new(
        key: &'static str,
        label: &'static str,
        value: impl Into<ArchiveValue>,
        bound: PropertyBound,
    ) -> Self {
        Self {
            key,
            label,
            value: value.into(),
            bound,
        }
    }
}

fn as_f64(value: &ArchiveValue) -> Option<f64> {
    match value {
        ArchiveValue::Float(v) => Some(*v),
        ArchiveValue::Int(v) => Some(*v as f64),
        ArchiveValue::Text(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn clamp_f64(value: f64, bound: PropertyBound) -> Option<f64> {
    if value.is_nan() {
        return None;
    }
    match bound {
        PropertyBound::Unbounded => Some(value),
        PropertyBound::NonNegative => Some(value.max(0.0)),
        PropertyBound::Positive => (value > 0.0).then_some(value),
        PropertyBound::AtLeastOne => Some(value.max(1.0)),
    }
}

fn set_floating(slot: &mut FloatingNumber, value: &ArchiveValue, bound: PropertyBound) -> bool {
    // text inside the bound keeps its spelling; anything else is clamped
    let kept = match (value, bound) {
        (ArchiveValue::Text(text), PropertyBound::NonNegative) => slot.set_non_negative(text),
        (ArchiveValue::Text(text), PropertyBound::Positive) => slot.set_positive(text),
        _ => false,
    };
    if kept {
        return true;
    }
    match as_f64(value).and_then(|v| clamp_f64(v, bound)) {
        Some(v) => {
            slot.set_value(v);
            true
        }
        None => false,
    }
}

fn set_scalar(slot: &mut f64, value: &ArchiveValue, bound: PropertyBound) -> bool {
    match as_f64(value).and_then(|v| clamp_f64(v, bound)) {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

fn selection<T: Copy>(value: &ArchiveValue, all: &[T], from_symbol: fn(&str) -> Option<T>) -> Option<T> {
    match value {
        ArchiveValue::Text(symbol) => from_symbol(symbol),
        ArchiveValue::Int(index) => usize::try_from(*index).ok().and_then(|i| all.get(i).copied()),
        _ => None,
    }
}

impl SimulationConfig {
    /// Every editable parameter with its current value and bound.
    pub fn properties(&self) -> Vec<Property> {
        use PropertyBound::*;
        vec![
            Property::new("dynamicsMode", "Dynamics mode", self.dynamics_mode.symbol(), Unbounded),
            Property::new(
                "integrationMode",
                "Integration mode",
                self.integration_mode.symbol(),
                Unbounded,
            ),
            Property::new("solverMode", "Solver mode", self.solver_mode.symbol(), Unbounded),
            Property::new("gravity", "Gravity", self.gravity, Unbounded),
            Property::new("staticFriction", "Static friction", self.static_friction, NonNegative),
            Property::new("slipFriction", "Slip friction", self.slip_friction, NonNegative),
            Property::new("penaltyKpCoef", "penaltyKpCoef", self.penalty_kp_coef, NonNegative),
            Property::new("penaltyKvCoef", "penaltyKvCoef", self.penalty_kv_coef, NonNegative),
            Property::new(
                "penaltySizeRatio",
                "penaltySizeRatio",
                self.penalty_size_ratio,
                NonNegative,
            ),
            Property::new(
                "cullingThresh",
                "Contact culling distance",
                &self.contact_culling_distance,
                NonNegative,
            ),
            Property::new(
                "contactCullingDepth",
                "Contact culling depth",
                &self.contact_culling_depth,
                NonNegative,
            ),
            Property::new("errorCriterion", "Error criterion", &self.error_criterion, Positive),
            Property::new(
                "maxNumIterations",
                "Max iterations",
                i64::from(self.max_num_iterations),
                AtLeastOne,
            ),
            Property::new(
                "contactCorrectionDepth",
                "Contact correction depth",
                &self.contact_correction_depth,
                NonNegative,
            ),
            Property::new(
                "contactCorrectionVelocityRatio",
                "Contact correction v-ratio",
                &self.contact_correction_velocity_ratio,
                NonNegative,
            ),
            Property::new("restitution", "Restitution", self.restitution, NonNegative),
            Property::new("kinematicWalking", "Kinematic walking", self.kinematic_walking, Unbounded),
            Property::new("2Dmode", "2D mode", self.is_2d_mode, Unbounded),
        ]
    }

    /// Applies a property edit, clamping into the declared bound.
    /// Returns false for unknown keys or values of the wrong shape.
    pub fn set_property(&mut self, key: &str, value: ArchiveValue) -> bool {
        use PropertyBound::*;
        match key {
            "dynamicsMode" => selection(&value, &DynamicsMode::ALL, DynamicsMode::from_symbol)
                .map(|m| self.dynamics_mode = m)
                .is_some(),
            "integrationMode" => {
                selection(&value, &IntegrationMode::ALL, IntegrationMode::from_symbol)
                    .map(|m| self.integration_mode = m)
                    .is_some()
            }
            "solverMode" => selection(&value, &SolverMode::ALL, SolverMode::from_symbol)
                .map(|m| self.solver_mode = m)
                .is_some(),
            "gravity" => match value {
                ArchiveValue::Vector(v) if v.iter().all(|c| c.is_finite()) => {
                    self.gravity = DVec3::from_array(v);
                    true
                }
                _ => false,
            },
            "staticFriction" => set_scalar(&mut self.static_friction, &value, NonNegative),
            "slipFriction" => set_scalar(&mut self.slip_friction, &value, NonNegative),
            "penaltyKpCoef" => set_scalar(&mut self.penalty_kp_coef, &value, NonNegative),
            "penaltyKvCoef" => set_scalar(&mut self.penalty_kv_coef, &value, NonNegative),
            "penaltySizeRatio" => set_scalar(&mut self.penalty_size_ratio, &value, NonNegative),
            "restitution" => set_scalar(&mut self.restitution, &value, NonNegative),
            "cullingThresh" => set_floating(&mut self.contact_culling_distance, &value, NonNegative),
            "contactCullingDepth" => {
                set_floating(&mut self.contact_culling_depth, &value, NonNegative)
            }
            "errorCriterion" => set_floating(&mut self.error_criterion, &value, Positive),
            "contactCorrectionDepth" => {
                set_floating(&mut self.contact_correction_depth, &value, NonNegative)
            }
            "contactCorrectionVelocityRatio" => {
                set_floating(&mut self.contact_correction_velocity_ratio, &value, NonNegative)
            }
            "maxNumIterations" => match as_f64(&value).and_then(|v| clamp_f64(v, AtLeastOne)) {
                Some(v) => {
                    self.max_num_iterations = v.min(f64::from(u32::MAX)) as u32;
                    true
                }
                None => false,
            },
            "kinematicWalking" => match value {
                ArchiveValue::Bool(on) => {
                    self.kinematic_walking = on;
                    true
                }
                _ => false,
            },
            "2Dmode" => match value {
                ArchiveValue::Bool(on) => {
                    self.is_2d_mode = on;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
}
