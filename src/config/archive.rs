//! Key/value persistence of [`SimulationConfig`].

use std::collections::BTreeMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::{DynamicsMode, IntegrationMode, SimulationConfig, SolverMode};
use crate::utils::numeric::FloatingNumber;

/// A single persisted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArchiveValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Vector([f64; 3]),
}

impl From<bool> for ArchiveValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ArchiveValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ArchiveValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ArchiveValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<DVec3> for ArchiveValue {
    fn from(value: DVec3) -> Self {
        Self::Vector(value.to_array())
    }
}

impl From<&FloatingNumber> for ArchiveValue {
    fn from(value: &FloatingNumber) -> Self {
        Self::Text(value.as_str().to_owned())
    }
}

/// Ordered string-keyed store a host serializes however it likes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Archive {
    values: BTreeMap<String, ArchiveValue>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, key: &str, value: impl Into<ArchiveValue>) {
        self.values.insert(key.to_owned(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ArchiveValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn read_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            ArchiveValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn read_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            ArchiveValue::Float(v) => Some(*v),
            ArchiveValue::Int(v) => Some(*v as f64),
            ArchiveValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn read_i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            ArchiveValue::Int(v) => Some(*v),
            ArchiveValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn read_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            ArchiveValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn read_vector3(&self, key: &str) -> Option<DVec3> {
        match self.get(key)? {
            ArchiveValue::Vector(v) => Some(DVec3::from_array(*v)),
            _ => None,
        }
    }

    pub fn read_floating(&self, key: &str) -> Option<FloatingNumber> {
        match self.get(key)? {
            ArchiveValue::Text(text) => FloatingNumber::parse(text),
            ArchiveValue::Float(v) => Some(FloatingNumber::new(*v)),
            ArchiveValue::Int(v) => Some(FloatingNumber::new(*v as f64)),
            _ => None,
        }
    }
}

fn restore_into<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl SimulationConfig {
    /// Writes every field under its persisted key.
    pub fn store(&self, archive: &mut Archive) {
        archive.write("dynamicsMode", self.dynamics_mode.symbol());
        archive.write("integrationMode", self.integration_mode.symbol());
        archive.write("solverMode", self.solver_mode.symbol());
        archive.write("gravity", self.gravity);
        archive.write("staticFriction", self.static_friction);
        archive.write("slipFriction", self.slip_friction);
        archive.write("cullingThresh", &self.contact_culling_distance);
        archive.write("contactCullingDepth", &self.contact_culling_depth);
        archive.write("errorCriterion", &self.error_criterion);
        archive.write("maxNumIterations", i64::from(self.max_num_iterations));
        archive.write("contactCorrectionDepth", &self.contact_correction_depth);
        archive.write(
            "contactCorrectionVelocityRatio",
            &self.contact_correction_velocity_ratio,
        );
        archive.write("restitution", self.restitution);
        archive.write("kinematicWalking", self.kinematic_walking);
        archive.write("2Dmode", self.is_2d_mode);
        archive.write("penaltyKpCoef", self.penalty_kp_coef);
        archive.write("penaltyKvCoef", self.penalty_kv_coef);
        archive.write("penaltySizeRatio", self.penalty_size_ratio);
    }

    /// Reads every key present in `archive`. Absent or unreadable keys keep
    /// the current value.
    pub fn restore(&mut self, archive: &Archive) {
        restore_into(
            &mut self.dynamics_mode,
            archive.read_str("dynamicsMode").and_then(DynamicsMode::from_symbol),
        );
        restore_into(
            &mut self.integration_mode,
            archive
                .read_str("integrationMode")
                .and_then(IntegrationMode::from_symbol),
        );
        restore_into(
            &mut self.solver_mode,
            archive.read_str("solverMode").and_then(SolverMode::from_symbol),
        );
        restore_into(&mut self.gravity, archive.read_vector3("gravity"));
        restore_into(&mut self.static_friction, archive.read_f64("staticFriction"));
        restore_into(&mut self.slip_friction, archive.read_f64("slipFriction"));
        restore_into(
            &mut self.contact_culling_distance,
            archive.read_floating("cullingThresh"),
        );
        restore_into(
            &mut self.contact_culling_depth,
            archive.read_floating("contactCullingDepth"),
        );
        restore_into(&mut self.error_criterion, archive.read_floating("errorCriterion"));
        restore_into(
            &mut self.max_num_iterations,
            archive
                .read_i64("maxNumIterations")
                .and_then(|v| u32::try_from(v).ok()),
        );
        restore_into(
            &mut self.contact_correction_depth,
            archive.read_floating("contactCorrectionDepth"),
        );
        restore_into(
            &mut self.contact_correction_velocity_ratio,
            archive.read_floating("contactCorrectionVelocityRatio"),
        );
        restore_into(&mut self.restitution, archive.read_f64("restitution"));
        restore_into(&mut self.kinematic_walking, archive.read_bool("kinematicWalking"));
        restore_into(&mut self.is_2d_mode, archive.read_bool("2Dmode"));
        restore_into(&mut self.penalty_kp_coef, archive.read_f64("penaltyKpCoef"));
        restore_into(&mut self.penalty_kv_coef, archive.read_f64("penaltyKvCoef"));
        restore_into(&mut self.penalty_size_ratio, archive.read_f64("penaltySizeRatio"));
    }
}
