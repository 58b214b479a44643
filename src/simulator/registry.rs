//! Registration of simulation bodies into the world for one run.

use std::collections::BTreeMap;

use super::walk::WalkState;
use crate::config::DynamicsMode;
use crate::core::articulations::Multibody;
use crate::core::body::{BodyId, SimulationBody};
use crate::core::controller::{Controller, ControllerKind};
use crate::error::WorldError;
use crate::utils::allocator::EntityId;
use crate::world::{DynamicsWorld, ForwardDynamicsDelegate};

/// A body taking part in the current run.
pub(crate) struct RegisteredBody {
    pub id: BodyId,
    pub handle: EntityId,
    pub controller: Option<Box<dyn Controller>>,
    pub walk: Option<WalkState>,
    /// Set once the controller reported the end of its work.
    pub controller_done: bool,
}

/// Maps body identities to world handles and keeps per-body run state.
#[derive(Default)]
pub(crate) struct BodyRegistry {
    bodies: Vec<RegisteredBody>,
    index_map: BTreeMap<BodyId, EntityId>,
}

/// Zeroes kinetic state and external forces, then recomputes kinematics
/// with velocity and acceleration propagation.
pub fn reset_body(body: &mut Multibody) {
    body.reset_kinetic_state();
    body.clear_external_forces();
    body.calc_forward_kinematics(true, true);
}

/// High-gain when the run is in high-gain mode or the controller is a
/// position servo, whatever the global mode.
pub fn select_delegate(
    mode: DynamicsMode,
    controller: Option<ControllerKind>,
) -> ForwardDynamicsDelegate {
    if mode == DynamicsMode::HighGainDynamics || controller == Some(ControllerKind::HighGain) {
        ForwardDynamicsDelegate::HighGain
    } else {
        ForwardDynamicsDelegate::ForwardDynamics
    }
}

impl BodyRegistry {
    pub fn clear(&mut self) {
        for rb in &mut self.bodies {
            if let Some(controller) = rb.controller.as_mut() {
                controller.stop();
            }
        }
        self.bodies.clear();
        self.index_map.clear();
    }

    /// Replaces the registered population with `bodies`.
    ///
    /// Walk state is built for legged bodies when `walking` is set.
    pub fn initialize<W: DynamicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        bodies: Vec<SimulationBody>,
        mode: DynamicsMode,
        walking: bool,
    ) -> Result<(), WorldError> {
        self.clear();
        for sim_body in bodies {
            self.add(world, sim_body, mode, walking)?;
        }
        Ok(())
    }

    fn add<W: DynamicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        sim_body: SimulationBody,
        mode: DynamicsMode,
        walking: bool,
    ) -> Result<(), WorldError> {
        let SimulationBody {
            id,
            mut body,
            controller,
        } = sim_body;

        body.validate().map_err(|reason| WorldError::MalformedBody {
            name: body.name.clone(),
            reason,
        })?;
        reset_body(&mut body);
        let delegate = select_delegate(mode, controller.as_ref().map(|c| c.kind()));
        let name = body.name.clone();
        let handle = world.add_body(body, delegate)?;

        let walk = match world.body(handle) {
            Some(body) if walking && mode == DynamicsMode::Kinematics => WalkState::new(body),
            _ => None,
        };
        log::debug!(
            "registered `{name}` ({id:?}) as {handle:?} with {delegate:?}{}",
            if walk.is_some() { ", walking" } else { "" }
        );

        self.index_map.insert(id, handle);
        self.bodies.push(RegisteredBody {
            id,
            handle,
            controller,
            walk,
            controller_done: false,
        });
        Ok(())
    }

    pub fn handle(&self, id: BodyId) -> Option<EntityId> {
        self.index_map.get(&id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.iter().map(|rb| rb.id)
    }

    pub fn get(&self, id: BodyId) -> Option<&RegisteredBody> {
        self.bodies.iter().find(|rb| rb.id == id)
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, RegisteredBody> {
        self.bodies.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_gain_controller_overrides_global_mode() {
        assert_eq!(
            select_delegate(DynamicsMode::ForwardDynamics, Some(ControllerKind::HighGain)),
            ForwardDynamicsDelegate::HighGain
        );
        assert_eq!(
            select_delegate(DynamicsMode::ForwardDynamics, Some(ControllerKind::Torque)),
            ForwardDynamicsDelegate::ForwardDynamics
        );
        assert_eq!(
            select_delegate(DynamicsMode::HighGainDynamics, None),
            ForwardDynamicsDelegate::HighGain
        );
    }
}
