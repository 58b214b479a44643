use serde::{Deserialize, Serialize};

use super::articulations::Multibody;
use super::controller::{Controller, ControllerKind};

/// Host-side identity of a simulated body, stable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// One articulated mechanism handed to the simulator for a run.
pub struct SimulationBody {
    pub id: BodyId,
    pub body: Multibody,
    pub controller: Option<Box<dyn Controller>>,
}

impl SimulationBody {
    pub fn new(id: BodyId, body: Multibody) -> Self {
        Self {
            id,
            body,
            controller: None,
        }
    }

    pub fn with_controller<C: Controller + 'static>(mut self, controller: C) -> Self {
        self.controller = Some(Box::new(controller));
        self
    }

    pub fn controller_kind(&self) -> Option<ControllerKind> {
        self.controller.as_ref().map(|c| c.kind())
    }
}

impl std::fmt::Debug for SimulationBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationBody")
            .field("id", &self.id)
            .field("body", &self.body.name)
            .field("controller", &self.controller.as_ref().map(|c| c.name().to_owned()))
            .finish()
    }
}
