use glam::DVec3;

use crate::config::IntegrationMode;
use crate::core::articulations::Multibody;
use crate::core::types::Transform;
use crate::dynamics::aba::Accelerations;
use crate::utils::math::integrate_rotation;

/// Integrator responsible for stepping articulated bodies forward in time.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub dt: f64,
    pub method: IntegrationMode,
}

/// Generalized state of one body: root pose and rates, joint positions and rates.
#[derive(Debug, Clone)]
struct BodyState {
    root: Transform,
    v: DVec3,
    w: DVec3,
    q: Vec<f64>,
    dq: Vec<f64>,
}

/// Time derivative of a [`BodyState`].
#[derive(Debug, Clone)]
struct Derivative {
    v: DVec3,
    w: DVec3,
    dv: DVec3,
    dw: DVec3,
    dq: Vec<f64>,
    ddq: Vec<f64>,
}

impl BodyState {
    fn capture(body: &Multibody) -> Self {
        let root = body.root();
        Self {
            root: root.pose,
            v: root.v,
            w: root.w,
            q: body.links.iter().map(|l| l.q).collect(),
            dq: body.links.iter().map(|l| l.dq).collect(),
        }
    }

    fn apply(&self, body: &mut Multibody) {
        let root = body.root_mut();
        root.pose = self.root;
        root.v = self.v;
        root.w = self.w;
        for (idx, link) in body.links.iter_mut().enumerate() {
            link.q = self.q[idx];
            link.dq = self.dq[idx];
        }
    }

    fn advanced(&self, d: &Derivative, h: f64) -> Self {
        Self {
            root: Transform::new(
                self.root.position + d.v * h,
                integrate_rotation(self.root.rotation, d.w, h),
            ),
            v: self.v + d.dv * h,
            w: self.w + d.dw * h,
            q: self.q.iter().zip(&d.dq).map(|(q, dq)| q + dq * h).collect(),
            dq: self.dq.iter().zip(&d.ddq).map(|(dq, ddq)| dq + ddq * h).collect(),
        }
    }
}

impl Derivative {
    fn evaluate(body: &Multibody, acc: &Accelerations) -> Self {
        let root = body.root();
        let (dv, dw) = if body.has_floating_root() {
            acc.root_classical(body)
        } else {
            (DVec3::ZERO, DVec3::ZERO)
        };
        Self {
            v: root.v,
            w: root.w,
            dv,
            dw,
            dq: body.links.iter().map(|l| l.dq).collect(),
            ddq: acc.ddq.clone(),
        }
    }

    /// Runge-Kutta weighting `(k1 + 2 k2 + 2 k3 + k4) / 6`.
    fn rk4_blend(k: [&Derivative; 4]) -> Self {
        let [k1, k2, k3, k4] = k;
        Self {
            v: rk4_vec(k1.v, k2.v, k3.v, k4.v),
            w: rk4_vec(k1.w, k2.w, k3.w, k4.w),
            dv: rk4_vec(k1.dv, k2.dv, k3.dv, k4.dv),
            dw: rk4_vec(k1.dw, k2.dw, k3.dw, k4.dw),
            dq: rk4_slice(&k1.dq, &k2.dq, &k3.dq, &k4.dq),
            ddq: rk4_slice(&k1.ddq, &k2.ddq, &k3.ddq, &k4.ddq),
        }
    }
}

fn rk4_vec(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> DVec3 {
    (a + 2.0 * b + 2.0 * c + d) / 6.0
}

fn rk4_slice(a: &[f64], b: &[f64], c: &[f64], d: &[f64]) -> Vec<f64> {
    (0..a.len())
        .map(|i| (a[i] + 2.0 * b[i] + 2.0 * c[i] + d[i]) / 6.0)
        .collect()
}

impl Integrator {
    pub fn new(dt: f64, method: IntegrationMode) -> Self {
        Self { dt, method }
    }

    /// Advances `body` by one time step.
    ///
    /// `accelerations` is evaluated on the body with poses and velocities
    /// already propagated; Runge-Kutta calls it four times per step. On return
    /// link poses, velocities and accelerations are consistent.
    pub fn step<F>(&self, body: &mut Multibody, mut accelerations: F)
    where
        F: FnMut(&Multibody) -> Accelerations,
    {
        if body.links.is_empty() {
            return;
        }
        let y0 = BodyState::capture(body);
        let (y1, d) = match self.method {
            IntegrationMode::Euler => self.euler(&y0, body, &mut accelerations),
            IntegrationMode::RungeKutta => self.runge_kutta(&y0, body, &mut accelerations),
        };

        y1.apply(body);
        let root = body.root_mut();
        root.dv = d.dv;
        root.dw = d.dw;
        for (link, ddq) in body.links.iter_mut().zip(&d.ddq) {
            link.ddq = *ddq;
        }
        body.calc_forward_kinematics(true, true);
    }

    /// Semi-implicit Euler: rates first, then positions from the new rates.
    fn euler<F>(&self, y0: &BodyState, body: &Multibody, f: &mut F) -> (BodyState, Derivative)
    where
        F: FnMut(&Multibody) -> Accelerations,
    {
        let dt = self.dt;
        let mut d = Derivative::evaluate(body, &f(body));
        d.v += d.dv * dt;
        d.w += d.dw * dt;
        for (dq, ddq) in d.dq.iter_mut().zip(&d.ddq) {
            *dq += ddq * dt;
        }
        (y0.advanced(&d, dt), d)
    }

    fn runge_kutta<F>(
        &self,
        y0: &BodyState,
        body: &mut Multibody,
        f: &mut F,
    ) -> (BodyState, Derivative)
    where
        F: FnMut(&Multibody) -> Accelerations,
    {
        let dt = self.dt;
        let mut stage = |state: &BodyState, body: &mut Multibody| {
            state.apply(body);
            body.calc_forward_kinematics(true, false);
            Derivative::evaluate(body, &f(body))
        };

        let k1 = stage(y0, body);
        let k2 = stage(&y0.advanced(&k1, dt * 0.5), body);
        let k3 = stage(&y0.advanced(&k2, dt * 0.5), body);
        let k4 = stage(&y0.advanced(&k3, dt), body);
        let d = Derivative::rk4_blend([&k1, &k2, &k3, &k4]);
        (y0.advanced(&d, dt), d)
    }
}
