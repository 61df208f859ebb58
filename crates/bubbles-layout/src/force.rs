//! Velocity-Verlet force simulation.
//!
//! Each tick moves `alpha` toward `alpha_target`, applies the forces in a
//! fixed order (charge, collision, x centering, y centering) and then
//! integrates velocities with decay. The simulation stops once alpha
//! falls below `alpha_min` and only runs again after [`Simulation::restart`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::error::LayoutError;

/// Frame interval the simulation is stepped at.
pub const TICK_MS: f64 = 1000.0 / 60.0;

const ALPHA_MIN: f64 = 0.001;
const VELOCITY_DECAY: f64 = 0.4;
const DISTANCE_MIN2: f64 = 1.0;

/// Physics state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimNode {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Pinned position; the node follows it exactly while set
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

impl SimNode {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

/// Simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    /// Target of the x/y centering forces
    pub center: (f64, f64),
    /// Centering strength
    pub centering_strength: f64,
    /// Many-body strength; negative repels
    pub charge_strength: f64,
}

/// Repulsion, collision and centering over a fixed node set.
#[derive(Debug, Clone)]
pub struct Simulation {
    nodes: Vec<SimNode>,
    params: ForceParams,
    alpha: f64,
    alpha_min: f64,
    alpha_decay: f64,
    alpha_target: f64,
    velocity_decay: f64,
    collide_radii: Vec<f64>,
    collide_enabled: bool,
    running: bool,
    ticks: u64,
    rng: StdRng,
}

impl Simulation {
    pub fn new(nodes: Vec<SimNode>, params: ForceParams) -> Self {
        let n = nodes.len();
        Self {
            nodes,
            params,
            alpha: 1.0,
            alpha_min: ALPHA_MIN,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
            alpha_target: 0.0,
            velocity_decay: 1.0 - VELOCITY_DECAY,
            collide_radii: vec![0.0; n],
            collide_enabled: true,
            running: true,
            ticks: 0,
            rng: StdRng::seed_from_u64(0x5eed),
        }
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn node(&self, i: usize) -> Option<&SimNode> {
        self.nodes.get(i)
    }

    pub fn position(&self, i: usize) -> Option<(f64, f64)> {
        self.nodes.get(i).map(|n| (n.x, n.y))
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn set_alpha_target(&mut self, target: f64) {
        self.alpha_target = target;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Resume stepping without touching alpha.
    pub fn restart(&mut self) {
        self.running = true;
    }

    /// Raise the target energy and resume stepping.
    pub fn reheat(&mut self, target: f64) {
        self.alpha_target = target;
        self.restart();
    }

    /// Let the simulation cool back to rest.
    pub fn relax(&mut self) {
        self.alpha_target = 0.0;
    }

    /// Per-node collision radii, replaced wholesale.
    pub fn set_collide_radii(&mut self, radii: Vec<f64>) -> Result<(), LayoutError> {
        if radii.len() != self.nodes.len() {
            return Err(LayoutError::NodeCount {
                expected: self.nodes.len(),
                got: radii.len(),
            });
        }
        self.collide_radii = radii;
        Ok(())
    }

    pub fn set_collide_enabled(&mut self, enabled: bool) {
        self.collide_enabled = enabled;
    }

    pub fn collide_enabled(&self) -> bool {
        self.collide_enabled
    }

    /// Pin node `i` at `(x, y)`.
    pub fn pin(&mut self, i: usize, x: f64, y: f64) -> Result<(), LayoutError> {
        let node = self
            .nodes
            .get_mut(i)
            .ok_or(LayoutError::NodeOutOfRange(i))?;
        node.fx = Some(x);
        node.fy = Some(y);
        Ok(())
    }

    pub fn unpin(&mut self, i: usize) -> Result<(), LayoutError> {
        let node = self
            .nodes
            .get_mut(i)
            .ok_or(LayoutError::NodeOutOfRange(i))?;
        node.fx = None;
        node.fy = None;
        Ok(())
    }

    /// Advance one frame if running; stops once cooled.
    pub fn step(&mut self) {
        if !self.running {
            return;
        }
        self.tick();
        if self.alpha < self.alpha_min {
            trace!(ticks = self.ticks, "Simulation at rest");
            self.running = false;
        }
    }

    /// One integration step, regardless of the running state.
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        self.ticks += 1;

        self.apply_charge();
        if self.collide_enabled {
            self.apply_collide();
        }
        self.apply_centering();

        let decay = self.velocity_decay;
        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= decay;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= decay;
                    node.y += node.vy;
                }
            }
        }
    }

    fn jiggle(&mut self) -> f64 {
        (self.rng.random::<f64>() - 0.5) * 1e-6
    }

    fn apply_charge(&mut self) {
        let strength = self.params.charge_strength * self.alpha;
        let n = self.nodes.len();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut x = self.nodes[j].x - self.nodes[i].x;
                let mut y = self.nodes[j].y - self.nodes[i].y;
                let mut l = x * x + y * y;
                if x == 0.0 {
                    x = self.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.jiggle();
                    l += y * y;
                }
                if l < DISTANCE_MIN2 {
                    l = (DISTANCE_MIN2 * l).sqrt();
                }
                let w = strength / l;
                self.nodes[i].vx += x * w;
                self.nodes[i].vy += y * w;
            }
        }
    }

    fn apply_collide(&mut self) {
        let n = self.nodes.len();
        for i in 0..n {
            let ri = self.collide_radii[i];
            let ri2 = ri * ri;
            for j in (i + 1)..n {
                let rj = self.collide_radii[j];
                let r = ri + rj;
                let (a, b) = (self.nodes[i], self.nodes[j]);
                let mut x = a.x + a.vx - b.x - b.vx;
                let mut y = a.y + a.vy - b.y - b.vy;
                let mut l = x * x + y * y;
                if l >= r * r {
                    continue;
                }
                if x == 0.0 {
                    x = self.jiggle();
                    l += x * x;
                }
                if y == 0.0 {
                    y = self.jiggle();
                    l += y * y;
                }
                let dist = l.sqrt();
                let push = (r - dist) / dist;
                x *= push;
                y *= push;
                let rj2 = rj * rj;
                let share = if ri2 + rj2 > 0.0 { rj2 / (ri2 + rj2) } else { 0.5 };
                self.nodes[i].vx += x * share;
                self.nodes[i].vy += y * share;
                self.nodes[j].vx -= x * (1.0 - share);
                self.nodes[j].vy -= y * (1.0 - share);
            }
        }
    }

    fn apply_centering(&mut self) {
        let k = self.params.centering_strength * self.alpha;
        let (cx, cy) = self.params.center;
        for node in &mut self.nodes {
            node.vx += (cx - node.x) * k;
        }
        for node in &mut self.nodes {
            node.vy += (cy - node.y) * k;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ForceParams {
        ForceParams {
            center: (400.0, 300.0),
            centering_strength: 0.05,
            charge_strength: -30.0,
        }
    }

    fn distance(a: &SimNode, b: &SimNode) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    #[test]
    fn test_cools_to_rest() {
        let mut sim = Simulation::new(vec![SimNode::at(0.0, 0.0)], params());
        let mut steps = 0;
        while sim.is_running() && steps < 1000 {
            sim.step();
            steps += 1;
        }
        assert!(!sim.is_running());
        // 1 - 0.001^(1/300) decay reaches alpha_min in about 300 ticks
        assert!((290..=310).contains(&steps), "{steps}");

        let ticks = sim.ticks();
        sim.step();
        assert_eq!(sim.ticks(), ticks);
    }

    #[test]
    fn test_reheat_holds_energy() {
        let mut sim = Simulation::new(vec![SimNode::at(0.0, 0.0)], params());
        sim.reheat(0.2);
        for _ in 0..2000 {
            sim.step();
        }
        assert!(sim.is_running());
        assert!((sim.alpha() - 0.2).abs() < 1e-3);

        sim.relax();
        for _ in 0..2000 {
            sim.step();
        }
        assert!(!sim.is_running());
    }

    #[test]
    fn test_collision_separates_overlapping_nodes() {
        let nodes = vec![SimNode::at(400.0, 300.0), SimNode::at(405.0, 300.0)];
        let mut sim = Simulation::new(nodes, params());
        sim.set_collide_radii(vec![30.0, 30.0]).unwrap();
        for _ in 0..300 {
            sim.step();
        }
        let d = distance(&sim.nodes()[0], &sim.nodes()[1]);
        assert!(d > 55.0, "distance {d}");
    }

    #[test]
    fn test_centering_pulls_toward_center() {
        let mut sim = Simulation::new(vec![SimNode::at(0.0, 0.0)], params());
        for _ in 0..300 {
            sim.step();
        }
        let n = sim.nodes()[0];
        assert!(n.x > 100.0 && n.y > 100.0);
    }

    #[test]
    fn test_pinned_node_stays_put() {
        let nodes = vec![SimNode::at(400.0, 300.0), SimNode::at(402.0, 300.0)];
        let mut sim = Simulation::new(nodes, params());
        sim.set_collide_radii(vec![20.0, 20.0]).unwrap();
        sim.pin(0, 100.0, 120.0).unwrap();
        for _ in 0..50 {
            sim.step();
        }
        assert_eq!(sim.position(0), Some((100.0, 120.0)));

        sim.unpin(0).unwrap();
        sim.step();
        assert_ne!(sim.position(0), Some((100.0, 120.0)));
    }

    #[test]
    fn test_rejects_mismatched_radii() {
        let mut sim = Simulation::new(vec![SimNode::default()], params());
        assert_eq!(
            sim.set_collide_radii(vec![1.0, 2.0]),
            Err(LayoutError::NodeCount {
                expected: 1,
                got: 2
            })
        );
        assert_eq!(sim.pin(3, 0.0, 0.0), Err(LayoutError::NodeOutOfRange(3)));
    }
}
