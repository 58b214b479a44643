use super::articulations::Multibody;

/// One visit in a [`LinkTraversal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalStep {
    /// Compute `link` from its parent (joint applied forward).
    Down { link: usize },
    /// Compute the parent of `from` from `from` (joint applied inversely).
    Up { from: usize, link: usize },
}

/// Forward kinematics restricted to the links reachable from a chosen root.
///
/// The root link's pose (and rates) are inputs; every other visited link is
/// recomputed from the link it was reached through. Rooting the traversal at a
/// support foot keeps that foot fixed in the world while the rest of the body
/// follows its joint angles.
#[derive(Debug, Clone, Default)]
pub struct LinkTraversal {
    root: usize,
    steps: Vec<TraversalStep>,
}

impl LinkTraversal {
    /// Builds a traversal rooted at `root`, visiting ancestors when
    /// `to_upper` and descendants when `to_lower`.
    pub fn find(body: &Multibody, root: usize, to_upper: bool, to_lower: bool) -> Self {
        let children = body.children();
        let mut steps = Vec::new();
        let mut stack = Vec::new();

        if to_lower {
            for &child in children[root].iter().rev() {
                stack.push(TraversalStep::Down { link: child });
            }
        }
        if to_upper {
            if let Some(parent) = body.links[root].parent_idx {
                stack.push(TraversalStep::Up {
                    from: root,
                    link: parent,
                });
            }
        }

        while let Some(step) = stack.pop() {
            steps.push(step);
            match step {
                TraversalStep::Down { link } => {
                    for &child in children[link].iter().rev() {
                        stack.push(TraversalStep::Down { link: child });
                    }
                }
                TraversalStep::Up { from, link } => {
                    // siblings of `from` hang below the newly reached parent
                    for &child in children[link].iter().rev() {
                        if child != from {
                            stack.push(TraversalStep::Down { link: child });
                        }
                    }
                    if let Some(grandparent) = body.links[link].parent_idx {
                        stack.push(TraversalStep::Up {
                            from: link,
                            link: grandparent,
                        });
                    }
                }
            }
        }

        Self { root, steps }
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn steps(&self) -> &[TraversalStep] {
        &self.steps
    }

    /// Number of links covered, root included.
    pub fn num_links(&self) -> usize {
        self.steps.len() + 1
    }

    pub fn calc_forward_kinematics(&self, body: &mut Multibody, calc_v: bool, calc_a: bool) {
        for step in &self.steps {
            match *step {
                TraversalStep::Down { link } => body.propagate_to_child(link, calc_v, calc_a),
                TraversalStep::Up { from, .. } => body.propagate_to_parent(from, calc_v, calc_a),
            }
        }
        if calc_v {
            body.update_spatial_velocity();
        }
        if calc_a {
            body.update_spatial_acceleration();
        }
    }
}
