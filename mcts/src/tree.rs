//! Arena-allocated search tree.
//!
//! Nodes live in a contiguous `Vec` and reference each other by index.
//! Each tree is rooted at a single real observation, mutated by one
//! thread for the duration of one decision, then discarded.

use rand::Rng;
use rand_distr::{Distribution, Gamma};
use reverie_core::{Action, NetworkOutput, Player};
use tracing::trace;

use crate::node::{Node, NodeId};
use crate::search::SearchError;

#[derive(Debug)]
pub struct SearchTree {
    nodes: Vec<Node>,
}

impl SearchTree {
    /// Fresh tree holding an unexpanded root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(1.0)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Populate a node from a network output: cache the latent state and
    /// predicted reward, then create one child per action with priors
    /// from the softmax of the policy logits restricted to `actions`.
    ///
    /// Children are created in the order actions are given; selection and
    /// arg-max tie-breaks follow that order.
    pub fn expand_node(
        &mut self,
        id: NodeId,
        to_play: Player,
        actions: &[Action],
        output: &NetworkOutput,
    ) -> Result<(), SearchError> {
        if actions.is_empty() {
            return Err(SearchError::NoLegalActions);
        }

        let priors = softmax_over(&output.policy_logits, actions);
        let children: Vec<(Action, NodeId)> = actions
            .iter()
            .zip(priors)
            .map(|(&action, prior)| (action, self.allocate(Node::new(prior))))
            .collect();

        let node = self.get_mut(id);
        node.to_play = Some(to_play);
        node.reward = output.reward;
        node.hidden_state = Some(output.hidden_state.clone());
        node.children = children;

        Ok(())
    }

    /// Expand the root from an initial inference over the real legal
    /// action set.
    pub fn expand_root(
        &mut self,
        to_play: Player,
        legal_actions: &[Action],
        output: &NetworkOutput,
    ) -> Result<(), SearchError> {
        self.expand_node(NodeId::ROOT, to_play, legal_actions, output)
    }

    /// Blend Dirichlet noise into the root children's priors.
    ///
    /// Applied exactly once per tree, after root expansion and before the
    /// first simulation. A zero alpha or fraction disables the noise
    /// (used by greedy evaluation configs).
    pub fn add_exploration_noise<R: Rng>(&mut self, alpha: f32, fraction: f32, rng: &mut R) {
        if alpha <= 0.0 || fraction <= 0.0 {
            return;
        }

        let num_children = self.get(NodeId::ROOT).children.len();
        let noise = dirichlet_noise(num_children, alpha, rng);
        trace!(num_children, alpha, fraction, "perturbing root priors");

        let children: Vec<NodeId> = self
            .get(NodeId::ROOT)
            .children
            .iter()
            .map(|&(_, id)| id)
            .collect();
        for (child_id, noise) in children.into_iter().zip(noise) {
            let child = self.get_mut(child_id);
            child.prior = child.prior * (1.0 - fraction) + noise * fraction;
        }
    }

    /// Visit counts of the root's children in creation order.
    pub fn root_visits(&self) -> Vec<(Action, u32)> {
        self.get(NodeId::ROOT)
            .children
            .iter()
            .map(|&(action, id)| (action, self.get(id).visit_count))
            .collect()
    }

    /// Empirical visit distribution over the full action space, indexed
    /// by action. Actions outside the root's children get probability 0.
    pub fn root_visit_distribution(&self, action_space: usize) -> Vec<f32> {
        let visits = self.root_visits();
        let total: u32 = visits.iter().map(|&(_, n)| n).sum();
        let mut distribution = vec![0.0; action_space];
        if total == 0 {
            return distribution;
        }
        for (action, n) in visits {
            distribution[action.index()] = n as f32 / total as f32;
        }
        distribution
    }

    /// Mean backed-up value at the root.
    pub fn root_value(&self) -> f32 {
        self.get(NodeId::ROOT).value()
    }
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Softmax of `logits` restricted to `actions`, renormalized over that
/// set. Shifted by the max logit for numerical stability.
fn softmax_over(logits: &[f32], actions: &[Action]) -> Vec<f32> {
    let max_logit = actions
        .iter()
        .map(|a| logits[a.index()])
        .fold(f32::NEG_INFINITY, f32::max);

    let exps: Vec<f32> = actions
        .iter()
        .map(|a| (logits[a.index()] - max_logit).exp())
        .collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Dirichlet(alpha) sample of length `n` via normalized Gamma variates.
fn dirichlet_noise<R: Rng>(n: usize, alpha: f32, rng: &mut R) -> Vec<f32> {
    let gamma = Gamma::new(alpha as f64, 1.0).expect("alpha must be positive");
    let mut samples: Vec<f32> = (0..n).map(|_| gamma.sample(rng) as f32).collect();

    let sum: f32 = samples.iter().sum();
    if sum > 0.0 {
        for s in &mut samples {
            *s /= sum;
        }
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use reverie_core::{Network, UniformNetwork};

    fn flat_output(action_space: usize) -> NetworkOutput {
        UniformNetwork::new(action_space, 4).initial_inference(&vec![0.0])
    }

    #[test]
    fn expand_creates_one_child_per_action() {
        let mut tree = SearchTree::new();
        let actions = vec![Action(0), Action(2), Action(3)];
        tree.expand_root(Player(0), &actions, &flat_output(4)).unwrap();

        let root = tree.get(tree.root());
        assert!(root.expanded());
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.to_play, Some(Player(0)));
        assert!(root.hidden_state.is_some());
    }

    #[test]
    fn priors_sum_to_one_over_the_legal_set() {
        let mut tree = SearchTree::new();
        let mut output = flat_output(4);
        output.policy_logits = vec![2.0, -1.0, 0.5, 0.0];
        let actions = vec![Action(0), Action(2)];
        tree.expand_root(Player(0), &actions, &output).unwrap();

        let sum: f32 = tree
            .get(tree.root())
            .children
            .iter()
            .map(|&(_, id)| tree.get(id).prior)
            .sum();
        assert!((sum - 1.0).abs() < 1e-5);

        // Higher logit, higher prior.
        let first = tree.get(tree.get(tree.root()).children[0].1).prior;
        let second = tree.get(tree.get(tree.root()).children[1].1).prior;
        assert!(first > second);
    }

    #[test]
    fn expand_rejects_empty_action_set() {
        let mut tree = SearchTree::new();
        let err = tree
            .expand_root(Player(0), &[], &flat_output(4))
            .unwrap_err();
        assert!(matches!(err, SearchError::NoLegalActions));
    }

    #[test]
    fn noise_changes_priors_but_preserves_their_sum() {
        let mut tree = SearchTree::new();
        let actions = vec![Action(0), Action(1), Action(2)];
        tree.expand_root(Player(0), &actions, &flat_output(3)).unwrap();

        let before: Vec<f32> = tree
            .get(tree.root())
            .children
            .iter()
            .map(|&(_, id)| tree.get(id).prior)
            .collect();

        let mut rng = ChaCha20Rng::seed_from_u64(7);
        tree.add_exploration_noise(0.3, 0.25, &mut rng);

        let after: Vec<f32> = tree
            .get(tree.root())
            .children
            .iter()
            .map(|&(_, id)| tree.get(id).prior)
            .collect();

        assert_ne!(before, after);
        let sum: f32 = after.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_fraction_noise_is_a_no_op() {
        let mut tree = SearchTree::new();
        let actions = vec![Action(0), Action(1)];
        tree.expand_root(Player(0), &actions, &flat_output(2)).unwrap();

        let before: Vec<f32> = tree
            .get(tree.root())
            .children
            .iter()
            .map(|&(_, id)| tree.get(id).prior)
            .collect();

        let mut rng = ChaCha20Rng::seed_from_u64(7);
        tree.add_exploration_noise(0.3, 0.0, &mut rng);

        let after: Vec<f32> = tree
            .get(tree.root())
            .children
            .iter()
            .map(|&(_, id)| tree.get(id).prior)
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn visit_distribution_is_indexed_by_action() {
        let mut tree = SearchTree::new();
        let actions = vec![Action(1), Action(3)];
        tree.expand_root(Player(0), &actions, &flat_output(4)).unwrap();

        let children: Vec<NodeId> = tree
            .get(tree.root())
            .children
            .iter()
            .map(|&(_, id)| id)
            .collect();
        tree.get_mut(children[0]).visit_count = 30;
        tree.get_mut(children[1]).visit_count = 10;

        let distribution = tree.root_visit_distribution(4);
        assert!((distribution[1] - 0.75).abs() < 1e-6);
        assert!((distribution[3] - 0.25).abs() < 1e-6);
        assert!(distribution[0].abs() < 1e-6);
        assert!(distribution[2].abs() < 1e-6);
    }

    #[test]
    fn dirichlet_noise_sums_to_one() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let noise = dirichlet_noise(5, 0.3, &mut rng);

        let sum: f32 = noise.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(noise.iter().all(|&n| n >= 0.0));
    }
}
