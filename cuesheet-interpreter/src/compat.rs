//! Agent type / behavior type compatibility rules

use cuesheet_core::{AgentType, BehaviorType, CompatibilityError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which behavior types each agent type may execute.
///
/// A plain data value: the interpreter takes one at construction, so tests
/// and product variants can swap in their own rules. Agents with no entry
/// may execute nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityMatrix {
    rules: HashMap<AgentType, Vec<BehaviorType>>,
}

impl Default for CompatibilityMatrix {
    /// The standard product rules.
    fn default() -> Self {
        Self::empty()
            .with_rule(
                AgentType::Scout,
                [BehaviorType::Research, BehaviorType::Custom],
            )
            .with_rule(
                AgentType::Coach,
                [
                    BehaviorType::Planning,
                    BehaviorType::Followup,
                    BehaviorType::Custom,
                ],
            )
            .with_rule(
                AgentType::Tracker,
                [BehaviorType::Followup, BehaviorType::Custom],
            )
            .with_rule(
                AgentType::Insight,
                [
                    BehaviorType::Analysis,
                    BehaviorType::Story,
                    BehaviorType::Custom,
                ],
            )
    }
}

impl CompatibilityMatrix {
    /// A matrix that permits nothing.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Replace the behaviors permitted for `agent`.
    pub fn with_rule(
        mut self,
        agent: AgentType,
        behaviors: impl IntoIterator<Item = BehaviorType>,
    ) -> Self {
        self.rules.insert(agent, behaviors.into_iter().collect());
        self
    }

    /// Behaviors `agent` may execute, in declaration order.
    pub fn allowed(&self, agent: AgentType) -> &[BehaviorType] {
        self.rules.get(&agent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn permits(&self, agent: AgentType, behavior: &BehaviorType) -> bool {
        self.allowed(agent).contains(behavior)
    }
}

/// Check one agent/behavior pairing. An empty list means compatible.
pub fn check_compatibility(
    matrix: &CompatibilityMatrix,
    agent: AgentType,
    behavior: &BehaviorType,
) -> Vec<CompatibilityError> {
    if matrix.permits(agent, behavior) {
        return Vec::new();
    }
    vec![CompatibilityError {
        agent_type: agent,
        behavior_type: behavior.clone(),
        allowed: matrix.allowed(agent).to_vec(),
    }]
}
