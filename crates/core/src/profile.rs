//! The static configuration surface consumed by the policy builder.
//!
//! Everything here is immutable data supplied at construction: the agent
//! persona, the customer background, the closed tool catalog and the
//! few-shot example exchanges. There is no ambient global; a profile is
//! built once at process start and injected wherever it is needed.

use serde::{Deserialize, Serialize};

/// The tool the router falls back to when the model goes off script.
pub const FALLBACK_TOOL: &str = "Fallback";

/// A named capability the model may select.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool name. Names are unique within a catalog and form a closed
    /// enumeration the model chooses from.
    pub name: String,
    /// A model-readable description of what the tool does.
    pub description: String,
}

impl ToolSpec {
    /// Creates a tool spec.
    #[inline]
    pub fn new<N: Into<String>, D: Into<String>>(
        name: N,
        description: D,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// One few-shot exchange rendered into the prompt.
///
/// The customer text is stored bare; the renderer wraps it in `<Customer>`
/// tags. The response is the literal tagged markup the model should learn
/// to imitate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleExchange {
    /// What the customer asked.
    pub customer: String,
    /// The tagged response the model should have produced.
    pub response: String,
}

/// The full configuration of one conversational agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// The agent persona and behavioral instructions.
    pub persona: String,
    /// A description of who the agent is talking to.
    pub customer_background: String,
    /// The canned redirect message used whenever the router degrades to
    /// the fallback tool.
    pub fallback_message: String,
    /// The closed tool catalog, in prompt order.
    pub tools: Vec<ToolSpec>,
    /// Few-shot example exchanges, in prompt order.
    pub examples: Vec<SampleExchange>,
}

impl AgentProfile {
    /// Returns whether `name` is in the tool catalog.
    #[inline]
    pub fn is_known_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|tool| tool.name == name)
    }
}
