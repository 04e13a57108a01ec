use std::fmt::{self, Display};

use chrono_tz::Tz;
use concierge_model::{ChatMessage, ModelProvider, ModelProviderError};

use crate::decision::{Decision, SchemaError, ToolAction};
use crate::model_client::ModelClient;
use crate::policy::PolicyBuilder;
use crate::profile::{AgentProfile, FALLBACK_TOOL};
use crate::xml;

/// The literal substring that anchors structured extraction. Everything the
/// model emitted before it is preamble and gets discarded; everything from
/// it onward is parsed as markup.
const RESPONSE_MARKER: &str = "<Response>";

/// Sampling temperature of the first attempt.
pub const INITIAL_TEMPERATURE: f32 = 0.7;

/// How much the temperature rises on each subsequent attempt.
pub const TEMPERATURE_STEP: f32 = 0.05;

/// Total attempts per invocation, the first one included.
pub const MAX_ATTEMPTS: u32 = 3;

/// The outcome of one invocation.
///
/// Callers match on the variant: `Decided` carries a structured decision
/// together with the unmodified completion text it was extracted from,
/// while `Exhausted` means every attempt failed and only the canned
/// fallback action is available. `invoke` never fails outright; end users
/// always receive either a model-grounded decision or the redirect.
#[derive(Clone, Debug, PartialEq)]
pub enum Invocation {
    /// A decision was extracted (or synthesized from a completion that
    /// carried no markup at all).
    Decided {
        /// The structured decision.
        decision: Decision,
        /// The raw completion text, exactly as the model returned it.
        raw_response: String,
    },
    /// Every attempt failed; no completion text is available.
    Exhausted {
        /// The canned fallback action.
        fallback: ToolAction,
    },
}

/// Why one attempt failed. All kinds take the same retry path; only the
/// diagnostics differ.
enum AttemptError {
    /// The dispatch to the model endpoint failed.
    Dispatch(Box<dyn ModelProviderError>),
    /// The completion carried the response marker, but the markup after it
    /// would not parse.
    Malformed(xml::ParseError),
    /// The markup parsed, but did not match the decision schema.
    Schema(SchemaError),
    /// The model selected a tool name outside the closed catalog.
    UnknownTool(String),
}

impl Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Dispatch(err) => {
                write!(f, "dispatch failed: {err}")
            }
            AttemptError::Malformed(err) => write!(f, "{err}"),
            AttemptError::Schema(err) => write!(f, "{err}"),
            AttemptError::UnknownTool(name) => {
                write!(f, "model selected an unknown tool `{name}`")
            }
        }
    }
}

/// [`Router`] builder.
pub struct RouterBuilder {
    client: ModelClient,
    policy: PolicyBuilder,
}

impl RouterBuilder {
    /// Creates a builder with the specified model provider and agent
    /// profile.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(
        provider: P,
        profile: AgentProfile,
    ) -> Self {
        Self {
            client: ModelClient::new(provider),
            policy: PolicyBuilder::new(profile),
        }
    }

    /// Sets the model identifier.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.policy = self.policy.with_model(model);
        self
    }

    /// Sets the completion token budget.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.policy = self.policy.with_max_tokens(max_tokens);
        self
    }

    /// Sets the time zone used for the prompt's temporal grounding.
    #[inline]
    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.policy = self.policy.with_time_zone(time_zone);
        self
    }

    /// Builds the router.
    #[inline]
    pub fn build(self) -> Router {
        Router {
            client: self.client,
            policy: self.policy,
        }
    }
}

/// Routes a conversation to a tool decision.
///
/// Each invocation builds a policy from the caller's history, dispatches it
/// and coerces the completion into a [`Decision`], retrying with a raised
/// temperature when an attempt fails. Attempts are strictly sequential;
/// nothing is shared across invocations except the model client, so one
/// router may serve concurrent callers.
pub struct Router {
    client: ModelClient,
    policy: PolicyBuilder,
}

impl Router {
    /// Returns the profile this router serves.
    #[inline]
    pub fn profile(&self) -> &AgentProfile {
        self.policy.profile()
    }

    /// Routes the given conversation history to a tool decision.
    ///
    /// This is the sole public entry point. `messages` is the ordered
    /// history; temporal order matters.
    pub async fn invoke(&self, messages: &[ChatMessage]) -> Invocation {
        for attempt in 0..MAX_ATTEMPTS {
            let temperature =
                INITIAL_TEMPERATURE + TEMPERATURE_STEP * attempt as f32;
            match self.try_once(messages, temperature).await {
                Ok(invocation) => return invocation,
                Err(err) => {
                    warn!(attempt, temperature, "attempt failed: {err}");
                }
            }
        }

        warn!("all attempts failed, returning the fallback action");
        Invocation::Exhausted {
            fallback: self.fallback_action(),
        }
    }

    /// Runs one build/dispatch/detect cycle at the given temperature.
    async fn try_once(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<Invocation, AttemptError> {
        let policy = self.policy.build(messages, temperature);
        let completion = self
            .client
            .send(policy)
            .await
            .map_err(AttemptError::Dispatch)?;
        let raw = completion.text;

        // A completion without the marker is not a failure: the model
        // answered in prose, and the prose becomes the thought of a
        // synthesized fallback decision. A completion whose marker is
        // followed by broken markup is a failure and takes the retry
        // path; the asymmetry is deliberate.
        let Some(start) = raw.find(RESPONSE_MARKER) else {
            info!("completion carries no response marker, degrading");
            return Ok(Invocation::Decided {
                decision: Decision {
                    thought: raw.clone(),
                    action: self.fallback_action(),
                },
                raw_response: raw,
            });
        };

        let markup = &raw[start..];
        debug!("reduced completion to: {markup}");

        let parsed = xml::parse(markup).map_err(AttemptError::Malformed)?;
        debug!("parsed response: {parsed}");

        let decision =
            Decision::from_value(&parsed).map_err(AttemptError::Schema)?;
        if !self.profile().is_known_tool(&decision.action.tool) {
            return Err(AttemptError::UnknownTool(decision.action.tool));
        }

        Ok(Invocation::Decided {
            decision,
            raw_response: raw,
        })
    }

    fn fallback_action(&self) -> ToolAction {
        ToolAction {
            tool: FALLBACK_TOOL.to_owned(),
            argument: self.profile().fallback_message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use concierge_model::ErrorKind;
    use concierge_test_model::TestModelProvider;

    use super::*;
    use crate::profile::{SampleExchange, ToolSpec};

    const FALLBACK_MESSAGE: &str =
        "Sorry, I am an admissions assistant, I can only help with \
         programs, tuition, scholarships and campus enquiries.";

    fn profile() -> AgentProfile {
        AgentProfile {
            persona: "You are a helpful admissions assistant called Fi."
                .to_owned(),
            customer_background: "The user is a parent or student."
                .to_owned(),
            fallback_message: FALLBACK_MESSAGE.to_owned(),
            tools: vec![
                ToolSpec::new("Scholarships", "Scholarship information."),
                ToolSpec::new("Fallback", "Redirect unrelated queries."),
                ToolSpec::new("Done", "Conclude the session."),
            ],
            examples: vec![SampleExchange {
                customer: "What scholarships are available?".to_owned(),
                response: "<Response><Thought>Scholarship query.</Thought>\
                           <Action><Tool>Scholarships</Tool>\
                           <Argument>Which program?</Argument></Action>\
                           </Response>"
                    .to_owned(),
            }],
        }
    }

    fn router(provider: TestModelProvider) -> Router {
        RouterBuilder::new(provider, profile()).build()
    }

    fn history() -> Vec<ChatMessage> {
        vec![ChatMessage::user(
            "<Customer>What scholarships are available?</Customer>",
        )]
    }

    const WELL_FORMED: &str = "<Response>\
         <Thought>This is a query about scholarships.</Thought>\
         <Action><Tool>Scholarships</Tool>\
         <Argument>Please let me know your preferred program.</Argument>\
         </Action></Response>";

    #[tokio::test]
    async fn test_well_formed_completion_decides() {
        let provider = TestModelProvider::default();
        provider.push_completion(WELL_FORMED);

        let invocation = router(provider.clone()).invoke(&history()).await;
        let Invocation::Decided {
            decision,
            raw_response,
        } = invocation
        else {
            panic!("expected a decision");
        };
        assert_eq!(decision.thought, "This is a query about scholarships.");
        assert_eq!(decision.action.tool, "Scholarships");
        assert_eq!(
            decision.action.argument,
            "Please let me know your preferred program."
        );
        assert_eq!(raw_response, WELL_FORMED);
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_schema_decoration_on_elements_decides_first_try() {
        // A model that copies the `type="string"` decoration from the
        // prompt schema onto its answer must not burn its attempts.
        let provider = TestModelProvider::default();
        provider.push_completion(
            "<Response>\
             <Thought type=\"string\">This is a query about scholarships.\
             </Thought><Action><Tool type=\"string\">Scholarships</Tool>\
             <Argument type=\"string\">Which program interests you?\
             </Argument></Action></Response>",
        );

        let invocation = router(provider.clone()).invoke(&history()).await;
        let Invocation::Decided { decision, .. } = invocation else {
            panic!("expected a decision");
        };
        assert_eq!(decision.thought, "This is a query about scholarships.");
        assert_eq!(decision.action.tool, "Scholarships");
        assert_eq!(decision.action.argument, "Which program interests you?");
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_preamble_is_discarded_but_raw_text_is_kept() {
        let raw = format!("Sure! Here is my decision:\n\n{WELL_FORMED}");
        let provider = TestModelProvider::default();
        provider.push_completion(raw.clone());

        let invocation = router(provider).invoke(&history()).await;
        let Invocation::Decided {
            decision,
            raw_response,
        } = invocation
        else {
            panic!("expected a decision");
        };
        assert_eq!(decision.action.tool, "Scholarships");
        // The preamble is discarded for parsing only; the raw response is
        // returned unmodified.
        assert_eq!(raw_response, raw);
    }

    #[tokio::test]
    async fn test_markerless_completion_degrades_immediately() {
        let raw = "I'm sorry, I can't talk about the weather.";
        let provider = TestModelProvider::default();
        provider.push_completion(raw);

        let invocation = router(provider.clone()).invoke(&history()).await;
        let Invocation::Decided {
            decision,
            raw_response,
        } = invocation
        else {
            panic!("expected a synthesized decision");
        };
        assert_eq!(decision.thought, raw);
        assert_eq!(decision.action.tool, FALLBACK_TOOL);
        assert_eq!(decision.action.argument, FALLBACK_MESSAGE);
        assert_eq!(raw_response, raw);
        // No retries are consumed on this path.
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_markup_exhausts_all_attempts() {
        let provider = TestModelProvider::default();
        for _ in 0..3 {
            provider.push_completion("<Response><Thought>broken");
        }

        let invocation = router(provider.clone()).invoke(&history()).await;
        assert_eq!(
            invocation,
            Invocation::Exhausted {
                fallback: ToolAction {
                    tool: FALLBACK_TOOL.to_owned(),
                    argument: FALLBACK_MESSAGE.to_owned(),
                },
            }
        );
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_temperature_rises_on_each_retry() {
        let provider = TestModelProvider::default();
        for _ in 0..3 {
            provider.push_completion("<Response>not closing");
        }

        router(provider.clone()).invoke(&history()).await;

        let temperatures: Vec<f32> = provider
            .recorded_policies()
            .iter()
            .map(|policy| policy.temperature)
            .collect();
        assert_eq!(temperatures.len(), 3);
        for (temperature, expected) in temperatures.iter().zip([0.7, 0.75, 0.8])
        {
            assert!((temperature - expected).abs() < 1e-6);
        }
        assert!(temperatures.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn test_transport_failures_then_recovery() {
        let provider = TestModelProvider::default();
        provider.push_failure(ErrorKind::Other);
        provider.push_failure(ErrorKind::RateLimitExceeded);
        provider.push_completion(WELL_FORMED);

        let invocation = router(provider.clone()).invoke(&history()).await;
        let Invocation::Decided { decision, .. } = invocation else {
            panic!("expected recovery on the final attempt");
        };
        assert_eq!(decision.action.tool, "Scholarships");
        assert_eq!(provider.request_count(), 3);

        let last = provider.recorded_policies().pop().unwrap();
        assert!((last.temperature - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_attempt_failure() {
        let provider = TestModelProvider::default();
        for _ in 0..3 {
            provider.push_completion(
                "<Response><Thought>hm</Thought>\
                 <Action><Tool>Telepathy</Tool><Argument>?</Argument>\
                 </Action></Response>",
            );
        }

        let invocation = router(provider.clone()).invoke(&history()).await;
        assert!(matches!(invocation, Invocation::Exhausted { .. }));
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_quotes_in_markup_survive_extraction() {
        let provider = TestModelProvider::default();
        provider.push_completion(
            "<Response><Thought>The user asked about \"honors\" \
             scholarships.</Thought><Action><Tool>Scholarships</Tool>\
             <Argument>We offer a \"Dean's List\" scholarship.</Argument>\
             </Action></Response>",
        );

        let invocation = router(provider).invoke(&history()).await;
        let Invocation::Decided { decision, .. } = invocation else {
            panic!("expected a decision");
        };
        assert_eq!(
            decision.thought,
            "The user asked about \"honors\" scholarships."
        );
        assert_eq!(
            decision.action.argument,
            "We offer a \"Dean's List\" scholarship."
        );
    }

    #[tokio::test]
    async fn test_schema_violations_take_the_retry_path() {
        let provider = TestModelProvider::default();
        // Parses fine, but there is no Action element.
        provider.push_completion(
            "<Response><Thought>hm</Thought></Response>",
        );
        provider.push_completion(WELL_FORMED);

        let invocation = router(provider.clone()).invoke(&history()).await;
        assert!(matches!(invocation, Invocation::Decided { .. }));
        assert_eq!(provider.request_count(), 2);
    }
}
