//! Deterministic assembly of the request payload sent to the model.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use concierge_model::{ChatMessage, Policy};

use crate::profile::AgentProfile;

/// The model used when the caller doesn't pick one.
pub const DEFAULT_MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";

/// The completion token budget used when the caller doesn't pick one.
pub const DEFAULT_MAX_TOKENS: u32 = 750;

/// The time zone the prompt's temporal grounding is written in.
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::Australia::Brisbane;

/// Renders [`Policy`] values from a fixed [`AgentProfile`] and the caller's
/// conversation history.
///
/// Building a policy is pure string templating and cannot fail. The
/// temperature is embedded as given, without validation or clamping; the
/// retry loop is the only caller that varies it.
#[derive(Clone, Debug)]
pub struct PolicyBuilder {
    profile: AgentProfile,
    model: String,
    max_tokens: u32,
    time_zone: Tz,
}

impl PolicyBuilder {
    /// Creates a builder for the given profile, with default model, token
    /// budget and time zone.
    #[inline]
    pub fn new(profile: AgentProfile) -> Self {
        Self {
            profile,
            model: DEFAULT_MODEL.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            time_zone: DEFAULT_TIME_ZONE,
        }
    }

    /// Sets the model identifier.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the completion token budget.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the time zone used for the prompt's date and time.
    #[inline]
    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Returns the profile this builder renders.
    #[inline]
    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Builds a policy stamped with the current date and time.
    #[inline]
    pub fn build(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Policy {
        self.build_at(
            messages,
            temperature,
            Utc::now().with_timezone(&self.time_zone),
        )
    }

    /// Builds a policy for an explicit instant.
    ///
    /// Identical inputs produce identical output; this is the seam the
    /// determinism tests use.
    pub fn build_at(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        now: DateTime<Tz>,
    ) -> Policy {
        Policy {
            model: self.model.clone(),
            temperature,
            max_tokens: self.max_tokens,
            system: self.system_prompt(&now),
            messages: messages.to_vec(),
        }
    }

    fn system_prompt(&self, now: &DateTime<Tz>) -> String {
        format!(
            "<System>\n    \
             <Agent>{agent}</Agent>\n    \
             <CustomerBackground>{background}</CustomerBackground>\n    \
             <SampleMessages>{samples}</SampleMessages>\n    \
             <Intent>Respond using only tools. Output strictly in XML \
             adhering to the Schema.</Intent>\n    \
             {tools}\n    \
             <Schema>\n      \
             <Response>\n        \
             <Thought type=\"string\">Reasoning behind your action</Thought>\n        \
             <Action>\n            \
             <Tool type=\"string\" description=\"{tool_types}\"/>\n            \
             <Argument type=\"string\" description=\"Argument to pass to the tool\"/>\n        \
             </Action>\n      \
             </Response>\n    \
             </Schema>\n  \
             </System>",
            agent = self.agent_info(now),
            background = self.profile.customer_background,
            samples = self.sample_messages(),
            tools = self.tools_markup(),
            tool_types = self.tool_types(),
        )
    }

    fn agent_info(&self, now: &DateTime<Tz>) -> String {
        format!(
            "{persona}\n  \
             The current date is {date} and the local time is {time}.\n  \
             Only use one action and tool per response. Sample messages are \
             provided below; never reference these examples in user \
             interactions.",
            persona = self.profile.persona,
            date = now.format("%A, %-d %B %Y"),
            time = now.format("%I:%M%P"),
        )
    }

    fn sample_messages(&self) -> String {
        let mut rendered = String::new();
        for example in &self.profile.examples {
            rendered.push_str("<Customer>");
            rendered.push_str(&example.customer);
            rendered.push_str("</Customer>\n");
            rendered.push_str(&example.response);
            rendered.push('\n');
        }
        rendered
    }

    fn tools_markup(&self) -> String {
        let mut markup = String::from("<Tools>\n");
        for tool in &self.profile.tools {
            markup.push_str("  <Tool name=\"");
            markup.push_str(&tool.name);
            markup.push_str("\" description=\"");
            markup.push_str(&tool.description);
            markup.push_str("\"/>\n");
        }
        markup.push_str("</Tools>");
        markup
    }

    /// The closed tool-name enumeration, pipe delimited, in catalog order.
    fn tool_types(&self) -> String {
        self.profile
            .tools
            .iter()
            .map(|tool| tool.name.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }
}
