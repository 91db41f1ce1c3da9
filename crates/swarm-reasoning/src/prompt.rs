//! Prompt templates for the reasoning backend.
//!
//! Templates are embedded string constants registered with a minijinja
//! environment at startup; the prompts are small and fixed, so there is no
//! file loading. Every template instructs the model to answer with a single
//! JSON object so the parse step stays uniform.

use minijinja::{context, Environment};

use swarm_types::Personality;

use crate::error::ReasoningError;

/// A rendered system + user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System prompt.
    pub system: String,
    /// User prompt.
    pub user: String,
}

const SYSTEM_TEMPLATE: &str = "\
You are {{ name }}, an autonomous swarm agent specialized in {{ specialization }}. \
Personality: curiosity {{ curiosity }}, diligence {{ diligence }}, boldness {{ boldness }}, \
sociability {{ sociability }}. \
You reason about space-science datasets and coordinate with peers only through \
signed signals. Answer with a single JSON object and nothing else.";

const THINK_TEMPLATE: &str = "\
Trigger: {{ trigger }}
Observation: {{ observation }}
Context: {{ context }}

Think this through and reply as JSON:
{\"observation\": string, \"reasoning\": string, \"conclusion\": string, \
\"suggestedActions\": [string], \"confidence\": number between 0 and 1}";

const SYNTHESIZE_TEMPLATE: &str = "\
You absorbed {{ count }} signals from peers this cycle:
{% for signal in signals %}- [{{ signal.domain }}] {{ signal.content }} \
(confidence {{ signal.confidence }})
{% endfor %}
Synthesize what the swarm appears to be converging on and reply as JSON:
{\"observation\": string, \"reasoning\": string, \"conclusion\": string, \
\"suggestedActions\": [string], \"confidence\": number between 0 and 1}";

const COLLECTIVE_REPORT_TEMPLATE: &str = "\
The swarm crossed its phase transition on topic \"{{ topic }}\".
Topics studied so far: {{ topics }}.
Evidence bundle:
{% for item in bundle %}- {{ item.producerName }} ({{ item.specialization }}): \
observed {{ item.observation }}; reasoned {{ item.reasoning }}; concluded \
{{ item.conclusion }} (confidence {{ item.confidence }})
{% endfor %}
Assemble the collective report as JSON:
{\"overview\": string, \"keyFindings\": [string], \"opinions\": string, \
\"improvements\": [string], \"verdict\": string}";

/// Template engine with all prompts registered.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Build the engine and register the embedded templates.
    ///
    /// Registration of the constants cannot fail at runtime unless a
    /// template constant itself is malformed, which the tests pin down.
    pub fn new() -> Result<Self, ReasoningError> {
        let mut env = Environment::new();
        for (name, source) in [
            ("system", SYSTEM_TEMPLATE),
            ("think", THINK_TEMPLATE),
            ("synthesize", SYNTHESIZE_TEMPLATE),
            ("collective_report", COLLECTIVE_REPORT_TEMPLATE),
        ] {
            env.add_template(name, source)
                .map_err(|e| ReasoningError::Template(format!("register {name}: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Render the shared system prompt for an agent.
    pub fn render_system(
        &self,
        name: &str,
        specialization: &str,
        personality: &Personality,
    ) -> Result<String, ReasoningError> {
        self.render(
            "system",
            context! {
                name => name,
                specialization => specialization,
                curiosity => rounded(personality.curiosity),
                diligence => rounded(personality.diligence),
                boldness => rounded(personality.boldness),
                sociability => rounded(personality.sociability),
            },
        )
    }

    /// Render the solo-think user prompt.
    pub fn render_think(
        &self,
        trigger: &str,
        observation: &str,
        context_text: &str,
    ) -> Result<String, ReasoningError> {
        self.render(
            "think",
            context! {
                trigger => trigger,
                observation => observation,
                context => context_text,
            },
        )
    }

    /// Render the absorbed-signal synthesis user prompt.
    ///
    /// `signals` is a pre-projected list of `{domain, content, confidence}`
    /// objects.
    pub fn render_synthesize(
        &self,
        signals: &[serde_json::Value],
    ) -> Result<String, ReasoningError> {
        self.render(
            "synthesize",
            context! {
                count => signals.len(),
                signals => signals,
            },
        )
    }

    /// Render the collective-report user prompt.
    pub fn render_collective_report(
        &self,
        topic: &str,
        topics: &[String],
        bundle: &[serde_json::Value],
    ) -> Result<String, ReasoningError> {
        self.render(
            "collective_report",
            context! {
                topic => topic,
                topics => topics.join(", "),
                bundle => bundle,
            },
        )
    }

    fn render(
        &self,
        name: &str,
        ctx: minijinja::value::Value,
    ) -> Result<String, ReasoningError> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| ReasoningError::Template(format!("lookup {name}: {e}")))?;
        template
            .render(ctx)
            .map_err(|e| ReasoningError::Template(format!("render {name}: {e}")))
    }
}

/// Two-decimal rounding for personality values in prompts.
fn rounded(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn personality() -> Personality {
        Personality {
            curiosity: 0.913,
            diligence: 0.4,
            boldness: 0.7,
            sociability: 0.5,
        }
    }

    #[test]
    fn all_templates_register() {
        assert!(PromptEngine::new().is_ok());
    }

    #[test]
    fn system_prompt_mentions_agent() {
        let engine = PromptEngine::new().unwrap();
        let system = engine
            .render_system("Vela", "dataset analysis", &personality())
            .unwrap();
        assert!(system.contains("Vela"));
        assert!(system.contains("dataset analysis"));
        assert!(system.contains("0.91"));
    }

    #[test]
    fn think_prompt_carries_fields() {
        let engine = PromptEngine::new().unwrap();
        let user = engine
            .render_think("new dataset", "pressure dropped 12%", "step 9")
            .unwrap();
        assert!(user.contains("pressure dropped 12%"));
        assert!(user.contains("suggestedActions"));
    }

    #[test]
    fn synthesize_prompt_lists_signals() {
        let engine = PromptEngine::new().unwrap();
        let signals = vec![
            serde_json::json!({"domain": "solar_activity", "content": "flare spike", "confidence": 0.8}),
            serde_json::json!({"domain": "mars_weather", "content": "dust storm", "confidence": 0.6}),
        ];
        let user = engine.render_synthesize(&signals).unwrap();
        assert!(user.contains("flare spike"));
        assert!(user.contains("dust storm"));
        assert!(user.contains("2 signals"));
    }

    #[test]
    fn collective_report_prompt_shape() {
        let engine = PromptEngine::new().unwrap();
        let bundle = vec![serde_json::json!({
            "producerName": "Vela",
            "specialization": "dataset analysis",
            "observation": "o",
            "reasoning": "r",
            "conclusion": "c",
            "confidence": 0.7,
        })];
        let user = engine
            .render_collective_report(
                "solar_activity",
                &[String::from("solar_activity"), String::from("exoplanets")],
                &bundle,
            )
            .unwrap();
        assert!(user.contains("phase transition"));
        assert!(user.contains("Vela"));
        assert!(user.contains("keyFindings"));
    }
}
