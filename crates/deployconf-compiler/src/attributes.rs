//! Model attribute inference
//!
//! Each field takes the first non-null value of model then family. A missing
//! thinking capability is inferred from the capability variant, and
//! `instruct` or non-hybrid `base` variants never expose a reasoning parser.

use crate::source::LlmAttributeSource;
use deployconf_types::{LlmAttributes, ThinkingCapability};

/// Attributes after inheritance; thinking capability may still be unknown
/// when there is no capability context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAttributes {
    pub thinking_capability: Option<ThinkingCapability>,
    pub tool_parser: Option<String>,
    pub reasoning_parser: Option<String>,
    pub chat_template: Option<String>,
}

impl ResolvedAttributes {
    pub fn into_llm_attributes(self, default_thinking: ThinkingCapability) -> LlmAttributes {
        LlmAttributes {
            thinking_capability: self.thinking_capability.unwrap_or(default_thinking),
            tool_parser: self.tool_parser,
            reasoning_parser: self.reasoning_parser,
            chat_template: self.chat_template,
        }
    }
}

pub fn build_model_attributes(
    family: &impl LlmAttributeSource,
    model: &impl LlmAttributeSource,
    capability: Option<&str>,
) -> ResolvedAttributes {
    let family = family.llm_fields();
    let model = model.llm_fields();

    let thinking_capability = model
        .thinking_capability
        .into_option()
        .or(family.thinking_capability.into_option())
        .or_else(|| {
            capability.map(|cap| match cap {
                "thinking" => ThinkingCapability::Thinking,
                _ => ThinkingCapability::NonThinking,
            })
        });

    let tool_parser = model.tool_parser.into_option().or(family.tool_parser.into_option());
    let mut reasoning_parser = model
        .reasoning_parser
        .into_option()
        .or(family.reasoning_parser.into_option());
    let chat_template = model
        .chat_template
        .into_option()
        .or(family.chat_template.into_option());

    let strips_reasoning = match capability {
        Some("instruct") => true,
        Some("base") => thinking_capability != Some(ThinkingCapability::Hybrid),
        _ => false,
    };
    if strips_reasoning {
        reasoning_parser = None;
    }

    ResolvedAttributes {
        thinking_capability,
        tool_parser,
        reasoning_parser,
        chat_template,
    }
}
