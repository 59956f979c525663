// SPDX-License-Identifier: MIT

//! Projection of a step tree into the compact plan handed to the agent's
//! language model. One-way: the plan is never read back into a tree.

use serde::Serialize;

use super::types::{ConditionBranch, Step};

/// One instruction of the model-facing plan.
/// Absent fields are omitted from the serialized JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmStep {
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub then: Option<Vec<LlmStep>>,
}

pub fn convert_to_llm_format(steps: &[Step]) -> Vec<LlmStep> {
    steps.iter().map(project).collect()
}

fn project(step: &Step) -> LlmStep {
    // `elseif` yields no `condition` key; only `if` and `else` do.
    let condition = step.conditions().and_then(|c| match c.branch {
        ConditionBranch::If => c.expression.clone(),
        ConditionBranch::Else => Some("else".to_string()),
        _ => None,
    });

    let then = if step.children.is_empty() {
        None
    } else {
        Some(convert_to_llm_format(&step.children))
    };

    LlmStep {
        step: step.name.clone(),
        description: step.description.clone(),
        tool: step.tool_name().map(str::to_string),
        condition,
        then,
    }
}

/// Pretty JSON rendering of the plan, as embedded in the agent prompt
pub fn render_plan(steps: &[Step]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&convert_to_llm_format(steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_step() {
        let plan = convert_to_llm_format(&[Step::instruction("Greet the user")]);
        assert_eq!(
            serde_json::to_value(&plan).unwrap(),
            json!([{"step": "Greet the user"}])
        );
    }

    #[test]
    fn test_tool_and_description() {
        let step = Step::tool("Find sources", "web_search").with_description("three links");
        let value = serde_json::to_value(convert_to_llm_format(&[step])).unwrap();

        assert_eq!(value[0]["tool"], "web_search");
        assert_eq!(value[0]["description"], "three links");
        assert!(value[0].get("condition").is_none());
        assert!(value[0].get("then").is_none());
    }

    #[test]
    fn test_branch_conditions() {
        let tree = vec![
            Step::condition(ConditionBranch::If, Some("ticket is urgent".into()))
                .with_children(vec![Step::instruction("Page oncall")]),
            Step::condition(ConditionBranch::ElseIf, Some("ticket is a bug".into()))
                .with_children(vec![Step::instruction("File issue")]),
            Step::condition(ConditionBranch::Else, None),
        ];
        let value = serde_json::to_value(convert_to_llm_format(&tree)).unwrap();

        assert_eq!(value[0]["condition"], "ticket is urgent");
        assert_eq!(value[0]["then"], json!([{"step": "Page oncall"}]));
        assert!(value[1].get("condition").is_none());
        assert_eq!(value[1]["then"][0]["step"], "File issue");
        assert_eq!(value[2]["condition"], "else");
        assert!(value[2].get("then").is_none());
    }

    #[test]
    fn test_if_without_expression_has_no_condition() {
        let plan = convert_to_llm_format(&[Step::condition(ConditionBranch::If, None)]);
        assert_eq!(plan[0].condition, None);
    }

    #[test]
    fn test_render_plan() {
        let text = render_plan(&[Step::instruction("Summarize")]).unwrap();
        assert!(text.contains("\"step\": \"Summarize\""));
    }
}
