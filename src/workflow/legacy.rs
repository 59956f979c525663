// SPDX-License-Identifier: MIT

//! Legacy flat JSON reconciliation
//!
//! Older backends stored steps as one flat ordered list. Condition entries
//! (`if`/`elseif`/`else`) are siblings of the steps they gate, and a gated
//! step names its condition only by repeating the same `conditions` payload.
//! Reconstruction therefore matches dependents to conditions by content.

use std::collections::HashMap;

use serde_json::Value;

use super::nested::{parse_raw_steps, RawStep};
use super::types::Step;
use crate::error::WorkflowError;

struct IndexedCondition<'a> {
    entry: usize,
    gate: Option<&'a Value>,
    step: Step,
}

/// Rebuild a step tree from the legacy flat format.
///
/// 1. Every `condition` entry becomes a step.
/// 2. Every other entry carrying `conditions` is attached as a child of the
///    first condition (in payload order) whose `conditions` is deep-equal.
///    Dependents with no match are dropped.
/// 3. Entries are sorted by `order` (or `step_order`, else 0).
/// 4. Each maximal run of consecutive condition entries becomes one group,
///    stably re-sorted `if` < `elseif` < `else`. Plain entries are emitted
///    as leaves; dependents are not emitted at the top level.
pub fn reconstruct_from_flat_json(steps: &Value) -> Result<Vec<Step>, WorkflowError> {
    let entries = parse_raw_steps(steps)?;

    let mut indexed = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        if entry.is_condition() {
            indexed.push(IndexedCondition {
                entry: i,
                gate: gate(entry),
                step: entry.materialize(&i.to_string())?,
            });
        }
    }

    for (i, entry) in entries.iter().enumerate() {
        if entry.is_condition() {
            continue;
        }
        let Some(conditions) = gate(entry) else {
            continue;
        };

        match indexed.iter_mut().find(|c| c.gate == Some(conditions)) {
            Some(parent) => parent.step.children.push(entry.materialize(&i.to_string())?),
            None => log::warn!(
                "Dropping legacy step '{}' at position {}: no condition matches {}",
                entry.name.as_deref().unwrap_or_default(),
                i,
                conditions
            ),
        }
    }

    let mut condition_steps: HashMap<usize, Step> =
        indexed.into_iter().map(|c| (c.entry, c.step)).collect();

    let mut sorted: Vec<usize> = (0..entries.len()).collect();
    sorted.sort_by_key(|&i| entries[i].effective_order());

    let mut result = Vec::new();
    let mut cursor = 0;
    while cursor < sorted.len() {
        let index = sorted[cursor];
        let entry = &entries[index];

        if entry.is_condition() {
            let mut group = Vec::new();
            while cursor < sorted.len() && entries[sorted[cursor]].is_condition() {
                if let Some(step) = condition_steps.remove(&sorted[cursor]) {
                    group.push(step);
                }
                cursor += 1;
            }
            group.sort_by_key(|step| step.conditions().map_or(0, |c| c.branch.priority()));
            result.extend(group);
            continue;
        }

        if gate(entry).is_none() {
            result.push(entry.materialize(&index.to_string())?);
        }
        cursor += 1;
    }

    Ok(result)
}

/// The entry's `conditions` payload, if it is truthy.
/// `null`, `false`, `0` and `""` all mean the entry is ungated.
fn gate(entry: &RawStep) -> Option<&Value> {
    entry.conditions.as_ref().filter(|value| match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{ConditionBranch, StepKind};
    use serde_json::json;

    fn branch(step: &Step) -> ConditionBranch {
        step.conditions().map(|c| c.branch.clone()).unwrap()
    }

    #[test]
    fn test_empty_payload() {
        assert!(reconstruct_from_flat_json(&json!([])).unwrap().is_empty());
        assert!(reconstruct_from_flat_json(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_if_else_with_children() {
        let steps = reconstruct_from_flat_json(&json!([
            {"id": "c1", "type": "condition", "conditions": {"type": "if", "expression": "x>0"}, "order": 0},
            {"id": "s1", "type": "instruction", "conditions": {"type": "if", "expression": "x>0"}, "order": 1},
            {"id": "c2", "type": "condition", "conditions": {"type": "else"}, "order": 2}
        ]))
        .unwrap();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, "c1");
        assert_eq!(branch(&steps[0]), ConditionBranch::If);
        assert_eq!(steps[0].children.len(), 1);
        assert_eq!(steps[0].children[0].id, "s1");
        assert_eq!(steps[1].id, "c2");
        assert_eq!(branch(&steps[1]), ConditionBranch::Else);
        assert!(steps[1].children.is_empty());
    }

    #[test]
    fn test_chain_sorted_by_branch_priority() {
        let steps = reconstruct_from_flat_json(&json!([
            {"id": "else", "type": "condition", "conditions": {"type": "else"}, "order": 1},
            {"id": "elif-a", "type": "condition", "conditions": {"type": "elseif", "expression": "a"}, "order": 2},
            {"id": "if", "type": "condition", "conditions": {"type": "if", "expression": "x"}, "order": 3},
            {"id": "elif-b", "type": "condition", "conditions": {"type": "elseif", "expression": "b"}, "order": 4},
            {"id": "under-a", "type": "instruction", "conditions": {"type": "elseif", "expression": "a"}, "order": 5},
            {"id": "under-b", "type": "instruction", "conditions": {"expression": "b", "type": "elseif"}, "order": 6}
        ]))
        .unwrap();

        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["if", "elif-a", "elif-b", "else"]);
        assert_eq!(steps[1].children[0].id, "under-a");
        // key order inside `conditions` does not affect matching
        assert_eq!(steps[2].children[0].id, "under-b");
    }

    #[test]
    fn test_unmatched_dependent_is_dropped() {
        let steps = reconstruct_from_flat_json(&json!([
            {"id": "c1", "type": "condition", "conditions": {"type": "if", "expression": "x"}, "order": 0},
            {"id": "orphan", "type": "instruction", "conditions": {"type": "if", "expression": "y"}, "order": 1},
            {"id": "plain", "type": "instruction", "order": 2}
        ]))
        .unwrap();

        fn contains(steps: &[Step], id: &str) -> bool {
            steps
                .iter()
                .any(|s| s.id == id || contains(&s.children, id))
        }

        assert!(!contains(&steps, "orphan"));
        assert!(contains(&steps, "plain"));
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_first_matching_condition_wins() {
        let steps = reconstruct_from_flat_json(&json!([
            {"id": "first", "type": "condition", "conditions": {"type": "if", "expression": "x"}, "order": 0},
            {"id": "gap", "type": "instruction", "order": 1},
            {"id": "second", "type": "condition", "conditions": {"type": "if", "expression": "x"}, "order": 2},
            {"id": "dep", "type": "instruction", "conditions": {"type": "if", "expression": "x"}, "order": 3}
        ]))
        .unwrap();

        assert_eq!(steps[0].id, "first");
        assert_eq!(steps[0].children.len(), 1);
        assert_eq!(steps[2].id, "second");
        assert!(steps[2].children.is_empty());
    }

    #[test]
    fn test_non_contiguous_chains_stay_separate() {
        let steps = reconstruct_from_flat_json(&json!([
            {"id": "else1", "type": "condition", "conditions": {"type": "else"}, "order": 0},
            {"id": "mid", "type": "instruction", "order": 1},
            {"id": "if2", "type": "condition", "conditions": {"type": "if", "expression": "z"}, "order": 2}
        ]))
        .unwrap();

        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["else1", "mid", "if2"]);
    }

    #[test]
    fn test_step_order_fallback_and_defaults() {
        let steps = reconstruct_from_flat_json(&json!([
            {"id": "late", "name": "late", "step_order": 5},
            {"id": "early", "name": "early", "step_order": 1, "enabled": false}
        ]))
        .unwrap();

        assert_eq!(steps[0].id, "early");
        assert_eq!(steps[0].order, 1);
        assert!(!steps[0].enabled);
        assert_eq!(steps[1].id, "late");
        assert_eq!(steps[1].kind, StepKind::Instruction);
        assert_eq!(steps[1].description.as_deref(), Some(""));
    }

    #[test]
    fn test_null_conditions_is_standalone() {
        let steps = reconstruct_from_flat_json(&json!([
            {"id": "s", "type": "instruction", "conditions": null, "order": 0}
        ]))
        .unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].id, "s");
    }

    #[test]
    fn test_nested_children_are_ignored() {
        let steps = reconstruct_from_flat_json(&json!([
            {"id": "p", "order": 0, "children": [{"id": "kid"}]}
        ]))
        .unwrap();
        assert!(steps[0].children.is_empty());
    }

    #[test]
    fn test_falsy_conditions_are_standalone() {
        let steps = reconstruct_from_flat_json(&json!([
            {"id": "a", "type": "instruction", "conditions": false, "order": 0},
            {"id": "b", "type": "instruction", "conditions": "", "order": 1},
            {"id": "c", "type": "instruction", "conditions": 0, "order": 2}
        ]))
        .unwrap();

        let ids: Vec<&str> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_condition_without_branch_type_keeps_dependents() {
        let steps = reconstruct_from_flat_json(&json!([
            {"id": "c1", "type": "condition", "conditions": {"expression": "x>0"}, "order": 0},
            {"id": "s1", "type": "instruction", "conditions": {"expression": "x>0"}, "order": 1},
            {"id": "c2", "type": "condition", "conditions": {"type": "else"}, "order": 2}
        ]))
        .unwrap();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, "c1");
        assert!(steps[0].conditions().unwrap().branch.is_untagged());
        assert_eq!(steps[0].children[0].id, "s1");
        assert_eq!(branch(&steps[1]), ConditionBranch::Else);
    }
}
