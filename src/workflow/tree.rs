// SPDX-License-Identifier: MIT

//! In-place edits on a step tree
//!
//! These are the mutations the workflow builder performs between loading
//! and saving. None of them validate branch ordering; that is only imposed
//! when reconciling legacy payloads.

use super::types::Step;
use crate::error::WorkflowError;

/// Direction for [`move_step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

pub fn find<'a>(steps: &'a [Step], id: &str) -> Option<&'a Step> {
    for step in steps {
        if step.id == id {
            return Some(step);
        }
        if let Some(found) = find(&step.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_mut<'a>(steps: &'a mut [Step], id: &str) -> Option<&'a mut Step> {
    for step in steps.iter_mut() {
        if step.id == id {
            return Some(step);
        }
        if let Some(found) = find_mut(&mut step.children, id) {
            return Some(found);
        }
    }
    None
}

/// The sibling list that contains `id`
fn siblings_mut<'a>(steps: &'a mut Vec<Step>, id: &str) -> Option<&'a mut Vec<Step>> {
    if steps.iter().any(|s| s.id == id) {
        return Some(steps);
    }
    for step in steps.iter_mut() {
        if let Some(found) = siblings_mut(&mut step.children, id) {
            return Some(found);
        }
    }
    None
}

/// Insert `step` under `parent` (or at the root) at `index`, appending when
/// `index` is `None` or past the end.
pub fn insert(
    steps: &mut Vec<Step>,
    parent: Option<&str>,
    index: Option<usize>,
    step: Step,
) -> Result<(), WorkflowError> {
    let target = match parent {
        None => steps,
        Some(parent_id) => {
            &mut find_mut(steps, parent_id)
                .ok_or_else(|| WorkflowError::StepNotFound(parent_id.to_string()))?
                .children
        }
    };

    let at = index.unwrap_or(target.len()).min(target.len());
    target.insert(at, step);
    renumber(target);
    Ok(())
}

/// Insert `step` right after the sibling `after_id`, e.g. an `elseif`
/// following an `if`.
pub fn insert_after(steps: &mut Vec<Step>, after_id: &str, step: Step) -> Result<(), WorkflowError> {
    let siblings = siblings_mut(steps, after_id)
        .ok_or_else(|| WorkflowError::StepNotFound(after_id.to_string()))?;
    let pos = siblings
        .iter()
        .position(|s| s.id == after_id)
        .ok_or_else(|| WorkflowError::StepNotFound(after_id.to_string()))?;

    siblings.insert(pos + 1, step);
    renumber(siblings);
    Ok(())
}

/// Remove the step `id` (with its subtree) from anywhere in the tree
pub fn remove(steps: &mut Vec<Step>, id: &str) -> Option<Step> {
    if let Some(pos) = steps.iter().position(|s| s.id == id) {
        let removed = steps.remove(pos);
        renumber(steps);
        return Some(removed);
    }
    steps.iter_mut().find_map(|s| remove(&mut s.children, id))
}

/// Swap the step with its neighbour. Returns `false` when already at the edge.
pub fn move_step(steps: &mut Vec<Step>, id: &str, direction: Direction) -> Result<bool, WorkflowError> {
    let siblings =
        siblings_mut(steps, id).ok_or_else(|| WorkflowError::StepNotFound(id.to_string()))?;
    let pos = siblings
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| WorkflowError::StepNotFound(id.to_string()))?;

    let other = match direction {
        Direction::Up if pos > 0 => pos - 1,
        Direction::Down if pos + 1 < siblings.len() => pos + 1,
        _ => return Ok(false),
    };

    siblings.swap(pos, other);
    renumber(siblings);
    Ok(true)
}

pub fn set_enabled(steps: &mut [Step], id: &str, enabled: bool) -> Result<(), WorkflowError> {
    let step = find_mut(steps, id).ok_or_else(|| WorkflowError::StepNotFound(id.to_string()))?;
    step.enabled = enabled;
    Ok(())
}

/// Total number of steps, including nested ones
pub fn count(steps: &[Step]) -> usize {
    steps.iter().map(|s| 1 + count(&s.children)).sum()
}

/// Sibling orders follow list position
fn renumber(siblings: &mut [Step]) {
    for (i, step) in siblings.iter_mut().enumerate() {
        step.order = i as i64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::ConditionBranch;

    fn sample() -> Vec<Step> {
        vec![
            Step::instruction("start").with_id("a"),
            Step::condition(ConditionBranch::If, Some("x".into()))
                .with_id("c1")
                .with_children(vec![
                    Step::instruction("inner one").with_id("i1"),
                    Step::instruction("inner two").with_id("i2"),
                ]),
            Step::instruction("end").with_id("z"),
        ]
    }

    fn ids(steps: &[Step]) -> Vec<&str> {
        steps.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_find_nested() {
        let steps = sample();
        assert_eq!(find(&steps, "i2").map(|s| s.name.as_str()), Some("inner two"));
        assert!(find(&steps, "missing").is_none());
    }

    #[test]
    fn test_insert_under_parent() {
        let mut steps = sample();
        insert(&mut steps, Some("c1"), Some(0), Step::instruction("first").with_id("n")).unwrap();

        let parent = find(&steps, "c1").unwrap();
        assert_eq!(ids(&parent.children), vec!["n", "i1", "i2"]);
        assert_eq!(parent.children[2].order, 2);
    }

    #[test]
    fn test_insert_root_appends() {
        let mut steps = sample();
        insert(&mut steps, None, Some(99), Step::instruction("last").with_id("n")).unwrap();
        assert_eq!(ids(&steps), vec!["a", "c1", "z", "n"]);
    }

    #[test]
    fn test_insert_unknown_parent() {
        let mut steps = sample();
        let err = insert(&mut steps, Some("nope"), None, Step::instruction("x")).unwrap_err();
        assert!(matches!(err, WorkflowError::StepNotFound(id) if id == "nope"));
    }

    #[test]
    fn test_insert_after_builds_chain() {
        let mut steps = sample();
        insert_after(
            &mut steps,
            "c1",
            Step::condition(ConditionBranch::Else, None).with_id("c2"),
        )
        .unwrap();
        assert_eq!(ids(&steps), vec!["a", "c1", "c2", "z"]);
    }

    #[test]
    fn test_remove_nested() {
        let mut steps = sample();
        let removed = remove(&mut steps, "i1").unwrap();
        assert_eq!(removed.id, "i1");
        assert_eq!(count(&steps), 4);
        assert_eq!(find(&steps, "i2").unwrap().order, 0);
        assert!(remove(&mut steps, "i1").is_none());
    }

    #[test]
    fn test_move_step() {
        let mut steps = sample();
        assert!(move_step(&mut steps, "i2", Direction::Up).unwrap());
        assert_eq!(ids(&find(&steps, "c1").unwrap().children), vec!["i2", "i1"]);

        assert!(!move_step(&mut steps, "a", Direction::Up).unwrap());
        assert!(!move_step(&mut steps, "z", Direction::Down).unwrap());
        assert!(move_step(&mut steps, "missing", Direction::Down).is_err());
    }

    #[test]
    fn test_set_enabled() {
        let mut steps = sample();
        set_enabled(&mut steps, "i1", false).unwrap();
        assert!(!find(&steps, "i1").unwrap().enabled);
    }

    #[test]
    fn test_count() {
        assert_eq!(count(&sample()), 5);
        assert_eq!(count(&[]), 0);
    }
}
