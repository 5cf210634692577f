//! Assignment validation as an ordered rule list.
//!
//! Each rule is an independent predicate over the task, the candidate
//! member, and the member's current workload. Rules run in order and
//! evaluation short-circuits on the first failure; warnings accumulate
//! without blocking the assignment.

use crate::types::{Member, Task};

/// Outcome of a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Pass,
    Warning(String),
    Failure(String),
}

/// Combined verdict over the whole rule list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted { warnings: Vec<String> },
    Rejected(String),
}

type Rule = fn(&Task, &Member, i32) -> RuleOutcome;

/// Rules in evaluation order: hard checks first, advisory checks after.
const RULES: &[Rule] = &[skill_coverage, workload_limit, workload_pressure];

/// The member must cover every required skill of the task.
fn skill_coverage(task: &Task, member: &Member, _workload: i32) -> RuleOutcome {
    for needed in &task.required_skills {
        if !member.skills.contains(needed) {
            return RuleOutcome::Failure(format!(
                "member '{}' is missing required skill: {}",
                member.name, needed
            ));
        }
    }
    RuleOutcome::Pass
}

/// The member must have spare capacity for in-progress work.
fn workload_limit(_task: &Task, member: &Member, workload: i32) -> RuleOutcome {
    if workload >= member.capacity {
        return RuleOutcome::Failure(format!(
            "member '{}' is at capacity ({}/{})",
            member.name, workload, member.capacity
        ));
    }
    RuleOutcome::Pass
}

/// Warn when the assignment would leave no spare capacity.
fn workload_pressure(_task: &Task, member: &Member, workload: i32) -> RuleOutcome {
    if workload == member.capacity - 1 {
        return RuleOutcome::Warning(format!(
            "member '{}' will be at capacity after this assignment",
            member.name
        ));
    }
    RuleOutcome::Pass
}

/// Run the rule list for assigning `task` to `member`.
///
/// `workload` is the member's current number of in-progress tasks.
pub fn evaluate(task: &Task, member: &Member, workload: i32) -> Verdict {
    let mut warnings = Vec::new();

    for rule in RULES {
        match rule(task, member, workload) {
            RuleOutcome::Pass => {}
            RuleOutcome::Warning(msg) => warnings.push(msg),
            RuleOutcome::Failure(msg) => return Verdict::Rejected(msg),
        }
    }

    Verdict::Accepted { warnings }
}
