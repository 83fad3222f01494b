//! Runtime learning.
//!
//! `learn` turns an embedded category body into a plain [`CategoryDef`] by
//! evaluating its `eval` parts against the current captures, then inserts it
//! into the live matcher. `unlearn` removes categories again.

use serde::{Deserialize, Serialize};

use crate::error::{BrainError, TagError};
use crate::pattern::{CategoryDef, Origin};
use crate::template::{Condition, EvalContext, Guard, LearnDef, PatternPart, TemplateNode};

/// Which categories `unlearn` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlearnPolicy {
    /// Only categories created by `learn`.
    #[default]
    LearnedOnly,
    /// Every category, loaded ones included.
    All,
}

/// Resolve every `eval` in a learn body to literal text.
///
/// Nested `learn` blocks in the template are left alone; their `eval`s belong
/// to the turn that eventually runs them.
pub fn literalize(ctx: &mut EvalContext<'_>, def: &LearnDef) -> Result<CategoryDef, BrainError> {
    let pattern = literal_parts(ctx, &def.pattern)?;
    let that = def
        .that
        .as_ref()
        .map(|parts| literal_parts(ctx, parts))
        .transpose()?;
    let topic = def
        .topic
        .as_ref()
        .map(|parts| literal_parts(ctx, parts))
        .transpose()?;
    let template = close(ctx, &def.template)?;
    Ok(CategoryDef {
        pattern,
        that,
        topic,
        template,
    })
}

fn literal_parts(ctx: &mut EvalContext<'_>, parts: &[PatternPart]) -> Result<String, BrainError> {
    let mut text = String::new();
    for part in parts {
        match part {
            PatternPart::Text(t) => text.push_str(t),
            PatternPart::Eval(node) => text.push_str(&ctx.evaluate(node)?),
        }
    }
    Ok(text)
}

fn close_box(ctx: &mut EvalContext<'_>, node: &TemplateNode) -> Result<Box<TemplateNode>, BrainError> {
    close(ctx, node).map(Box::new)
}

/// Copy of `node` with every `eval` outside nested `learn`s replaced by text.
fn close(ctx: &mut EvalContext<'_>, node: &TemplateNode) -> Result<TemplateNode, BrainError> {
    let closed = match node {
        TemplateNode::Eval(content) => TemplateNode::Text(ctx.evaluate(content)?),
        TemplateNode::Sequence(nodes) => TemplateNode::Sequence(
            nodes
                .iter()
                .map(|child| close(ctx, child))
                .collect::<Result<_, _>>()?,
        ),
        TemplateNode::Random(items) => TemplateNode::Random(
            items
                .iter()
                .map(|child| close(ctx, child))
                .collect::<Result<_, _>>()?,
        ),
        TemplateNode::Condition(condition) => {
            let mut guards = Vec::with_capacity(condition.guards.len());
            for guard in &condition.guards {
                guards.push(Guard {
                    predicate: guard.predicate.clone(),
                    value: guard.value.clone(),
                    body: close(ctx, &guard.body)?,
                });
            }
            TemplateNode::Condition(Condition { guards })
        }
        TemplateNode::Srai(content) => TemplateNode::Srai(close_box(ctx, content)?),
        TemplateNode::Think(content) => TemplateNode::Think(close_box(ctx, content)?),
        TemplateNode::Set { name, value } => TemplateNode::Set {
            name: name.clone(),
            value: close_box(ctx, value)?,
        },
        TemplateNode::Map { name, content } => TemplateNode::Map {
            name: name.clone(),
            content: close_box(ctx, content)?,
        },
        TemplateNode::Date {
            locale,
            timezone,
            format,
        } => TemplateNode::Date {
            locale: locale.clone(),
            timezone: timezone.clone(),
            format: close_box(ctx, format)?,
        },
        TemplateNode::Substitute { kind, content } => TemplateNode::Substitute {
            kind: *kind,
            content: close_box(ctx, content)?,
        },
        TemplateNode::Transform { op, content } => TemplateNode::Transform {
            op: *op,
            content: close_box(ctx, content)?,
        },
        TemplateNode::Text(_)
        | TemplateNode::Star { .. }
        | TemplateNode::Sr
        | TemplateNode::Get { .. }
        | TemplateNode::Bot { .. }
        | TemplateNode::Loop
        | TemplateNode::That { .. }
        | TemplateNode::Input { .. }
        | TemplateNode::Request { .. }
        | TemplateNode::Response { .. }
        | TemplateNode::Learn(_)
        | TemplateNode::Unlearn => node.clone(),
    };
    Ok(closed)
}

/// Literalize and insert a learned category.
///
/// A body that does not yield a usable category is logged and skipped. A
/// loaded category the new one replaces is kept aside for `unlearn`.
pub(crate) fn learn(ctx: &mut EvalContext<'_>, def: &LearnDef) -> Result<(), BrainError> {
    let literal = literalize(ctx, def)?;
    match literal.compile(&ctx.core.normalizer, Origin::Learned) {
        Ok(category) => {
            log::info!("Learned category: {}", category.key);
            if let Some(previous) = ctx.core.matcher.insert(category) {
                log::debug!("Replaced {:?} category {}", previous.origin, previous.key);
                if previous.origin == Origin::Loaded {
                    ctx.core.shadowed.insert(previous.key.clone(), previous);
                }
            }
        }
        Err(err) => log::warn!("{}", TagError::MalformedLearnCategory(err.to_string())),
    }
    Ok(())
}

/// Remove categories according to the configured policy.
///
/// Under [`UnlearnPolicy::LearnedOnly`] loaded categories that a `learn`
/// replaced come back.
pub(crate) fn unlearn(ctx: &mut EvalContext<'_>) -> usize {
    let core = &mut *ctx.core;
    let removed = match core.config.unlearn_policy {
        UnlearnPolicy::LearnedOnly => {
            let removed = core
                .matcher
                .remove_where(|category| category.origin == Origin::Learned);
            for (key, category) in core.shadowed.drain() {
                if core.matcher.get(&key).is_none() {
                    log::debug!("Restored loaded category {}", key);
                    core.matcher.insert_shared(category);
                }
            }
            removed
        }
        UnlearnPolicy::All => {
            core.shadowed.clear();
            core.matcher.remove_where(|_| true)
        }
    };
    log::info!("Unlearned {} categories", removed);
    removed
}
