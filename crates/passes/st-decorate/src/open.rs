//! Open parent/child binding: nearest preceding compatible decorator

use crate::compose::{candidates, describe, Links, Pending};
use crate::error::CompositionError;
use st_types::{TypeId, TypeRegistry};
use std::fmt::Write as _;

/// Bind each decorator that asks for an ancestor to the nearest preceding
/// decorator whose role is assignable to it.
///
/// Children are linked walking the list backward and prepending, so each
/// parent enumerates its children in declaration order.
pub(crate) fn bind(registry: &TypeRegistry, owner: TypeId, pending: &[Pending]) -> Result<Links, CompositionError> {
    let mut links = Links::with_len(pending.len());
    let mut missing: Vec<Option<TypeId>> = vec![None; pending.len()];

    for (idx, item) in pending.iter().enumerate() {
        let Some(expected) = item.decorator.expected_parent() else {
            continue;
        };
        let found = (0..idx)
            .rev()
            .find(|prior| registry.is_assignable_from(expected, pending[*prior].role));
        match found {
            Some(parent) => links.parent[idx] = Some(parent),
            None => missing[idx] = Some(expected),
        }
    }

    if missing.iter().any(Option::is_some) {
        return Err(CompositionError::Binding {
            entity: registry.name(owner).to_string(),
            report: report(registry, owner, pending, &missing),
        });
    }

    for idx in (0..pending.len()).rev() {
        if let Some(parent) = links.parent[idx] {
            links.next_sibling[idx] = links.first_child[parent];
            links.first_child[parent] = Some(idx);
        }
    }
    Ok(links)
}

fn report(registry: &TypeRegistry, owner: TypeId, pending: &[Pending], missing: &[Option<TypeId>]) -> String {
    let mut out = format!("Decorator tree on `{}` cannot be built:", registry.name(owner));
    for (item, expected) in pending.iter().zip(missing) {
        out.push('\n');
        out.push_str(&describe(registry, item));
        let Some(expected) = expected else {
            continue;
        };
        let qualifying: Vec<&Pending> = pending
            .iter()
            .filter(|other| other.position != item.position)
            .filter(|other| registry.is_assignable_from(*expected, other.role))
            .collect();
        if qualifying.is_empty() {
            let _ = write!(
                out,
                ": requires a parent of type `{}`, but no such decorator is declared.",
                registry.name(*expected)
            );
        } else {
            let _ = write!(
                out,
                ": requires a parent of type `{}`; move it below one of: {}.",
                registry.name(*expected),
                candidates(registry, qualifying.into_iter())
            );
        }
    }
    out
}
