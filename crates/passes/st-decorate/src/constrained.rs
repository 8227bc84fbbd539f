//! Constrained primary/secondary binding: strictly the active primary

use crate::compose::{candidates, describe, ConstrainedFamily, Links, Pending};
use crate::error::CompositionError;
use st_types::{TypeId, TypeRegistry};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy)]
enum Failure {
    NoPrimary { expected: TypeId },
    Mismatch { active: usize, expected: TypeId },
}

impl Failure {
    fn expected(self) -> TypeId {
        match self {
            Self::NoPrimary { expected } | Self::Mismatch { expected, .. } => expected,
        }
    }
}

/// Bind each secondary to the currently active primary.
///
/// A primary replaces the active one and resets the secondary cursor; older
/// primaries are never searched. Secondaries are appended to their primary in
/// declaration order.
pub(crate) fn bind(
    registry: &TypeRegistry,
    owner: TypeId,
    family: ConstrainedFamily,
    pending: &[Pending],
) -> Result<Links, CompositionError> {
    let mut links = Links::with_len(pending.len());
    let mut failures: Vec<Option<Failure>> = vec![None; pending.len()];
    let mut current_primary: Option<usize> = None;
    let mut current_secondary: Option<usize> = None;

    for (idx, item) in pending.iter().enumerate() {
        if registry.is_assignable_from(family.primary, item.role) {
            current_primary = Some(idx);
            current_secondary = None;
            continue;
        }
        let expected = item.decorator.expected_primary().unwrap_or(family.primary);
        match current_primary {
            None => failures[idx] = Some(Failure::NoPrimary { expected }),
            Some(primary) if registry.is_assignable_from(expected, pending[primary].role) => {
                links.parent[idx] = Some(primary);
                match current_secondary {
                    Some(previous) => links.next_sibling[previous] = Some(idx),
                    None => links.first_child[primary] = Some(idx),
                }
                current_secondary = Some(idx);
            }
            Some(active) => failures[idx] = Some(Failure::Mismatch { active, expected }),
        }
    }

    if failures.iter().any(Option::is_some) {
        return Err(CompositionError::Binding {
            entity: registry.name(owner).to_string(),
            report: report(registry, owner, family, pending, &failures),
        });
    }
    Ok(links)
}

fn report(
    registry: &TypeRegistry,
    owner: TypeId,
    family: ConstrainedFamily,
    pending: &[Pending],
    failures: &[Option<Failure>],
) -> String {
    let mut out = format!("Primary/secondary decorators on `{}` cannot be bound:", registry.name(owner));
    for (item, failure) in pending.iter().zip(failures) {
        out.push('\n');
        out.push_str(&describe(registry, item));
        let Some(failure) = failure else {
            continue;
        };
        match failure {
            Failure::NoPrimary { .. } => out.push_str(": Missing a primary attribute above this one."),
            Failure::Mismatch { active, expected } => {
                let _ = write!(
                    out,
                    ": expects a primary of type `{}` but the active primary is `{}`.",
                    registry.name(*expected),
                    registry.name(pending[*active].role)
                );
            }
        }
        let expected = failure.expected();
        let satisfying: Vec<&Pending> = pending
            .iter()
            .filter(|other| registry.is_assignable_from(family.primary, other.role))
            .filter(|other| registry.is_assignable_from(expected, other.role))
            .collect();
        if satisfying.is_empty() {
            out.push_str(" No declared primary satisfies it.");
        } else {
            let _ = write!(
                out,
                " Primaries that would satisfy it: {}.",
                candidates(registry, satisfying.into_iter())
            );
        }
    }
    out
}
