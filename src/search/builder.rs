//! Folds compiled criteria into one query predicate.

use tracing::warn;

use crate::search::compiler::compile;
use crate::search::criterion::Criterion;
use crate::search::descriptor::DescriptorFactory;
use crate::search::error::SearchError;
use crate::search::operators::OperatorRegistry;
use crate::search::predicate::Compiled;

/// Compile `criteria` and fold them left to right.
///
/// An empty list means "no filter" and matches every record. Each
/// criterion gets its own descriptor from `factory`; a criterion whose
/// descriptor cannot be built is skipped and the rest still apply. The
/// first compiled result seeds the running predicate and every later
/// one joins it with OR when its `or_with_previous` flag is set, AND
/// otherwise.
pub fn build(
    criteria: &[Criterion],
    factory: &dyn DescriptorFactory,
    registry: &OperatorRegistry,
) -> Result<Compiled, SearchError> {
    let mut running: Option<Compiled> = None;

    for criterion in criteria {
        let descriptor = match factory.create() {
            Ok(descriptor) => descriptor,
            Err(err) => {
                warn!(
                    key = criterion.key(),
                    operator = criterion.operator(),
                    error = %format!("{err:#}"),
                    "skipping criterion; descriptor unavailable"
                );
                continue;
            }
        };

        let compiled = compile(criterion, &descriptor, descriptor.root(), registry)?;
        running = Some(match running {
            None => compiled,
            Some(acc) if criterion.or_with_previous() => acc.or(compiled),
            Some(acc) => acc.and(compiled),
        });
    }

    Ok(running.unwrap_or(Compiled::NoRestriction))
}
