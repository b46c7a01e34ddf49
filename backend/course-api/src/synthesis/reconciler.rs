use crate::error::{CourseError, CourseResult};
use crate::models::course::Module;

fn unfinalized(mut module: Module) -> Module {
    module.is_finalized = false;
    module
}

/// Merge freshly generated modules into the caller's draft, position by position.
///
/// Without a draft every generated module is kept as non-finalized. With a
/// draft, finalized positions and positions the model did not return are kept
/// verbatim, the rest are replaced, and surplus generated modules are appended.
pub fn reconcile(existing: Option<&[Module]>, generated: Vec<Module>) -> Vec<Module> {
    let Some(existing) = existing else {
        return generated.into_iter().map(unfinalized).collect();
    };

    let mut generated = generated.into_iter();
    let mut merged = Vec::with_capacity(existing.len());

    for current in existing {
        let candidate = generated.next();
        match candidate {
            Some(fresh) if !current.is_finalized => merged.push(unfinalized(fresh)),
            _ => merged.push(current.clone()),
        }
    }

    merged.extend(generated.map(unfinalized));

    tracing::debug!(
        existing = existing.len(),
        merged = merged.len(),
        finalized = existing.iter().filter(|m| m.is_finalized).count(),
        "Reconciled generated modules with draft"
    );

    merged
}

fn check_index(modules: &[Module], index: usize) -> CourseResult<()> {
    if index >= modules.len() {
        return Err(CourseError::ModuleIndexOutOfRange {
            index,
            len: modules.len(),
        });
    }
    Ok(())
}

/// Drop the module at `index`, keeping the order of the rest.
pub fn remove_module(modules: &mut Vec<Module>, index: usize) -> CourseResult<Module> {
    check_index(modules, index)?;
    Ok(modules.remove(index))
}

/// Replace every field of a non-finalized module; the result stays unfinalized.
pub fn edit_module(modules: &mut [Module], index: usize, replacement: Module) -> CourseResult<()> {
    check_index(modules, index)?;
    if modules[index].is_finalized {
        return Err(CourseError::ModuleFinalized(index));
    }
    modules[index] = unfinalized(replacement);
    Ok(())
}

pub fn set_finalized(modules: &mut [Module], index: usize, finalized: bool) -> CourseResult<()> {
    check_index(modules, index)?;
    modules[index].is_finalized = finalized;
    Ok(())
}

/// Flip the finalized flag and return the new value.
pub fn toggle_finalized(modules: &mut [Module], index: usize) -> CourseResult<bool> {
    check_index(modules, index)?;
    let module = &mut modules[index];
    module.is_finalized = !module.is_finalized;
    Ok(module.is_finalized)
}
