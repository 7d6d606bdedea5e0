//! First pass: discover every output a project's custom steps produce.

use std::collections::{HashMap, HashSet};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use super::Owner;
use crate::ast::{OutputDecl, Project, Target, TargetKind};
use crate::outputs::OutputTracker;

/// Sub-targets of the dashboard umbrellas that are never emitted.
const DASHBOARD_UMBRELLAS: [&str; 3] = ["Nightly", "Continuous", "Experimental"];

/// Returns `true` for targets that get a `%Target` entry of their own.
#[must_use]
pub fn is_emitted(target: &Target) -> bool {
    match target.kind {
        TargetKind::Executable
        | TargetKind::StaticLibrary
        | TargetKind::SharedLibrary
        | TargetKind::ModuleLibrary => true,
        TargetKind::Utility => !DASHBOARD_UMBRELLAS
            .iter()
            .any(|umbrella| target.name.starts_with(umbrella) && target.name != *umbrella),
        TargetKind::ObjectLibrary | TargetKind::InterfaceLibrary | TargetKind::Global => false,
    }
}

/// Returns `true` for targets whose files can reach a description, either
/// directly or by being inlined into a dependent.
fn contributes_files(target: &Target) -> bool {
    target.kind == TargetKind::ObjectLibrary || is_emitted(target)
}

/// Anchor a possibly relative path at `base`.
pub(super) fn absolute(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn register_decl(tracker: &mut OutputTracker, project: &str, base: &Utf8Path, decl: &OutputDecl) {
    if decl.is_symbolic() {
        return;
    }
    if let Some(dir) = decl.created_directory() {
        tracker.register_directory(project, absolute(base, Utf8Path::new(dir)));
        return;
    }
    tracker.register_output(project, absolute(base, Utf8Path::new(decl.path())));
}

/// Register the step outputs of `owner` under the `consumer` project.
fn register_target_outputs(tracker: &mut OutputTracker, consumer: &str, owner: Owner<'_>) {
    let base = owner.target.binary_dir(owner.project);
    for step in owner.target.sources.iter().filter_map(|file| file.custom_step.as_ref()) {
        for decl in step.outputs.iter().chain(&step.byproducts) {
            register_decl(tracker, consumer, base, decl);
        }
        if let Some(depfile) = &step.depfile {
            tracker.register_output(consumer, absolute(base, depfile));
        }
    }
}

/// Follow `target`'s object library dependencies, registering the outputs
/// of libraries owned by other projects under `project`.
///
/// Unknown dependencies are skipped; emission reports them.
fn register_inlined_libraries<'a>(
    tracker: &mut OutputTracker,
    project: &Project,
    target: &Target,
    targets: &HashMap<&'a str, Owner<'a>>,
    seen: &mut HashSet<&'a str>,
) {
    for dependency in &target.dependencies {
        let Some(library) = targets.get(dependency.target()).copied() else {
            continue;
        };
        if library.target.kind != TargetKind::ObjectLibrary
            || !seen.insert(library.target.name.as_str())
        {
            continue;
        }
        if library.project.name != project.name {
            register_target_outputs(tracker, &project.name, library);
        }
        register_inlined_libraries(tracker, project, library.target, targets, seen);
    }
}

/// Register the outputs, byproducts and dependency files of every custom
/// step whose files end up in `project`'s description, including those of
/// object libraries inlined from other projects.
pub(super) fn register_project_outputs<'a>(
    tracker: &mut OutputTracker,
    project: &'a Project,
    targets: &HashMap<&'a str, Owner<'a>>,
) {
    for target in project.targets.iter().filter(|target| contributes_files(target)) {
        register_target_outputs(tracker, &project.name, Owner { project, target });
    }
    let mut seen = HashSet::new();
    for target in project.targets.iter().filter(|target| is_emitted(target)) {
        register_inlined_libraries(tracker, project, target, targets, &mut seen);
    }
    debug!(
        project = %project.name,
        outputs = tracker.declared_outputs(&project.name).len(),
        "collected custom step outputs"
    );
}
