//! Custom build step blocks.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use super::collect::absolute;
use super::{Owner, ProjectEmitter, TranslateError, join_paths};
use crate::ast::CustomStep;
use crate::command::CommandContext;
use crate::probe::PathProbe;
use crate::registry::NodeId;

impl<P: PathProbe> ProjectEmitter<'_, '_, P> {
    /// Resolve a `depends` entry to the file it stands for.
    ///
    /// Target names resolve to the target's artifact, absolute paths to
    /// themselves and relative paths against the owner's source directory.
    fn real_dependency(&self, owner: Owner<'_>, entry: &str) -> Option<Utf8PathBuf> {
        if entry.is_empty() {
            return None;
        }
        if let Some(named) = self.translator.targets.get(entry) {
            let artifact = named.target.artifact.as_deref()?;
            return Some(absolute(named.target.binary_dir(named.project), artifact));
        }
        Some(absolute(
            owner.target.source_dir(owner.project),
            Utf8Path::new(entry),
        ))
    }

    /// Attach the `Compile` block describing `step` to `file_node`.
    pub(super) fn add_custom_step(
        &mut self,
        file_node: NodeId,
        owner: Owner<'_>,
        path: &Utf8Path,
        step: &CustomStep,
        compile_type: Option<&str>,
    ) -> Result<(), TranslateError> {
        let project = self.project.name.as_str();
        let binary_dir = owner.target.binary_dir(owner.project);
        let working_dir = step
            .working_directory
            .as_deref()
            .map_or_else(|| binary_dir.to_path_buf(), |dir| absolute(binary_dir, dir));

        let outputs = join_paths(
            step.outputs
                .iter()
                .filter(|decl| decl.created_directory().is_none())
                .map(|decl| {
                    let output = absolute(binary_dir, Utf8Path::new(decl.path()));
                    self.tracker.path_value(project, &output)
                }),
        );

        let mut inputs = Vec::with_capacity(step.depends.len());
        for entry in &step.depends {
            match self.real_dependency(owner, entry) {
                Some(input) => inputs.push(self.tracker.path_value(project, &input)),
                None => warn!(
                    target_name = %owner.target.name,
                    dependency = %entry,
                    "dropping custom step input that does not resolve to a file"
                ),
            }
        }
        let inputs = join_paths(inputs);

        let context = CommandContext {
            project,
            source_root: &owner.project.source_dir,
            binary_dir,
            working_dir: &working_dir,
            tracker: self.tracker,
        };
        let command_line = context
            .transcribe(
                &step.command_lines,
                self.translator.launcher.as_deref(),
                self.translator.config.join_command_lines,
            )
            .map_err(|err| TranslateError::MultipleCommandLines {
                target: owner.target.name.clone(),
                file: path.to_path_buf(),
                count: err.count,
            })?;

        let working_value = self.tracker.directory_value(project, &working_dir);
        let compile = self.registry.add_child(file_node, "Compile", "");
        if let Some(compile_type) = compile_type {
            self.registry.add_child(compile, "Type", compile_type);
        }
        self.registry
            .add_path_child(compile, "Custom_WorkingDirectory", &working_value);
        self.registry.add_child(compile, "Custom_Outputs", outputs);
        self.registry.add_child(compile, "Custom_Inputs", inputs);
        if let Some(command_line) = command_line {
            self.registry
                .add_child(compile, "Custom_CommandLine", command_line);
        }

        if !self.tracker.is_tracked(project, path) && !self.translator.probe.exists(path) {
            debug!(file = %path, "scheduling placeholder for missing custom step file");
            self.placeholders.insert(path.to_path_buf());
        }
        Ok(())
    }
}
