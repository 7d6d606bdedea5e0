//! Second pass: `%Target` subtrees with dependencies and compile blocks.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use itertools::Itertools as _;
use tracing::debug;

use super::collect::absolute;
use super::flags::parse_compile_flags;
use super::{Owner, ProjectEmitter, TranslateError};
use crate::ast::{Target, TargetKind};
use crate::outputs::PathValue;
use crate::probe::PathProbe;
use crate::registry::{NodeId, kind};

/// Compile type whose language standard is also exposed on the target.
const C_COMPILE_TYPE: &str = "C";

/// Settings gathered for one compile type.
#[derive(Debug, Default)]
struct CompileInfo {
    includes: IndexSet<Utf8PathBuf>,
    defines: BTreeSet<String>,
    language_standard: Option<String>,
}

/// Lexically resolve `.` and `..` components.
fn collapse(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if !matches!(out.components().next_back(), Some(Utf8Component::Normal(_)))
                    || !out.pop()
                {
                    out.push("..");
                }
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

/// Display name of a target in the description.
fn target_name(target: &Target) -> String {
    format!("{}{}", target.kind.name_prefix().unwrap_or_default(), target.name)
}

impl<'a, P: PathProbe> ProjectEmitter<'_, 'a, P> {
    /// Emit the `%Target` entry for `owner`.
    pub(super) fn emit_target(&mut self, owner: Owner<'_>) -> Result<(), TranslateError> {
        let target = owner.target;
        debug!(project = %self.project.name, target_name = %target.name, "emitting target");
        let root = self.registry.root();
        let node = self.registry.add_child(root, kind::TARGET, target_name(target));
        self.registry
            .add_child(node, "Property.MalterlibTargetNameType", "Normal");
        self.registry.add_child(
            node,
            "Target.Group",
            format!("{}/{}", self.translator.config.group_prefix, self.project.name),
        );
        self.registry.add_child(
            node,
            "Target.Type",
            target.kind.type_tag().unwrap_or_default(),
        );
        self.registry.add_child(node, "Target.BaseName", target.name.as_str());

        let mut settings = BTreeMap::new();
        self.add_compile_info(&mut settings, owner)?;
        self.add_files(node, owner)?;
        self.add_dependencies(node, owner, &mut settings)?;
        self.add_compile_blocks(node, settings);
        self.registry.prune_lone_children(node);
        Ok(())
    }

    fn add_compile_info(
        &self,
        settings: &mut BTreeMap<String, CompileInfo>,
        owner: Owner<'_>,
    ) -> Result<(), TranslateError> {
        let source_dir = owner.target.source_dir(owner.project);
        for (language, language_settings) in &owner.target.languages {
            if language.is_empty() {
                continue;
            }
            let compile_type = self.translator.compile_type(owner, language)?;
            let info = settings.entry(compile_type.to_owned()).or_default();
            let flags = parse_compile_flags(&language_settings.flags);
            let includes = language_settings
                .include_dirs
                .iter()
                .map(Utf8PathBuf::as_path)
                .chain(flags.includes.iter().map(Utf8Path::new));
            for dir in includes {
                info.includes.insert(collapse(&absolute(source_dir, dir)));
            }
            for define in language_settings.defines.iter().chain(&flags.defines) {
                info.defines.insert(self.interpolated(define));
            }
            if flags.language_standard.is_some() {
                info.language_standard = flags.language_standard;
            }
        }
        Ok(())
    }

    /// Emit dependency edges, inlining object libraries.
    fn add_dependencies(
        &mut self,
        node: NodeId,
        owner: Owner<'_>,
        settings: &mut BTreeMap<String, CompileInfo>,
    ) -> Result<(), TranslateError> {
        let target = owner.target;
        let mut inlined = HashSet::new();
        for (name, link) in direct_dependencies(target) {
            let dependency = self.translator.lookup(target, name)?;
            match dependency.target.kind {
                TargetKind::InterfaceLibrary | TargetKind::Global => {}
                TargetKind::ObjectLibrary => {
                    self.inline_object_library(node, dependency, settings, &mut inlined)?;
                }
                dependency_kind => {
                    let edge = self.registry.add_child(
                        node,
                        kind::DEPENDENCY,
                        target_name(dependency.target),
                    );
                    if !link {
                        self.registry.add_child(edge, "Dependency.Link", "false");
                    } else if target.kind.is_static_like() && dependency_kind.is_static_like() {
                        self.registry.add_child(edge, "Dependency.Indirect", "true");
                    }
                }
            }
        }
        Ok(())
    }

    fn inline_object_library(
        &mut self,
        node: NodeId,
        library: Owner<'a>,
        settings: &mut BTreeMap<String, CompileInfo>,
        inlined: &mut HashSet<&'a str>,
    ) -> Result<(), TranslateError> {
        if !inlined.insert(library.target.name.as_str()) {
            return Ok(());
        }
        debug!(library = %library.target.name, "inlining object library");
        self.add_files(node, library)?;
        self.add_compile_info(settings, library)?;
        for (name, _) in direct_dependencies(library.target) {
            let dependency = self.translator.lookup(library.target, name)?;
            if dependency.target.kind == TargetKind::ObjectLibrary {
                self.inline_object_library(node, dependency, settings, inlined)?;
            }
        }
        Ok(())
    }

    /// Push one `Compile` block per compile type to the front of the target.
    fn add_compile_blocks(&mut self, node: NodeId, settings: BTreeMap<String, CompileInfo>) {
        for (compile_type, info) in settings {
            let block = self.registry.push_front_child(node, "Compile", "");
            self.registry
                .add_child(block, "!!Compile.Type", compile_type.as_str());
            let search_path = info
                .includes
                .iter()
                .map(|dir| PathValue::dynamic(dir.as_str()).into_rendered())
                .chain(std::iter::once("@(Compile.SearchPath)".to_owned()))
                .join(";");
            self.registry.add_child(block, "SearchPath", search_path);
            self.registry.add_child(
                block,
                "PreprocessorDefines",
                format!("{};@(Compile.PreprocessorDefines)", info.defines.iter().join(";")),
            );
            if let Some(standard) = info.language_standard
                && compile_type == C_COMPILE_TYPE
            {
                let upper = standard.to_uppercase();
                self.registry.add_child(block, "CLanguage", upper.as_str());
                self.registry.push_front_child(node, "Target.CLanguage", upper);
            }
        }
    }
}

/// Direct dependencies sorted by name, with duplicates merged. A merged
/// dependency links when any of its declarations does.
fn direct_dependencies(target: &Target) -> BTreeMap<&str, bool> {
    let mut merged = BTreeMap::new();
    for dependency in &target.dependencies {
        *merged.entry(dependency.target()).or_insert(false) |= dependency.is_link();
    }
    merged
}
