//! Integration tests for the `mheader` binary using `assert_cmd`.
//!
//! Each test lays out a graph in a temporary workspace, runs the compiled
//! binary inside it and checks the files or streams it produces.

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use predicates::prelude::*;
use test_support::Workspace;

const DEMO_GRAPH: &str = include_str!("data/demo_graph.yml");

fn demo_workspace() -> Result<Workspace> {
    let workspace = Workspace::new()?;
    workspace.write("build-graph.yml", &workspace.expand(DEMO_GRAPH))?;
    Ok(workspace)
}

fn mheader(workspace: &Workspace) -> Result<Command> {
    let mut cmd = Command::cargo_bin("mheader").context("locate mheader binary")?;
    cmd.current_dir(workspace.root())
        .env_remove("MHEADER_HIDE_PREFIXES")
        .env_remove("MHEADER_REPLACE_PREFIXES")
        .env_remove("MHEADER_TRANSIENT_ROOT")
        .env_remove("MHEADER_LANGUAGES")
        .env_remove("MHEADER_RULE_LAUNCHER")
        .env_remove("MHEADER_GROUP_PREFIX");
    Ok(cmd)
}

#[test]
fn generate_writes_descriptions_lists_and_placeholders() -> Result<()> {
    let workspace = demo_workspace()?;
    mheader(&workspace)?
        .args(["generate", "--outputs-list", "outputs.txt", "--protected-list", "protected.txt"])
        .assert()
        .success();

    let header = workspace.read("build/demo.MHeader")?;
    ensure!(header.starts_with("%Target \"Exe_app\"\n"), "unexpected header:\n{header}");
    ensure!(
        header.contains("%Dependency \"Tool_codegen\"") && header.contains("Dependency.Link false"),
        "missing non-linking dependency:\n{header}"
    );
    let version = workspace.expand("%File @('{root}/build/out/version.h'->MakeAbsolute())");
    ensure!(header.contains(&version), "generated file not late-bound:\n{header}");

    let dependencies = workspace.read("build/demo.MHeader.dependencies")?;
    ensure!(
        dependencies
            == workspace.expand("{root}/src/CMakeLists.txt\n{root}/src/cmake/deps.cmake\n"),
        "unexpected dependencies list: {dependencies}"
    );
    let outputs = workspace.read("build/demo.MHeader.outputs")?;
    ensure!(outputs == workspace.expand("{root}/build/out/version.h\n"));
    ensure!(workspace.read("outputs.txt")? == outputs, "tracked outputs differ");

    let protected = workspace.read("protected.txt")?;
    ensure!(protected == workspace.expand("{root}/src/version.rule\n"));
    ensure!(
        workspace.read("src/version.rule")?.is_empty(),
        "placeholder should be empty"
    );
    Ok(())
}

#[test]
fn generate_is_the_default_command() -> Result<()> {
    let workspace = demo_workspace()?;
    mheader(&workspace)?.assert().success();
    ensure!(workspace.path("build/demo.MHeader").exists());
    Ok(())
}

#[test]
fn print_streams_without_writing() -> Result<()> {
    let workspace = demo_workspace()?;
    mheader(&workspace)?
        .args(["print", "--project", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("%Target \"Exe_app\"\n"));
    ensure!(!workspace.path("build").exists(), "print must not write files");
    ensure!(!workspace.path("src/version.rule").exists());
    Ok(())
}

#[test]
fn print_rejects_unknown_projects() -> Result<()> {
    let workspace = demo_workspace()?;
    mheader(&workspace)?
        .args(["print", "--project", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("project 'ghost' is not part of the build graph"));
    Ok(())
}

#[test]
fn outputs_lists_tracked_paths() -> Result<()> {
    let workspace = demo_workspace()?;
    let expected = workspace.expand("{root}/build/out/version.h\n");
    mheader(&workspace)?
        .arg("outputs")
        .assert()
        .success()
        .stdout(predicate::str::diff(expected));
    Ok(())
}

#[test]
fn environment_supplies_hide_prefixes() -> Result<()> {
    let workspace = demo_workspace()?;
    mheader(&workspace)?
        .env("MHEADER_HIDE_PREFIXES", workspace.path("src").as_str())
        .arg("print")
        .assert()
        .success()
        .stdout(predicate::str::contains(workspace.expand("%File \"{root}/src/main.c\"")))
        .stdout(predicate::str::contains("%Group \"src\"").not());
    Ok(())
}

#[test]
fn directory_option_locates_the_graph() -> Result<()> {
    let workspace = demo_workspace()?;
    let mut cmd = Command::cargo_bin("mheader").context("locate mheader binary")?;
    cmd.arg("-C")
        .arg(workspace.root().as_str())
        .arg("outputs")
        .assert()
        .success()
        .stdout(predicate::str::contains("version.h"));
    Ok(())
}

const RELATIVE_GRAPH: &str = r#"
graph_version: "1.0.0"
projects:
  - name: rel
    source_dir: src
    binary_dir: build
    targets:
      - name: codegen
        kind: utility
        sources:
          - path: version.rule
            custom_step:
              command_lines: [[touch, version.h]]
              outputs: [version.h]
"#;

#[test]
fn directory_option_anchors_existing_step_files() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.write("build-graph.yml", RELATIVE_GRAPH)?;
    workspace.write("src/version.rule", "rule")?;
    let elsewhere = Workspace::new()?;
    let mut cmd = mheader(&elsewhere)?;
    cmd.arg("-C")
        .arg(workspace.root().as_str())
        .args(["generate", "--protected-list", "-"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    ensure!(
        workspace.read("src/version.rule")? == "rule",
        "existing step file was replaced"
    );
    ensure!(workspace.path("build/rel.MHeader").exists());
    Ok(())
}

#[test]
fn graph_section_and_flags_are_layered() -> Result<()> {
    let workspace = demo_workspace()?;
    mheader(&workspace)?
        .env("MHEADER_GROUP_PREFIX", "Deps")
        .args(["--hide-prefix", workspace.path("src").as_str(), "print"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Target.Group \"Deps/demo\""))
        .stdout(predicate::str::contains("%Group \"src\"").not())
        .stdout(predicate::str::contains(
            workspace.expand("%File @('{root}/build/out/version.h'->MakeAbsolute())"),
        ));
    Ok(())
}

#[test]
fn missing_graph_fails() -> Result<()> {
    let workspace = Workspace::new()?;
    mheader(&workspace)?
        .assert()
        .failure()
        .stderr(predicate::str::contains("build-graph.yml"));
    Ok(())
}

#[test]
fn several_configurations_fail() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.write(
        "build-graph.yml",
        "graph_version: \"1.0.0\"\nconfigurations: [Debug, Release]\n",
    )?;
    mheader(&workspace)?
        .assert()
        .failure()
        .stderr(predicate::str::contains("exactly one is supported"));
    Ok(())
}
