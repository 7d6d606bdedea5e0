//! Placeholder decisions driven through a mocked filesystem probe.

use camino::Utf8Path;
use mheader::config::GeneratorConfig;
use mheader::probe::PathProbe;
use mheader::translate::translate;
use mockall::mock;
use test_support::graph::parse_graph;

mock! {
    pub Probe {}
    impl PathProbe for Probe {
        fn exists(&self, path: &Utf8Path) -> bool;
    }
}

const GRAPH: &str = r"
generator:
  transient_root: /b
projects:
  - name: p
    source_dir: /src
    binary_dir: /b
    targets:
      - name: gen
        kind: utility
        sources:
          - path: /src/missing.rule
            custom_step:
              outputs: [/b/made.h]
          - path: /b/made.h
            custom_step:
              depends: [/src/missing.rule]
      - name: app
        kind: executable
        sources:
          - { path: main.c, language: C }
";

#[test]
fn only_untracked_step_files_are_probed() {
    let graph = parse_graph(GRAPH);
    let config = GeneratorConfig::from_section(&graph.generator).expect("section merges");
    let mut probe = MockProbe::new();
    probe
        .expect_exists()
        .withf(|path| path.as_str() == "/src/missing.rule")
        .times(1)
        .return_const(false);
    let translation = translate(&graph, &config, &probe).expect("translates");
    assert_eq!(translation.placeholders, ["/src/missing.rule"]);
}

#[test]
fn existing_step_files_need_no_placeholder() {
    let graph = parse_graph(GRAPH);
    let config = GeneratorConfig::from_section(&graph.generator).expect("section merges");
    let mut probe = MockProbe::new();
    probe.expect_exists().return_const(true);
    let translation = translate(&graph, &config, &probe).expect("translates");
    assert!(translation.placeholders.is_empty());
}
