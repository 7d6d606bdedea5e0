//! Unit tests for the runner module's helpers.

use super::*;
use crate::probe::PathProbe;
use rstest::rstest;

fn parse(args: &[&str]) -> (Cli, ArgMatches) {
    let argv = std::iter::once("mheader").chain(args.iter().copied());
    cli::parse_from(argv).expect("valid arguments")
}

fn cli(args: &[&str]) -> Cli {
    parse(args).0
}

fn graph_with_section(section: &str) -> BuildGraph {
    let yaml = format!("graph_version: \"1.0.0\"\ngenerator:\n{section}projects: []\n");
    graph::from_str(&yaml).expect("graph parses")
}

#[rstest]
#[case(&[], "out.txt", "out.txt")]
#[case(&["-C", "work"], "out.txt", "work/out.txt")]
#[case(&["-C", "work"], "/tmp/out.txt", "/tmp/out.txt")]
fn resolve_output_path_respects_directory(
    #[case] args: &[&str],
    #[case] input: &str,
    #[case] expected: &str,
) {
    let resolved = resolve_output_path(&cli(args), Path::new(input));
    assert_eq!(resolved.as_ref(), Path::new(expected));
}

#[rstest]
#[case(&["-C", "work"], "b/demo.MHeader", "work/b/demo.MHeader")]
#[case(&["-C", "work"], "/b/demo.MHeader", "/b/demo.MHeader")]
#[case(&[], "b/demo.MHeader", "b/demo.MHeader")]
fn graph_paths_follow_directory(#[case] args: &[&str], #[case] input: &str, #[case] expected: &str) {
    let resolved = resolve_graph_relative(&cli(args), Utf8Path::new(input));
    assert_eq!(resolved.as_str(), expected);
}

#[rstest]
fn command_line_layers_over_graph_section() {
    let graph = graph_with_section(concat!(
        "  hide_prefixes: [/opt/sdk]\n",
        "  transient_root: /b/old\n",
        "  languages: { CUDA: Cuda }\n",
        "  rule_launcher: ccache\n",
    ));
    let (parsed, matches) = parse(&[
        "--hide-prefix",
        "/opt/extra",
        "--replace-prefix",
        "/src=Src",
        "--transient-root",
        "/b/out",
        "--language",
        "CUDA=CudaC",
        "--join-command-lines",
    ]);
    let config = generator_config(&parsed, &matches, &graph).expect("layers merge");
    assert_eq!(config.hide_prefixes, ["/opt/sdk", "/opt/extra"]);
    assert_eq!(config.replace_prefixes.get("/src").map(String::as_str), Some("Src"));
    assert_eq!(config.transient_root.as_deref(), Some(Utf8Path::new("/b/out")));
    assert_eq!(config.compile_type("CUDA"), Some("CudaC"));
    assert_eq!(config.compile_type("CXX"), Some("C++"));
    assert_eq!(config.rule_launcher.as_deref(), Some("ccache"));
    assert!(config.join_command_lines);
}

#[rstest]
fn graph_section_applies_without_flags() {
    let graph = graph_with_section("  group_prefix: Deps\n  join_command_lines: true\n");
    let (parsed, matches) = parse(&[]);
    let config = generator_config(&parsed, &matches, &graph).expect("layers merge");
    assert_eq!(config.group_prefix, "Deps");
    assert!(config.join_command_lines);
    assert!(config.hide_prefixes.is_empty());
}

#[rstest]
fn disk_check_is_rooted_at_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    std::fs::write(dir.path().join("present.txt"), "").expect("write file");
    let root = dir.path().to_str().expect("utf-8 temp dir");
    let rooted = disk_probe(&cli(&["-C", root])).expect("utf-8 directory");
    assert!(rooted.exists(Utf8Path::new("present.txt")));
    let plain = disk_probe(&cli(&[])).expect("no directory");
    assert!(!plain.exists(Utf8Path::new("present.txt")));
}

#[rstest]
fn sibling_appends_suffix() {
    assert_eq!(
        sibling(Utf8Path::new("/b/demo.MHeader"), OUTPUTS_SUFFIX),
        Utf8PathBuf::from("/b/demo.MHeader.outputs")
    );
}

#[rstest]
fn missing_graph_is_reported() {
    let (parsed, matches) = parse(&["-C", "/nonexistent/mheader-test", "generate"]);
    let err = run(&parsed, &matches).expect_err("graph is missing");
    assert!(matches!(
        err.downcast_ref::<RunnerError>(),
        Some(RunnerError::GraphNotFound { .. })
    ));
}
