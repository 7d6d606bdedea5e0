pub(crate) const YAML_HINTS: [(&str, &str); 6] = [
    (
        "did not find expected '-'",
        "Start list items with '-' and ensure proper indentation.",
    ),
    (
        "expected ':'",
        "Ensure each key is followed by ':' separating key and value.",
    ),
    (
        "mapping values are not allowed",
        "Check for a stray ':' or add quotes around paths containing ': '.",
    ),
    (
        "unknown variant",
        "Target kinds are snake_case, for example static_library or utility.",
    ),
    (
        "unknown field",
        "Check the spelling of the key against the build graph schema.",
    ),
    (
        "missing field",
        "Every project needs name, source_dir and binary_dir; every target needs name and kind.",
    ),
];
