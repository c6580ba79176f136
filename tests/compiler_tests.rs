use std::fs;
use std::path::PathBuf;

// Helper to create a directory of tech files for one test
fn create_test_dir(name: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("techc_test_{}", name));
    fs::create_dir_all(&dir).expect("Failed to create test dir");
    for (file, content) in files {
        fs::write(dir.join(file), content).expect("Failed to write test file");
    }
    dir
}

// Helper to cleanup test files
fn cleanup_test_dir(dir: &PathBuf) {
    let _ = fs::remove_dir_all(dir);
}

#[cfg(test)]
mod preprocessor_tests {
    use super::*;
    use techc::compiler::{preprocess, remove_continuations, strip_comments};
    use techc::diag::Diagnostics;

    #[test]
    fn test_comment_removal_is_idempotent_and_length_preserving() {
        let text = "buffer b { // trailing\n/* multi\nline */ size 4\n\"kept // inside\"\n}";
        let once = strip_comments(text);
        let twice = strip_comments(&once);

        assert_eq!(once, twice, "comment removal should be idempotent");
        assert_eq!(once.len(), text.len(), "length must be unchanged");
        assert_eq!(
            once.matches('\n').count(),
            text.matches('\n').count(),
            "line count must be unchanged"
        );
        assert!(
            once.contains("\"kept // inside\""),
            "string literals must be preserved verbatim"
        );
        assert!(!once.contains("trailing"));
        assert!(!once.contains("multi"));
    }

    #[test]
    fn test_continuation_marker_joins_lines() {
        let text = "size ...\n256\n";
        let joined = remove_continuations(text);
        assert_eq!(joined.len(), text.len());
        assert!(!joined.contains("..."));
        // the newline of the marker is blanked, so both halves sit on one line
        assert_eq!(joined.matches('\n').count(), 1);
    }

    #[test]
    fn test_include_expansion_is_transitive_and_order_preserving() {
        let dir = create_test_dir(
            "inc_order",
            &[
                ("c.tech", "buffer from_c {\n}\n"),
                ("b.tech", "#include \"c.tech\"\nbuffer from_b {\n}\n"),
            ],
        );
        let root = "#include \"b.tech\"\nbuffer from_a {\n}\n";

        let mut diag = Diagnostics::new();
        let pre = preprocess(root, &dir, &mut diag);
        assert!(!diag.has_errors(), "unexpected errors: {}", diag.text());

        let text = &pre.buffer.text;
        let at_c = text.find("from_c").expect("c content present");
        let at_b = text.find("from_b").expect("b content present");
        let at_a = text.find("from_a").expect("a content present");
        assert!(at_c < at_b && at_b < at_a, "include order must be preserved");

        cleanup_test_dir(&dir);
    }

    #[test]
    fn test_include_spans_attribute_origin_files() {
        let dir = create_test_dir("inc_spans", &[("inc.tech", "buffer included {\n}\n")]);
        let root = "#include \"inc.tech\"\nbuffer root_buf {\n}\n";

        let mut diag = Diagnostics::new();
        let pre = preprocess(root, &dir, &mut diag);

        let at_inc = pre.buffer.text.find("included").expect("included content");
        let span = techc::compiler::origin_of(&pre.includes, at_inc)
            .expect("offset must map to the included file");
        assert!(span.path.ends_with("inc.tech"));

        let at_root = pre.buffer.text.find("root_buf").expect("root content");
        assert!(
            techc::compiler::origin_of(&pre.includes, at_root).is_none(),
            "root content must not be attributed to an include"
        );

        cleanup_test_dir(&dir);
    }

    #[test]
    fn test_missing_include_is_reported_and_skipped() {
        let dir = create_test_dir("inc_missing", &[]);
        let root = "#include \"nope.tech\"\nbuffer still_here {\n}\n";

        let mut diag = Diagnostics::new();
        let pre = preprocess(root, &dir, &mut diag);

        assert!(diag.has_errors());
        assert!(diag.text().contains("'nope.tech' could not be found"));
        assert!(pre.buffer.text.contains("still_here"));

        cleanup_test_dir(&dir);
    }

    #[test]
    fn test_include_cycle_is_reported_not_looping() {
        let dir = create_test_dir("inc_cycle", &[]);
        fs::write(
            dir.join("self.tech"),
            "#include \"self.tech\"\nbuffer cyc {\n}\n",
        )
        .expect("Failed to write test file");
        let root = "#include \"self.tech\"\n";

        let mut diag = Diagnostics::new();
        let pre = preprocess(root, &dir, &mut diag);

        assert!(diag.text().contains("included recursively"));
        assert!(pre.buffer.text.contains("cyc"));

        cleanup_test_dir(&dir);
    }

    #[test]
    fn test_global_macro_replaces_partial_word_matches() {
        // literal byte-level substitution: no identifier-boundary check
        let text = "#global WIDTH 512\nbuffer b {\n size WIDTH\n}\nimage myWIDTHimg {\n}\n";
        let mut diag = Diagnostics::new();
        let pre = preprocess(text, &std::env::temp_dir(), &mut diag);

        assert!(pre.buffer.text.contains("size 512"));
        assert!(
            pre.buffer.text.contains("my512img"),
            "substitution must hit partial-word matches too"
        );
        assert!(!pre.buffer.text.contains("#global"));
    }

    #[test]
    fn test_macro_only_applies_after_its_directive() {
        let text = "size KEY\n#global KEY 7\nsize KEY\n";
        let mut diag = Diagnostics::new();
        let pre = preprocess(text, &std::env::temp_dir(), &mut diag);

        let first = pre.buffer.text.lines().next().unwrap_or("");
        assert!(first.contains("KEY"), "occurrence before the directive stays");
        assert!(pre.buffer.text.ends_with("size 7\n"));
    }
}

#[cfg(test)]
mod segmenter_tests {
    use techc::compiler::compile_unit;
    use techc::diag::{CompileError, Diagnostics};

    #[test]
    fn test_end_to_end_block_example() {
        let text = "buffer myBuf { usage staticDraw\n size 256\n }";
        let mut diag = Diagnostics::new();
        let blocks = compile_unit(text, &std::env::temp_dir(), &mut diag)
            .expect("segmentation should succeed");

        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.type_token, "buffer");
        assert_eq!(block.annotation_token, None);
        assert_eq!(block.name_token, "myBuf");
        assert_eq!(block.commands.len(), 2);
        assert_eq!(block.commands[0].name, "usage");
        assert_eq!(block.commands[0].args, vec!["staticDraw".to_string()]);
        assert_eq!(block.commands[1].name, "size");
        assert_eq!(block.commands[1].args, vec!["256".to_string()]);
    }

    #[test]
    fn test_n_headers_yield_n_blocks() {
        let text = "buffer a {\n}\nshader vert b {\n void main() { }\n}\nsampler c {\n}\n";
        let mut diag = Diagnostics::new();
        let blocks = compile_unit(text, &std::env::temp_dir(), &mut diag)
            .expect("segmentation should succeed");

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].name_token, "a");
        assert_eq!(blocks[1].type_token, "shader");
        assert_eq!(blocks[1].annotation_token.as_deref(), Some("vert"));
        assert_eq!(blocks[1].name_token, "b");
        assert_eq!(blocks[2].name_token, "c");
        // nested braces belong to the body
        assert!(blocks[1].body.contains("void main() { }"));
    }

    #[test]
    fn test_unmatched_closing_brace_is_fatal_with_line_number() {
        let text = "buffer a {\n}\n}\n";
        let mut diag = Diagnostics::new();
        let err = compile_unit(text, &std::env::temp_dir(), &mut diag)
            .expect_err("stray brace must abort the unit");

        match err {
            CompileError::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_braces_without_header_are_not_blocks() {
        let text = "{\n usage staticDraw\n}\nbuffer b {\n}\n";
        let mut diag = Diagnostics::new();
        let blocks = compile_unit(text, &std::env::temp_dir(), &mut diag)
            .expect("segmentation should succeed");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name_token, "b");
    }

    #[test]
    fn test_block_line_attribution() {
        let text = "// header comment\n\nbuffer late {\n usage staticDraw\n}\n";
        let mut diag = Diagnostics::new();
        let blocks = compile_unit(text, &std::env::temp_dir(), &mut diag)
            .expect("segmentation should succeed");
        assert_eq!(blocks[0].line, 3, "line is 1-based within the origin file");
        assert!(blocks[0].origin_file.is_none());
    }

    #[test]
    fn test_find_commands_returns_all_in_order() {
        let text = "pass p {\n draw points 0 4\n vert vs\n draw points 4 4\n}\n";
        let mut diag = Diagnostics::new();
        let blocks = compile_unit(text, &std::env::temp_dir(), &mut diag)
            .expect("segmentation should succeed");
        let draws: Vec<_> = blocks[0].find_commands("draw").collect();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].args[1], "0");
        assert_eq!(draws[1].args[1], "4");
    }
}

#[cfg(test)]
mod diagnostics_tests {
    use techc::diag::{Diagnostics, ErrorKind};

    #[test]
    fn test_context_prefix_is_applied_at_add_time() {
        let mut diag = Diagnostics::with_context("shader 'foo'");
        diag.push("command 'bind'");
        diag.add(ErrorKind::Field, "bad argument");
        diag.pop();
        diag.add(ErrorKind::Field, "another problem");

        assert_eq!(
            diag.text(),
            "shader 'foo': command 'bind': bad argument\nshader 'foo': another problem\n"
        );
    }

    #[test]
    fn test_functional_child_does_not_mutate_parent() {
        let parent = Diagnostics::with_context("pass 'p'");
        let mut child = parent.with("command 'draw'");
        child.add(ErrorKind::Reference, "name not found");

        assert!(!parent.has_errors());
        assert_eq!(child.text(), "pass 'p': command 'draw': name not found\n");
    }

    #[test]
    fn test_into_result_raises_all_messages_as_one_failure() {
        let mut diag = Diagnostics::with_context("buffer 'b'");
        diag.add(ErrorKind::Field, "first");
        diag.add(ErrorKind::Field, "second");

        let err = diag.into_result(()).expect_err("must raise");
        let text = err.to_string();
        assert!(text.contains("first"));
        assert!(text.contains("second"));
    }

    #[test]
    fn test_empty_accumulator_passes_value_through() {
        let diag = Diagnostics::new();
        assert_eq!(diag.into_result(42).expect("no errors"), 42);
    }
}

#[cfg(test)]
mod scene_tests {
    use techc::compiler::compile_unit;
    use techc::diag::Diagnostics;
    use techc::scene::{build_scene, Builder, SceneObject};

    fn build(text: &str) -> (techc::scene::Scene, Diagnostics) {
        let mut diag = Diagnostics::new();
        let blocks = compile_unit(text, &std::env::temp_dir(), &mut diag)
            .expect("segmentation should succeed");
        let mut builder = Builder { debug: None };
        let scene = build_scene(&blocks, &mut builder, &mut diag);
        (scene, diag)
    }

    #[test]
    fn test_simple_scene_builds_without_errors() {
        let (scene, diag) = build(
            "buffer buf_pos {\n usage staticDraw\n size 256\n}\n\
             shader vert vs {\n void main() { }\n}\n\
             pass p0 {\n vert vs\n draw points 0 4\n}\n\
             tech t {\n pass p0\n}\n",
        );
        assert!(!diag.has_errors(), "unexpected errors: {}", diag.text());
        assert_eq!(scene.len(), 4);
        match scene.get("buf_pos") {
            Some(SceneObject::Buffer(buf)) => {
                assert_eq!(buf.usage, "staticDraw");
                assert_eq!(buf.size, 256);
            }
            other => panic!("expected buffer, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_object_kind_is_isolated() {
        let (scene, diag) = build("widget w {\n}\nbuffer b {\n size 1\n}\n");
        assert!(diag.text().contains("Object type 'widget' is not known."));
        assert_eq!(scene.len(), 1, "later objects must still be constructed");
    }

    #[test]
    fn test_duplicate_name_is_a_reference_error() {
        let (scene, diag) = build("buffer b {\n}\nbuffer b {\n}\n");
        assert!(diag.text().contains("Object name 'b' already exists."));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_field_errors_accumulate_before_raising() {
        let (scene, diag) = build("buffer b {\n size\n usage a b\n flibber 3\n}\n");
        let text = diag.text();
        assert!(text.contains("has no arguments"));
        assert!(text.contains("too many arguments"));
        assert!(text.contains("Unknown field 'flibber'."));
        assert!(scene.is_empty(), "failed object must be absent from the scene");
    }

    #[test]
    fn test_unresolved_reference_names_the_context() {
        let (scene, diag) = build("pass p0 {\n vert missing_vs\n}\n");
        let text = diag.text();
        assert!(text.contains("pass 'p0': command 'vert': "));
        assert!(text.contains("The name 'missing_vs' could not be found"));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_pass_commands_without_arguments_are_reported() {
        let (scene, diag) = build("pass p0 {\n vert\n fragout\n vertout\n}\n");
        let text = diag.text();
        assert!(
            text.contains("pass 'p0': command 'vert': Command 'vert' has no arguments"),
            "got: {text}"
        );
        assert!(
            text.contains("Command 'fragout' has no arguments"),
            "got: {text}"
        );
        assert!(
            text.contains("Command 'vertout' has no arguments"),
            "got: {text}"
        );
        assert!(scene.is_empty(), "a pass with missing bindings must not build");
    }

    #[test]
    fn test_tech_pass_command_without_arguments_is_reported() {
        let (scene, diag) = build("tech t {\n pass\n}\n");
        assert!(
            diag.text()
                .contains("tech 't': command 'pass': Command 'pass' has no arguments"),
            "got: {}",
            diag.text()
        );
        assert!(scene.is_empty());
    }

    #[test]
    fn test_bad_shader_annotation_is_reported() {
        let (scene, diag) = build("shader blub s {\n void main() { }\n}\n");
        assert!(diag.text().contains("Shader type 'blub' is not supported."));
        assert!(scene.is_empty());
    }
}
