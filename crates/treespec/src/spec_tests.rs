#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use super::*;
use std::sync::Arc;
use tempfile::TempDir;
use treespec_diff::Pattern;

struct Fixture {
    _dir: TempDir,
    context: FileTreeSpecContext,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let spec_dir = dir.path().join("specs");
        fs::create_dir_all(&spec_dir).unwrap();
        let mut context = FileTreeSpecContext::new(&spec_dir).unwrap();
        context.set_temp_root(dir.path().join("tmp")).unwrap();
        Self { _dir: dir, context }
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.context.spec_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

#[test]
fn test_missing_before_dir_is_a_fixture_error() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.context.spec_dir().join("empty")).unwrap();
    let spec = fixture.context.spec("empty");
    let result = spec.run(|_| Ok(()));
    assert!(matches!(result, Err(SpecError::MissingFixture { .. })));
}

#[test]
fn test_missing_base_after_dir_is_a_fixture_error() {
    let fixture = Fixture::new();
    fixture.write("dependent/before/b.txt", "3");
    let spec = fixture.context.spec_based_on("dependent", "base");
    let result = spec.run(|_| Ok(()));
    assert!(matches!(result, Err(SpecError::MissingBaseFixture { .. })));
}

#[test]
fn test_staging_copies_nested_trees() {
    let fixture = Fixture::new();
    fixture.write("case/before/a.txt", "top");
    fixture.write("case/before/sub/deep/b.txt", "nested");
    let spec = fixture.context.spec("case");
    spec.run(|spec| {
        let temp = spec.temp_path();
        assert_eq!(fs::read_to_string(temp.join("a.txt"))?, "top");
        assert_eq!(fs::read_to_string(temp.join("sub/deep/b.txt"))?, "nested");
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_layered_staging_local_files_win() {
    let fixture = Fixture::new();
    fixture.write("base/after/a.txt", "1");
    fixture.write("base/after/b.txt", "2");
    fixture.write("dependent/before/b.txt", "3");
    let spec = fixture.context.spec_based_on("dependent", "base");
    spec.run(|spec| {
        let temp = spec.temp_path();
        assert_eq!(fs::read_to_string(temp.join("a.txt"))?, "1");
        assert_eq!(fs::read_to_string(temp.join("b.txt"))?, "3");
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_layered_spec_tolerates_missing_local_before() {
    let fixture = Fixture::new();
    fixture.write("base/after/a.txt", "1");
    fs::create_dir_all(fixture.context.spec_dir().join("dependent")).unwrap();
    let spec = fixture.context.spec_based_on("dependent", "base");
    spec.run(|spec| {
        assert_eq!(fs::read_to_string(spec.temp_path().join("a.txt"))?, "1");
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_compare_requires_run() {
    let fixture = Fixture::new();
    fixture.write("case/before/a.txt", "x");
    let spec = fixture.context.spec("case");
    let result = spec.compare(|_| {});
    assert!(matches!(result, Err(SpecError::NotExecuted(_))));
    let result = spec.check_unexpected_files(|_| {});
    assert!(matches!(result, Err(SpecError::NotExecuted(_))));
}

#[test]
fn test_mutation_error_skips_comparison_phase() {
    let fixture = Fixture::new();
    fixture.write("case/before/a.txt", "x");
    let spec = fixture.context.spec("case");
    let result: Result<(), _> = spec.run(|_| Err("subject exploded".into()));
    assert!(matches!(result, Err(SpecError::Execution { .. })));
    // The spec never reached the executed state.
    assert!(matches!(
        spec.compare(|_| {}),
        Err(SpecError::NotExecuted(_))
    ));
}

#[test]
fn test_sandbox_is_recreated_between_runs() {
    let fixture = Fixture::new();
    fixture.write("case/before/a.txt", "x");
    let spec = fixture.context.spec("case");
    spec.run(|spec| {
        fs::write(spec.temp_path().join("junk.txt"), "junk")?;
        Ok(())
    })
    .unwrap();
    // Sandbox contents persist for inspection until the next run.
    assert!(spec.temp_path().join("junk.txt").exists());
    spec.run(|_| Ok(())).unwrap();
    assert!(!spec.temp_path().join("junk.txt").exists());
    assert!(spec.temp_path().join("a.txt").exists());
}

#[test]
fn test_staging_honors_hidden_file_policy() {
    let fixture = Fixture::new();
    fixture.write("case/before/.hidden", "dot");
    fixture.write("case/before/plain.txt", "plain");

    fixture
        .context
        .spec("case")
        .run(|spec| {
            assert!(spec.temp_path().join(".hidden").exists());
            Ok(())
        })
        .unwrap();

    let mut fixture = fixture;
    fixture.context.set_include_hidden_files(false);
    fixture
        .context
        .spec("case")
        .run(|spec| {
            assert!(!spec.temp_path().join(".hidden").exists());
            assert!(spec.temp_path().join("plain.txt").exists());
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_compare_reports_missing_produced_file() {
    let fixture = Fixture::new();
    fixture.write("case/before/kept.txt", "kept");
    fixture.write("case/after/kept.txt", "kept");
    fixture.write("case/after/never-made.txt", "wanted");
    let spec = fixture.context.spec("case");
    spec.run(|_| Ok(())).unwrap();

    let mut outcomes = Vec::new();
    spec.compare(|diff| {
        outcomes.push((diff.relative().to_path_buf(), diff.outcome().clone()));
    })
    .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        outcomes[0],
        (PathBuf::from("kept.txt"), treespec_diff::DiffOutcome::Equal)
    );
    assert_eq!(
        outcomes[1],
        (
            PathBuf::from("never-made.txt"),
            treespec_diff::DiffOutcome::MissingProduced
        )
    );
}

#[test]
fn test_transforms_apply_to_all_matches_before_comparison() {
    let fixture = Fixture::new();
    fixture.write("case/before/one.stamp", "raw");
    fixture.write("case/before/two.stamp", "raw");
    fixture.write("case/after/one.stamp", "normalized");
    fixture.write("case/after/two.stamp", "normalized");

    let mut fixture = fixture;
    fixture.context.register_transform(
        [Pattern::glob("*.stamp").unwrap()],
        Arc::new(|path| fs::write(path, "normalized")),
    );

    let spec = fixture.context.spec("case");
    spec.run(|_| Ok(())).unwrap();
    let mut all_equal = true;
    spec.compare(|diff| all_equal &= diff.is_equal()).unwrap();
    assert!(all_equal);
}

#[test]
fn test_transform_failure_aborts_comparison() {
    let fixture = Fixture::new();
    fixture.write("case/before/bad.stamp", "raw");
    let mut fixture = fixture;
    fixture.context.register_transform(
        [Pattern::glob("*.stamp").unwrap()],
        Arc::new(|_| Err(io::Error::new(io::ErrorKind::Other, "stamp press jammed"))),
    );
    let spec = fixture.context.spec("case");
    spec.run(|_| Ok(())).unwrap();
    assert!(matches!(
        spec.compare(|_| {}),
        Err(SpecError::Transform { .. })
    ));
}

#[test]
fn test_first_preprocessor_wins() {
    let fixture = Fixture::new();
    fixture.write("case/before/data.txt", "produced-body");
    fixture.write("case/after/data.txt", "expected-body");

    let mut fixture = fixture;
    // Both patterns match; only the first registered applies, and it maps
    // both sides to the same text.
    fixture.context.register_preprocess(
        [Pattern::glob("*.txt").unwrap()],
        Arc::new(|_| Ok(treespec_diff::Prepared::Text("canonical".to_string()))),
    );
    fixture.context.register_preprocess(
        [Pattern::glob("**/*.txt").unwrap()],
        Arc::new(|path| {
            Ok(treespec_diff::Prepared::Text(
                fs::read_to_string(path).unwrap_or_default(),
            ))
        }),
    );

    let spec = fixture.context.spec("case");
    spec.run(|_| Ok(())).unwrap();
    let mut equal = Vec::new();
    spec.compare(|diff| equal.push(diff.is_equal())).unwrap();
    assert_eq!(equal, vec![true]);
}
