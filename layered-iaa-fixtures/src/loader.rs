//! Fixture file loading.

use std::fs;
use std::path::Path;

use layered_iaa::Sentence;

use crate::{AnnotationFixture, FixtureError, FixtureResult};

/// Parse a fixture from RON text.
pub fn parse_fixture(content: &str) -> FixtureResult<AnnotationFixture> {
    ron::from_str(content).map_err(|e| FixtureError::Parse {
        line: e.position.line,
        message: e.code.to_string(),
    })
}

/// Load a single fixture file.
pub fn load_fixture(path: &Path) -> FixtureResult<AnnotationFixture> {
    let content = fs::read_to_string(path).map_err(|e| FixtureError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_fixture(&content)
}

/// Load a fixture file straight into sentences.
pub fn load_sentences(path: &Path) -> FixtureResult<Vec<Sentence>> {
    load_fixture(path)?.to_sentences()
}

/// Load all `.ron` fixtures under a directory, ordered by relative path.
pub fn load_all_fixtures(dir: &Path) -> FixtureResult<Vec<(String, AnnotationFixture)>> {
    let mut fixtures = Vec::new();
    load_fixtures_recursive(dir, dir, &mut fixtures)?;
    fixtures.sort_by(|a, b| a.0.cmp(&b.0));
    log::debug!("loaded {} fixtures from {}", fixtures.len(), dir.display());
    Ok(fixtures)
}

/// Every sentence of every fixture under `dir`, documents in path order.
pub fn load_corpus(dir: &Path) -> FixtureResult<Vec<Sentence>> {
    let mut sentences = Vec::new();
    for (_, fixture) in load_all_fixtures(dir)? {
        sentences.extend(fixture.to_sentences()?);
    }
    Ok(sentences)
}

fn load_fixtures_recursive(
    base: &Path,
    dir: &Path,
    fixtures: &mut Vec<(String, AnnotationFixture)>,
) -> FixtureResult<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    let load_error = |e: std::io::Error| FixtureError::Load {
        path: dir.display().to_string(),
        message: e.to_string(),
    };
    for entry in fs::read_dir(dir).map_err(load_error)? {
        let path = entry.map_err(load_error)?.path();

        if path.is_dir() {
            load_fixtures_recursive(base, &path, fixtures)?;
        } else if path.extension().map_or(false, |e| e == "ron") {
            let relative = path.strip_prefix(base).unwrap_or(&path);
            let fixture = load_fixture(&path)?;
            fixtures.push((relative.display().to_string(), fixture));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"(
        file_name: "mini.ann",
        sentences: [
            (
                text: "Rain fell so we stayed",
                instances: [
                    (id: "T1", connective: [3], cause: Some([1, 2]), effect: Some([4, 5]), degree: Some(Facilitate)),
                ],
            ),
            (text: "Nothing happened"),
        ],
    )"#;

    #[test]
    fn test_parse_and_resolve() {
        let fixture = parse_fixture(MINIMAL).unwrap();
        assert_eq!(fixture.instance_count(), 1);

        let sentences = fixture.to_sentences().unwrap();
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].file_name(), "mini.ann");
        let instance = &sentences[0].causation_instances[0];
        assert_eq!(instance.connective.text(), "so");
        assert_eq!(instance.cause.as_ref().map(|s| s.text()), Some("Rain fell".to_string()));
        assert!(instance.causation_type.is_none());
        assert!(sentences[1].causation_instances.is_empty());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_fixture("(\n  file_name: \"x.ann\",\n  sentences: oops,\n)").unwrap_err();
        match err {
            FixtureError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_out_of_range_token_is_annotation_error() {
        let fixture = parse_fixture(
            r#"(file_name: "bad.ann", sentences: [(text: "Too short", instances: [(id: "T1", connective: [7])])])"#,
        )
        .unwrap();
        assert!(matches!(fixture.to_sentences(), Err(FixtureError::Annotation(_))));
    }

    #[test]
    fn test_load_all_fixtures_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.ron", "a.ron"] {
            let mut file = fs::File::create(dir.path().join(name)).unwrap();
            file.write_all(MINIMAL.as_bytes()).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "not a fixture").unwrap();

        let fixtures = load_all_fixtures(dir.path()).unwrap();
        let names: Vec<_> = fixtures.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["a.ron", "b.ron"]);

        assert_eq!(load_corpus(dir.path()).unwrap().len(), 4);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let err = load_fixture(Path::new("/nonexistent/fixture.ron")).unwrap_err();
        assert!(matches!(err, FixtureError::Load { .. }));
    }

    #[test]
    fn test_load_repository_fixtures() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let fixtures = load_all_fixtures(&dir).unwrap();
        assert!(fixtures.len() >= 2);
    }
}
