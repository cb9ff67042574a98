use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

datatest_stable::harness! {
    { test = test, root = "tests/benchstack/testdata", pattern = r".*/config.yaml" },
}

fn test(path: &Path) -> datatest_stable::Result<()> {
    let dir = path.parent().context("config has no parent directory")?;
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

    let mut out = Cursor::new(Vec::new());
    match runtime.block_on(benchstack::render(path, &dir.join("manifests"), None, &mut out)) {
        Ok(()) => {
            let actual = String::from_utf8(out.into_inner())?;
            compare_rendered(&dir.join("expected.yaml"), &actual)
        }
        Err(err) => compare_stderr(&dir.join("expected.stderr"), &format!("{err:?}")),
    }
}

/// Rendered output is compared as parsed document sequences, so formatting
/// and key order are free while values and document order are not.
fn compare_rendered(path: &Path, actual: &str) -> datatest_stable::Result<()> {
    if update_snapshots() || !path.exists() {
        std::fs::write(path, actual).context("writing snapshot")?;
        return Ok(());
    }

    let expected = std::fs::read_to_string(path).context("reading snapshot")?;
    if parse_documents(&expected)? == parse_documents(actual)? {
        return Ok(());
    }

    let chunks = dissimilar::diff(&expected, actual);
    Err(format!("rendered output diverges from {}:\n{}", path.display(), format_chunks(chunks)).into())
}

fn compare_stderr(path: &Path, actual: &str) -> datatest_stable::Result<()> {
    let actual = strip_backtrace(actual).trim_end();
    if update_snapshots() || !path.exists() {
        std::fs::write(path, actual).context("writing snapshot")?;
        return Ok(());
    }

    let expected = std::fs::read_to_string(path).context("reading snapshot")?;
    if expected.trim_end() == actual {
        return Ok(());
    }

    let chunks = dissimilar::diff(expected.trim_end(), actual);
    Err(format!("error output diverges from {}:\n{}", path.display(), format_chunks(chunks)).into())
}

fn parse_documents(text: &str) -> datatest_stable::Result<Vec<serde_yaml::Value>> {
    serde_yaml::Deserializer::from_str(text)
        .map(|document| serde_yaml::Value::deserialize(document).map_err(Into::into))
        .collect()
}

fn update_snapshots() -> bool {
    std::env::var_os("UPDATE_SNAPSHOTS").is_some()
}

fn strip_backtrace(text: &str) -> &str {
    match text.find("\nStack backtrace:") {
        Some(index) => &text[..index],
        None => text,
    }
}

fn format_chunks(chunks: Vec<dissimilar::Chunk>) -> String {
    let mut buf = String::new();
    for chunk in chunks {
        let formatted = match chunk {
            dissimilar::Chunk::Equal(text) => text.into(),
            dissimilar::Chunk::Delete(text) => format!("\x1b[4m\x1b[31m{text}\x1b[0m"),
            dissimilar::Chunk::Insert(text) => format!("\x1b[4m\x1b[32m{text}\x1b[0m"),
        };
        buf.push_str(&formatted);
    }
    buf
}
