use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;

/// Fixed file name of every generated page.
pub const ARTIFACT_NAME: &str = "index.html";

/// Persists rendered bytes at a location derived from the source path.
pub trait OutputWriter: Send + Sync {
    /// Write `rendered` for `source` and return where it landed.
    fn write(&self, source: &Path, rendered: &[u8]) -> std::io::Result<PathBuf>;
}

/// Writes pages under a base directory, mirroring the source's absolute path.
///
/// `/home/me/notes/todo.md` becomes `<base>/home/me/notes/todo/index.html`, so each
/// source has exactly one artifact and regenerating overwrites it in place.
#[derive(Debug, Clone)]
pub struct HtmlWriter {
    base_dir: PathBuf,
}

impl HtmlWriter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Output location for `source`: extension dropped, root and drive prefix stripped.
    pub fn build_output_path(&self, source: &Path) -> PathBuf {
        let stem = source.with_extension("");
        let relative: PathBuf = stem
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_os_string()),
                Component::Prefix(prefix) => {
                    // `C:` -> `C`
                    let drive = prefix.as_os_str().to_string_lossy();
                    Some(drive.trim_end_matches(':').trim_start_matches(r"\\?\").into())
                }
                _ => None,
            })
            .collect();
        self.base_dir.join(relative).join(ARTIFACT_NAME)
    }
}

impl OutputWriter for HtmlWriter {
    fn write(&self, source: &Path, rendered: &[u8]) -> std::io::Result<PathBuf> {
        let output = self.build_output_path(source);
        if let Some(dir) = output.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&output, rendered)?;
        Ok(output)
    }
}

/// Every generated page below `base_dir`, sorted.
pub fn list_files(base_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !base_dir.is_dir() {
        anyhow::bail!("output directory does not exist: {}", base_dir.display());
    }

    let walker = WalkBuilder::new(base_dir)
        .standard_filters(false)
        .follow_links(false)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        let is_file = entry.file_type().is_some_and(|t| t.is_file());
        if is_file && entry.file_name() == ARTIFACT_NAME {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_build_output_path_strips_extension_and_root() {
        let writer = HtmlWriter::new("/var/mdp");
        assert_eq!(
            writer.build_output_path(Path::new("/home/me/notes/todo.md")),
            PathBuf::from("/var/mdp/home/me/notes/todo/index.html")
        );
    }

    #[test]
    fn test_build_output_path_only_drops_last_extension() {
        let writer = HtmlWriter::new("/out");
        assert_eq!(
            writer.build_output_path(Path::new("/docs/release.v2.md")),
            PathBuf::from("/out/docs/release.v2/index.html")
        );
        assert_eq!(
            writer.build_output_path(Path::new("/docs/README")),
            PathBuf::from("/out/docs/README/index.html")
        );
    }

    #[test]
    fn test_write_creates_directories_and_overwrites() {
        let out = tempfile::tempdir().unwrap();
        let writer = HtmlWriter::new(out.path());
        let source = Path::new("/project/doc.md");

        let first = writer.write(source, b"<h1>A</h1>").unwrap();
        assert_eq!(first, out.path().join("project/doc/index.html"));
        assert_eq!(fs::read_to_string(&first).unwrap(), "<h1>A</h1>");

        let second = writer.write(source, b"<h1>B</h1>").unwrap();
        assert_eq!(first, second, "same source should map to the same artifact");
        assert_eq!(fs::read_to_string(&second).unwrap(), "<h1>B</h1>");
    }

    #[test]
    fn test_list_files_finds_only_artifacts() {
        let out = tempfile::tempdir().unwrap();
        let writer = HtmlWriter::new(out.path());
        writer.write(Path::new("/b/second.md"), b"2").unwrap();
        writer.write(Path::new("/a/first.md"), b"1").unwrap();
        fs::write(out.path().join("notes.txt"), "stray").unwrap();

        let files = list_files(out.path()).unwrap();
        assert_eq!(
            files,
            vec![
                out.path().join("a/first/index.html"),
                out.path().join("b/second/index.html"),
            ]
        );
    }

    #[test]
    fn test_list_files_includes_hidden_directories() {
        let out = tempfile::tempdir().unwrap();
        let writer = HtmlWriter::new(out.path());
        writer.write(Path::new("/home/me/.notes/x.md"), b"x").unwrap();

        let files = list_files(out.path()).unwrap();
        assert_eq!(files.len(), 1, "hidden source directories must still be listed");
    }

    #[test]
    fn test_list_files_missing_directory_is_an_error() {
        let out = tempfile::tempdir().unwrap();
        let err = list_files(&out.path().join("missing")).unwrap_err();
        assert!(err.to_string().contains("output directory does not exist"));
    }
}
