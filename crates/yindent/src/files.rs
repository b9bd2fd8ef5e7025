//! File collection

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::fs;

/// Expand `paths` into files. Explicit file paths are always included;
/// directories are walked honouring gitignore and keep only files whose
/// extension is in `extensions` (every file when `None`).
pub fn collect_all_files(
    paths: &[Utf8PathBuf],
    extensions: Option<&HashSet<String>>,
) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let metadata = fs::metadata(path).with_context(|| format!("cannot access {path}"))?;
        if metadata.is_file() {
            files.push(path.clone());
            continue;
        }

        let walker = WalkBuilder::new(path).standard_filters(true).build();

        for result in walker {
            let entry = result?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let p = Utf8PathBuf::from_path_buf(entry.path().to_owned())
                .map_err(|_| anyhow::anyhow!("non-utf8 path: {}", entry.path().display()))?;
            if has_extension(&p, extensions) {
                files.push(p);
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn has_extension(path: &Utf8Path, extensions: Option<&HashSet<String>>) -> bool {
    extensions.is_none_or(|exts| {
        path.extension()
            .is_some_and(|ext| exts.contains(&ext.to_ascii_lowercase()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn yaml_exts() -> HashSet<String> {
        ["yml", "yaml"].iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn walks_directories_for_yaml_only() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("a.yml"), "a: 1\n").unwrap();
        fs::write(root.join("nested/b.YAML"), "b: 1\n").unwrap();
        fs::write(root.join("notes.txt"), "text\n").unwrap();

        let files = collect_all_files(std::slice::from_ref(&root), Some(&yaml_exts())).unwrap();
        let names: Vec<_> = files.iter().filter_map(|f| f.file_name()).collect();
        assert_eq!(names, ["a.yml", "b.YAML"]);
    }

    #[test]
    fn explicit_files_are_always_included() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let odd = root.join("config.txt");
        fs::write(&odd, "a: 1\n").unwrap();

        let files = collect_all_files(std::slice::from_ref(&odd), Some(&yaml_exts())).unwrap();
        assert_eq!(files, [odd]);
    }

    #[test]
    fn missing_paths_are_errors() {
        let missing = Utf8PathBuf::from("/nonexistent/yindent/input.yml");
        assert!(collect_all_files(&[missing], None).is_err());
    }
}
