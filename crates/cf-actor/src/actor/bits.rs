use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use tracing::trace;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::ActionError;

/// Entries never uploaded, matched against any path component.
pub const DEFAULT_IGNORED_PATHS: &[&str] = &[
    ".cfignore",
    ".DS_Store",
    ".git",
    ".gitignore",
    ".hg",
    ".svn",
    "_darcs",
    "manifest.yaml",
    "manifest.yml",
];

const FILE_PERMISSIONS: u32 = 0o744;
const DIRECTORY_PERMISSIONS: u32 = 0o755;

/// Produce the zip archive uploaded as a bits package.
///
/// A path to an existing `.zip` or `.jar` is used as-is. A directory is
/// archived recursively, skipping [`DEFAULT_IGNORED_PATHS`] and any exact
/// names listed in its `.cfignore`.
pub fn zip_directory(path: &Path) -> Result<Vec<u8>, ActionError> {
    if path.is_file() {
        let is_archive = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip") || ext.eq_ignore_ascii_case("jar"));
        if is_archive {
            return Ok(fs::read(path)?);
        }
        return Err(ActionError::Archive(format!(
            "{} is neither a directory nor a zip archive",
            path.display()
        )));
    }

    let ignored = ignore_list(path);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    add_directory(&mut zip, path, path, &ignored)?;
    Ok(zip.finish()?.into_inner())
}

fn ignore_list(root: &Path) -> Vec<String> {
    let mut ignored: Vec<String> = DEFAULT_IGNORED_PATHS.iter().map(ToString::to_string).collect();
    if let Ok(cfignore) = fs::read_to_string(root.join(".cfignore")) {
        ignored.extend(
            cfignore
                .lines()
                .map(|line| line.trim().trim_matches('/'))
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    ignored
}

fn add_directory(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    root: &Path,
    dir: &Path,
    ignored: &[String],
) -> Result<(), ActionError> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let name = relative.to_string_lossy().replace('\\', "/");
        if ignored.iter().any(|pattern| {
            name == *pattern || relative.components().any(|c| c.as_os_str() == pattern.as_str())
        }) {
            trace!(file = %name, "ignored");
            continue;
        }

        if entry.file_type()?.is_dir() {
            zip.add_directory(
                format!("{name}/"),
                SimpleFileOptions::default().unix_permissions(DIRECTORY_PERMISSIONS),
            )?;
            add_directory(zip, root, &path, ignored)?;
        } else {
            zip.start_file(
                name,
                SimpleFileOptions::default().unix_permissions(FILE_PERMISSIONS),
            )?;
            zip.write_all(&fs::read(&path)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_names(archive: Vec<u8>) -> Vec<String> {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive)).expect("valid zip");
        (0..zip.len())
            .map(|i| zip.by_index(i).expect("entry").name().to_string())
            .collect()
    }

    #[test]
    fn archives_directory_skipping_ignored_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("app.rb"), "puts 1").expect("write");
        fs::write(dir.path().join("manifest.yml"), "---").expect("write");
        fs::write(dir.path().join(".cfignore"), "secret.txt\n# comment\n").expect("write");
        fs::write(dir.path().join("secret.txt"), "shh").expect("write");
        fs::create_dir(dir.path().join("lib")).expect("mkdir");
        fs::write(dir.path().join("lib").join("util.rb"), "").expect("write");
        fs::create_dir(dir.path().join(".git")).expect("mkdir");
        fs::write(dir.path().join(".git").join("HEAD"), "ref").expect("write");

        let names = entry_names(zip_directory(dir.path()).expect("zip"));

        assert_eq!(names, vec!["app.rb", "lib/", "lib/util.rb"]);
    }

    #[test]
    fn existing_zip_is_passed_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.zip");
        fs::write(&path, b"PK\x03\x04").expect("write");

        assert_eq!(zip_directory(&path).expect("read"), b"PK\x03\x04".to_vec());
    }

    #[test]
    fn plain_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.rb");
        fs::write(&path, "").expect("write");

        assert!(matches!(zip_directory(&path), Err(ActionError::Archive(_))));
    }
}
