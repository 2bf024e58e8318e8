//! Finding the compiled app.
//!
//! Nuitka names its standalone output directory after either the entry
//! module or the output filename, depending on version and flags, so a short
//! list of candidates is checked in order.

use colored::*;
use std::path::{Path, PathBuf};

/// First candidate directory that contains `executable`.
pub fn locate_artifact(candidates: &[PathBuf], executable: &str) -> Option<PathBuf> {
    println!("{} Looking for compiled app...", "🔍".cyan());
    let found = find_first(candidates, executable);
    match &found {
        Some(dir) => println!("   {} Found: {}", "✓".green(), dir.display()),
        None => println!("   {} No candidate contains {}", "x".red(), executable),
    }
    found
}

fn find_first(candidates: &[PathBuf], executable: &str) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|dir| is_artifact_dir(dir, executable))
        .cloned()
}

fn is_artifact_dir(dir: &Path, executable: &str) -> bool {
    dir.join(executable).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_none_when_nothing_matches() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("main.dist");
        fs::create_dir_all(&a).unwrap();
        fs::write(a.join("other.exe"), b"").unwrap();
        let candidates = vec![a, tmp.path().join("missing.dist")];
        assert_eq!(locate_artifact(&candidates, "app.exe"), None);
        assert_eq!(locate_artifact(&[], "app.exe"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("main.dist");
        let second = tmp.path().join("app.dist");
        for dir in [&first, &second] {
            fs::create_dir_all(dir).unwrap();
            fs::write(dir.join("app.exe"), b"MZ").unwrap();
        }
        let found = locate_artifact(&[first.clone(), second.clone()], "app.exe");
        assert_eq!(found, Some(first.clone()));
        let found = locate_artifact(&[second.clone(), first], "app.exe");
        assert_eq!(found, Some(second));
    }

    #[test]
    fn test_directory_named_like_exe_does_not_count() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("main.dist");
        fs::create_dir_all(dir.join("app.exe")).unwrap();
        assert_eq!(locate_artifact(&[dir], "app.exe"), None);
    }
}
