//! Precondition checks run before any file is read.
//!
//! Every problem is collected so the user can fix them in one go; the run
//! only starts when the list is empty.

use std::path::Path;

use crate::config::RunPaths;
use crate::error::{PreconditionError, PreflightError};

/// Validates the three run paths.
///
/// Checks:
/// - Input csv exists and is a file
/// - Files path exists, is a directory and has at least one entry
/// - Output parent directory exists
/// - Output is not the input csv
pub fn check_paths(paths: &RunPaths) -> Result<(), PreflightError> {
    let mut problems = Vec::new();

    let input = paths.input_csv.as_path();
    if !input.exists() {
        problems.push(PreconditionError::MissingInput(input.to_path_buf()));
    } else if !input.is_file() {
        problems.push(PreconditionError::InputNotAFile(input.to_path_buf()));
    }

    let files = paths.files_dir.as_path();
    if !files.exists() {
        problems.push(PreconditionError::MissingDirectory(files.to_path_buf()));
    } else if !files.is_dir() {
        problems.push(PreconditionError::NotADirectory(files.to_path_buf()));
    } else if is_empty_dir(files) {
        problems.push(PreconditionError::EmptyDirectory(files.to_path_buf()));
    }

    let output = paths.output_csv.as_path();
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        problems.push(PreconditionError::MissingOutputDirectory(parent.to_path_buf()));
    }

    if same_file(output, input) {
        problems.push(PreconditionError::OutputIsInput(output.to_path_buf()));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(PreflightError(problems))
    }
}

fn is_empty_dir(dir: &Path) -> bool {
    match std::fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn test_valid_paths() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("titles.csv");
        fs::write(&input, "Alpha,\n").unwrap();
        let files = dir.path().join("files");
        fs::create_dir(&files).unwrap();
        fs::write(files.join("alpha.mkv"), b"").unwrap();

        let paths = RunPaths {
            input_csv: input,
            files_dir: files,
            output_csv: dir.path().join("matched.csv"),
        };
        assert!(check_paths(&paths).is_ok());
    }

    #[test]
    fn test_all_problems_reported_together() {
        let dir = tempfile::tempdir().unwrap();
        let paths = RunPaths {
            input_csv: dir.path().join("missing.csv"),
            files_dir: dir.path().join("nowhere"),
            output_csv: dir.path().join("no_such_dir").join("matched.csv"),
        };
        let err = check_paths(&paths).unwrap_err();
        assert_eq!(err.0.len(), 3);
        assert!(matches!(err.0[0], PreconditionError::MissingInput(_)));
        assert!(matches!(err.0[1], PreconditionError::MissingDirectory(_)));
        assert!(matches!(err.0[2], PreconditionError::MissingOutputDirectory(_)));
    }

    #[test]
    fn test_empty_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("titles.csv");
        fs::write(&input, "Alpha,\n").unwrap();
        let files = dir.path().join("files");
        fs::create_dir(&files).unwrap();

        let paths = RunPaths {
            input_csv: input,
            files_dir: files,
            output_csv: dir.path().join("matched.csv"),
        };
        let err = check_paths(&paths).unwrap_err();
        assert_eq!(err.0, vec![PreconditionError::EmptyDirectory(dir.path().join("files"))]);
    }

    #[test]
    fn test_output_equals_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("titles.csv");
        fs::write(&input, "Alpha,\n").unwrap();
        fs::write(dir.path().join("alpha.mkv"), b"").unwrap();

        let paths = RunPaths {
            input_csv: input.clone(),
            files_dir: dir.path().to_path_buf(),
            output_csv: input,
        };
        let err = check_paths(&paths).unwrap_err();
        assert!(matches!(err.0[0], PreconditionError::OutputIsInput(_)));
        assert!(err.to_string().contains("cannot be the same as the input"));
    }

    #[test]
    fn test_relative_output_uses_current_dir() {
        let paths = RunPaths {
            input_csv: PathBuf::from("/definitely/not/here.csv"),
            files_dir: PathBuf::from("/definitely/not/here"),
            output_csv: PathBuf::from("matched.csv"),
        };
        let err = check_paths(&paths).unwrap_err();
        assert!(err
            .0
            .iter()
            .all(|p| !matches!(p, PreconditionError::MissingOutputDirectory(_))));
    }
}
