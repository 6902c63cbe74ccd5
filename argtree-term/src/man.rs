use std::{
    fs, io,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

#[derive(Debug, thiserror::Error)]
pub enum ManError {
    #[error("Man file `{}` does not exist", .0.display())]
    Path(PathBuf),
    #[error("Unable to open man page using `{exe}`, {source}")]
    Execution { path: PathBuf, exe: String, source: io::Error },
}

/// Displays `man_path/page` with `man`, waiting for the viewer to exit.
pub fn show_manual(man_path: &Path, page: &str) -> Result<(), ManError> {
    show_manual_with("man", man_path, page)
}

/// Like [`show_manual`], with a different viewer program.
pub fn show_manual_with(viewer: &str, man_path: &Path, page: &str) -> Result<(), ManError> {
    let path = man_path.join(page);
    match fs::metadata(&path) {
        Ok(meta) if !meta.is_dir() => {}
        _ => return Err(ManError::Path(path)),
    }

    tracing::debug!(viewer, path = %path.display(), "spawning manual viewer");
    let mut child = Command::new(viewer)
        .arg(&path)
        .stdout(Stdio::inherit())
        .spawn()
        .map_err(|source| ManError::Execution {
            path: path.clone(),
            exe: viewer.to_string(),
            source,
        })?;

    // The viewer reports its own failures to the user.
    drop(child.wait());
    Ok(())
}
