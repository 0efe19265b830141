use std::{
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use crate::Error;

const OUTPUT_SUBDIRECTORY: &str = "cv_imshow";
const FALLBACK_TEMP_DIRECTORY: &str = "/tmp";
const IMAGE_EXTENSION: &str = "png";

/// How a written image is brought on screen.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Viewer {
    /// the platform's "open" action
    #[default]
    System,
    /// a given program, called with the image path as its only argument
    Command(String),
    Disabled,
}

#[derive(Clone, Debug, Default)]
pub struct DisplaySettings {
    /// overrides the directory below `TMPDIR`
    pub output_directory: Option<PathBuf>,
    pub viewer: Viewer,
}

impl DisplaySettings {
    pub fn resolve_output_directory(&self) -> PathBuf {
        match &self.output_directory {
            Some(directory) => directory.clone(),
            None => output_directory_in(env::var_os("TMPDIR")),
        }
    }
}

fn output_directory_in(temp_directory: Option<OsString>) -> PathBuf {
    temp_directory
        .filter(|directory| !directory.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(FALLBACK_TEMP_DIRECTORY))
        .join(OUTPUT_SUBDIRECTORY)
}

/// Path of the image file for a window; the name must stay inside `directory`.
pub fn image_path(directory: &Path, window_name: &str) -> crate::Result<PathBuf> {
    let is_plain_name = !window_name.is_empty()
        && window_name != "."
        && window_name != ".."
        && !window_name.contains(['/', '\\']);
    if !is_plain_name {
        return Err(Error::InvalidWindowName(window_name.to_owned()));
    }
    Ok(directory.join(format!("{}.{}", window_name, IMAGE_EXTENSION)))
}

pub fn ensure_directory_exists(directory: &Path) -> crate::Result<()> {
    if directory.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(directory).map_err(|e| {
        Error::UnableToCreateOutputDirectory(directory.display().to_string(), e)
    })
}

impl Viewer {
    /// Opens `path` and waits for the launcher to return.
    pub fn show(&self, path: &Path) -> crate::Result<()> {
        let mut command = match self {
            Self::Disabled => {
                log::info!("Viewer disabled, image left at '{}'", path.display());
                return Ok(());
            }
            Self::System => system_open_command(path),
            Self::Command(program) => {
                let mut command = Command::new(program);
                command.arg(path);
                command
            }
        };
        let program = command.get_program().to_string_lossy().into_owned();
        let status = command
            .status()
            .map_err(|e| Error::FailedToLaunchViewer(program.clone(), e))?;
        if !status.success() {
            log::warn!("Viewer '{}' exited with {}", program, status);
        }
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn system_open_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(target_os = "windows")]
fn system_open_command(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn system_open_command(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}
