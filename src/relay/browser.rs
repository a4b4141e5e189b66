//! Opening the portal in the user's browser
//!
//! Delegates to the platform URL opener, which reuses an existing browser
//! window when the desktop supports it.

use async_trait::async_trait;
use std::process::{Command, Stdio};
use tracing::info;
use url::Url;

use super::host::WindowOpener;
use crate::errors::{AppError, AppResult};

/// Production [`WindowOpener`] spawning the platform launcher, detached
#[derive(Default)]
pub struct CommandWindowOpener;

impl CommandWindowOpener {
    pub fn new() -> Self {
        CommandWindowOpener
    }
}

/// Launcher invocation for a URL: `xdg-open` on Linux, `open` on macOS,
/// `cmd /C start` on Windows.
pub(crate) fn launcher_command(url: &str) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "windows") {
        (
            "cmd",
            vec![
                "/C".to_string(),
                "start".to_string(),
                String::new(), // window title slot of `start`
                url.to_string(),
            ],
        )
    } else if cfg!(target_os = "macos") {
        ("open", vec![url.to_string()])
    } else {
        ("xdg-open", vec![url.to_string()])
    }
}

#[async_trait]
impl WindowOpener for CommandWindowOpener {
    async fn open_window(&self, url: &Url) -> AppResult<()> {
        let (program, args) = launcher_command(url.as_str());

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AppError::browser_launch(url.as_str(), e))?;

        // The launcher detaches on its own; reap it off the async path.
        tokio::task::spawn_blocking(move || {
            let _ = child.wait();
        });

        info!("requested browser window for {url}");
        Ok(())
    }
}
