//! Shell-based media toolkit: `ffprobe`, `ffmpeg`, ImageMagick, Ghostscript.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error};

use homevault_core::config::MediaConfig;
use homevault_core::error::{AppError, ErrorKind};
use homevault_core::result::AppResult;
use homevault_core::traits::MediaToolkit;
use homevault_core::types::media::{MediaClass, ThumbMethod};

use crate::layout::StorageLayout;
use crate::local;

/// Runs external binaries for duration probing and thumbnailing.
#[derive(Debug, Clone)]
pub struct ShellMediaToolkit {
    config: MediaConfig,
    layout: StorageLayout,
}

impl ShellMediaToolkit {
    /// Create a toolkit writing intermediate frames to the layout's
    /// scratch directory.
    pub fn new(config: MediaConfig, layout: StorageLayout) -> Self {
        Self { config, layout }
    }

    /// Arguments for `convert` producing a `width`-wide thumbnail.
    pub fn convert_args(
        source: &Path,
        dest: &Path,
        method: ThumbMethod,
        width: u32,
    ) -> Vec<String> {
        let mut args = vec![source.to_string_lossy().into_owned()];
        match method.height_for(width) {
            Some(height) => args.extend([
                "-geometry".to_string(),
                format!("{width}x{height}^"),
                "-gravity".to_string(),
                "center".to_string(),
                "-crop".to_string(),
                format!("{width}x{height}+0+0"),
                "+repage".to_string(),
            ]),
            None => args.extend(["-scale".to_string(), format!("{width}x")]),
        }
        args.push(dest.to_string_lossy().into_owned());
        args
    }

    async fn render_image(&self, source: &Path, dest: &Path, method: ThumbMethod) -> AppResult<()> {
        let args = Self::convert_args(source, dest, method, self.config.thumb_width);
        run(&self.config.convert_bin, &args).await.map(|_| ())
    }

    async fn render_video(&self, source: &Path, dest: &Path, method: ThumbMethod) -> AppResult<()> {
        let offset = self.probe_duration(source).await.unwrap_or(0.0) / 5.0;
        let frame = self.layout.temp_file("frame", "jpg");
        local::ensure_dir(self.layout.temp_dir()).await?;

        let args = vec![
            "-y".to_string(),
            "-ss".to_string(),
            format!("{offset:.0}"),
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-vframes".to_string(),
            "1".to_string(),
            "-an".to_string(),
            frame.to_string_lossy().into_owned(),
        ];
        let result = match run(&self.config.ffmpeg_bin, &args).await {
            Ok(_) => self.render_image(&frame, dest, method).await,
            Err(e) => Err(e),
        };
        local::remove_best_effort(&frame, "video frame").await;
        result
    }

    async fn render_pdf(&self, source: &Path, dest: &Path, method: ThumbMethod) -> AppResult<()> {
        let page = self.layout.temp_file("page", "jpg");
        local::ensure_dir(self.layout.temp_dir()).await?;

        let args = vec![
            "-dSAFER".to_string(),
            "-dBATCH".to_string(),
            "-dNOPAUSE".to_string(),
            "-dJPEGQ=95".to_string(),
            "-r72x72".to_string(),
            "-sDEVICE=jpeg".to_string(),
            "-dFirstPage=1".to_string(),
            "-dLastPage=1".to_string(),
            "-o".to_string(),
            page.to_string_lossy().into_owned(),
            source.to_string_lossy().into_owned(),
        ];
        let result = match run(&self.config.ghostscript_bin, &args).await {
            Ok(_) => self.render_image(&page, dest, method).await,
            Err(e) => Err(e),
        };
        local::remove_best_effort(&page, "rendered page").await;
        result
    }
}

#[async_trait]
impl MediaToolkit for ShellMediaToolkit {
    async fn probe_duration(&self, path: &Path) -> AppResult<f64> {
        let args = vec![
            "-v".to_string(),
            "0".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            path.to_string_lossy().into_owned(),
        ];
        let stdout = run(&self.config.ffprobe_bin, &args).await?;
        parse_duration(&stdout)
    }

    async fn generate_thumbnail(
        &self,
        source: &Path,
        dest: &Path,
        mime: &str,
        method: ThumbMethod,
    ) -> AppResult<()> {
        match MediaClass::of(mime) {
            MediaClass::Image => self.render_image(source, dest, method).await,
            MediaClass::Video => self.render_video(source, dest, method).await,
            MediaClass::Pdf => self.render_pdf(source, dest, method).await,
            MediaClass::Audio | MediaClass::Other => Err(AppError::bad_request(format!(
                "Cannot generate a thumbnail for {mime}"
            ))),
        }
    }
}

/// Parse `ffprobe` duration output.
pub fn parse_duration(stdout: &str) -> AppResult<f64> {
    let trimmed = stdout.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| AppError::external(format!("Unparseable duration '{trimmed}'")))
}

/// Run a tool to completion, returning stdout on success.
async fn run(program: &str, args: &[String]) -> AppResult<String> {
    debug!(program, ?args, "Running media tool");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Failed to start {program}"),
                e,
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output.status.code().unwrap_or(-1);
        error!(
            program,
            code,
            stderr = %stderr.chars().take(500).collect::<String>(),
            "Media tool failed"
        );
        return Err(AppError::external(format!(
            "{program} exited with code {code}"
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
