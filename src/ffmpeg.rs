use crate::error::MediaError;
use crate::media::{MediaAsset, MediaKind, RenderSpec, VideoRenderer};
use crate::models::VideoArtifact;
use async_trait::async_trait;
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::process::Command;

fn render_err(msg: impl Into<String>) -> MediaError {
    MediaError::Render(msg.into())
}

async fn run_cmd(args: &[String]) -> Result<(), MediaError> {
    let Some((program, rest)) = args.split_first() else {
        return Ok(());
    };

    let output = Command::new(program)
        .args(rest)
        .output()
        .await
        .map_err(|e| render_err(format!("{program} execution failed: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(render_err(format!(
            "{program} failed: {}",
            crate::error::snippet(stderr.trim())
        )));
    }
    Ok(())
}

fn base_args() -> Vec<String> {
    ["ffmpeg", "-y", "-hide_banner", "-loglevel", "error"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn h264_args(fps: u32) -> Vec<String> {
    [
        "-r",
        &fps.to_string(),
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-preset",
        "veryfast",
        "-crf",
        "22",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub async fn ffprobe_video_dimensions(path: &Path) -> Result<(u32, u32), MediaError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| render_err(format!("ffprobe execution failed: {e}")))?;

    if !output.status.success() {
        return Err(render_err(format!("ffprobe failed on {}", path.display())));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let mut parts = text.split('x');
    let w = parts.next().and_then(|v| v.parse::<u32>().ok()).unwrap_or(0);
    let h = parts.next().and_then(|v| v.parse::<u32>().ok()).unwrap_or(0);

    if w == 0 || h == 0 {
        return Err(render_err(format!("invalid dimensions {text:?}")));
    }
    Ok((w, h))
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64, MediaError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| render_err(format!("ffprobe execution failed: {e}")))?;

    if !output.status.success() {
        return Err(render_err(format!("ffprobe failed on {}", path.display())));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.1 {
        return Err(render_err(format!("invalid duration {text:?}")));
    }
    Ok(duration)
}

/// Escape a path for use inside an ffmpeg filter argument.
fn filter_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

fn cover_filter(spec: &RenderSpec) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1",
        w = spec.width,
        h = spec.height
    )
}

/// Slow centered zoom over a still image, 1.0 to 1.1 across the segment.
fn ken_burns_filter(spec: &RenderSpec, duration_secs: f64) -> String {
    let frames = ((duration_secs * spec.fps as f64).round() as u64).max(1);
    format!(
        "scale={w2}:{h2}:force_original_aspect_ratio=increase,crop={w2}:{h2},\
         zoompan=z='min(zoom+{step:.6},1.1)':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d={frames}:s={w}x{h}:fps={fps},setsar=1",
        w2 = spec.width * 2,
        h2 = spec.height * 2,
        step = 0.1 / frames as f64,
        w = spec.width,
        h = spec.height,
        fps = spec.fps,
    )
}

fn finalize_filter(subtitles: &Path, spec: &RenderSpec) -> String {
    format!(
        "subtitles='{srt}':force_style='Fontname=Arial,Bold=1,Fontsize=16,PrimaryColour=&H00FFFFFF,OutlineColour=&H00000000,BorderStyle=1,Outline=2,Alignment=2,MarginV=90',\
         drawtext=text='{wm}':x=w*0.05:y=h*0.05:fontsize=36:fontcolor=white@0.7:borderw=1:bordercolor=black",
        srt = filter_path(subtitles),
        wm = spec.watermark.replace('\'', "").replace(':', "\\:"),
    )
}

/// Renderer backed by the `ffmpeg`/`ffprobe` executables on `PATH`.
#[derive(Debug, Default, Clone)]
pub struct FfmpegRenderer;

#[async_trait]
impl VideoRenderer for FfmpegRenderer {
    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError> {
        ffprobe_duration_seconds(path).await
    }

    async fn render_segment(
        &self,
        asset: &MediaAsset,
        duration_secs: f64,
        spec: &RenderSpec,
        out: &Path,
    ) -> Result<(), MediaError> {
        let mut args = base_args();
        match asset.kind {
            MediaKind::Video => {
                let src_dur = ffprobe_duration_seconds(&asset.path).await.unwrap_or(0.0);
                if src_dur > duration_secs {
                    let offset = rand::thread_rng().gen_range(0.0..(src_dur - duration_secs));
                    args.extend(["-ss".to_string(), format!("{offset:.3}")]);
                } else {
                    args.extend(["-stream_loop".to_string(), "-1".to_string()]);
                }
                args.extend([
                    "-i".to_string(),
                    asset.path.display().to_string(),
                    "-t".to_string(),
                    format!("{duration_secs:.3}"),
                    "-vf".to_string(),
                    cover_filter(spec),
                ]);
            }
            MediaKind::Image => {
                args.extend([
                    "-i".to_string(),
                    asset.path.display().to_string(),
                    "-vf".to_string(),
                    ken_burns_filter(spec, duration_secs),
                    "-t".to_string(),
                    format!("{duration_secs:.3}"),
                ]);
            }
        }
        args.push("-an".to_string());
        args.extend(h264_args(spec.fps));
        args.push(out.display().to_string());

        run_cmd(&args).await?;
        if !out.exists() {
            return Err(render_err(format!("segment {} not written", out.display())));
        }
        Ok(())
    }

    async fn concat_segments(&self, segments: &[PathBuf], out: &Path) -> Result<(), MediaError> {
        let list_txt = out.with_extension("txt");
        let list: String = segments
            .iter()
            .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', "'\\''")))
            .collect();
        tokio::fs::write(&list_txt, list)
            .await
            .map_err(|source| MediaError::Io {
                path: list_txt.clone(),
                source,
            })?;

        let mut args = base_args();
        args.extend(
            ["-f", "concat", "-safe", "0", "-i"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.push(list_txt.display().to_string());
        args.extend(["-c".to_string(), "copy".to_string()]);
        args.push(out.display().to_string());

        run_cmd(&args).await?;
        if !out.exists() {
            return Err(render_err("concat produced no output"));
        }
        Ok(())
    }

    async fn finalize(
        &self,
        visuals: &Path,
        narration: &Path,
        subtitles: &Path,
        spec: &RenderSpec,
        out: &Path,
    ) -> Result<VideoArtifact, MediaError> {
        let mut args = base_args();
        args.extend([
            "-i".to_string(),
            visuals.display().to_string(),
            "-i".to_string(),
            narration.display().to_string(),
            "-vf".to_string(),
            finalize_filter(subtitles, spec),
            "-map".to_string(),
            "0:v".to_string(),
            "-map".to_string(),
            "1:a".to_string(),
        ]);
        args.extend(h264_args(spec.fps));
        args.extend(
            [
                "-c:a",
                "aac",
                "-b:a",
                "192k",
                "-shortest",
                "-movflags",
                "+faststart",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.push(out.display().to_string());
        run_cmd(&args).await?;

        let size_bytes = tokio::fs::metadata(out)
            .await
            .map_err(|source| MediaError::Io {
                path: out.to_path_buf(),
                source,
            })?
            .len();
        let duration_secs = ffprobe_duration_seconds(out).await?;
        let (width, height) = ffprobe_video_dimensions(out).await?;

        Ok(VideoArtifact {
            path: out.to_path_buf(),
            duration_secs,
            width,
            height,
            size_bytes,
        })
    }
}
