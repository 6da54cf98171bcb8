//! ffmpeg command-line Transcode Engine
//!
//! Builds an argument vector from a [`TranscodeSpec`] and runs the `ffmpeg`
//! binary directly (no shell). Success is a zero exit status.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use super::{
    stderr_tail, ChannelAddressing, EngineMode, EngineOutput, TranscodeEngine, TranscodeSpec,
};

/// Runs extraction attempts through the `ffmpeg` binary
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    program: PathBuf,
}

impl FfmpegEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Build the ffmpeg argument list for one attempt
    pub fn build_args(spec: &TranscodeSpec) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |a: &str| args.push(a.into());

        push("-hide_banner");
        push("-nostdin");
        push("-loglevel");
        push("error");
        push(if spec.overwrite { "-y" } else { "-n" });

        args.push("-i".into());
        args.push(spec.input_path.as_os_str().to_owned());
        for a in ["-vn", "-sn", "-dn"] {
            args.push(a.into());
        }

        let track = format!("0:a:{}", spec.track);
        match spec.channel {
            None => {
                args.push("-map".into());
                args.push(track.into());
            }
            Some(sel) => {
                let pan = format!("pan=mono|c0=c{}", sel.channel);
                match sel.addressing {
                    ChannelAddressing::Generic => {
                        args.push("-map".into());
                        args.push(track.into());
                        args.push("-af".into());
                        args.push(pan.into());
                    }
                    ChannelAddressing::StreamQualified => {
                        args.push("-filter_complex".into());
                        args.push(format!("[{}]{}[ch]", track, pan).into());
                        args.push("-map".into());
                        args.push("[ch]".into());
                    }
                }
            }
        }

        args.push("-c:a".into());
        match &spec.mode {
            // A filtered stream cannot be stream-copied; re-emitting the
            // source PCM codec keeps the samples bit-exact.
            EngineMode::Copy if spec.channel.is_some() => {
                args.push(spec.source_codec.clone().into());
            }
            EngineMode::Copy => args.push("copy".into()),
            EngineMode::Reencode(choice) => {
                args.push(choice.encoder.into());
                if let Some(bitrate) = &choice.bitrate {
                    args.push("-b:a".into());
                    args.push(bitrate.into());
                }
            }
        }

        args.push("-map_metadata".into());
        args.push(if spec.preserve_metadata { "0" } else { "-1" }.into());

        args.push(spec.output_path.as_os_str().to_owned());
        args
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl TranscodeEngine for FfmpegEngine {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn run(&self, spec: &TranscodeSpec) -> EngineOutput {
        let args = Self::build_args(spec);
        tracing::debug!(
            "Running {} {}",
            self.program.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(out) if out.status.success() => EngineOutput::ok(),
            Ok(out) => {
                tracing::debug!("{} exited with {}", self.program.display(), out.status);
                EngineOutput::failed(stderr_tail(&out.stderr))
            }
            Err(e) => EngineOutput::failed(format!(
                "failed to start {}: {}",
                self.program.display(),
                e
            )),
        }
    }
}
