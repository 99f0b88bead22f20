//! Headless driver: sweeps progress from 0 to 1 and logs what each frame produces.
//!
//! ```text
//! rigcloud [CONFIG.json] [--frames N] [--dump-config]
//! RUST_LOG=debug rigcloud --frames 20
//! ```

use rigcloud::{Scene, SceneConfig, SceneError};
use std::process::ExitCode;

const DEFAULT_FRAMES: u32 = 120;
const FRAME_RATE: f32 = 60.0;

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    frames: Option<u32>,
    dump_config: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--frames" => {
                let value = args.next().ok_or("--frames needs a value")?;
                let frames = value
                    .parse()
                    .map_err(|_| format!("--frames expects a whole number, got {:?}", value))?;
                parsed.frames = Some(frames);
            }
            "--dump-config" => parsed.dump_config = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag {}", flag)),
            path => {
                if parsed.config.replace(path.to_string()).is_some() {
                    return Err("only one config file may be given".to_string());
                }
            }
        }
    }
    Ok(parsed)
}

fn run(args: Args) -> Result<(), SceneError> {
    let config = match &args.config {
        Some(path) => {
            log::info!("loading config from {}", path);
            SceneConfig::load(path)?
        }
        None => SceneConfig::default(),
    };

    if args.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let mut scene = Scene::new(config)?;
    let frames = args.frames.unwrap_or(DEFAULT_FRAMES).max(1);

    for i in 0..=frames {
        let progress = i as f32 / frames as f32;
        let time = i as f32 / FRAME_RATE;
        let frame = scene.frame(progress, time);

        let settled = frame.assembly.iter().filter(|p| p.local_progress >= 1.0).count();
        let visible_flow = frame.flow.iter().filter(|p| p.alpha > 0.0).count();
        log::info!(
            "progress {:.3}: build {:.3}, fog {:.2}, settled {}/{}, flow {}/{}, camera ({:.1}, {:.1}, {:.1})",
            progress,
            frame.state.build_progress,
            frame.state.fog_density,
            settled,
            frame.assembly.len(),
            visible_flow,
            frame.flow.len(),
            frame.pose.position.x,
            frame.pose.position.y,
            frame.pose.position.z,
        );
        log::debug!(
            "headline {:.2}, subhead {:.2}, glow {:.2}",
            frame.state.headline_opacity,
            frame.state.subhead_opacity,
            frame.state.glow_intensity
        );
    }

    log::info!("done, generated the rig {} time(s)", scene.generation_count());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("usage: rigcloud [CONFIG.json] [--frames N] [--dump-config]");
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["scene.json", "--frames", "10", "--dump-config"]).unwrap();
        assert_eq!(parsed.config.as_deref(), Some("scene.json"));
        assert_eq!(parsed.frames, Some(10));
        assert!(parsed.dump_config);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&["--frames"]).is_err());
        assert!(args(&["--frames", "ten"]).is_err());
        assert!(args(&["--fast"]).is_err());
        assert!(args(&["a.json", "b.json"]).is_err());
    }
}
