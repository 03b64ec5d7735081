//! Headless driver: runs a scene at 60 Hz with periodic clicks and logs what
//! the render layer would receive.
//!
//! Run with: `RUST_LOG=debug cargo run --release --features demo -- [frames] [config.json]`

use starchain::prelude::*;

const DT: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let frames: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(900);

    let config = match args.next() {
        Some(path) => match BackgroundConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => BackgroundConfig::default(),
    };

    let mut scene = match Scene::new(config, 16.0 / 9.0) {
        Ok(scene) => scene,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let mut peak_lines = 0;
    for frame in 0..frames {
        // Click somewhere new every two seconds, sweeping across the screen.
        if frame % 120 == 0 {
            let t = (frame / 120) as f32;
            let ndc = Vec2::new((t * 0.37).sin() * 0.8, (t * 0.61).cos() * 0.6);
            let scheduled = scene.click_ndc(ndc);
            log::info!("frame {}: click at {:?} scheduled {} lines", frame, ndc, scheduled);
        }

        scene.frame(DT);

        let vertices = scene.line_vertices();
        peak_lines = peak_lines.max(vertices.len() / 2);
        if frame % 60 == 0 {
            log::info!(
                "frame {}: {} points, {} visible lines, {} active",
                frame,
                scene.point_instances().len(),
                vertices.len() / 2,
                scene.sequencer().lines().len()
            );
        }
    }

    log::info!("done: {} frames, peak {} visible lines", frames, peak_lines);
}
