//! Interactive driver that feeds captured window input into the session.

use std::sync::Arc;

use anyhow::{Context, Result};
use quantum_groove_rendering::{
    FrameMailbox, HudPresentation, Presentation, RenderingBackend, Scene, SceneLayout,
};
use quantum_groove_rendering_macroquad::MacroquadBackend;
use quantum_groove_system_arrangement::MelodyModel;
use quantum_groove_world::{apply, query, Session, SessionConfig};
use tracing::info;

use crate::sound::TracingSoundEngine;

/// Options forwarded to the rendering backend.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WindowOptions {
    pub(crate) vsync: bool,
    pub(crate) show_fps: bool,
}

/// Opens the window and runs the session until the window closes.
pub(crate) fn run(
    config: SessionConfig,
    melody: Option<Arc<dyn MelodyModel>>,
    options: WindowOptions,
) -> Result<()> {
    let mut session = Session::new(config, TracingSoundEngine::new(), FrameMailbox::new(), melody);
    let presentation = Presentation::new(
        query::welcome_banner(&session),
        Scene::new(SceneLayout::default()),
    );

    let backend = MacroquadBackend::new()
        .with_vsync(options.vsync)
        .with_show_fps(options.show_fps);

    let mut commands = Vec::new();
    let mut events = Vec::new();
    backend
        .run(presentation, move |dt, input, scene| {
            commands.clear();
            input.commands(dt, &mut commands);
            for command in commands.drain(..) {
                apply(&mut session, command, &mut events);
            }
            events.clear();

            if let Some(frame) = session.visuals_mut().take() {
                scene.apply_frame(&frame);
            }
            scene.decay(dt);
            scene.hud = hud_for(&session);
        })
        .context("rendering backend failed")?;

    info!("window closed");
    Ok(())
}

fn hud_for(session: &Session<TracingSoundEngine, FrameMailbox>) -> HudPresentation {
    HudPresentation {
        tempo: query::tempo(session).unwrap_or_default(),
        tier: query::complexity(session).unwrap_or_default(),
        triggers: session.visuals().triggers(),
        generated_melody: query::melody_generated(session),
    }
}
