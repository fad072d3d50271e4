//! Window shell: polls input into `InputFrame`s, renders through the viewer
//! and blits the framebuffer to the window

use macroquad::prelude::{
    clear_background, draw_text, draw_texture_ex, get_frame_time, is_key_down, is_key_pressed,
    is_mouse_button_down, mouse_position, mouse_wheel, next_frame, screen_height, screen_width,
    vec2, Conf, DrawTextureParams, FilterMode, KeyCode, MouseButton, Texture2D, BLACK, WHITE,
};
use facet_raster::config::AppConfig;
use facet_raster::rasterizer::Vec3;
use facet_raster::viewer::{FrameStats, InputFrame, Viewer};
use facet_raster::VERSION;
use tracing::info;

/// Open the window and run until it closes or Esc is pressed
pub fn run(config: AppConfig) {
    let conf = Conf {
        window_title: format!("facet v{}", VERSION),
        window_width: config.width as i32,
        window_height: config.height as i32,
        window_resizable: true,
        ..Default::default()
    };
    macroquad::Window::from_config(conf, event_loop(config));
}

async fn event_loop(config: AppConfig) {
    let mut viewer = Viewer::from_config(&config);
    let mut stats = FrameStats::new();
    let mut last_mouse: Option<(f32, f32)> = None;
    let mut rgba = Vec::new();

    loop {
        if is_key_pressed(KeyCode::Escape) {
            info!("Quit requested");
            break;
        }

        #[cfg(not(target_arch = "wasm32"))]
        if is_key_pressed(KeyCode::O) {
            open_model_dialog(&mut viewer);
        }

        let dt = get_frame_time();
        stats.tick(dt);

        let input = poll_input(dt, &mut last_mouse);
        viewer.apply(&input);

        let fb = viewer.render_frame();
        fb.write_rgba8(&mut rgba);
        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &rgba);
        texture.set_filter(FilterMode::Nearest);

        clear_background(BLACK);
        draw_texture_ex(
            &texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );
        draw_overlay(&viewer, &stats);

        next_frame().await;
    }
}

/// Gather one frame of keyboard/mouse state
fn poll_input(dt: f32, last_mouse: &mut Option<(f32, f32)>) -> InputFrame {
    let axis = |pos: KeyCode, neg: KeyCode| -> f32 {
        (is_key_down(pos) as i32 - is_key_down(neg) as i32) as f32
    };

    let shift = is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift);
    let rotate_keys = [KeyCode::Key1, KeyCode::Key2, KeyCode::Key3];
    let rotating = rotate_keys.iter().any(|&k| is_key_down(k));

    // Shift is a modifier while a rotate key is held, otherwise it flies down
    let descend = is_key_down(KeyCode::LeftShift) && !rotating;
    let camera_move = Vec3::new(
        axis(KeyCode::A, KeyCode::D),
        axis(KeyCode::W, KeyCode::S),
        is_key_down(KeyCode::Space) as i32 as f32 - descend as i32 as f32,
    );

    let sign = if shift { -1.0 } else { 1.0 };
    let [rx, ry, rz] = rotate_keys.map(|k| if is_key_down(k) { sign } else { 0.0 });

    let model_move = Vec3::new(
        axis(KeyCode::Right, KeyCode::Left),
        axis(KeyCode::Up, KeyCode::Down),
        axis(KeyCode::PageUp, KeyCode::PageDown),
    );

    // Drag to look
    let look = if is_mouse_button_down(MouseButton::Left) || is_mouse_button_down(MouseButton::Right) {
        let pos = mouse_position();
        let delta = last_mouse.map(|(x, y)| (x - pos.0, y - pos.1)).unwrap_or((0.0, 0.0));
        *last_mouse = Some(pos);
        delta
    } else {
        *last_mouse = None;
        (0.0, 0.0)
    };

    let wheel = mouse_wheel().1;
    let zoom = if wheel > 0.0 {
        Some(true)
    } else if wheel < 0.0 {
        Some(false)
    } else {
        None
    };

    InputFrame {
        camera_move,
        look,
        zoom,
        model_rotate: Vec3::new(rx, ry, rz),
        model_move,
        dt,
        reset_model: is_key_pressed(KeyCode::R),
    }
}

fn draw_overlay(viewer: &Viewer, stats: &FrameStats) {
    let eye = viewer.camera.eye();
    let render = viewer.stats();
    let lines = [
        format!("FPS {:.0} ({:.1} ms)", stats.fps(), stats.frame_ms()),
        format!("eye ({:.2}, {:.2}, {:.2})  zoom {:.2}", eye.x, eye.y, eye.z, viewer.camera.scale_factor()),
        format!("triangles {} drawn, {} clipped", render.rasterized, render.clipped),
    ];
    for (i, line) in lines.iter().enumerate() {
        draw_text(line, 10.0, 24.0 + i as f32 * 22.0, 22.0, WHITE);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn open_model_dialog(viewer: &mut Viewer) {
    let extensions = facet_raster::parser::supported_extensions();
    let dialog = rfd::FileDialog::new().add_filter("Mesh", extensions.as_slice());

    if let Some(path) = dialog.pick_file() {
        match viewer.open_model(&path) {
            Ok(()) => info!(path = %path.display(), "Opened model"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Open failed"),
        }
    }
}
