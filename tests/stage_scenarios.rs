use std::path::Path;

use zoomstage::{
    Camera, FrameStats, Point, PointerTarget, Scene, Stage, StageOpts, TickOutcome,
    render::{ElementContent, OverlayElement},
};

fn load_fixture(name: &str) -> Scene {
    let json = std::fs::read_to_string(Path::new("tests/data").join(name)).unwrap();
    Scene::from_json(&json).unwrap()
}

fn stage(animations_enabled: bool) -> Stage {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Stage::new(
        load_fixture("showcase.json"),
        StageOpts {
            width: 800.0,
            height: 600.0,
            animations_enabled,
            grid: None,
            ..StageOpts::default()
        },
    )
    .unwrap()
}

fn rendered(outcome: TickOutcome) -> FrameStats {
    match outcome {
        TickOutcome::Rendered(stats) => stats,
        TickOutcome::Halted => panic!("stage halted"),
    }
}

fn el<'a>(stage: &'a Stage, id: &str) -> &'a OverlayElement {
    stage.element(id).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn first_frame_places_world_screen_and_child_nodes() {
    let mut stage = stage(true);
    let stats = rendered(stage.tick(0.0));
    assert_eq!(stats.overlay_elements, 4);
    assert_eq!(stats.vectors, 1);
    assert_eq!(stats.hidden, 1);
    assert_eq!(stats.culled_offscreen, 0);

    // Center-anchored 200x100 box at the world origin.
    let title = el(&stage, "title").style.clone().unwrap();
    assert!(approx(title.rect.left, 300.0));
    assert!(approx(title.rect.top, 250.0));
    assert!(approx(title.rect.width, 200.0));

    // Offset (0.5, 1) and size (1, 0.25) in units of the parent's 100 px height; inherits the
    // center anchor.
    let sub = el(&stage, "subtitle").style.clone().unwrap();
    assert!(approx(sub.rect.width, 100.0));
    assert!(approx(sub.rect.height, 25.0));
    assert!(approx(sub.rect.left, 400.0));
    assert!(approx(sub.rect.top, 387.5));

    let hud = el(&stage, "hud").style.clone().unwrap();
    assert!(approx(hud.rect.left, 720.0));
    assert!(approx(hud.rect.top, 30.0));
    assert!(approx(hud.rect.width, 40.0));

    assert!(stage.element("detail").is_none());
    assert!(stage.element("link").is_none());
}

#[test]
fn fade_in_is_half_way_at_midpoint() {
    let mut stage = stage(true);
    rendered(stage.tick(0.0));
    assert_eq!(el(&stage, "title").style.as_ref().unwrap().opacity, 0.0);
    rendered(stage.tick(500.0));
    let opacity = el(&stage, "title").style.as_ref().unwrap().opacity;
    assert!((opacity - 0.5).abs() < 1e-9);
    rendered(stage.tick(1000.0));
    assert_eq!(el(&stage, "title").style.as_ref().unwrap().opacity, 1.0);
}

#[test]
fn pixelate_waits_for_its_image() {
    let mut stage = stage(true);
    rendered(stage.tick(0.0));
    assert_eq!(stage.images().pending(), vec!["logo.png".to_string()]);
    let logo = el(&stage, "logo");
    assert_eq!(logo.style.as_ref().unwrap().opacity, 0.0);
    assert_eq!(logo.pixelation.map(|p| p.step), Some(0));
    assert_eq!(
        logo.content,
        ElementContent::Image {
            src: "logo.png".to_string()
        }
    );

    // Time spent loading does not count toward the effect.
    rendered(stage.tick(90.0));
    stage
        .images_mut()
        .complete("logo.png", image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 255, 255])));
    rendered(stage.tick(100.0));
    rendered(stage.tick(625.0));
    let logo = el(&stage, "logo");
    assert_eq!(logo.style.as_ref().unwrap().opacity, 1.0);
    let px = logo.pixelation.unwrap();
    assert_eq!((px.step, px.steps), (5, 10));
    assert!(logo.pixel_frame.is_some());

    rendered(stage.tick(1100.0));
    let logo = el(&stage, "logo");
    assert_eq!(logo.pixelation, None);
    assert!(stage.scheduler().enter_state("logo").unwrap().done);
}

#[test]
fn going_to_a_view_exits_old_nodes_and_moves_the_camera() {
    let mut stage = stage(true);
    rendered(stage.tick(0.0));
    rendered(stage.tick(1000.0));

    stage.go_to_view("detail", 1000.0).unwrap();
    let scene = stage.scene();
    assert_eq!(scene.node("title").unwrap().exit_start_ms, Some(1000.0));
    assert!(scene.node("title").unwrap().visible);
    assert!(!scene.node("subtitle").unwrap().visible);
    assert!(!scene.node("logo").unwrap().visible);
    assert!(scene.node("detail").unwrap().visible);

    let stats = rendered(stage.tick(1000.0));
    assert!(stats.camera_moving);
    assert_eq!(
        stage.scheduler().exit_state("title").map(|s| s.done),
        Some(false)
    );
    assert!(!el(&stage, "subtitle").shown);

    rendered(stage.tick(1100.0));
    let opacity = el(&stage, "title").style.as_ref().unwrap().opacity;
    assert!((opacity - 0.5).abs() < 1e-9);

    // Raised-sine camera easing is exactly half way at the midpoint.
    rendered(stage.tick(1250.0));
    let cam = stage.camera();
    assert!(approx(cam.cx, 100.0));
    assert!(approx(cam.zoom, 1.5));
    assert!(stage.scene().node("title").unwrap().visible);

    let stats = rendered(stage.tick(1500.0));
    assert!(!stats.camera_moving);
    assert_eq!(stage.camera(), Camera::new(200.0, 0.0, 2.0));
    let title = stage.scene().node("title").unwrap();
    assert!(!title.visible);
    assert_eq!(title.exit_start_ms, None);
    assert!(!el(&stage, "title").shown);

    let detail = el(&stage, "detail").style.clone().unwrap();
    assert!(approx(detail.rect.left, 300.0));
    assert!(approx(detail.rect.top, 200.0));
    assert!(approx(detail.rect.width, 200.0));
    assert_eq!(
        el(&stage, "detail").content,
        ElementContent::Markup {
            html: "<ul><li>one</li><li>two</li></ul>".to_string()
        }
    );
}

#[test]
fn re_showing_an_exiting_node_cancels_the_exit() {
    let mut stage = stage(true);
    rendered(stage.tick(0.0));
    rendered(stage.tick(1000.0));
    stage.go_to_view("detail", 1000.0).unwrap();
    rendered(stage.tick(1050.0));
    stage.go_to_view("intro", 1100.0).unwrap();
    assert_eq!(stage.scene().node("title").unwrap().exit_start_ms, None);

    rendered(stage.tick(1200.0));
    rendered(stage.tick(2000.0));
    assert!(stage.scene().node("title").unwrap().visible);
    assert_eq!(el(&stage, "title").style.as_ref().unwrap().opacity, 1.0);
}

#[test]
fn disabled_animations_show_resting_state() {
    let mut stage = stage(false);
    rendered(stage.tick(0.0));
    assert_eq!(el(&stage, "title").style.as_ref().unwrap().opacity, 1.0);
    let logo = el(&stage, "logo");
    assert_eq!(logo.style.as_ref().unwrap().opacity, 1.0);
    assert_eq!(logo.pixelation, None);

    // Re-enabling does not replay entrances that were settled while disabled.
    stage.set_animations_enabled(true);
    rendered(stage.tick(10.0));
    assert_eq!(el(&stage, "title").style.as_ref().unwrap().opacity, 1.0);
    assert_eq!(el(&stage, "logo").pixelation, None);

    // Exits skip straight to hidden while disabled.
    stage.set_animations_enabled(false);
    stage.go_to_view("detail", 20.0).unwrap();
    assert!(!stage.scene().node("title").unwrap().visible);
    assert_eq!(stage.scene().node("title").unwrap().exit_start_ms, None);
}

#[test]
fn hidden_then_shown_replays_the_entrance() {
    let mut stage = stage(true);
    rendered(stage.tick(0.0));
    rendered(stage.tick(2000.0));
    stage.patch_node("title", &serde_json::json!({ "visible": false })).unwrap();
    rendered(stage.tick(2100.0));
    assert!(stage.scheduler().enter_state("title").is_none());
    stage.patch_node("title", &serde_json::json!({ "visible": true })).unwrap();
    rendered(stage.tick(2200.0));
    rendered(stage.tick(2700.0));
    let opacity = el(&stage, "title").style.as_ref().unwrap().opacity;
    assert!((opacity - 0.5).abs() < 1e-9);
}

#[test]
fn errors_halt_the_stage_with_a_diagnostic() {
    let mut stage = stage(true);
    rendered(stage.tick(0.0));
    assert_eq!(stage.tick(f64::INFINITY), TickOutcome::Halted);
    assert!(stage.is_halted());
    let reason = stage.halt_reason().unwrap().to_string();
    assert!(reason.contains("finite"));
    assert_eq!(stage.overlay().diagnostic(), Some(reason.as_str()));
    assert_eq!(stage.tick(16.0), TickOutcome::Halted);
}

#[test]
fn background_drag_and_wheel_move_the_camera() {
    let mut stage = stage(true);
    stage.pointer_down(Point::new(100.0, 100.0), PointerTarget::Background);
    stage.pointer_move(Point::new(150.0, 120.0));
    stage.pointer_up();
    assert_eq!(stage.camera(), Camera::new(-50.0, -20.0, 1.0));

    let cursor = Point::new(200.0, 150.0);
    let before = stage.camera().screen_to_world(cursor, stage.viewport());
    stage.wheel(cursor, -300.0);
    assert!(stage.camera().zoom > 1.0);
    let after = stage.camera().screen_to_world(cursor, stage.viewport());
    assert!((before.x - after.x).abs() < 1e-6);
    assert!((before.y - after.y).abs() < 1e-6);

    stage.set_interactive(false);
    let frozen = stage.camera();
    stage.wheel(cursor, -300.0);
    assert_eq!(stage.camera(), frozen);
}

#[test]
fn panning_far_away_culls_world_nodes_but_not_screen_nodes() {
    let mut stage = stage(true);
    stage.set_camera(Camera::new(50_000.0, 0.0, 1.0));
    let stats = rendered(stage.tick(0.0));
    assert_eq!(stats.overlay_elements, 1);
    assert_eq!(stats.vectors, 0);
    assert_eq!(stats.culled_offscreen, 4);
    assert!(el(&stage, "hud").shown);
    assert!(stage.element("title").is_none());
}

#[test]
fn unknown_view_is_rejected() {
    let mut stage = stage(true);
    let err = stage.go_to_view("nowhere", 0.0).unwrap_err();
    assert!(err.to_string().contains("nowhere"));
    assert!(stage.resize(0.0, 100.0).is_err());
    stage.resize(1024.0, 768.0).unwrap();
    assert_eq!(stage.viewport().width, 1024.0);
}

#[test]
fn entrance_clock_starts_on_the_first_frame_in_view() {
    let mut stage = stage(true);
    stage.set_camera(Camera::new(50_000.0, 0.0, 1.0));
    rendered(stage.tick(0.0));
    rendered(stage.tick(500.0));
    assert!(stage.scheduler().enter_state("title").is_none());

    stage.set_camera(Camera::new(0.0, 0.0, 1.0));
    rendered(stage.tick(700.0));
    assert_eq!(
        stage.scheduler().enter_state("title").unwrap().anchor_ms,
        Some(700.0)
    );
    assert_eq!(el(&stage, "title").style.as_ref().unwrap().opacity, 0.0);
    rendered(stage.tick(1200.0));
    let opacity = el(&stage, "title").style.as_ref().unwrap().opacity;
    assert!((opacity - 0.5).abs() < 1e-9);
}

#[test]
fn exit_finishes_while_panned_away() {
    let mut stage = stage(true);
    rendered(stage.tick(0.0));
    rendered(stage.tick(1000.0));
    stage.mark_exit("title", 2000.0).unwrap();
    stage.set_camera(Camera::new(50_000.0, 0.0, 1.0));

    rendered(stage.tick(2050.0));
    assert!(stage.scene().node("title").unwrap().visible);
    // The 200 ms fade is over; settlement lands on the following tick.
    rendered(stage.tick(2300.0));
    rendered(stage.tick(2400.0));
    let title = stage.scene().node("title").unwrap();
    assert!(!title.visible);
    assert_eq!(title.exit_start_ms, None);

    // Showing it again replays the entrance from the start.
    stage.go_to_view("intro", 3000.0).unwrap();
    stage.set_camera(Camera::new(0.0, 0.0, 1.0));
    rendered(stage.tick(3000.0));
    assert_eq!(el(&stage, "title").style.as_ref().unwrap().opacity, 0.0);
    rendered(stage.tick(3500.0));
    let opacity = el(&stage, "title").style.as_ref().unwrap().opacity;
    assert!((opacity - 0.5).abs() < 1e-9);
}

#[test]
fn zoomed_in_pixelation_stays_at_source_resolution() {
    let scene = Scene::from_json(
        r#"{ "nodes": [ { "id": "photo", "type": "image", "src": "photo.png",
            "transform": { "x": 0, "y": 0, "w": 1000, "h": 1000, "anchor": "center" },
            "appear": { "kind": "pixelate", "durationMs": 1000, "steps": 10 } } ] }"#,
    )
    .unwrap();
    let mut stage = Stage::new(
        scene,
        StageOpts {
            width: 800.0,
            height: 600.0,
            grid: None,
            ..StageOpts::default()
        },
    )
    .unwrap();
    stage.set_camera(Camera::new(0.0, 0.0, 10.0));
    rendered(stage.tick(0.0));
    stage.images_mut().complete(
        "photo.png",
        image::RgbaImage::from_pixel(200, 200, image::Rgba([0, 128, 0, 255])),
    );
    rendered(stage.tick(0.0));
    rendered(stage.tick(500.0));

    let photo = el(&stage, "photo");
    assert_eq!(photo.pixelation.map(|p| p.step), Some(5));
    assert!(approx(photo.style.as_ref().unwrap().rect.width, 10_000.0));
    let frame = photo.pixel_frame.as_ref().unwrap();
    assert_eq!(frame.dimensions(), (100, 100));
}

#[test]
fn directional_fade_still_animates_arrows() {
    let scene = Scene::from_json(
        r#"{ "nodes": [ { "id": "pointer", "type": "arrow",
            "transform": { "x": -100, "y": 0, "w": 200, "h": 10 },
            "appear": { "kind": "fade", "from": "left", "durationMs": 1000 } } ] }"#,
    )
    .unwrap();
    let mut stage = Stage::new(
        scene,
        StageOpts {
            width: 800.0,
            height: 600.0,
            grid: None,
            ..StageOpts::default()
        },
    )
    .unwrap();
    assert_eq!(rendered(stage.tick(0.0)).vectors, 0);
    assert_eq!(rendered(stage.tick(500.0)).vectors, 1);
}
