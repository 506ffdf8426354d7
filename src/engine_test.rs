use super::*;

fn hd() -> CanvasSize {
    CanvasSize::new(1280.0, 720.0)
}

fn core_at_calibrate() -> EstimatorCore {
    let mut core = EstimatorCore::default();
    core.select_pasta(PastaKind::Spaghetti);
    core.advance().unwrap();
    core
}

/// Complete the newest camera request with frames of `frame` pixels.
fn ready(core: &mut EstimatorCore, frame: CanvasSize) -> Vec<Action> {
    let ticket = core.camera_ticket();
    core.camera_ready(ticket, frame).unwrap()
}

/// Calibration step with a live 1280x720 camera.
fn core_with_camera() -> EstimatorCore {
    let mut core = core_at_calibrate();
    core.begin_camera().unwrap();
    ready(&mut core, hd());
    core
}

fn has(actions: &[Action], wanted: &Action) -> bool {
    actions.iter().any(|a| a == wanted)
}

fn step_changes(actions: &[Action]) -> Vec<Step> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::StepChanged(step) => Some(*step),
            _ => None,
        })
        .collect()
}

// =============================================================
// Step flow
// =============================================================

#[test]
fn starts_on_pasta_selection() {
    let core = EstimatorCore::default();
    assert_eq!(core.step(), Step::SelectPasta);
    assert!(!core.can_advance());
    assert_eq!(core.active_loop(), None);
}

#[test]
fn advance_without_pasta_is_rejected() {
    let mut core = EstimatorCore::default();
    assert_eq!(core.advance(), Err(EstimateError::MissingSelection));
    assert_eq!(core.step(), Step::SelectPasta);
}

#[test]
fn select_by_id() {
    let mut core = EstimatorCore::default();
    core.select_pasta_id("linguine").unwrap();
    assert_eq!(core.session.pasta, Some(PastaKind::Linguine));
    assert!(core.can_advance());
}

#[test]
fn select_unknown_id_keeps_selection() {
    let mut core = EstimatorCore::default();
    core.select_pasta(PastaKind::Bucatini);
    assert!(core.select_pasta_id("penne").is_err());
    assert_eq!(core.session.pasta, Some(PastaKind::Bucatini));
}

#[test]
fn entering_calibration_paints_static_view() {
    let mut core = EstimatorCore::default();
    core.select_pasta(PastaKind::Spaghetti);
    let actions = core.advance().unwrap();
    assert_eq!(core.step(), Step::Calibrate);
    assert_eq!(step_changes(&actions), vec![Step::Calibrate]);
    assert!(has(&actions, &Action::ResizeCanvas { view: View::Calibration, size: CanvasSize::new(400.0, 400.0) }));
    assert!(has(&actions, &Action::CameraStatus(crate::camera::STATUS_OFF.into())));
    assert!(has(&actions, &Action::RenderNeeded));
    assert_eq!(core.active_loop(), None);
}

#[test]
fn full_walk_through_produces_estimate() {
    let mut core = core_with_camera();
    let to_bundle = core.advance().unwrap();
    assert_eq!(core.step(), Step::MeasureBundle);
    assert!(has(&to_bundle, &Action::StopLoop(View::Calibration)));
    assert!(has(&to_bundle, &Action::StartLoop(View::Bundle)));
    assert!(has(&to_bundle, &Action::ResizeCanvas { view: View::Bundle, size: hd() }));
    assert!(!has(&to_bundle, &Action::ReleaseCamera));

    let to_result = core.advance().unwrap();
    assert_eq!(core.step(), Step::ShowResult);
    assert!(matches!(to_result.first(), Some(Action::EstimateReady(_))));
    assert!(has(&to_result, &Action::StopLoop(View::Bundle)));
    assert!(has(&to_result, &Action::ReleaseCamera));
    assert!(has(&to_result, &Action::RenderNeeded));
    assert!(!core.camera().is_active());
    assert_eq!(core.active_loop(), None);
    assert!(core.session.fill_pct().is_some());
}

#[test]
fn estimate_summary_matches_session() {
    let mut core = core_at_calibrate();
    core.advance().unwrap();
    let actions = core.advance().unwrap();
    let Some(Action::EstimateReady(summary)) = actions.first() else {
        panic!("expected an estimate first: {actions:?}");
    };
    assert_eq!(summary.pasta_name, "Spaghetti");
    assert!((summary.bowl_diameter_in - 8.0).abs() < f64::EPSILON);
    assert_eq!(Some(summary.fill_pct), core.session.fill_pct());
}

#[test]
fn bundle_step_runs_without_camera() {
    let mut core = core_at_calibrate();
    let actions = core.advance().unwrap();
    assert!(has(&actions, &Action::StartLoop(View::Bundle)));
    assert!(has(&actions, &Action::ResizeCanvas { view: View::Bundle, size: CanvasSize::new(640.0, 480.0) }));
    assert!(!actions.iter().any(|a| matches!(a, Action::StopLoop(_))));
}

#[test]
fn advance_past_result_is_noop() {
    let mut core = core_at_calibrate();
    core.advance().unwrap();
    core.advance().unwrap();
    assert!(!core.can_advance());
    assert_eq!(core.advance(), Ok(Vec::new()));
    assert_eq!(core.step(), Step::ShowResult);
}

#[test]
fn step_numbers() {
    assert_eq!(Step::SelectPasta.number(), 1);
    assert_eq!(Step::ShowResult.number(), 4);
    assert!(Step::Calibrate.uses_camera());
    assert!(!Step::ShowResult.uses_camera());
}

// =============================================================
// Reset
// =============================================================

#[test]
fn reset_from_live_calibration_releases_everything() {
    let mut core = core_with_camera();
    core.set_bowl_diameter(12.0);
    let actions = core.reset();
    assert!(has(&actions, &Action::StopLoop(View::Calibration)));
    assert!(has(&actions, &Action::ReleaseCamera));
    assert!(has(&actions, &Action::CameraStatus(crate::camera::STATUS_OFF.into())));
    assert_eq!(step_changes(&actions), vec![Step::SelectPasta]);
    assert_eq!(core.step(), Step::SelectPasta);
    assert_eq!(core.session.pasta, None);
    assert!((core.session.bowl_diameter_in() - 8.0).abs() < f64::EPSILON);
    assert_eq!(*core.camera(), CameraState::Off);
}

#[test]
fn reset_without_camera_does_not_release() {
    let mut core = core_at_calibrate();
    let actions = core.reset();
    assert!(!has(&actions, &Action::ReleaseCamera));
}

#[test]
fn reset_keeps_tuning() {
    let tuning = Tuning { grams_per_square_inch: 40.0, ..Tuning::default() };
    let mut core = EstimatorCore::new(tuning);
    core.reset();
    assert_eq!(*core.session.tuning(), tuning);
}

// =============================================================
// Camera
// =============================================================

#[test]
fn camera_only_starts_while_calibrating() {
    let mut core = EstimatorCore::default();
    assert_eq!(core.begin_camera(), Err(CameraError::NotCalibrating));
}

#[test]
fn begin_camera_requests_acquisition() {
    let mut core = core_at_calibrate();
    let actions = core.begin_camera().unwrap();
    assert_eq!(
        actions,
        vec![Action::CameraStatus(crate::camera::STATUS_PENDING.into()), Action::AcquireCamera(1)]
    );
    assert_eq!(core.begin_camera(), Err(CameraError::AlreadyAcquired));
}

#[test]
fn camera_ready_starts_calibration_loop() {
    let mut core = core_at_calibrate();
    core.begin_camera().unwrap();
    let actions = ready(&mut core, hd());
    assert!(has(&actions, &Action::CameraStatus(crate::camera::STATUS_ACTIVE.into())));
    assert!(has(&actions, &Action::ResizeCanvas { view: View::Calibration, size: hd() }));
    assert!(has(&actions, &Action::StartLoop(View::Calibration)));
    assert_eq!(core.active_loop(), Some(View::Calibration));
}

#[test]
fn camera_ready_after_reset_is_refused() {
    let mut core = core_at_calibrate();
    core.begin_camera().unwrap();
    let ticket = core.camera_ticket();
    core.reset();
    assert!(!core.awaits_camera(ticket));
    assert_eq!(core.camera_ready(ticket, hd()), Err(CameraError::NotActive));
    assert_eq!(*core.camera(), CameraState::Off);
    assert_eq!(core.active_loop(), None);
}

#[test]
fn superseded_request_cannot_complete() {
    let mut core = core_at_calibrate();
    core.begin_camera().unwrap();
    let first = core.camera_ticket();
    core.reset();
    core.select_pasta(PastaKind::Spaghetti);
    core.advance().unwrap();
    core.begin_camera().unwrap();
    let second = core.camera_ticket();
    assert_ne!(first, second);

    // The abandoned request resolves first and is turned away.
    assert_eq!(core.camera_ready(first, hd()), Err(CameraError::NotActive));
    assert_eq!(*core.camera(), CameraState::Pending);
    assert!(core.camera_failed(first, CameraError::Unavailable).is_empty());
    assert_eq!(*core.camera(), CameraState::Pending);

    assert!(core.camera_ready(second, hd()).is_ok());
    assert!(core.camera().is_active());
    // Once live, a duplicate completion is refused too.
    assert_eq!(core.camera_ready(second, hd()), Err(CameraError::NotActive));
}

#[test]
fn camera_ready_during_bundle_step_resizes_bundle_canvas() {
    let mut core = core_at_calibrate();
    core.begin_camera().unwrap();
    core.advance().unwrap();
    let actions = ready(&mut core, hd());
    assert!(has(&actions, &Action::ResizeCanvas { view: View::Bundle, size: hd() }));
    assert_eq!(core.active_loop(), Some(View::Bundle));
}

#[test]
fn narrow_camera_refits_reference_line() {
    let mut core = core_at_calibrate();
    core.begin_camera().unwrap();
    ready(&mut core, CanvasSize::new(480.0, 640.0));
    assert!((core.session.reference_line_px() - 456.0).abs() < 1e-9);
    assert!((core.session.pixels_per_inch() - 45.6).abs() < 1e-9);
}

#[test]
fn wide_camera_keeps_reference_line() {
    let core = core_with_camera();
    assert!((core.session.reference_line_px() - 500.0).abs() < 1e-9);
}

#[test]
fn container_change_keeps_live_line_in_bounds() {
    let mut core = core_at_calibrate();
    core.begin_camera().unwrap();
    ready(&mut core, CanvasSize::new(320.0, 240.0));
    core.set_containers(Containers { calibration_width: 200.0, ..Containers::default() });
    let max = core.canvas_size(View::Calibration).width * 0.95;
    let line = core.session.reference_line_px();
    assert!((100.0..=max).contains(&line), "line {line} outside [100, {max}]");
}

#[test]
fn denied_camera_reports_status() {
    let mut core = core_at_calibrate();
    core.begin_camera().unwrap();
    let ticket = core.camera_ticket();
    let actions = core.camera_failed(ticket, CameraError::Denied("blocked".into()));
    assert!(has(&actions, &Action::CameraStatus(crate::camera::STATUS_DENIED.into())));
    assert!(has(&actions, &Action::RenderNeeded));
    // A retry is allowed.
    assert!(core.begin_camera().is_ok());
}

#[test]
fn late_failure_is_ignored() {
    let mut core = core_at_calibrate();
    assert!(core.camera_failed(core.camera_ticket(), CameraError::Unavailable).is_empty());
}

// =============================================================
// Setters
// =============================================================

#[test]
fn bowl_setter_clamps_and_repaints() {
    let mut core = core_at_calibrate();
    assert_eq!(core.set_bowl_diameter(20.0), vec![Action::RenderNeeded]);
    assert!((core.session.bowl_diameter_in() - 14.0).abs() < f64::EPSILON);
    core.set_bowl_preset(6.0);
    assert!((core.session.bowl_diameter_in() - 6.0).abs() < f64::EPSILON);
}

#[test]
fn bowl_preset_outside_slider_range_is_kept() {
    let mut core = core_at_calibrate();
    assert_eq!(core.set_bowl_preset(16.0), vec![Action::RenderNeeded]);
    assert!((core.session.bowl_diameter_in() - 16.0).abs() < f64::EPSILON);
    core.set_bowl_preset(3.0);
    assert!((core.session.bowl_diameter_in() - 3.0).abs() < f64::EPSILON);
}

#[test]
fn bundle_setter_reports_readout() {
    let mut core = core_at_calibrate();
    let actions = core.set_bundle_diameter(2.0);
    let expected = Action::BundleChanged { diameter_in: 2.0, raw_amount: core.session.raw_amount() };
    assert!(has(&actions, &expected));
}

#[test]
fn unit_change_reports_converted_amount() {
    let mut core = core_at_calibrate();
    let actions = core.set_unit(MassUnit::Ounces);
    let Some(Action::BundleChanged { raw_amount, .. }) = actions.first() else {
        panic!("expected a bundle update: {actions:?}");
    };
    assert_eq!(raw_amount.unit, MassUnit::Ounces);
}

#[test]
fn handedness_repaints() {
    let mut core = core_at_calibrate();
    assert_eq!(core.set_left_handed(true), vec![Action::RenderNeeded]);
    assert!(core.session.left_handed);
}

#[test]
fn containers_resize_visible_canvas() {
    let mut core = core_at_calibrate();
    let containers = Containers { calibration_width: 300.0, ..Containers::default() };
    let actions = core.set_containers(containers);
    assert_eq!(
        actions,
        vec![
            Action::ResizeCanvas { view: View::Calibration, size: CanvasSize::new(300.0, 300.0) },
            Action::RenderNeeded,
        ]
    );
    assert_eq!(core.containers(), containers);
}

#[test]
fn containers_on_first_step_only_record() {
    let mut core = EstimatorCore::default();
    assert!(core.set_containers(Containers::default()).is_empty());
}

// =============================================================
// Frame bookkeeping
// =============================================================

#[test]
fn frame_tick_reports_only_changes() {
    let mut core = core_at_calibrate();
    core.advance().unwrap();
    assert!(core.frame_tick(View::Bundle).is_empty());

    core.session.set_bundle_diameter_in(3.0);
    let actions = core.frame_tick(View::Bundle);
    assert_eq!(actions.len(), 1);
    assert!(core.frame_tick(View::Bundle).is_empty());
}

#[test]
fn frame_tick_ignores_other_views() {
    let mut core = core_with_camera();
    assert!(core.frame_tick(View::Calibration).is_empty());
}

// =============================================================
// Pointer input
// =============================================================

#[test]
fn reference_drag_updates_line() {
    let mut core = core_with_camera();
    // 500px line centred on 640 ends at x = 890.
    let down = core.on_pointer_down(View::Calibration, Point::new(890.0, 360.0));
    assert_eq!(down, vec![Action::SetCursor(CURSOR_GRABBING.into())]);
    assert!(core.is_dragging());

    let moved = core.on_pointer_move(View::Calibration, Point::new(940.0, 360.0));
    assert_eq!(moved, vec![Action::RenderNeeded]);
    assert!((core.session.reference_line_px() - 600.0).abs() < 1e-9);
    assert!((core.session.pixels_per_inch() - 60.0).abs() < 1e-9);

    let up = core.on_pointer_up(View::Calibration);
    assert_eq!(up, vec![Action::SetCursor(CURSOR_GRAB.into())]);
    assert!(!core.is_dragging());
}

#[test]
fn reference_drag_is_clamped_to_canvas() {
    let mut core = core_with_camera();
    core.on_pointer_down(View::Calibration, Point::new(890.0, 360.0));
    core.on_pointer_move(View::Calibration, Point::new(2000.0, 360.0));
    assert!((core.session.reference_line_px() - 1280.0 * 0.95).abs() < 1e-9);
    core.on_pointer_move(View::Calibration, Point::new(650.0, 360.0));
    assert!((core.session.reference_line_px() - 100.0).abs() < 1e-9);
}

#[test]
fn press_away_from_handle_does_nothing() {
    let mut core = core_with_camera();
    assert!(core.on_pointer_down(View::Calibration, Point::new(10.0, 10.0)).is_empty());
    assert!(!core.is_dragging());
    assert!(core.on_pointer_up(View::Calibration).is_empty());
}

#[test]
fn drags_need_a_live_camera() {
    let mut core = core_at_calibrate();
    assert!(core.on_pointer_down(View::Calibration, Point::new(300.0, 200.0)).is_empty());
    assert!(core.on_pointer_move(View::Calibration, Point::new(350.0, 200.0)).is_empty());
    assert!(!core.is_dragging());
}

#[test]
fn events_for_hidden_view_are_ignored() {
    let mut core = core_with_camera();
    assert!(core.on_pointer_down(View::Bundle, Point::new(565.0, 360.0)).is_empty());
}

#[test]
fn hover_cursor_changes_once() {
    let mut core = core_with_camera();
    let over = core.on_pointer_move(View::Calibration, Point::new(892.0, 362.0));
    assert_eq!(over, vec![Action::SetCursor(CURSOR_GRAB.into())]);
    assert!(core.on_pointer_move(View::Calibration, Point::new(893.0, 362.0)).is_empty());
    let away = core.on_pointer_move(View::Calibration, Point::new(100.0, 100.0));
    assert_eq!(away, vec![Action::SetCursor(CURSOR_DEFAULT.into())]);
}

#[test]
fn bundle_drag_and_slider_agree() {
    let mut core = core_with_camera();
    core.advance().unwrap();
    // ppi 50, bowl radius 200, bundle centred at x = 540 with radius 25.
    core.on_pointer_down(View::Bundle, Point::new(565.0, 360.0));
    let moved = core.on_pointer_move(View::Bundle, Point::new(590.0, 360.0));
    assert!((core.session.bundle_diameter_in() - 2.0).abs() < 1e-9);
    assert!(has(&moved, &Action::RenderNeeded));
    core.on_pointer_up(View::Bundle);

    let mut slider = core_with_camera();
    slider.advance().unwrap();
    slider.set_bundle_diameter(2.0);
    assert_eq!(slider.session.raw_amount(), core.session.raw_amount());
}

#[test]
fn leaving_step_ends_drag() {
    let mut core = core_with_camera();
    core.on_pointer_down(View::Calibration, Point::new(890.0, 360.0));
    core.advance().unwrap();
    assert!(!core.is_dragging());
}

// =============================================================
// Serialization
// =============================================================

#[test]
fn actions_serialize_tagged() {
    let json = serde_json::to_value(Action::StepChanged(Step::MeasureBundle)).unwrap();
    assert_eq!(json["type"], "step_changed");
    assert_eq!(json["data"], "measure-bundle");

    let json = serde_json::to_value(Action::RenderNeeded).unwrap();
    assert_eq!(json["type"], "render_needed");
}

#[test]
fn snapshot_reflects_state() {
    let core = core_with_camera();
    let snap = core.snapshot();
    assert_eq!(snap.step, Step::Calibrate);
    assert_eq!(snap.step_number, 2);
    assert!(snap.camera_active);
    assert_eq!(snap.camera_status, crate::camera::STATUS_ACTIVE);
    assert_eq!(snap.session.pasta, Some(PastaKind::Spaghetti));
}

#[test]
fn view_ids() {
    assert_eq!(View::from_id("bundle"), Some(View::Bundle));
    assert_eq!(View::from_id("Bundle"), None);
}
