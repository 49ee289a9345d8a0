use approx::assert_relative_eq;

use tileview_core::config::ZoomLimits;
use tileview_core::input::{InputAction, InputController, Modifiers, MouseMode, PointerButton};

fn controller() -> InputController {
    InputController::new(ZoomLimits::default())
}

// ---------------------------------------------------------------------------
// Zoom mode
// ---------------------------------------------------------------------------

#[test]
fn test_zoom_mode_clicks() {
    let mut input = controller();
    assert_eq!(input.mode(), MouseMode::Zoom);

    let action = input.press([10.0, 20.0], PointerButton::Primary, Modifiers::NONE);
    assert_eq!(action, InputAction::ZoomIn { at: [10.0, 20.0] });
    assert!(!input.is_dragging());
    input.release([10.0, 20.0]);

    let action = input.press([30.0, 40.0], PointerButton::Secondary, Modifiers::NONE);
    assert_eq!(action, InputAction::ZoomOut { at: [30.0, 40.0] });
}

#[test]
fn test_middle_drag_pans_in_zoom_mode() {
    let mut input = controller();
    input.press([100.0, 100.0], PointerButton::Middle, Modifiers::NONE);
    assert!(input.is_dragging());

    let action = input.motion([110.0, 95.0], Modifiers::NONE, 2.0);
    assert_eq!(action, InputAction::Pan { dx: -5.0, dy: 2.5 });
}

#[test]
fn test_alt_primary_drag_pans() {
    let mut input = controller();
    assert_eq!(
        input.press([0.0, 0.0], PointerButton::Primary, Modifiers::ALT),
        InputAction::None
    );
    let action = input.motion([4.0, 0.0], Modifiers::ALT, 1.0);
    assert_eq!(action, InputAction::Pan { dx: -4.0, dy: 0.0 });
}

#[test]
fn test_alt_secondary_drag_zooms() {
    let mut input = controller();
    input.press([0.0, 0.0], PointerButton::Secondary, Modifiers::ALT);
    let InputAction::SetZoom(zoom) = input.motion([10.0, 10.0], Modifiers::ALT, 1.0) else {
        panic!("expected a zoom");
    };
    assert_relative_eq!(zoom, 1.1, epsilon = 1e-6);
}

#[test]
fn test_plain_primary_drag_does_nothing() {
    let mut input = controller();
    input.press([0.0, 0.0], PointerButton::Primary, Modifiers::NONE);
    assert_eq!(input.motion([50.0, 50.0], Modifiers::NONE, 1.0), InputAction::None);
}

// ---------------------------------------------------------------------------
// Other modes
// ---------------------------------------------------------------------------

#[test]
fn test_pan_mode_drags_with_any_button() {
    let mut input = controller();
    input.set_mode(MouseMode::Pan);
    for button in [PointerButton::Primary, PointerButton::Secondary] {
        assert_eq!(input.press([0.0, 0.0], button, Modifiers::NONE), InputAction::None);
        assert_eq!(
            input.motion([-8.0, 4.0], Modifiers::NONE, 4.0),
            InputAction::Pan { dx: 2.0, dy: -1.0 }
        );
        input.release([-8.0, 4.0]);
        assert!(!input.is_dragging());
    }
}

#[test]
fn test_inert_modes() {
    for mode in [MouseMode::Wipe, MouseMode::Select, MouseMode::Annotate] {
        let mut input = controller();
        input.set_mode(mode);
        assert_eq!(
            input.press([0.0, 0.0], PointerButton::Primary, Modifiers::NONE),
            InputAction::None
        );
        assert_eq!(input.motion([5.0, 5.0], Modifiers::NONE, 1.0), InputAction::None);
    }
}

#[test]
fn test_motion_without_button_only_tracks() {
    let mut input = controller();
    assert_eq!(input.motion([7.0, 9.0], Modifiers::NONE, 1.0), InputAction::None);
    assert_eq!(input.last_position(), [7.0, 9.0]);
    assert_eq!(input.drag_button(), None);
}

// ---------------------------------------------------------------------------
// Wheel
// ---------------------------------------------------------------------------

#[test]
fn test_wheel_notch() {
    let mut input = controller();
    let InputAction::SetZoom(zoom) = input.wheel(120.0, 2.0) else {
        panic!("expected a zoom");
    };
    // One notch is 15 degrees.
    assert_relative_eq!(zoom, 2.0 * (1.0 + 0.005 * 15.0), epsilon = 1e-6);
}

#[test]
fn test_wheel_clamps_to_limits() {
    let mut input = InputController::new(ZoomLimits { min: 0.5, max: 4.0 });
    assert_eq!(input.wheel(-1e6, 1.0), InputAction::SetZoom(0.5));
    assert_eq!(input.wheel(1e6, 1.0), InputAction::SetZoom(4.0));
}

#[test]
fn test_mode_labels() {
    let labels: Vec<_> = MouseMode::ALL.iter().map(|m| m.label()).collect();
    assert_eq!(labels, ["Zoom", "Pan", "Wipe", "Select", "Annotate"]);
}
