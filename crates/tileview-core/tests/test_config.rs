use tileview_core::color::{ChannelView, DisplayParams};
use tileview_core::config::{ViewerConfig, ZoomLimits};
use tileview_core::TileViewError;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[test]
fn test_empty_toml_is_default() {
    let config = ViewerConfig::from_toml_str("").unwrap();
    assert_eq!(config, ViewerConfig::default());
    assert_eq!(config.tile_pool_size, 4);
    assert_eq!(config.max_texture_ceiling, 4096);
    assert_eq!(config.inspector.pixels, 11);
}

#[test]
fn test_partial_toml() {
    let text = r#"
tile_pool_size = 8
force_fixed_function = true

[inspector]
follows_mouse = true
"#;
    let config = ViewerConfig::from_toml_str(text).unwrap();
    assert_eq!(config.tile_pool_size, 8);
    assert!(config.force_fixed_function);
    assert!(config.inspector.follows_mouse);
    assert_eq!(config.inspector.texture_size, 16);
    assert_eq!(config.zoom, ZoomLimits::default());
}

#[test]
fn test_round_trip() {
    let mut config = ViewerConfig::default();
    config.max_texture_ceiling = 1024;
    config.zoom.max = 32.0;
    let text = config.to_toml_string().unwrap();
    assert_eq!(ViewerConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("viewer.toml");
    std::fs::write(&path, "clear_color = [0.0, 0.0, 0.0, 1.0]\n").unwrap();
    let config = ViewerConfig::load(&path).unwrap();
    assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);

    let missing = ViewerConfig::load(&dir.path().join("missing.toml"));
    assert!(matches!(missing, Err(TileViewError::Io(_))));
}

#[test]
fn test_malformed_toml() {
    let err = ViewerConfig::from_toml_str("tile_pool_size = \"many\"").unwrap_err();
    assert!(matches!(err, TileViewError::Config(_)));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_rejects_empty_pool() {
    assert!(ViewerConfig::from_toml_str("tile_pool_size = 0").is_err());
}

#[test]
fn test_rejects_inverted_zoom_limits() {
    let text = "[zoom]\nmin = 4.0\nmax = 2.0\n";
    assert!(ViewerConfig::from_toml_str(text).is_err());
}

#[test]
fn test_rejects_even_inspector_size() {
    let text = "[inspector]\npixels = 10\n";
    let err = ViewerConfig::from_toml_str(text).unwrap_err();
    assert!(err.to_string().contains("odd"));
}

#[test]
fn test_rejects_inspector_larger_than_texture() {
    let text = "[inspector]\npixels = 33\ntexture_size = 32\n";
    assert!(ViewerConfig::from_toml_str(text).is_err());
}

#[test]
fn test_zoom_limits_clamp() {
    let limits = ZoomLimits { min: 0.25, max: 8.0 };
    assert_eq!(limits.clamp(0.1), 0.25);
    assert_eq!(limits.clamp(3.0), 3.0);
    assert_eq!(limits.clamp(100.0), 8.0);
    assert_eq!(limits.clamp(f32::NAN), 0.25);
}

#[test]
fn test_inverted_zoom_limits_clamp_to_max() {
    let limits = ZoomLimits { min: 4.0, max: 2.0 };
    assert_eq!(limits.clamp(10.0), 2.0);
    assert_eq!(limits.clamp(0.1), 2.0);
    assert_eq!(limits.clamp(3.0), 2.0);
}

// ---------------------------------------------------------------------------
// Display parameters
// ---------------------------------------------------------------------------

#[test]
fn test_display_params_from_toml() {
    let params: DisplayParams = toml::from_str("exposure = -1.5\nchannel = \"Luminance\"\n").unwrap();
    assert_eq!(params.exposure, -1.5);
    assert_eq!(params.gamma, 1.0);
    assert_eq!(params.channel, ChannelView::Luminance);
    assert!(params.linear_interpolation);
}
