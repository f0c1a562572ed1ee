use image::{Rgba, RgbaImage};
use image_to_bead_pattern_wasm::matcher::{LinearMatcher, match_all};
use image_to_bead_pattern_wasm::reducer::{count_occurrences, select_top_k};
use image_to_bead_pattern_wasm::render::layout::RenderLayout;
use image_to_bead_pattern_wasm::sampler::{center_crop_square, sample, trim_to_divisible};
use image_to_bead_pattern_wasm::{
    LegendPosition, Palette, PaletteJson, PatternConfig, Session, Stage, demo, generate,
};
use pretty_assertions::assert_eq;

const RGB_PALETTE: &str = r#"{"rgb": [[1,0,0],[0,1,0],[0,0,1]], "name": ["R","G","B"]}"#;

#[test]
fn landscape_red_walkthrough() {
    let image = RgbaImage::from_pixel(100, 60, Rgba([255, 0, 0, 255]));

    let square = center_crop_square(&image);
    assert_eq!(square.side(), 60);
    let crop = trim_to_divisible(square, 4);
    assert_eq!(crop.side(), 60);

    let grid = sample(&image, 4).unwrap();
    assert_eq!(grid.cells().len(), 16);

    let palette = Palette::from_json(RGB_PALETTE.as_bytes()).unwrap();
    let colors = palette.colors();
    let first = match_all(&grid, &LinearMatcher::new(&colors));
    assert_eq!(first, vec![0; 16]);

    let counts = count_occurrences(&first, palette.len());
    assert_eq!(counts, vec![16, 0, 0]);
    assert_eq!(select_top_k(&counts, 2), vec![0]);

    let cfg = PatternConfig {
        grid_size: 4,
        max_colors: 2,
        ..Default::default()
    };
    let out = generate(&image, &palette, &cfg).unwrap();
    assert_eq!(out.palette.len(), 1);
    assert_eq!(out.indices, vec![0; 16]);
    assert_eq!(out.counts, vec![16]);

    let layout = RenderLayout::compute(4, out.palette.len(), &cfg).unwrap();
    assert_eq!(out.raster.width(), layout.canvas_width);
    assert_eq!(out.raster.height(), layout.canvas_height);
}

#[test]
fn one_color_palette_maps_every_cell() {
    let image = demo::gradient_demo();
    let palette = Palette::from_json(br#"{"rgb": [[0.4,0.4,0.4]], "name": ["Gray"]}"#).unwrap();
    let cfg = PatternConfig {
        grid_size: 9,
        max_colors: 5,
        show_names: true,
        ..Default::default()
    };
    let out = generate(&image, &palette, &cfg).unwrap();
    assert_eq!(out.indices, vec![0; 81]);
    assert_eq!(out.counts, vec![81]);
}

#[test]
fn both_legend_layouts_render_demo() {
    let palette = Palette::from_json(
        br#"{"rgb": [[1,0.42,0],[0,0.83,1],[0.5,1,0],[1,1,1],[0,0,0],[0.6,0.3,0.8]],
             "name": ["Orange","Cyan","Lime","White","Black","Violet"]}"#,
    )
    .unwrap();
    for position in [LegendPosition::Right, LegendPosition::Bottom] {
        let cfg = PatternConfig {
            grid_size: 12,
            max_colors: 4,
            cell_size: 16,
            legend_position: position,
            ..Default::default()
        };
        let out = generate(&demo::gradient_demo(), &palette, &cfg).unwrap();
        assert!(out.palette.len() <= 4);
        assert!(out.indices.iter().all(|&i| i < out.palette.len()));
        let layout = RenderLayout::compute(12, out.palette.len(), &cfg).unwrap();
        assert_eq!(
            (out.raster.width(), out.raster.height()),
            (layout.canvas_width, layout.canvas_height)
        );
        let png = out.raster.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}

#[test]
fn session_round_trip_from_encoded_bytes() {
    let mut encoded = Vec::new();
    RgbaImage::from_pixel(20, 20, Rgba([0, 0, 255, 255]))
        .write_to(&mut std::io::Cursor::new(&mut encoded), image::ImageFormat::Png)
        .unwrap();

    let mut session = Session::new();
    assert_eq!(session.stage(), Stage::Idle);
    session.load_image_bytes(&encoded).unwrap();

    let cfg = PatternConfig::from_json(r#"{"gridSize": 5, "maxColors": 3}"#).unwrap();
    let out = session.run(&PaletteJson(RGB_PALETTE.as_bytes()), &cfg).unwrap();
    assert_eq!(out.palette.get(0).unwrap().name, "B");
    let out_png = out.png.clone();
    assert_eq!(out.counts, vec![25]);
    assert_eq!(session.stage(), Stage::Done);
    assert!(session.export_png().unwrap().starts_with(b"\x89PNG"));
    assert_eq!(session.export_png().unwrap(), out_png.as_slice());
}
