use artboard_core::shapes::{
    Gradient, ImageFormat, ImageSource, SequentialIds, SerializableColor, Shadow, ShapeRecord,
    TextAlign,
};
use artboard_core::{Action, EditorStore, ShapePatch, Theme, ThemeKind};
use artboard_render::{GridStyle, RenderContext, Renderer, RendererError, SvgRenderer, render_svg};
use kurbo::{Point, Rect, Size};

fn store() -> EditorStore {
    EditorStore::new().with_ids(SequentialIds::new())
}

fn tiny_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 1, image::Rgba([255, 0, 0, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn empty_document_is_a_sized_svg() {
    let store = store();
    let svg = render_svg(store.state(), &Theme::default()).unwrap();
    let canvas = &store.state().canvas;
    assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(svg.contains(&format!(
        "viewBox=\"0 0 {} {}\"",
        canvas.width, canvas.height
    )));
    assert!(svg.contains("class=\"background\""));
    assert!(!svg.contains("<defs>"));
    assert!(svg.trim_end().ends_with("</svg>"));
}

#[test]
fn shapes_render_in_paint_order() {
    let mut store = store();
    store.dispatch_all([
        Action::AddShape(ShapeRecord::rect(0.0, 0.0, 100.0, 50.0)),
        Action::AddShape(ShapeRecord::circle(Point::new(50.0, 50.0), 20.0)),
        Action::AddShape(ShapeRecord::line(&[Point::new(0.0, 0.0), Point::new(30.0, 40.0)])),
    ]);
    let svg = render_svg(store.state(), &Theme::default()).unwrap();
    let rect = svg.find("<rect width=\"100\"").unwrap();
    let ellipse = svg.find("<ellipse").unwrap();
    let polyline = svg.find("<polyline points=\"0,0 30,40\"").unwrap();
    assert!(rect < ellipse && ellipse < polyline);
}

#[test]
fn paint_features_emit_defs() {
    let mut store = store();
    let mut card = ShapeRecord::rect(10.0, 10.0, 200.0, 100.0);
    card.style.gradient = Some(Gradient::linear(
        0.0,
        SerializableColor::rgb(255, 0, 0),
        SerializableColor::new(0, 0, 255, 128),
    ));
    card.style.shadow = Some(Shadow::default());
    card.style.opacity = 0.5;
    let mut badge = ShapeRecord::circle(Point::new(300.0, 60.0), 40.0);
    badge.style.gradient = Some(Gradient::radial(
        SerializableColor::white(),
        SerializableColor::black(),
    ));
    store.dispatch_all([Action::AddShape(card), Action::AddShape(badge)]);

    let svg = render_svg(store.state(), &Theme::default()).unwrap();
    assert!(svg.contains("<linearGradient id=\"gradient-1\" x1=\"0\" y1=\"0.5\" x2=\"1\" y2=\"0.5\">"));
    assert!(svg.contains("stop-opacity=\"0.502\""));
    assert!(svg.contains("<feDropShadow"));
    assert!(svg.contains("fill=\"url(#gradient-1)\""));
    assert!(svg.contains("filter=\"url(#shadow-2)\""));
    assert!(svg.contains("opacity=\"0.5\""));
    assert!(svg.contains("<radialGradient id=\"gradient-3\""));
}

#[test]
fn rotation_and_scale_become_a_matrix() {
    let mut store = store();
    store.dispatch(Action::AddShape(ShapeRecord::rect(10.0, 20.0, 40.0, 40.0)));
    let id = store.state().selected_ids()[0].clone();
    store.dispatch(Action::UpdateShape {
        id: id.clone(),
        patch: ShapePatch::new().scale(2.0, 2.0),
    });
    let svg = render_svg(store.state(), &Theme::default()).unwrap();
    assert!(svg.contains(&format!("data-id=\"{}\" transform=\"matrix(2 0 0 2 10 20)\"", id)));

    store.dispatch(Action::UpdateShape {
        id,
        patch: ShapePatch::new().scale(1.0, 1.0).rotation(90.0),
    });
    let svg = render_svg(store.state(), &Theme::default()).unwrap();
    // 90 degrees about the box center (20, 20), then moved to (10, 20).
    assert!(svg.contains("transform=\"matrix(0 1 -1 0 50 20)\""));
}

#[test]
fn text_is_escaped_and_aligned() {
    let mut store = store();
    let mut label = ShapeRecord::text(Point::new(0.0, 0.0), "Fish & <Chips>\nSecond line");
    if let Some(text) = label.text.as_mut() {
        text.align = TextAlign::Center;
        text.italic = true;
    }
    store.dispatch(Action::AddShape(label));
    let svg = render_svg(store.state(), &Theme::default()).unwrap();
    assert!(svg.contains("Fish &amp; &lt;Chips&gt;"));
    assert!(svg.contains("text-anchor=\"middle\""));
    assert!(svg.contains("font-style=\"italic\""));
    assert_eq!(svg.matches("<tspan").count(), 2);
}

#[test]
fn images_embed_as_data_urls() {
    let mut store = store();
    let source = ImageSource::from_bytes(&tiny_png()).unwrap();
    store.dispatch(Action::AddShape(ShapeRecord::image(Point::ZERO, source, 100.0)));

    let svg = render_svg(store.state(), &Theme::default()).unwrap();
    assert!(svg.contains("href=\"data:image/png;base64,"));

    let ctx = RenderContext::new(store.state());
    let svg = SvgRenderer::new().with_images(false).render(&ctx).unwrap();
    assert!(svg.contains("image-placeholder"));
    assert!(!svg.contains("data:image/png"));
}

#[test]
fn image_data_cannot_break_out_of_href() {
    let mut store = store();
    let source = ImageSource {
        format: ImageFormat::Png,
        source_width: 1,
        source_height: 1,
        data: "AAAA\"/><script>alert(1)</script><x a=\"".to_string(),
    };
    store.dispatch(Action::AddShape(ShapeRecord::image(Point::ZERO, source, 100.0)));

    let svg = render_svg(store.state(), &Theme::default()).unwrap();
    assert!(!svg.contains("<script>"));
    assert!(svg.contains("AAAA&quot;/&gt;&lt;script&gt;"));
    assert_eq!(svg.matches("<image ").count(), 1);
}

#[test]
fn hidden_and_edited_shapes_are_skipped() {
    let mut store = store();
    store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
    let hidden = store.state().selected_ids()[0].clone();
    store.dispatch(Action::UpdateShape {
        id: hidden.clone(),
        patch: ShapePatch::new().visible(false),
    });
    store.dispatch(Action::AddShape(ShapeRecord::text(Point::ZERO, "editing")));
    let editing = store.state().selected_ids()[0].clone();

    let ctx = RenderContext::new(store.state()).with_editing_shape(Some(editing.clone()));
    let svg = SvgRenderer::new().render(&ctx).unwrap();
    assert!(!svg.contains(hidden.as_str()));
    assert!(!svg.contains(editing.as_str()));
}

#[test]
fn editor_view_draws_grid_selection_and_marquee() {
    let mut store = store();
    store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 40.0, 40.0)));
    let theme = ThemeKind::Dark.theme();
    let ctx = RenderContext::for_view(store.state(), Size::new(200.0, 100.0))
        .with_theme(&theme)
        .with_grid(GridStyle::Lines)
        .with_selection_rect(Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
    let svg = SvgRenderer::new().render(&ctx).unwrap();

    assert!(svg.contains("class=\"grid\""));
    assert!(svg.contains("class=\"selection\""));
    assert_eq!(svg.matches("class=\"handle\"").count(), 8);
    assert!(svg.contains("class=\"marquee\""));
    let selection = theme.selection;
    assert!(svg.contains(&format!(
        "stroke=\"#{:02x}{:02x}{:02x}\"",
        selection.r, selection.g, selection.b
    )));

    let dots = RenderContext::for_view(store.state(), Size::new(200.0, 100.0))
        .with_grid(GridStyle::Dots)
        .with_selection(false);
    let svg = SvgRenderer::new().render(&dots).unwrap();
    assert!(svg.contains("<circle"));
    assert!(!svg.contains("class=\"handle\""));
}

#[test]
fn non_finite_geometry_is_an_error() {
    let mut store = store();
    store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
    let id = store.state().selected_ids()[0].clone();
    store.dispatch(Action::UpdateShape {
        id: id.clone(),
        patch: ShapePatch::new().position(f64::NAN, 0.0),
    });
    match render_svg(store.state(), &Theme::default()) {
        Err(RendererError::InvalidGeometry(bad)) => assert_eq!(bad, id),
        other => panic!("expected invalid geometry, got {other:?}"),
    }
}

#[test]
fn grid_style_cycles() {
    let mut style = GridStyle::default();
    assert_eq!(style, GridStyle::None);
    for _ in 0..3 {
        style = style.next();
    }
    assert_eq!(style, GridStyle::None);
    assert_eq!(GridStyle::Dots.name(), "Dots");
}
