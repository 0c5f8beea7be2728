//! SVG output.

use crate::renderer::{GridStyle, RenderContext, RenderResult, Renderer, RendererError};
use artboard_core::shapes::{
    Gradient, GradientKind, SerializableColor, Shadow, ShapeKind, ShapeRecord, TextAlign,
};
use artboard_core::{EditorState, Theme};
use kurbo::{Affine, Point, Rect};
use peniko::Color;
use std::fmt::Write;

/// Selection handle edge length, in output pixels.
const HANDLE_SIZE: f64 = 6.0;

/// Draws a document as a standalone SVG file.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    /// Embed image data; when off, images render as placeholders.
    embed_images: bool,
    defs: String,
    body: String,
    def_count: usize,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgRenderer {
    /// Renderer that embeds images.
    pub fn new() -> Self {
        Self {
            embed_images: true,
            defs: String::new(),
            body: String::new(),
            def_count: 0,
        }
    }

    /// Embed images, or draw placeholders when false.
    pub fn with_images(mut self, embed: bool) -> Self {
        self.embed_images = embed;
        self
    }

    fn reset(&mut self) {
        self.defs.clear();
        self.body.clear();
        self.def_count = 0;
    }

    fn next_def_id(&mut self, prefix: &str) -> String {
        self.def_count += 1;
        format!("{}-{}", prefix, self.def_count)
    }

    fn render_grid(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        let size = ctx.state.canvas.grid_size;
        if ctx.grid_style == GridStyle::None || size <= 0.0 {
            return Ok(());
        }
        let area = ctx.visible_world_rect();
        let (x0, y0) = ((area.x0 / size).floor() * size, (area.y0 / size).floor() * size);
        let stroke = 1.0 / ctx.view_scale();
        match ctx.grid_style {
            GridStyle::None => {}
            GridStyle::Lines => {
                writeln!(
                    self.body,
                    "<g class=\"grid\" {} stroke-width=\"{}\">",
                    paint_attr("stroke", Some(ctx.grid_color.into())),
                    num(stroke)
                )?;
                let mut x = x0;
                while x <= area.x1 {
                    writeln!(
                        self.body,
                        "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"/>",
                        num(x),
                        num(area.y0),
                        num(x),
                        num(area.y1)
                    )?;
                    x += size;
                }
                let mut y = y0;
                while y <= area.y1 {
                    writeln!(
                        self.body,
                        "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"/>",
                        num(area.x0),
                        num(y),
                        num(area.x1),
                        num(y)
                    )?;
                    y += size;
                }
                self.body.push_str("</g>\n");
            }
            GridStyle::Dots => {
                writeln!(
                    self.body,
                    "<g class=\"grid\" {}>",
                    paint_attr("fill", Some(ctx.grid_color.into()))
                )?;
                let mut y = y0;
                while y <= area.y1 {
                    let mut x = x0;
                    while x <= area.x1 {
                        writeln!(
                            self.body,
                            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"/>",
                            num(x),
                            num(y),
                            num(stroke)
                        )?;
                        x += size;
                    }
                    y += size;
                }
                self.body.push_str("</g>\n");
            }
        }
        Ok(())
    }

    fn render_shape(&mut self, shape: &ShapeRecord) -> RenderResult<()> {
        if !is_finite(shape) {
            return Err(RendererError::InvalidGeometry(shape.id.clone()));
        }
        let style = &shape.style;
        let fill = match &style.gradient {
            Some(gradient) if shape.kind != ShapeKind::Line => {
                let id = self.next_def_id("gradient");
                self.write_gradient(&id, gradient)?;
                format!("fill=\"url(#{id})\"")
            }
            _ => paint_attr("fill", style.fill),
        };
        let stroke = if style.stroke.is_some() && style.stroke_width > 0.0 {
            format!(
                "{} stroke-width=\"{}\"",
                paint_attr("stroke", style.stroke),
                num(style.stroke_width)
            )
        } else {
            "stroke=\"none\"".to_string()
        };
        let filter = match &style.shadow {
            Some(shadow) => {
                let id = self.next_def_id("shadow");
                self.write_shadow(&id, shadow)?;
                format!(" filter=\"url(#{id})\"")
            }
            None => String::new(),
        };

        write!(
            self.body,
            "<g data-id=\"{}\" transform=\"{}\"",
            escape(shape.id.as_str()),
            matrix(shape.transform())
        )?;
        if style.opacity < 1.0 {
            write!(self.body, " opacity=\"{}\"", num(style.opacity.max(0.0)))?;
        }
        self.body.push_str(">\n");

        let (w, h) = (num(shape.width), num(shape.height));
        match shape.kind {
            ShapeKind::Rect => {
                let r = num(shape.corner_radius.min(shape.width / 2.0).min(shape.height / 2.0).max(0.0));
                writeln!(
                    self.body,
                    "<rect width=\"{w}\" height=\"{h}\" rx=\"{r}\" ry=\"{r}\" {fill} {stroke}{filter}/>"
                )?;
            }
            ShapeKind::Circle => {
                let (rx, ry) = (num(shape.width / 2.0), num(shape.height / 2.0));
                writeln!(
                    self.body,
                    "<ellipse cx=\"{rx}\" cy=\"{ry}\" rx=\"{rx}\" ry=\"{ry}\" {fill} {stroke}{filter}/>"
                )?;
            }
            ShapeKind::Line => {
                let points: Vec<String> = shape
                    .points
                    .iter()
                    .map(|p| format!("{},{}", num(p.x), num(p.y)))
                    .collect();
                writeln!(
                    self.body,
                    "<polyline points=\"{}\" fill=\"none\" {stroke} stroke-linecap=\"round\" stroke-linejoin=\"round\"{filter}/>",
                    points.join(" ")
                )?;
            }
            ShapeKind::Text => self.write_text(shape, &fill, &filter)?,
            ShapeKind::Image => match &shape.image {
                Some(image) if self.embed_images => {
                    writeln!(
                        self.body,
                        "<image width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"none\" href=\"{}\"{filter}/>",
                        escape(&image.data_url())
                    )?;
                }
                _ => {
                    writeln!(
                        self.body,
                        "<rect class=\"image-placeholder\" width=\"{w}\" height=\"{h}\" fill=\"#e5e7eb\" stroke=\"#9ca3af\"/>"
                    )?;
                }
            },
            ShapeKind::Icon => {
                let name = shape.icon.as_deref().unwrap_or_default();
                let r = num(shape.width.min(shape.height) / 4.0);
                writeln!(
                    self.body,
                    "<rect data-icon=\"{}\" width=\"{w}\" height=\"{h}\" rx=\"{r}\" {fill} {stroke}{filter}/>",
                    escape(name)
                )?;
            }
            // Members carry the paint.
            ShapeKind::Group => {}
        }
        self.body.push_str("</g>\n");
        Ok(())
    }

    fn write_text(&mut self, shape: &ShapeRecord, fill: &str, filter: &str) -> RenderResult<()> {
        let Some(text) = &shape.text else {
            return Ok(());
        };
        let (anchor, x) = match text.align {
            TextAlign::Left => ("start", 0.0),
            TextAlign::Center => ("middle", shape.width / 2.0),
            TextAlign::Right => ("end", shape.width),
        };
        let line_height = text.font_size * text.line_height;
        write!(
            self.body,
            "<text font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" text-anchor=\"{}\" {}{}",
            escape(&text.font_family),
            num(text.font_size),
            text.font_weight.css_weight(),
            anchor,
            fill,
            filter
        )?;
        if text.italic {
            self.body.push_str(" font-style=\"italic\"");
        }
        if text.letter_spacing != 0.0 {
            write!(self.body, " letter-spacing=\"{}\"", num(text.letter_spacing))?;
        }
        self.body.push('>');
        // Baseline sits at 0.8em inside each line box.
        let mut y = line_height - text.font_size * 0.2;
        for line in text.lines() {
            write!(
                self.body,
                "<tspan x=\"{}\" y=\"{}\">{}</tspan>",
                num(x),
                num(y),
                escape(line)
            )?;
            y += line_height;
        }
        self.body.push_str("</text>\n");
        Ok(())
    }

    fn write_gradient(&mut self, id: &str, gradient: &Gradient) -> RenderResult<()> {
        let tag = match gradient.kind {
            GradientKind::Linear { angle } => {
                let (dy, dx) = angle.to_radians().sin_cos();
                write!(
                    self.defs,
                    "<linearGradient id=\"{id}\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">",
                    num(0.5 - dx / 2.0),
                    num(0.5 - dy / 2.0),
                    num(0.5 + dx / 2.0),
                    num(0.5 + dy / 2.0)
                )?;
                "linearGradient"
            }
            GradientKind::Radial => {
                write!(self.defs, "<radialGradient id=\"{id}\" cx=\"0.5\" cy=\"0.5\" r=\"0.5\">")?;
                "radialGradient"
            }
        };
        for stop in &gradient.stops {
            write!(
                self.defs,
                "<stop offset=\"{}\" stop-color=\"{}\"",
                num(stop.offset.clamp(0.0, 1.0)),
                rgb_hex(stop.color)
            )?;
            if stop.color.a < 255 {
                write!(self.defs, " stop-opacity=\"{}\"", num(stop.color.alpha()))?;
            }
            self.defs.push_str("/>");
        }
        writeln!(self.defs, "</{tag}>")?;
        Ok(())
    }

    fn write_shadow(&mut self, id: &str, shadow: &Shadow) -> RenderResult<()> {
        writeln!(
            self.defs,
            "<filter id=\"{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\"><feDropShadow dx=\"{}\" dy=\"{}\" stdDeviation=\"{}\" flood-color=\"{}\" flood-opacity=\"{}\"/></filter>",
            num(shadow.offset_x),
            num(shadow.offset_y),
            num(shadow.blur.max(0.0) / 2.0),
            rgb_hex(shadow.color),
            num(shadow.color.alpha())
        )?;
        Ok(())
    }

    /// Outline of the shape's rotated box plus eight resize handles.
    fn render_selection(&mut self, shape: &ShapeRecord, ctx: &RenderContext) -> RenderResult<()> {
        let color: SerializableColor = ctx.selection_color.into();
        let dash = if shape.kind == ShapeKind::Group {
            " stroke-dasharray=\"4 3\""
        } else {
            ""
        };
        writeln!(
            self.body,
            "<g class=\"selection\" transform=\"{}\"><rect width=\"{}\" height=\"{}\" fill=\"none\" {} stroke-width=\"1\" vector-effect=\"non-scaling-stroke\"{}/></g>",
            matrix(shape.transform()),
            num(shape.width),
            num(shape.height),
            paint_attr("stroke", Some(color)),
            dash
        )?;

        let size = HANDLE_SIZE / ctx.view_scale();
        let transform = shape.transform();
        let (w, h) = (shape.width, shape.height);
        let handles = [
            (0.0, 0.0),
            (w / 2.0, 0.0),
            (w, 0.0),
            (w, h / 2.0),
            (w, h),
            (w / 2.0, h),
            (0.0, h),
            (0.0, h / 2.0),
        ];
        for (x, y) in handles {
            let p = transform * Point::new(x, y);
            writeln!(
                self.body,
                "<rect class=\"handle\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#ffffff\" {} vector-effect=\"non-scaling-stroke\"/>",
                num(p.x - size / 2.0),
                num(p.y - size / 2.0),
                num(size),
                num(size),
                paint_attr("stroke", Some(color))
            )?;
        }
        Ok(())
    }

    fn render_marquee(&mut self, rect: Rect, color: Color) -> RenderResult<()> {
        let color: SerializableColor = color.into();
        writeln!(
            self.body,
            "<rect class=\"marquee\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {} {} stroke-width=\"1\" vector-effect=\"non-scaling-stroke\"/>",
            num(rect.x0),
            num(rect.y0),
            num(rect.width()),
            num(rect.height()),
            paint_attr("fill", Some(color.with_opacity(0.1))),
            paint_attr("stroke", Some(color))
        )?;
        Ok(())
    }
}

impl Renderer for SvgRenderer {
    type Output = String;

    fn render(&mut self, ctx: &RenderContext) -> RenderResult<String> {
        self.reset();
        let state = ctx.state;

        let background: SerializableColor = self.background_color(ctx).into();
        writeln!(
            self.body,
            "<rect class=\"background\" width=\"100%\" height=\"100%\" {}/>",
            paint_attr("fill", Some(background))
        )?;
        writeln!(self.body, "<g transform=\"{}\">", matrix(ctx.view_transform))?;
        self.render_grid(ctx)?;

        for shape in state.iter() {
            if !shape.visible || ctx.editing_shape_id.as_ref() == Some(&shape.id) {
                continue;
            }
            self.render_shape(shape)?;
        }

        if ctx.show_selection {
            for shape in state.selected_shapes() {
                self.render_selection(shape, ctx)?;
            }
        }
        if let Some(rect) = ctx.selection_rect {
            self.render_marquee(rect, ctx.selection_color)?;
        }
        self.body.push_str("</g>\n");

        let (width, height) = (num(ctx.viewport_size.width), num(ctx.viewport_size.height));
        let mut svg = String::with_capacity(self.defs.len() + self.body.len() + 256);
        writeln!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
        )?;
        if !self.defs.is_empty() {
            writeln!(svg, "<defs>\n{}</defs>", self.defs)?;
        }
        svg.push_str(&self.body);
        svg.push_str("</svg>\n");
        log::debug!("Rendered {} shape(s) to SVG ({} bytes)", state.len(), svg.len());
        Ok(svg)
    }
}

/// Export the artboard as SVG with theme colors for any overlays.
pub fn render_svg(state: &EditorState, theme: &Theme) -> RenderResult<String> {
    let ctx = RenderContext::new(state).with_theme(theme);
    SvgRenderer::new().render(&ctx)
}

fn is_finite(shape: &ShapeRecord) -> bool {
    [
        shape.x,
        shape.y,
        shape.width,
        shape.height,
        shape.rotation,
        shape.scale_x,
        shape.scale_y,
    ]
    .iter()
    .all(|v| v.is_finite())
        && shape.points.iter().all(|p| p.is_finite())
}

/// `name="#rrggbb"` plus `name-opacity` for translucent colors.
fn paint_attr(name: &str, color: Option<SerializableColor>) -> String {
    match color {
        None => format!("{name}=\"none\""),
        Some(c) if c.a == 255 => format!("{name}=\"{}\"", rgb_hex(c)),
        Some(c) => format!("{name}=\"{}\" {name}-opacity=\"{}\"", rgb_hex(c), num(c.alpha())),
    }
}

fn rgb_hex(color: SerializableColor) -> String {
    SerializableColor { a: 255, ..color }.to_hex()
}

fn matrix(transform: Affine) -> String {
    let [a, b, c, d, e, f] = transform.as_coeffs();
    format!(
        "matrix({} {} {} {} {} {})",
        num(a),
        num(b),
        num(c),
        num(d),
        num(e),
        num(f)
    )
}

/// Round to three decimals; `+ 0.0` turns `-0` into `0`.
fn num(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0 + 0.0
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
