use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry as CanvasGeometry, Path, Stroke},
    Color, Point, Rectangle, Renderer, Size, Theme,
};
use std::time::Instant;
use trackcore::map::style::{LabelStyle, MarkerStyle};
use trackcore::map::{Coordinate, Feature, FeatureStyle, Geometry, Rgba, VectorLayer};

fn color(rgba: Rgba) -> Color {
    Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a)
}

/// Projected coordinate to canvas pixels; y grows downwards on screen.
pub fn to_screen(coordinate: Coordinate, center: Coordinate, resolution: f64, size: Size) -> Point {
    let dx = (coordinate.x - center.x) / resolution;
    let dy = (coordinate.y - center.y) / resolution;
    Point::new(size.width / 2.0 + dx as f32, size.height / 2.0 - dy as f32)
}

/// Vertices of a regular polygon whose first point sits at `rotation`
/// radians clockwise from north.
pub fn polygon_vertices(center: Point, radius: f32, rotation: f64, points: u8) -> Vec<Point> {
    let points = points.max(3);
    (0..points)
        .map(|i| {
            let angle = rotation as f32 + i as f32 * std::f32::consts::TAU / points as f32;
            Point::new(center.x + radius * angle.sin(), center.y - radius * angle.cos())
        })
        .collect()
}

/// Frame-local copy of the vector layer, drawn in layer order.
pub struct MapCanvas {
    features: Vec<Feature>,
    center: Coordinate,
    resolution: f64,
}

impl MapCanvas {
    pub fn new(layer: &VectorLayer, now: Instant, resolution: f64) -> Self {
        Self {
            features: layer.features().cloned().collect(),
            center: layer.center_at(now),
            resolution,
        }
    }

    fn draw_marker(&self, frame: &mut Frame, at: Point, style: &MarkerStyle) {
        let vertices = polygon_vertices(at, style.radius, style.rotation, style.points);
        let shape = Path::new(|builder| {
            for (i, vertex) in vertices.iter().enumerate() {
                if i == 0 {
                    builder.move_to(*vertex);
                } else {
                    builder.line_to(*vertex);
                }
            }
            builder.close();
        });
        frame.fill(&shape, color(style.fill));
        frame.stroke(
            &shape,
            Stroke::default()
                .with_width(style.stroke.width)
                .with_color(color(style.stroke.color)),
        );

        if let Some(label) = &style.label {
            self.draw_label(frame, at, label);
        }
    }

    fn draw_label(&self, frame: &mut Frame, at: Point, label: &LabelStyle) {
        let anchor = Point::new(at.x, at.y + label.offset_y - 12.0);
        let width = label.outline.width;
        let text = |position: Point, fill: Rgba| canvas::Text {
            content: label.text.clone(),
            position,
            color: color(fill),
            size: 12.0.into(),
            ..canvas::Text::default()
        };

        for (dx, dy) in [(-width, 0.0), (width, 0.0), (0.0, -width), (0.0, width)] {
            frame.fill_text(text(Point::new(anchor.x + dx, anchor.y + dy), label.outline.color));
        }
        frame.fill_text(text(anchor, label.fill));
    }
}

impl<Message> canvas::Program<Message> for MapCanvas {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<CanvasGeometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.93, 0.93, 0.9),
        );

        let size = bounds.size();
        let project = |coordinate: Coordinate| to_screen(coordinate, self.center, self.resolution, size);

        for feature in &self.features {
            match (&feature.geometry, &feature.style) {
                (Geometry::LineString(points), FeatureStyle::Line(line)) if points.len() > 1 => {
                    let path = Path::new(|builder| {
                        builder.move_to(project(points[0]));
                        for point in &points[1..] {
                            builder.line_to(project(*point));
                        }
                    });
                    frame.stroke(
                        &path,
                        Stroke::default()
                            .with_width(line.stroke.width)
                            .with_color(color(line.stroke.color)),
                    );
                }
                (Geometry::Point(point), FeatureStyle::Marker(marker)) => {
                    self.draw_marker(&mut frame, project(*point), marker);
                }
                _ => {}
            }
        }

        vec![frame.into_geometry()]
    }
}
