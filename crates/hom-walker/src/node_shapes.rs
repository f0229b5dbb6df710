use eframe::egui::{
    self, Color32, FontFamily, FontId, Pos2, Shape, Stroke, Vec2,
    epaint::{CircleShape, TextShape},
};
use egui_graphs::{DisplayNode, DrawContext, NodeProps};
use homomorphism::{Category, NodeRole};
use once_cell::sync::Lazy;
use petgraph::{EdgeType, stable_graph::IndexType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::graph_view::VertexNode;
use crate::settings::NodeVisualSettings;

static LABEL_VISIBILITY: AtomicBool = AtomicBool::new(true);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualParams {
    pub radius: f32,
    pub label_gap: f32,
    pub label_font: f32,
}

impl From<&NodeVisualSettings> for VisualParams {
    fn from(settings: &NodeVisualSettings) -> Self {
        Self {
            radius: settings.node_radius,
            label_gap: settings.label_gap,
            label_font: settings.label_font_size,
        }
    }
}

static TARGET_VISUALS: Lazy<RwLock<VisualParams>> = Lazy::new(|| {
    RwLock::new(VisualParams::from(
        &NodeVisualSettings::target_defaults(),
    ))
});

static BICLIQUE_VISUALS: Lazy<RwLock<VisualParams>> =
    Lazy::new(|| {
        RwLock::new(VisualParams::from(
            &NodeVisualSettings::biclique_defaults(),
        ))
    });

pub fn set_label_visibility(always: bool) {
    LABEL_VISIBILITY.store(always, Ordering::Relaxed);
}

pub fn set_target_visuals(visuals: VisualParams) {
    *TARGET_VISUALS
        .write()
        .unwrap_or_else(PoisonError::into_inner) = visuals;
}

pub fn set_biclique_visuals(visuals: VisualParams) {
    *BICLIQUE_VISUALS
        .write()
        .unwrap_or_else(PoisonError::into_inner) = visuals;
}

fn visuals_for(category: Category) -> VisualParams {
    let lock = match category {
        Category::TargetGraph => &TARGET_VISUALS,
        Category::BicliqueLeft | Category::BicliqueRight => {
            &BICLIQUE_VISUALS
        }
    };
    *lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn labels_always() -> bool {
    LABEL_VISIBILITY.load(Ordering::Relaxed)
}

fn set1(index: usize) -> Color32 {
    let c = colorous::SET1[index];
    Color32::from_rgb(c.r, c.g, c.b)
}

/// Fill colour of a vertex: red/blue for the two biclique columns, grey
/// for G, yellow for the active S vertex and green for its new image.
pub fn role_color(role: NodeRole) -> Color32 {
    match role {
        NodeRole::Plain(Category::BicliqueLeft) => set1(0),
        NodeRole::Plain(Category::BicliqueRight) => set1(1),
        NodeRole::Plain(Category::TargetGraph) => set1(8),
        NodeRole::Active(Category::TargetGraph) => set1(2),
        NodeRole::Active(_) => set1(5),
    }
}

/// Colour of the edges that explain the current step.
pub fn highlight_color() -> Color32 {
    set1(2)
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum LabelPlacement {
    Left,
    Right,
    /// Away from the centre of the graph
    Radial,
}

impl LabelPlacement {
    fn from_category(category: Category) -> Self {
        match category {
            Category::BicliqueLeft => Self::Left,
            Category::BicliqueRight => Self::Right,
            Category::TargetGraph => Self::Radial,
        }
    }
}

fn label_top_left_for_direction(
    ctx: &DrawContext,
    node_pos: Pos2,
    dir: Vec2,
    galley: &std::sync::Arc<egui::Galley>,
    radius: f32,
    gap: f32,
) -> Pos2 {
    let direction = if dir.length_sq() < f32::EPSILON {
        Vec2::new(0.0, -1.0)
    } else {
        dir.normalized()
    };

    let radius_screen = ctx.meta.canvas_to_screen_size(radius);
    let gap_screen = ctx.meta.canvas_to_screen_size(gap);
    let support = 0.5
        * (direction.x.abs() * galley.size().x
            + direction.y.abs() * galley.size().y);

    let node_screen = ctx.meta.canvas_to_screen_pos(node_pos);
    let center_screen = node_screen
        + direction * (radius_screen + gap_screen + support);

    Pos2::new(
        center_screen.x - galley.size().x / 2.0,
        center_screen.y - galley.size().y / 2.0,
    )
}

/// Filled circle coloured by the vertex's [`NodeRole`]. Biclique labels sit
/// outside their column; target-graph labels point away from the centre.
#[derive(Clone, Debug)]
pub struct VertexNodeShape {
    pos: Pos2,
    selected: bool,
    dragged: bool,
    hovered: bool,
    label_text: String,
    role: NodeRole,
    visuals: VisualParams,
}

impl From<NodeProps<VertexNode>> for VertexNodeShape {
    fn from(props: NodeProps<VertexNode>) -> Self {
        let role = props.payload.role;
        Self {
            pos: props.location(),
            selected: props.selected,
            dragged: props.dragged,
            hovered: props.hovered,
            label_text: props.label,
            role,
            visuals: visuals_for(role.category()),
        }
    }
}

impl<E: Clone, Ty: EdgeType, Ix: IndexType>
    DisplayNode<VertexNode, E, Ty, Ix> for VertexNodeShape
{
    fn closest_boundary_point(&self, dir: Vec2) -> Pos2 {
        self.pos + dir.normalized() * self.visuals.radius
    }

    fn shapes(&mut self, ctx: &DrawContext) -> Vec<Shape> {
        self.visuals = visuals_for(self.role.category());
        let mut res = Vec::with_capacity(2);
        let center_screen = ctx.meta.canvas_to_screen_pos(self.pos);
        let radius = if self.role.is_active() {
            self.visuals.radius * 1.5
        } else {
            self.visuals.radius
        };
        let radius_screen = ctx.meta.canvas_to_screen_size(radius);
        let color = role_color(self.role);

        res.push(
            CircleShape {
                center: center_screen,
                radius: radius_screen,
                fill: color,
                stroke: self.effective_stroke(),
            }
            .into(),
        );

        if !self.should_show_label() {
            return res;
        }

        let text_color = ctx.ctx.style().visuals.text_color();
        let galley = self.label_galley(ctx, text_color);
        let label_pos = self.label_pos(ctx, &galley);
        res.push(TextShape::new(label_pos, galley, text_color).into());
        res
    }

    fn update(&mut self, state: &NodeProps<VertexNode>) {
        self.pos = state.location();
        self.selected = state.selected;
        self.dragged = state.dragged;
        self.hovered = state.hovered;
        self.label_text = state.label.clone();
        self.role = state.payload.role;
    }

    fn is_inside(&self, pos: Pos2) -> bool {
        (pos - self.pos).length() <= self.visuals.radius
    }
}

impl VertexNodeShape {
    pub fn set_role(&mut self, role: NodeRole) {
        self.role = role;
    }

    fn should_show_label(&self) -> bool {
        labels_always()
            || self.role.is_active()
            || self.selected
            || self.dragged
            || self.hovered
    }

    fn effective_stroke(&self) -> Stroke {
        if self.selected || self.hovered {
            Stroke::new(3.0, Color32::from_rgb(40, 40, 40))
        } else {
            Stroke::new(1.0, Color32::from_rgb(80, 80, 80))
        }
    }

    fn label_galley(
        &self,
        ctx: &DrawContext,
        color: Color32,
    ) -> std::sync::Arc<egui::Galley> {
        ctx.ctx.fonts_mut(|f| {
            f.layout_no_wrap(
                self.label_text.clone(),
                FontId::new(
                    self.visuals.label_font,
                    FontFamily::Monospace,
                ),
                color,
            )
        })
    }

    fn label_pos(
        &self,
        ctx: &DrawContext,
        galley: &std::sync::Arc<egui::Galley>,
    ) -> Pos2 {
        let dir = match LabelPlacement::from_category(self.role.category())
        {
            LabelPlacement::Left => Vec2::new(-1.0, 0.0),
            LabelPlacement::Right => Vec2::new(1.0, 0.0),
            LabelPlacement::Radial => {
                self.pos - ctx.meta.graph_bounds().center()
            }
        };
        label_top_left_for_direction(
            ctx,
            self.pos,
            dir,
            galley,
            self.visuals.radius,
            self.visuals.label_gap,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_palette() {
        assert_eq!(
            role_color(NodeRole::Plain(Category::BicliqueLeft)),
            Color32::from_rgb(0xe4, 0x1a, 0x1c)
        );
        assert_eq!(
            role_color(NodeRole::Plain(Category::BicliqueRight)),
            Color32::from_rgb(0x37, 0x7e, 0xb8)
        );
        assert_eq!(
            role_color(NodeRole::Active(Category::TargetGraph)),
            highlight_color()
        );
        assert_eq!(
            role_color(NodeRole::Active(Category::BicliqueLeft)),
            role_color(NodeRole::Active(Category::BicliqueRight))
        );
    }

    #[test]
    fn test_label_placement_follows_column() {
        assert_eq!(
            LabelPlacement::from_category(Category::BicliqueLeft),
            LabelPlacement::Left
        );
        assert_eq!(
            LabelPlacement::from_category(Category::TargetGraph),
            LabelPlacement::Radial
        );
    }
}
