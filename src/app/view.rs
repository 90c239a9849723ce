use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::emath::Rot2;
use eframe::egui::epaint::TextShape;
use eframe::egui::{self, Align2, Color32, FontId, PointerButton, Pos2, Rect, Sense, Stroke, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use similarity_graph::NodeId;
use tracing::warn;

use super::render_utils::{
    NODE_COLOR, blend_color, circle_visible, draw_background, draw_viewport, screen_radius,
    screen_to_world, world_to_screen,
};
use super::{SearchMatchCache, ViewModel};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    fn node_at(&self, rect: Rect, pointer: Pos2) -> Option<NodeId> {
        let list = self.sim_loop.renderer().latest()?;
        let radius = screen_radius(self.zoom);
        list.nodes
            .iter()
            .rev()
            .find(|marker| {
                world_to_screen(rect, self.pan, self.zoom, marker.position).distance(pointer)
                    <= radius
            })
            .map(|marker| marker.id.clone())
    }

    // The node stays pinned after release unless `unpin_on_release` is set.
    fn handle_node_drag(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let pointer = ui.input(|input| input.pointer.interact_pos());

        if response.drag_started_by(PointerButton::Primary)
            && let Some(id) = pointer.and_then(|pointer| self.node_at(rect, pointer))
        {
            match self.sim_loop.simulation_mut().set_fixed(id.as_str(), true) {
                Ok(()) => {
                    self.dragging = Some(id);
                    self.sim_loop.start();
                }
                Err(error) => warn!(%error, "could not pin the dragged node"),
            }
        }

        let Some(id) = self.dragging.clone() else {
            return;
        };

        if response.dragged_by(PointerButton::Primary)
            && let Some(pointer) = pointer
        {
            let world = screen_to_world(rect, self.pan, self.zoom, pointer);
            if let Err(error) = self
                .sim_loop
                .simulation_mut()
                .set_position(id.as_str(), world.x, world.y)
            {
                warn!(%error, "could not move the dragged node");
                self.dragging = None;
                return;
            }
        }

        if response.drag_stopped() {
            if self.unpin_on_release
                && let Err(error) = self.sim_loop.simulation_mut().set_fixed(id.as_str(), false)
            {
                warn!(%error, "could not unpin the dragged node");
            }
            self.dragging = None;
        }
    }

    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let list = self.sim_loop.renderer().latest()?;
        let matcher = SkimMatcherV2::default();
        let matches = list
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, marker)| {
                fuzzy_match_score(&matcher, &marker.label, query).is_some()
                    || fuzzy_match_score(&matcher, &marker.title, query).is_some()
            })
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        self.handle_node_drag(ui, rect, &response);

        let ticked = self.sim_loop.tick();
        if !ticked && self.dragging.is_some() {
            self.sim_loop.refresh();
        }
        if ticked || self.dragging.is_some() {
            ui.ctx().request_repaint();
        }

        let search_matches = self.cached_search_matches();
        let hovered = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| self.node_at(rect, pointer));

        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::Grab;
            });
        }

        if let Some(size) = self.sim_loop.simulation().config().viewport_size {
            draw_viewport(&painter, rect, self.pan, self.zoom, size);
        }

        let Some(list) = self.sim_loop.renderer().latest() else {
            ui.label("Waiting for the first layout tick...");
            return;
        };

        let zoom_sqrt = self.zoom.sqrt();
        let edge_stroke = Stroke::new(
            (1.1 * zoom_sqrt).clamp(0.6, 3.0),
            Color32::from_rgba_unmultiplied(150, 150, 150, 200),
        );
        let show_edge_labels = self.zoom > 0.35;
        let label_font = FontId::proportional((11.0 * zoom_sqrt).clamp(8.0, 16.0));

        for edge in &list.edges {
            let start = world_to_screen(rect, self.pan, self.zoom, edge.from);
            let end = world_to_screen(rect, self.pan, self.zoom, edge.to);
            painter.line_segment([start, end], edge_stroke);

            if !show_edge_labels {
                continue;
            }

            let center = world_to_screen(rect, self.pan, self.zoom, edge.label_position);
            if !rect.contains(center) {
                continue;
            }
            let galley =
                painter.layout_no_wrap(edge.label.clone(), label_font.clone(), Color32::from_gray(230));
            let offset = Rot2::from_angle(edge.label_angle) * (-galley.size() * 0.5);
            painter.add(
                TextShape::new(center + offset, galley, Color32::from_gray(230))
                    .with_angle(edge.label_angle),
            );
        }

        let radius = screen_radius(self.zoom);
        let pseudo_active = search_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        for (index, marker) in list.nodes.iter().enumerate() {
            let position = world_to_screen(rect, self.pan, self.zoom, marker.position);
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let is_hovered = hovered.as_ref() == Some(&marker.id);
            let is_match = search_matches
                .as_ref()
                .is_some_and(|matches| matches.contains(&index));

            let color = if is_hovered {
                Color32::from_rgb(255, 164, 101)
            } else if is_match {
                blend_color(NODE_COLOR, Color32::from_rgb(103, 196, 255), 0.68)
            } else if pseudo_active {
                blend_color(NODE_COLOR, Color32::from_rgb(19, 23, 29), 0.45)
            } else {
                NODE_COLOR
            };

            painter.circle_filled(position, radius, color);
            let outline = if marker.fixed {
                Stroke::new(2.2, Color32::from_rgb(245, 206, 93))
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190))
            };
            painter.circle_stroke(position, radius, outline);

            painter.text(
                position,
                Align2::CENTER_CENTER,
                &marker.label,
                FontId::proportional((12.0 * zoom_sqrt).clamp(8.0, 18.0)),
                Color32::from_gray(20),
            );
        }

        if let Some(id) = &hovered
            && let Some(marker) = list.nodes.iter().find(|marker| &marker.id == id)
        {
            let pin_state = if marker.fixed { "pinned" } else { "free" };
            painter.text(
                rect.left_top() + egui::vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {}  |  {pin_state}", marker.label, marker.title),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
