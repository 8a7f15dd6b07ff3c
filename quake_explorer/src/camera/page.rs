//! Scrollable page: stacked sections viewed through an orthographic camera
//! that follows the scroll offset.

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::render::camera::ScalingMode;
use bevy_egui::EguiContexts;

use crate::frames::VisibilitySample;

/// Visible page height in world units.
pub const VIEW_HEIGHT: f32 = 10.0;
const LINE_STEP: f32 = 0.8;
const PIXEL_STEP: f32 = 0.01;
const KEY_STEP: f32 = 0.25;
const CAMERA_Z: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionId {
    Intro,
    Heatmap,
    Globe,
}

#[derive(Clone, Copy, Debug)]
pub struct PageSection {
    pub id: SectionId,
    /// Page offset of the section's top edge; the page grows downward.
    pub top: f32,
    pub height: f32,
}

impl PageSection {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// World-space centre. Page y maps to world -y.
    pub fn center(&self) -> Vec3 {
        Vec3::new(0.0, -(self.top + self.height / 2.0), 0.0)
    }
}

/// Section layout and the current scroll offset.
#[derive(Resource, Debug)]
pub struct PageLayout {
    sections: Vec<PageSection>,
    pub scroll: f32,
    pub view_height: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::new(&[
            (SectionId::Intro, VIEW_HEIGHT),
            (SectionId::Heatmap, 12.0),
            (SectionId::Globe, 12.0),
        ])
    }
}

impl PageLayout {
    pub fn new(sections: &[(SectionId, f32)]) -> Self {
        let mut top = 0.0;
        let sections = sections
            .iter()
            .map(|&(id, height)| {
                let section = PageSection { id, top, height };
                top += height;
                section
            })
            .collect();
        Self {
            sections,
            scroll: 0.0,
            view_height: VIEW_HEIGHT,
        }
    }

    pub fn section(&self, id: SectionId) -> Option<&PageSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn sections(&self) -> &[PageSection] {
        &self.sections
    }

    pub fn page_height(&self) -> f32 {
        self.sections.last().map_or(0.0, PageSection::bottom)
    }

    pub fn max_scroll(&self) -> f32 {
        (self.page_height() - self.view_height).max(0.0)
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll = (self.scroll + delta).clamp(0.0, self.max_scroll());
    }

    /// Page span currently inside the viewport.
    pub fn view_span(&self) -> (f32, f32) {
        (self.scroll, self.scroll + self.view_height)
    }

    pub fn visibility(&self, id: SectionId) -> VisibilitySample {
        match self.section(id) {
            Some(section) => {
                VisibilitySample::from_spans((section.top, section.bottom()), self.view_span())
            }
            None => VisibilitySample {
                is_intersecting: false,
                ratio: 0.0,
            },
        }
    }

    /// Fraction of the viewport height from its top edge to the section's top.
    pub fn screen_fraction_of(&self, id: SectionId) -> Option<f32> {
        self.section(id)
            .map(|s| (s.top - self.scroll) / self.view_height)
    }
}

/// Marker for the page camera.
#[derive(Component)]
pub struct PageCamera;

pub fn page_plugin(app: &mut App) {
    app.init_resource::<PageLayout>()
        .add_systems(Startup, spawn_page_camera)
        .add_systems(Update, (scroll_input_system, follow_scroll_system).chain());
}

fn spawn_page_camera(mut commands: Commands) {
    commands.spawn((
        PageCamera,
        Camera3d::default(),
        Projection::from(OrthographicProjection {
            scaling_mode: ScalingMode::FixedVertical {
                viewport_height: VIEW_HEIGHT,
            },
            ..OrthographicProjection::default_3d()
        }),
        Transform::from_xyz(0.0, -VIEW_HEIGHT / 2.0, CAMERA_Z).looking_at(
            Vec3::new(0.0, -VIEW_HEIGHT / 2.0, 0.0),
            Vec3::Y,
        ),
    ));
}

fn scroll_input_system(
    mut wheel: EventReader<MouseWheel>,
    keys: Res<ButtonInput<KeyCode>>,
    mut contexts: EguiContexts,
    mut page: ResMut<PageLayout>,
) {
    let over_ui = contexts.ctx_mut().is_pointer_over_area();
    let mut delta = 0.0;
    for event in wheel.read() {
        if over_ui {
            continue;
        }
        delta -= match event.unit {
            MouseScrollUnit::Line => event.y * LINE_STEP,
            MouseScrollUnit::Pixel => event.y * PIXEL_STEP,
        };
    }
    if keys.pressed(KeyCode::ArrowDown) {
        delta += KEY_STEP;
    }
    if keys.pressed(KeyCode::ArrowUp) {
        delta -= KEY_STEP;
    }
    if keys.just_pressed(KeyCode::PageDown) {
        delta += page.view_height;
    }
    if keys.just_pressed(KeyCode::PageUp) {
        delta -= page.view_height;
    }
    if delta != 0.0 {
        page.scroll_by(delta);
    }
}

fn follow_scroll_system(
    page: Res<PageLayout>,
    mut cameras: Query<&mut Transform, With<PageCamera>>,
) {
    if !page.is_changed() {
        return;
    }
    let center_y = -(page.scroll + page.view_height / 2.0);
    for mut transform in &mut cameras {
        transform.translation.x = 0.0;
        transform.translation.y = center_y;
    }
}
