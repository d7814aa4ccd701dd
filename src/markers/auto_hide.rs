//! Hide markers while the camera is being navigated.
//!
//! On a navigation start the global hidden flag is remembered and forced on.
//! After the gesture ends the camera matrix is sampled every frame; once it has
//! not changed for the idle duration the remembered flag is put back.

use bevy::prelude::*;

use super::registry::MarkerRegistry;
use crate::config::AppConfig;
use crate::viewer::{NavigationEnded, NavigationStarted, SceneViewer, Viewer};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Phase {
    #[default]
    Inactive,
    Navigating {
        prior_hidden: bool,
    },
    Settling {
        prior_hidden: bool,
        last_sample: Mat4,
        last_change: f64,
    },
}

#[derive(Resource, Debug, Default)]
pub struct AutoHide {
    phase: Phase,
}

fn matrix_changed(a: &Mat4, b: &Mat4, epsilon: f32) -> bool {
    !a.abs_diff_eq(*b, epsilon)
}

impl AutoHide {
    /// True while markers are force-hidden by this detector.
    pub fn is_engaged(&self) -> bool {
        self.phase != Phase::Inactive
    }

    pub fn navigation_started(&mut self, registry: &mut MarkerRegistry) {
        self.phase = match self.phase {
            Phase::Inactive => {
                let prior_hidden = registry.markers_hidden();
                registry.set_markers_hidden(true);
                debug!("Auto-hide engaged");
                Phase::Navigating { prior_hidden }
            }
            // Already hidden by us; keep the value from before the first gesture
            Phase::Navigating { prior_hidden } | Phase::Settling { prior_hidden, .. } => {
                Phase::Navigating { prior_hidden }
            }
        };
    }

    /// Begin waiting for the camera to settle. Without a camera there is
    /// nothing to wait for and the flag is restored at once.
    pub fn navigation_ended(
        &mut self,
        camera_matrix: Option<Mat4>,
        now: f64,
        registry: &mut MarkerRegistry,
    ) {
        let Phase::Navigating { prior_hidden } = self.phase else {
            return;
        };
        match camera_matrix {
            Some(last_sample) => {
                self.phase = Phase::Settling {
                    prior_hidden,
                    last_sample,
                    last_change: now,
                };
            }
            None => self.restore(prior_hidden, registry),
        }
    }

    /// Per-frame settle check. Returns true on the frame the flag is restored.
    pub fn poll(
        &mut self,
        camera_matrix: Option<Mat4>,
        now: f64,
        idle_secs: f64,
        epsilon: f32,
        registry: &mut MarkerRegistry,
    ) -> bool {
        let Phase::Settling {
            prior_hidden,
            last_sample,
            last_change,
        } = self.phase
        else {
            return false;
        };

        let Some(sample) = camera_matrix else {
            self.restore(prior_hidden, registry);
            return true;
        };
        if matrix_changed(&sample, &last_sample, epsilon) {
            self.phase = Phase::Settling {
                prior_hidden,
                last_sample: sample,
                last_change: now,
            };
            return false;
        }
        if now - last_change >= idle_secs {
            self.restore(prior_hidden, registry);
            return true;
        }
        false
    }

    /// Stop immediately and put the remembered flag back.
    pub fn disengage(&mut self, registry: &mut MarkerRegistry) {
        match self.phase {
            Phase::Navigating { prior_hidden } | Phase::Settling { prior_hidden, .. } => {
                self.restore(prior_hidden, registry);
            }
            Phase::Inactive => {}
        }
    }

    /// Change the user's hidden preference. While engaged the new value is
    /// remembered and applied when the camera settles.
    pub fn set_user_hidden(&mut self, hidden: bool, registry: &mut MarkerRegistry) {
        match &mut self.phase {
            Phase::Navigating { prior_hidden } | Phase::Settling { prior_hidden, .. } => {
                *prior_hidden = hidden;
            }
            Phase::Inactive => registry.set_markers_hidden(hidden),
        }
    }

    /// The hidden flag the user will see once navigation settles.
    pub fn user_hidden(&self, registry: &MarkerRegistry) -> bool {
        match self.phase {
            Phase::Navigating { prior_hidden } | Phase::Settling { prior_hidden, .. } => prior_hidden,
            Phase::Inactive => registry.markers_hidden(),
        }
    }

    fn restore(&mut self, prior_hidden: bool, registry: &mut MarkerRegistry) {
        registry.set_markers_hidden(prior_hidden);
        self.phase = Phase::Inactive;
        debug!("Auto-hide released");
    }
}

pub fn update_auto_hide(
    mut started: MessageReader<NavigationStarted>,
    mut ended: MessageReader<NavigationEnded>,
    mut auto_hide: ResMut<AutoHide>,
    mut registry: ResMut<MarkerRegistry>,
    config: Res<AppConfig>,
    time: Res<Time>,
    viewer: SceneViewer,
) {
    let settings = config.markers();
    let had_start = started.read().count() > 0;
    let had_end = ended.read().count() > 0;

    if !settings.auto_hide_during_navigation {
        auto_hide.disengage(&mut registry);
        return;
    }

    let now = time.elapsed_secs_f64();
    let camera_matrix = viewer.camera().map(|camera| camera.world_matrix());
    if had_start {
        auto_hide.navigation_started(&mut registry);
    }
    if had_end {
        auto_hide.navigation_ended(camera_matrix, now, &mut registry);
    }
    auto_hide.poll(
        camera_matrix,
        now,
        settings.auto_hide_idle_secs,
        settings.auto_hide_epsilon,
        &mut registry,
    );
}
