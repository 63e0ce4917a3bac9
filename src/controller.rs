use std::sync::Arc;

use glam::Mat4;
use log::{debug, trace, warn};
use parking_lot::Mutex;
use rand::Rng;

use crate::buffers::PointCloudBuffers;
use crate::error::FieldError;
use crate::generator::{generate_galaxy, generate_stars};
use crate::params::{GalaxyChange, GalaxyParameters, StarFieldChange, StarFieldParameters};
use crate::surface::{DisplaySurface, FieldKind, PointCloud, PointStyle, SurfaceHandle};

/// Idle spin of the galaxy around its vertical axis, radians per second.
pub const GALAXY_YAW_SPEED: f32 = 0.05;
pub const STARS_YAW_SPEED: f32 = 0.02;
pub const STARS_PITCH_SPEED: f32 = 0.01;

/// Whether a configuration edit is final or still being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangePhase {
    Intermediate,
    Settled,
}

/// A cloud currently published on the surface.
///
/// Not `Clone`: the controller is the only owner and [`FieldResource::release`]
/// consumes it, so a handle cannot be released twice.
#[derive(Debug)]
pub struct FieldResource {
    handle: SurfaceHandle,
    cloud: PointCloud,
}

impl FieldResource {
    fn publish<S>(cloud: PointCloud, surface: &mut S) -> Self
    where
        S: DisplaySurface + ?Sized,
    {
        let handle = surface.publish(&cloud);
        Self { handle, cloud }
    }

    fn release<S>(self, surface: &mut S)
    where
        S: DisplaySurface + ?Sized,
    {
        surface.release(self.handle);
    }

    pub fn handle(&self) -> SurfaceHandle {
        self.handle
    }

    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    pub fn buffers(&self) -> &PointCloudBuffers {
        &self.cloud.buffers
    }
}

#[derive(Debug, Default)]
struct FieldSlot {
    current: Option<FieldResource>,
    dirty: bool,
    generation: u64,
}

impl FieldSlot {
    /// Publishes `cloud`, then releases whatever it supersedes.
    fn replace<S>(&mut self, cloud: PointCloud, surface: &mut S)
    where
        S: DisplaySurface + ?Sized,
    {
        let next = FieldResource::publish(cloud, surface);
        if let Some(previous) = self.current.replace(next) {
            previous.release(surface);
        }
        self.dirty = false;
        self.generation += 1;
    }

    fn clear<S>(&mut self, surface: &mut S)
    where
        S: DisplaySurface + ?Sized,
    {
        if let Some(previous) = self.current.take() {
            previous.release(surface);
        }
        self.dirty = true;
    }
}

/// Owns the parameter snapshots and the current cloud of each field.
///
/// All regeneration goes through `&mut self`, so one regeneration always
/// completes before the next starts. Share across threads through
/// [`SharedController`].
pub struct FieldController<S, R> {
    surface: S,
    rng: R,
    galaxy: GalaxyParameters,
    stars: StarFieldParameters,
    galaxy_slot: FieldSlot,
    stars_slot: FieldSlot,
}

pub type SharedController<S, R> = Arc<Mutex<FieldController<S, R>>>;

impl<S, R> FieldController<S, R>
where
    S: DisplaySurface,
    R: Rng,
{
    pub fn new(
        surface: S,
        rng: R,
        galaxy: GalaxyParameters,
        stars: StarFieldParameters,
    ) -> Self {
        Self {
            surface,
            rng,
            galaxy,
            stars,
            galaxy_slot: FieldSlot {
                dirty: true,
                ..FieldSlot::default()
            },
            stars_slot: FieldSlot {
                dirty: true,
                ..FieldSlot::default()
            },
        }
    }

    pub fn shared(self) -> SharedController<S, R> {
        Arc::new(Mutex::new(self))
    }

    /// Generates and publishes both fields from the current snapshots.
    pub fn start(&mut self) -> Result<(), FieldError> {
        self.regenerate_galaxy()?;
        self.regenerate_stars()
    }

    /// Replaces the galaxy cloud with a fresh one built from the current
    /// parameters. On error nothing is published and the previous cloud
    /// stays current.
    pub fn regenerate_galaxy(&mut self) -> Result<(), FieldError> {
        let buffers = generate_galaxy(&self.galaxy, &mut self.rng)?;
        let cloud = PointCloud {
            kind: FieldKind::Galaxy,
            buffers,
            style: PointStyle::additive(self.galaxy.size),
        };
        self.galaxy_slot.replace(cloud, &mut self.surface);
        debug!(
            "galaxy generation {} published ({} points)",
            self.galaxy_slot.generation, self.galaxy.count
        );
        Ok(())
    }

    pub fn regenerate_stars(&mut self) -> Result<(), FieldError> {
        let buffers = generate_stars(&self.stars, &mut self.rng)?;
        let cloud = PointCloud {
            kind: FieldKind::Stars,
            buffers,
            style: PointStyle::uniform(self.stars.size, self.stars.color),
        };
        self.stars_slot.replace(cloud, &mut self.surface);
        debug!(
            "star field generation {} published ({} points)",
            self.stars_slot.generation, self.stars.count
        );
        Ok(())
    }

    /// Applies an edit to the galaxy snapshot.
    ///
    /// Invalid edits are rejected without touching the snapshot. Settled edits
    /// regenerate immediately; intermediate ones only mark the galaxy dirty.
    /// Returns whether a regeneration ran.
    pub fn apply_galaxy_change(
        &mut self,
        change: GalaxyChange,
        phase: ChangePhase,
    ) -> Result<bool, FieldError> {
        let mut candidate = self.galaxy;
        candidate.apply(change);
        if let Err(err) = candidate.validate() {
            warn!("rejected galaxy change {change:?}: {err}");
            return Err(err);
        }
        self.galaxy = candidate;
        self.galaxy_slot.dirty = true;
        match phase {
            ChangePhase::Intermediate => Ok(false),
            ChangePhase::Settled => self.regenerate_galaxy().map(|()| true),
        }
    }

    pub fn apply_stars_change(
        &mut self,
        change: StarFieldChange,
        phase: ChangePhase,
    ) -> Result<bool, FieldError> {
        let mut candidate = self.stars;
        candidate.apply(change);
        if let Err(err) = candidate.validate() {
            warn!("rejected star field change {change:?}: {err}");
            return Err(err);
        }
        self.stars = candidate;
        self.stars_slot.dirty = true;
        match phase {
            ChangePhase::Intermediate => Ok(false),
            ChangePhase::Settled => self.regenerate_stars().map(|()| true),
        }
    }

    /// Regenerates every field with pending intermediate edits.
    pub fn settle(&mut self) -> Result<usize, FieldError> {
        let mut regenerated = 0;
        if self.galaxy_slot.dirty {
            self.regenerate_galaxy()?;
            regenerated += 1;
        }
        if self.stars_slot.dirty {
            self.regenerate_stars()?;
            regenerated += 1;
        }
        Ok(regenerated)
    }

    /// Hands the current clouds to the surface with their idle rotation.
    pub fn present(&mut self, elapsed_seconds: f32) {
        for (kind, slot) in [
            (FieldKind::Galaxy, &self.galaxy_slot),
            (FieldKind::Stars, &self.stars_slot),
        ] {
            if let Some(resource) = slot.current.as_ref() {
                self.surface
                    .present(resource.handle(), field_transform(kind, elapsed_seconds));
            }
        }
        trace!("presented frame at {elapsed_seconds:.3}s");
    }

    /// Releases both current clouds; the next `settle` rebuilds them.
    pub fn clear(&mut self) {
        self.galaxy_slot.clear(&mut self.surface);
        self.stars_slot.clear(&mut self.surface);
    }
}

impl<S, R> FieldController<S, R> {
    pub fn galaxy_parameters(&self) -> &GalaxyParameters {
        &self.galaxy
    }

    pub fn star_parameters(&self) -> &StarFieldParameters {
        &self.stars
    }

    pub fn current(&self, kind: FieldKind) -> Option<&FieldResource> {
        self.slot(kind).current.as_ref()
    }

    pub fn is_dirty(&self, kind: FieldKind) -> bool {
        self.slot(kind).dirty
    }

    /// Number of successful regenerations of the field.
    pub fn generation(&self, kind: FieldKind) -> u64 {
        self.slot(kind).generation
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    fn slot(&self, kind: FieldKind) -> &FieldSlot {
        match kind {
            FieldKind::Galaxy => &self.galaxy_slot,
            FieldKind::Stars => &self.stars_slot,
        }
    }
}

/// Model transform of a field `elapsed_seconds` after start-up.
pub fn field_transform(kind: FieldKind, elapsed_seconds: f32) -> Mat4 {
    match kind {
        FieldKind::Galaxy => Mat4::from_rotation_y(elapsed_seconds * GALAXY_YAW_SPEED),
        FieldKind::Stars => {
            Mat4::from_rotation_x(elapsed_seconds * STARS_PITCH_SPEED)
                * Mat4::from_rotation_y(elapsed_seconds * STARS_YAW_SPEED)
        }
    }
}
