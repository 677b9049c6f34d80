use bevy::prelude::*;

use super::{GalaxyCloud, GalaxyError, GalaxyParams};

/// Fixed display settings for an installed cloud. Only the size is tunable;
/// additive blending, no depth writes and vertex colors are always on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointStyle {
    pub size: f32,
}

impl From<&GalaxyParams> for PointStyle {
    fn from(params: &GalaxyParams) -> Self {
        Self { size: params.size }
    }
}

/// Whatever owns the display resources of a galaxy.
pub trait GalaxyHost {
    type Installed;

    fn install(&mut self, cloud: GalaxyCloud, style: PointStyle) -> Self::Installed;

    /// Fails if any part of `installed` is missing. Touches nothing.
    fn check_release(&self, installed: &Self::Installed) -> Result<(), GalaxyError>;

    fn release_geometry(&mut self, installed: &Self::Installed) -> Result<(), GalaxyError>;
    fn release_material(&mut self, installed: &Self::Installed) -> Result<(), GalaxyError>;
    fn detach(&mut self, installed: &Self::Installed) -> Result<(), GalaxyError>;

    /// Geometry, then material, then the scene node. Nothing is released unless
    /// every part is still there.
    fn release(&mut self, installed: &Self::Installed) -> Result<(), GalaxyError> {
        self.check_release(installed)?;
        self.release_geometry(installed)?;
        self.release_material(installed)?;
        self.detach(installed)
    }

    /// Same order as `release`, but skips whatever is already gone.
    fn release_remaining(&mut self, installed: &Self::Installed) {
        let results = [
            self.release_geometry(installed),
            self.release_material(installed),
            self.detach(installed),
        ];
        for err in results.into_iter().filter_map(Result::err) {
            warn!("Skipped while clearing broken galaxy: {err}");
        }
    }
}

/// The single galaxy currently on screen, if any.
#[derive(Resource, Debug)]
pub struct DisplayedGalaxy<T> {
    current: Option<T>,
    generation: u32,
    /// Set when `current` could not be released; the next replace clears it
    /// piecewise instead of refusing again.
    release_refused: bool,
}

impl<T> Default for DisplayedGalaxy<T> {
    fn default() -> Self {
        Self {
            current: None,
            generation: 0,
            release_refused: false,
        }
    }
}

impl<T> DisplayedGalaxy<T> {
    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Number of successful installs so far.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Releases the previous galaxy and installs `cloud` in its place.
    ///
    /// If the previous galaxy cannot be released as a whole, it is left exactly
    /// as it was and nothing is installed. The following call then clears what
    /// is left of it and installs normally.
    pub fn replace<H>(
        &mut self,
        host: &mut H,
        cloud: GalaxyCloud,
        style: PointStyle,
    ) -> Result<&T, GalaxyError>
    where
        H: GalaxyHost<Installed = T>,
    {
        if let Some(previous) = self.current.take() {
            if self.release_refused {
                host.release_remaining(&previous);
            } else if let Err(err) = host.release(&previous) {
                self.current = Some(previous);
                self.release_refused = true;
                return Err(err);
            }
        }

        self.release_refused = false;
        self.generation += 1;
        Ok(&*self.current.insert(host.install(cloud, style)))
    }
}
