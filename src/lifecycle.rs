//! Activation and teardown of a running field.
//!
//! [`activate`] wires a [`ParticleField`] to a host: one recurring callback on
//! the [`FrameClock`] (step, then render) and one listener on the
//! [`ResizeNotifier`]. The returned [`SimulationHandle`] owns both
//! subscriptions. Deactivating it, or dropping it, unregisters them; this is
//! idempotent and takes effect from the next tick, so a frame already in
//! flight finishes untouched.
//!
//! # Example
//!
//! ```ignore
//! let clock = FrameClock::new();
//! let resizes = ResizeNotifier::new();
//! let surface = Rc::new(RefCell::new(PixelSurface::new(800, 600)));
//!
//! let handle = activate(Some(&surface), &clock, &resizes, &FieldConfig::default());
//! clock.tick();
//! drop(handle); // no more frames
//! ```

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::clock::{FrameClock, ResizeNotifier, Subscription};
use crate::config::FieldConfig;
use crate::field::ParticleField;
use crate::particle::Bounds;
use crate::surface::Surface;

/// Start a field on `surface`.
///
/// Returns `None`, without registering anything, when no surface is
/// available.
pub fn activate<S>(
    surface: Option<&Rc<RefCell<S>>>,
    clock: &FrameClock,
    resizes: &ResizeNotifier,
    config: &FieldConfig,
) -> Option<SimulationHandle>
where
    S: Surface + 'static,
{
    let Some(surface) = surface else {
        debug!("no surface to draw on, not starting");
        return None;
    };

    let bounds = surface.borrow().size();
    let field = Rc::new(RefCell::new(ParticleField::new(config, bounds)));
    info!(
        particles = config.particle_count,
        width = bounds.width,
        height = bounds.height,
        "particle field activated"
    );

    let frame = {
        let field = Rc::clone(&field);
        let surface = Rc::clone(surface);
        clock.schedule(move |tick| {
            let (Ok(mut field), Ok(mut surface)) = (field.try_borrow_mut(), surface.try_borrow_mut()) else {
                warn!(frame = tick.index, "field or surface busy, skipping frame");
                return;
            };
            field.advance(&mut *surface);
        })
    };

    let resize = {
        let field = Rc::clone(&field);
        let surface = Rc::clone(surface);
        resizes.subscribe(move |&bounds: &Bounds| {
            match surface.try_borrow_mut() {
                Ok(mut surface) => surface.resize(bounds),
                Err(_) => warn!("surface busy during resize"),
            }
            match field.try_borrow_mut() {
                Ok(mut field) => field.resize(bounds),
                Err(_) => warn!("field busy during resize"),
            }
        })
    };

    Some(SimulationHandle {
        frame,
        resize,
        field,
    })
}

/// Stop a running field. Same as [`SimulationHandle::deactivate`].
pub fn deactivate(handle: &mut SimulationHandle) {
    handle.deactivate();
}

/// A running field and its two host subscriptions.
#[derive(Debug)]
pub struct SimulationHandle {
    frame: Subscription,
    resize: Subscription,
    field: Rc<RefCell<ParticleField>>,
}

impl SimulationHandle {
    /// Unregister the frame callback and the resize listener.
    pub fn deactivate(&mut self) {
        if self.is_active() {
            info!("particle field deactivated");
        }
        self.frame.cancel();
        self.resize.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.frame.is_active() || self.resize.is_active()
    }

    /// Borrow the field state.
    ///
    /// # Panics
    ///
    /// If called from inside a frame callback of this same field.
    pub fn field(&self) -> Ref<'_, ParticleField> {
        self.field.borrow()
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Recorder;

    fn recorder(width: f32, height: f32) -> Rc<RefCell<Recorder>> {
        Rc::new(RefCell::new(Recorder::new(Bounds::new(width, height))))
    }

    #[test]
    fn test_no_surface_is_a_no_op() {
        let clock = FrameClock::new();
        let resizes = ResizeNotifier::new();
        let handle = activate::<Recorder>(None, &clock, &resizes, &FieldConfig::default());
        assert!(handle.is_none());
        assert_eq!(clock.scheduled(), 0);
        assert!(resizes.is_empty());
    }

    #[test]
    fn test_activate_registers_once() {
        let clock = FrameClock::new();
        let resizes = ResizeNotifier::new();
        let surface = recorder(300.0, 200.0);
        let handle = activate(Some(&surface), &clock, &resizes, &FieldConfig::default()).unwrap();

        assert!(handle.is_active());
        assert_eq!(clock.scheduled(), 1);
        assert_eq!(resizes.len(), 1);
        assert_eq!(handle.field().bounds(), Bounds::new(300.0, 200.0));
    }

    #[test]
    fn test_free_deactivate_matches_method() {
        let clock = FrameClock::new();
        let resizes = ResizeNotifier::new();
        let surface = recorder(100.0, 100.0);
        let mut handle = activate(Some(&surface), &clock, &resizes, &FieldConfig::default()).unwrap();

        deactivate(&mut handle);
        deactivate(&mut handle);
        assert!(!handle.is_active());
        assert_eq!(clock.scheduled(), 0);
        assert!(resizes.is_empty());
    }

    #[test]
    fn test_deactivate_inside_frame_finishes_current_frame() {
        let clock = FrameClock::new();
        let resizes = ResizeNotifier::new();
        let surface = recorder(100.0, 100.0);
        let config = FieldConfig::default().with_particle_count(5).with_seed(3);
        let handle = Rc::new(RefCell::new(activate(Some(&surface), &clock, &resizes, &config)));

        // Registered after the field's own callback, so it runs second.
        let h = Rc::clone(&handle);
        let _stopper = clock.schedule(move |_| {
            if let Some(handle) = h.borrow_mut().as_mut() {
                handle.deactivate();
            }
        });

        assert_eq!(clock.tick(), 2);
        let drawn = surface.borrow().circles().count();
        assert_eq!(drawn, 5);

        clock.tick();
        assert_eq!(surface.borrow().circles().count(), drawn);
    }
}
