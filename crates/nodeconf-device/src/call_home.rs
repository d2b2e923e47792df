//! Registration state of a device

use crate::errors::{DeviceError, Result};
use crate::options::Options;
use nodeconf_core::{log_op_end, log_op_error, log_op_start};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

/// Performs the actual registration with the management endpoint
///
/// Transport lives outside this crate; implementations may block.
pub trait Registrar {
    /// # Errors
    ///
    /// `DeviceError::Registration` when the endpoint refuses or cannot be
    /// reached.
    fn register(&self, options: &Options) -> Result<()>;
}

/// A device's call-home options and whether they are registered
pub struct CallHome {
    pub(crate) options: Rc<RefCell<Options>>,
    registered: Cell<bool>,
    registrar: Box<dyn Registrar>,
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

impl CallHome {
    /// Unregistered device holding `options`; call [`CallHome::apply_options`]
    /// to register
    pub fn new(options: Options, registrar: impl Registrar + 'static) -> Rc<Self> {
        Rc::new(Self {
            options: Rc::new(RefCell::new(options)),
            registered: Cell::new(false),
            registrar: Box::new(registrar),
        })
    }

    /// Current options
    pub fn options(&self) -> Options {
        self.options.borrow().clone()
    }

    pub fn registered(&self) -> bool {
        self.registered.get()
    }

    /// Register with `options` and keep them as the current options
    ///
    /// On failure the current options and registration status stay as they
    /// were.
    ///
    /// # Errors
    ///
    /// `DeviceError::InvalidOptions` when no address is set,
    /// `DeviceError::Registration` when the registrar fails.
    pub fn apply_options(&self, options: Options) -> Result<()> {
        log_op_start!("call_home_apply", device_id = options.device_id.as_str());
        let start = Instant::now();

        self.apply_impl(&options).map_err(|e| {
            log_op_error!(
                "call_home_apply",
                e.clone(),
                duration_ms = elapsed_ms(start),
                device_id = options.device_id.as_str()
            );
            e
        })?;

        log_op_end!(
            "call_home_apply",
            duration_ms = elapsed_ms(start),
            device_id = options.device_id.as_str()
        );
        *self.options.borrow_mut() = options;
        Ok(())
    }

    fn apply_impl(&self, options: &Options) -> Result<()> {
        if options.address.is_empty() {
            return Err(DeviceError::InvalidOptions {
                reason: "address is required to call home".to_string(),
            });
        }
        self.registrar.register(options)?;
        self.registered.set(true);
        Ok(())
    }
}
