//! Driver registry for Falcon backends.
//!
//! Maps backend names (`device.driver` in the configuration) to factories.
//! The registry is constructed at startup and passed by value; there is no
//! global state.

use falcon_common::hal::driver::{DriverFactory, FalconDriver, LinkError};
use std::collections::HashMap;

/// Registry of available Falcon drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every built-in driver registered.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_builtin(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// Returns `LinkError::DriverNotFound` if no driver with the given name is registered.
    pub fn create_driver(&self, name: &str) -> Result<Box<dyn FalconDriver>, LinkError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| LinkError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use falcon_common::hal::types::{DeviceSample, FirmwareImage, ForceVector, Indicator};

    struct NullDriver;

    impl FalconDriver for NullDriver {
        fn name(&self) -> &'static str {
            "null"
        }

        fn version(&self) -> &'static str {
            "0.1.0"
        }

        fn device_count(&self) -> u32 {
            0
        }

        fn open(&mut self, index: u32) -> Result<(), LinkError> {
            Err(LinkError::DeviceNotFound { index })
        }

        fn is_firmware_loaded(&mut self) -> bool {
            false
        }

        fn load_firmware(&mut self, _: &FirmwareImage, _: bool) -> Result<(), LinkError> {
            Err(LinkError::NotOpen)
        }

        fn set_homing_mode(&mut self, _enabled: bool) {}

        fn exchange(&mut self, _force: ForceVector) -> Result<DeviceSample, LinkError> {
            Err(LinkError::NotOpen)
        }

        fn set_led(&mut self, _indicator: Indicator) -> Result<(), LinkError> {
            Ok(())
        }

        fn close(&mut self) {}
    }

    fn create_null_driver() -> Box<dyn FalconDriver> {
        Box::new(NullDriver)
    }

    #[test]
    fn registry_register_and_create() {
        let mut reg = DriverRegistry::new();
        reg.register("null", create_null_driver);

        let driver = reg.create_driver("null").expect("should create");
        assert_eq!(driver.name(), "null");
    }

    #[test]
    fn registry_driver_not_found() {
        let reg = DriverRegistry::new();
        let result = reg.create_driver("libnifalcon");
        assert!(matches!(result, Err(LinkError::DriverNotFound(_))));
    }

    #[test]
    fn builtin_registry_has_simulation() {
        let reg = DriverRegistry::with_builtin();
        assert_eq!(reg.list_drivers(), vec!["simulation"]);
        let driver = reg.create_driver("simulation").unwrap();
        assert_eq!(driver.name(), "simulation");
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = DriverRegistry::with_builtin();
        reg.register("simulation", create_null_driver);
    }
}
