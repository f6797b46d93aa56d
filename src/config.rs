//! Pool configuration options

use crate::errors::{PoolError, PoolResult};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sizing and timing policy for an [`ObjectPool`](crate::ObjectPool).
///
/// # Examples
///
/// ```
/// use coropool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_min_objects(2)
///     .with_max_objects(10)
///     .with_max_idle_time(Duration::from_secs(30))
///     .with_get_object_timeout(Duration::from_millis(500));
///
/// assert_eq!(config.max_objects, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfiguration {
    /// Number of objects kept warm by the maintenance tick
    pub min_objects: usize,

    /// Upper bound on objects alive at once
    pub max_objects: usize,

    /// Idle objects older than this are evicted by the idle sweep
    pub max_idle_time: Duration,

    /// Default wait for `acquire` when the caller passes no timeout
    pub get_object_timeout: Duration,

    /// Period of the maintenance tick; zero disables it
    pub interval_check_period: Duration,

    /// Average wait per checkout below which the pool is considered lightly loaded
    pub load_average_target: Duration,

    /// Observation window of the load-adaptive shrink; zero disables it
    pub load_window: Duration,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            min_objects: 5,
            max_objects: 20,
            max_idle_time: Duration::from_secs(10),
            get_object_timeout: Duration::from_secs(3),
            interval_check_period: Duration::from_secs(15),
            load_average_target: Duration::from_millis(1),
            load_window: Duration::from_secs(5),
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of objects kept warm
    pub fn with_min_objects(mut self, min: usize) -> Self {
        self.min_objects = min;
        self
    }

    /// Set the maximum number of live objects
    ///
    /// # Examples
    ///
    /// ```
    /// use coropool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::new().with_max_objects(50);
    /// assert_eq!(config.max_objects, 50);
    /// ```
    pub fn with_max_objects(mut self, max: usize) -> Self {
        self.max_objects = max;
        self
    }

    pub fn with_max_idle_time(mut self, idle: Duration) -> Self {
        self.max_idle_time = idle;
        self
    }

    pub fn with_get_object_timeout(mut self, timeout: Duration) -> Self {
        self.get_object_timeout = timeout;
        self
    }

    /// Set the maintenance period. `Duration::ZERO` disables periodic maintenance.
    pub fn with_interval_check_period(mut self, period: Duration) -> Self {
        self.interval_check_period = period;
        self
    }

    pub fn with_load_average_target(mut self, target: Duration) -> Self {
        self.load_average_target = target;
        self
    }

    /// Set the load observation window. `Duration::ZERO` disables load-adaptive shrinking.
    pub fn with_load_window(mut self, window: Duration) -> Self {
        self.load_window = window;
        self
    }

    /// Check the sizing invariants.
    ///
    /// # Examples
    ///
    /// ```
    /// use coropool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::new().with_min_objects(4).with_max_objects(4);
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> PoolResult<()> {
        if self.min_objects >= self.max_objects {
            return Err(PoolError::Configuration(format!(
                "min_objects ({}) must be smaller than max_objects ({})",
                self.min_objects, self.max_objects
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PoolConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.load_window, Duration::from_secs(5));
    }

    #[test]
    fn test_min_not_below_max_is_rejected() {
        let err = PoolConfiguration::new()
            .with_min_objects(10)
            .with_max_objects(3)
            .validate()
            .unwrap_err();
        assert!(matches!(err, PoolError::Configuration(_)));
    }
}
