use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Declares an `f32` newtype whose constructor clamps into `[min, max]`
macro_rules! range_type {
    ($(#[$meta:meta])* $name:ident, $min:expr, $max:expr, $default:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Serialize, Deserialize)]
        pub struct $name(f32);

        impl $name {
            const MIN: f32 = $min;
            const MAX: f32 = $max;

            pub fn new(value: f32) -> Self {
                if value.is_nan() {
                    return Self::default();
                }
                Self(value.clamp(Self::MIN, Self::MAX))
            }

            pub fn get(self) -> f32 {
                self.0
            }

            /// Re-apply the range after deserializing untrusted input
            pub fn clamped(self) -> Self {
                Self::new(self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self($default)
            }
        }
    };
}

range_type!(
    /// A movement speed in units per second constrained to [0.1, 50.0]
    MovementSpeed, 0.1, 50.0, 5.0
);

range_type!(
    /// A speed scale factor constrained to [0.1, 5.0]
    SpeedMultiplier, 0.1, 5.0, 1.0
);

range_type!(
    /// Distance threshold for a speed tier, constrained to [0.5, 100.0]
    TierDistance, 0.5, 100.0, 8.0
);

range_type!(
    /// Distance at which an actor stops approaching, constrained to [0.0, 20.0]
    StoppingDistance, 0.0, 20.0, 2.5
);

range_type!(
    /// Reach of a melee attack constrained to [0.5, 20.0]
    AttackDistance, 0.5, 20.0, 3.0
);

range_type!(
    /// Distance that ends the round in catch mode, constrained to [0.1, 20.0]
    CatchDistance, 0.1, 20.0, 2.5
);

range_type!(
    /// Reach for interacting with props, constrained to [0.5, 20.0]
    InteractionDistance, 0.5, 20.0, 3.0
);

range_type!(
    /// A cooldown in seconds constrained to [0.0, 60.0]
    CooldownSeconds, 0.0, 60.0, 3.0
);

range_type!(
    /// Fraction of the remaining yaw covered per tick, constrained to [0.01, 1.0]
    TurnRate, 0.01, 1.0, 0.1
);

range_type!(
    /// Pathfinding grid cell size constrained to [0.1, 10.0]
    CellSize, 0.1, 10.0, 1.0
);

range_type!(
    /// Seconds between path recomputations, constrained to [0.0, 5.0]
    RefreshInterval, 0.0, 5.0, 0.25
);

range_type!(
    /// Downward acceleration constrained to [0.0, 100.0]
    Gravity, 0.0, 100.0, 20.0
);

range_type!(
    /// A damage amount constrained to [0.0, 1000.0]
    DamageValue, 0.0, 1000.0, 10.0
);

range_type!(
    /// A health value constrained to [1.0, 1000.0]
    HealthValue, 1.0, 1000.0, 100.0
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_clamped() {
        assert_eq!(MovementSpeed::new(100.0).get(), 50.0);
        assert_eq!(MovementSpeed::new(-1.0).get(), 0.1);
        assert_eq!(TurnRate::new(0.5).get(), 0.5);
        assert_eq!(CellSize::new(0.0).get(), 0.1);
    }

    #[test]
    fn test_nan_falls_back_to_default() {
        assert_eq!(CooldownSeconds::new(f32::NAN), CooldownSeconds::default());
        assert_eq!(Gravity::new(f32::NAN).get(), 20.0);
    }

    #[test]
    fn test_deserialized_values_can_be_reclamped() {
        let raw = AttackDistance::from(250.0_f32);
        assert_eq!(raw.get(), 250.0);
        assert_eq!(raw.clamped().get(), 20.0);
    }

    #[test]
    fn test_display_shows_inner_value() {
        assert_eq!(HealthValue::new(75.0).to_string(), "75");
    }
}
