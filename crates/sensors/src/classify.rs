//! Pure classifiers over a single accelerometer reading.

use aria_core::{AxisReading, MotionPattern, Orientation};

const STATIONARY_BELOW: f64 = 0.5;
const WALKING_BELOW: f64 = 2.0;
const JOGGING_BELOW: f64 = 5.0;

/// Magnitude of the reading after removing `gravity` from its dominant axis.
///
/// With `gravity == 0.0` this is the raw vector magnitude.
pub fn linear_magnitude(reading: &AxisReading, gravity: f64) -> f64 {
    let (mut x, mut y, mut z) = (reading.x, reading.y, reading.z);
    let (ax, ay, az) = (x.abs(), y.abs(), z.abs());

    if az >= ax && az >= ay {
        z -= gravity.copysign(z);
    } else if ay >= ax {
        y -= gravity.copysign(y);
    } else {
        x -= gravity.copysign(x);
    }

    (x * x + y * y + z * z).sqrt()
}

/// Bucket a reading: < 0.5 stationary, < 2.0 walking, < 5.0 jogging,
/// otherwise intense movement. No reading is `Unknown`.
pub fn motion_pattern(reading: Option<&AxisReading>, gravity: f64) -> MotionPattern {
    let Some(reading) = reading else {
        return MotionPattern::Unknown;
    };

    let magnitude = linear_magnitude(reading, gravity);
    if magnitude < STATIONARY_BELOW {
        MotionPattern::Stationary
    } else if magnitude < WALKING_BELOW {
        MotionPattern::Walking
    } else if magnitude < JOGGING_BELOW {
        MotionPattern::Jogging
    } else {
        MotionPattern::IntenseMovement
    }
}

/// Dominant-axis orientation of the gravity vector.
pub fn orientation(reading: Option<&AxisReading>) -> Orientation {
    let Some(r) = reading else {
        return Orientation::Unknown;
    };

    let (ax, ay, az) = (r.x.abs(), r.y.abs(), r.z.abs());
    if az > ax && az > ay {
        if r.z > 0.0 {
            Orientation::FaceUp
        } else {
            Orientation::FaceDown
        }
    } else if ay > ax {
        if r.y > 0.0 {
            Orientation::Portrait
        } else {
            Orientation::PortraitUpsideDown
        }
    } else if r.x > 0.0 {
        Orientation::LandscapeLeft
    } else {
        Orientation::LandscapeRight
    }
}
