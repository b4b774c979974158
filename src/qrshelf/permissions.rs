use std::fmt;

/// Authorization state of a privacy-protected device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    NotDetermined,
    Authorized,
    /// Partial access. Enough to add photos, so treated like `Authorized`.
    Limited,
    Denied,
    Restricted,
}

impl Authorization {
    pub fn allows_access(self) -> bool {
        matches!(self, Authorization::Authorized | Authorization::Limited)
    }

    /// Denied or restricted: asking again will not change anything.
    pub fn is_refused(self) -> bool {
        matches!(self, Authorization::Denied | Authorization::Restricted)
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Authorization::NotDetermined => "not determined",
            Authorization::Authorized => "authorized",
            Authorization::Limited => "limited",
            Authorization::Denied => "denied",
            Authorization::Restricted => "restricted",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Camera,
    PhotoLibrary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Ready,
    Pending,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
}

/// The user-facing status for a device in a given authorization state.
pub fn status_message(device: Device, status: Authorization) -> Status {
    let (level, message) = match (device, status) {
        (Device::Camera, s) if s.allows_access() => (StatusLevel::Ready, "Camera available"),
        (Device::Camera, Authorization::NotDetermined) => {
            (StatusLevel::Pending, "Point the camera at a QR code")
        }
        (Device::Camera, _) => (
            StatusLevel::Blocked,
            "No access to the camera. Check your settings.",
        ),
        (Device::PhotoLibrary, s) if s.allows_access() => {
            (StatusLevel::Ready, "Photo library available")
        }
        (Device::PhotoLibrary, Authorization::NotDetermined) => {
            (StatusLevel::Pending, "Photo library access will be requested")
        }
        (Device::PhotoLibrary, _) => (
            StatusLevel::Blocked,
            "Access to Photos denied. Allow it in Settings.",
        ),
    };
    Status {
        level,
        message: message.to_string(),
    }
}
