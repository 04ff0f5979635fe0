//! Snapshot of the drive configuration a grab overrides

use kinesketch_physics::{ArticulationBackend, ArticulationDrive, BodyHandle, DriveAxis, Result};

/// Drives and immovable flag captured before a grab or free-movement
/// override, restored verbatim afterwards
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointState {
    drives: [ArticulationDrive; 3],
    immovable: bool,
}

impl JointState {
    /// Capture the current drives and immovable flag of `body`
    pub fn capture(backend: &dyn ArticulationBackend, body: BodyHandle) -> Result<Self> {
        Ok(Self {
            drives: [
                backend.drive(body, DriveAxis::X)?,
                backend.drive(body, DriveAxis::Y)?,
                backend.drive(body, DriveAxis::Z)?,
            ],
            immovable: backend.immovable(body)?,
        })
    }

    /// Write the captured values back
    pub fn restore(&self, backend: &mut dyn ArticulationBackend, body: BodyHandle) -> Result<()> {
        for axis in DriveAxis::ALL {
            backend.set_drive(body, axis, self.drives[axis.index()])?;
        }
        backend.set_immovable(body, self.immovable)
    }

    /// Captured drive for one axis
    pub fn drive(&self, axis: DriveAxis) -> ArticulationDrive {
        self.drives[axis.index()]
    }

    /// Captured immovable flag
    pub fn immovable(&self) -> bool {
        self.immovable
    }
}
