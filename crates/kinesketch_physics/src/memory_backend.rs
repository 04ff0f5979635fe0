//! In-memory articulation backend
//!
//! A small reference engine with no dynamics: drive targets take effect when
//! [`MemoryBackend::settle`] is called, teleports are applied immediately and
//! carry descendants rigidly. Colliders are spheres centered on the body.

use super::{
    ArticulationBackend, ArticulationBody, ArticulationDrive, BodyHandle, ColliderHit, DofLocks,
    DriveAxis, JointAnchor, JointType, PhysicsError, Result,
};
use kinesketch_core::{Pose, Quat, Vec3};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

struct BodyRecord {
    name: Option<String>,
    parent: Option<BodyHandle>,
    pose: Pose,
    joint_type: JointType,
    drives: [ArticulationDrive; 3],
    immovable: bool,
    anchor: JointAnchor,
    dof_locks: DofLocks,
    joint_position: f32,
    collider_radius: f32,
}

/// In-memory articulation backend
pub struct MemoryBackend {
    bodies: SlotMap<BodyHandle, BodyRecord>,
    children: FxHashMap<BodyHandle, SmallVec<[BodyHandle; 8]>>,
    /// Teleports issued since creation (diagnostics for tests)
    teleport_count: u64,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self {
            bodies: SlotMap::with_key(),
            children: FxHashMap::default(),
            teleport_count: 0,
        }
    }

    /// Add a body
    pub fn add_body(&mut self, desc: ArticulationBody) -> Result<BodyHandle> {
        if let Some(parent) = desc.parent {
            if !self.bodies.contains_key(parent) {
                return Err(PhysicsError::UnknownParent(parent));
            }
        }

        let handle = self.bodies.insert(BodyRecord {
            name: desc.name,
            parent: desc.parent,
            pose: desc.pose,
            joint_type: desc.joint_type,
            drives: desc.drives,
            immovable: desc.immovable,
            anchor: desc.anchor,
            dof_locks: desc.dof_locks,
            joint_position: desc.joint_position,
            collider_radius: desc.collider_radius,
        });

        if let Some(parent) = desc.parent {
            self.children.entry(parent).or_default().push(handle);
        }
        tracing::trace!("MemoryBackend: added body {:?}", handle);
        Ok(handle)
    }

    /// Remove a body and its descendants
    pub fn remove_body(&mut self, body: BodyHandle) {
        let Some(record) = self.bodies.get(body) else {
            return;
        };
        if let Some(parent) = record.parent {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|c| *c != body);
            }
        }

        let mut doomed = self.descendants(body);
        doomed.push(body);
        for handle in doomed {
            self.bodies.remove(handle);
            self.children.remove(&handle);
        }
    }

    /// Number of live bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether there are no bodies
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Debug name of a body
    pub fn body_name(&self, body: BodyHandle) -> Option<&str> {
        self.bodies.get(body).and_then(|r| r.name.as_deref())
    }

    /// Number of teleports applied so far
    pub fn teleport_count(&self) -> u64 {
        self.teleport_count
    }

    /// Overwrite the measured joint position (simulates the solver)
    pub fn set_joint_position(&mut self, body: BodyHandle, position: f32) -> Result<()> {
        self.record_mut(body)?.joint_position = position;
        Ok(())
    }

    /// Snap every revolute joint to its clamped X-drive target, rotating the
    /// link and its descendants about the joint pivot.
    ///
    /// Walks each chain from its root so a parent is settled before its
    /// children.
    pub fn settle(&mut self) {
        let mut stack: SmallVec<[BodyHandle; 16]> = self
            .bodies
            .iter()
            .filter(|(_, rec)| rec.parent.is_none())
            .map(|(handle, _)| handle)
            .collect();
        while let Some(handle) = stack.pop() {
            if let Err(err) = self.settle_body(handle) {
                tracing::warn!("MemoryBackend: failed to settle {:?}: {}", handle, err);
            }
            if let Some(kids) = self.children.get(&handle) {
                stack.extend(kids.iter().copied());
            }
        }
    }

    fn settle_body(&mut self, body: BodyHandle) -> Result<()> {
        let record = self.record(body)?;
        if record.joint_type != JointType::Revolute || record.immovable {
            return Ok(());
        }

        let drive = record.drives[DriveAxis::X.index()];
        let goal = drive.clamp(drive.target);
        let delta = goal - record.joint_position;
        if delta.abs() < 1e-7 {
            return Ok(());
        }

        let axis = self.joint_axis(body)?;
        let pivot = self.joint_pivot(body)?;
        let rotation = Quat::from_axis_angle(axis, delta);

        let mut moved = self.descendants(body);
        moved.push(body);
        for handle in moved {
            let rec = self.record_mut(handle)?;
            rec.pose.position = pivot + rotation * (rec.pose.position - pivot);
            rec.pose.rotation = (rotation * rec.pose.rotation).normalize();
        }

        self.record_mut(body)?.joint_position = goal;
        Ok(())
    }

    fn descendants(&self, body: BodyHandle) -> Vec<BodyHandle> {
        let mut out = Vec::new();
        let mut stack: SmallVec<[BodyHandle; 16]> = SmallVec::new();
        if let Some(kids) = self.children.get(&body) {
            stack.extend(kids.iter().copied());
        }
        while let Some(handle) = stack.pop() {
            out.push(handle);
            if let Some(kids) = self.children.get(&handle) {
                stack.extend(kids.iter().copied());
            }
        }
        out
    }

    fn record(&self, body: BodyHandle) -> Result<&BodyRecord> {
        self.bodies.get(body).ok_or(PhysicsError::UnknownBody(body))
    }

    fn record_mut(&mut self, body: BodyHandle) -> Result<&mut BodyRecord> {
        self.bodies
            .get_mut(body)
            .ok_or(PhysicsError::UnknownBody(body))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticulationBackend for MemoryBackend {
    fn contains(&self, body: BodyHandle) -> bool {
        self.bodies.contains_key(body)
    }

    fn joint_type(&self, body: BodyHandle) -> Result<JointType> {
        Ok(self.record(body)?.joint_type)
    }

    fn set_joint_type(&mut self, body: BodyHandle, joint_type: JointType) -> Result<()> {
        self.record_mut(body)?.joint_type = joint_type;
        Ok(())
    }

    fn drive(&self, body: BodyHandle, axis: DriveAxis) -> Result<ArticulationDrive> {
        Ok(self.record(body)?.drives[axis.index()])
    }

    fn set_drive(&mut self, body: BodyHandle, axis: DriveAxis, drive: ArticulationDrive) -> Result<()> {
        self.record_mut(body)?.drives[axis.index()] = drive;
        Ok(())
    }

    fn immovable(&self, body: BodyHandle) -> Result<bool> {
        Ok(self.record(body)?.immovable)
    }

    fn set_immovable(&mut self, body: BodyHandle, immovable: bool) -> Result<()> {
        self.record_mut(body)?.immovable = immovable;
        Ok(())
    }

    fn anchor(&self, body: BodyHandle) -> Result<JointAnchor> {
        Ok(self.record(body)?.anchor)
    }

    fn dof_locks(&self, body: BodyHandle) -> Result<DofLocks> {
        Ok(self.record(body)?.dof_locks)
    }

    fn joint_position(&self, body: BodyHandle) -> Result<f32> {
        Ok(self.record(body)?.joint_position)
    }

    fn pose(&self, body: BodyHandle) -> Result<Pose> {
        Ok(self.record(body)?.pose)
    }

    fn parent(&self, body: BodyHandle) -> Result<Option<BodyHandle>> {
        Ok(self.record(body)?.parent)
    }

    fn teleport(&mut self, body: BodyHandle, pose: Pose) -> Result<()> {
        let old = self.record(body)?.pose;
        let (_, rotation) = old.delta_to(&pose);

        for handle in self.descendants(body) {
            let rec = self.record_mut(handle)?;
            rec.pose.position = pose.position + rotation * (rec.pose.position - old.position);
            rec.pose.rotation = (rotation * rec.pose.rotation).normalize();
        }
        self.record_mut(body)?.pose = pose;
        self.teleport_count += 1;
        Ok(())
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<ColliderHit> {
        self.bodies
            .iter()
            .filter_map(|(handle, rec)| {
                let distance = rec.pose.position.distance(center);
                (distance <= radius + rec.collider_radius).then_some(ColliderHit {
                    body: handle,
                    position: rec.pose.position,
                    distance,
                })
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
