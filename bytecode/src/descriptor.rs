//! Header records describing each compiled task and the devices it binds.
//!
//! These are archived field by field in declaration order, so reordering
//! fields changes the on-disk format.

use std::collections::BTreeMap;

use object::{TypeTag, Value};
use serde::{Deserialize, Serialize};

/// Which bound devices must report before a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadPolicy {
    #[default]
    All,
    Any,
}

/// What happens to queued device states when a new one arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverwritePolicy {
    Clear,
    Current,
    Discard,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceKind {
    #[default]
    Polling,
    Interrupt,
    Cursor,
    Actuator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub device_name: String,
    pub device_type: TypeTag,
    pub controller: String,
    pub port_maps: BTreeMap<String, String>,
    /// `Void` when the device has no declared initial state.
    pub initial_value: Value,
    pub is_vtype: bool,

    pub read_policy: ReadPolicy,
    pub overwrite_policy: OverwritePolicy,
    pub is_yield: bool,
    /// Milliseconds between polls; -1 lets the driver decide.
    pub polling_period: i32,
    pub is_const: bool,
    pub ignore_write_backs: bool,

    pub device_kind: DeviceKind,
}

impl Default for DeviceDescriptor {
    fn default() -> Self {
        Self {
            device_name: String::new(),
            device_type: TypeTag::None,
            controller: String::new(),
            port_maps: BTreeMap::new(),
            initial_value: Value::Void,
            is_vtype: false,
            read_policy: ReadPolicy::All,
            overwrite_policy: OverwritePolicy::None,
            is_yield: true,
            polling_period: -1,
            is_const: true,
            ignore_write_backs: false,
            device_kind: DeviceKind::Polling,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerData {
    pub rule: Vec<String>,
    pub id: String,
    pub priority: u16,
}

impl Default for TriggerData {
    fn default() -> Self {
        Self {
            rule: Vec::new(),
            id: String::new(),
            priority: 1,
        }
    }
}

pub const DEFAULT_CONTROLLER: &str = "MASTER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub name: String,
    pub binded_devices: Vec<DeviceDescriptor>,
    /// Byte offset of the task body within the instruction stream.
    pub bytecode_offset: i32,
    pub in_devices: Vec<DeviceDescriptor>,
    pub out_devices: Vec<DeviceDescriptor>,
    pub host_controller: String,
    pub triggers: Vec<TriggerData>,
}

impl Default for TaskDescriptor {
    fn default() -> Self {
        Self {
            name: String::new(),
            binded_devices: Vec::new(),
            bytecode_offset: 0,
            in_devices: Vec::new(),
            out_devices: Vec::new(),
            host_controller: DEFAULT_CONTROLLER.to_owned(),
            triggers: Vec::new(),
        }
    }
}

impl TaskDescriptor {
    pub fn new(name: impl Into<String>, bytecode_offset: i32) -> Self {
        Self {
            name: name.into(),
            bytecode_offset,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let task = TaskDescriptor::new("blink", 12);
        assert_eq!(task.host_controller, "MASTER");
        assert_eq!(task.bytecode_offset, 12);

        let device = DeviceDescriptor::default();
        assert!(device.is_yield && device.is_const);
        assert_eq!(device.polling_period, -1);
        assert_eq!(device.device_type, TypeTag::None);
        assert_eq!(TriggerData::default().priority, 1);
    }

    #[test]
    fn archive_round_trip() {
        let mut device = DeviceDescriptor {
            device_name: "temp".into(),
            device_type: TypeTag::Int,
            controller: "PI_1".into(),
            initial_value: Value::Int(20),
            read_policy: ReadPolicy::Any,
            device_kind: DeviceKind::Interrupt,
            ..DeviceDescriptor::default()
        };
        device.port_maps.insert("pin".into(), "4".into());

        let task = TaskDescriptor {
            binded_devices: vec![device.clone()],
            in_devices: vec![device],
            triggers: vec![TriggerData {
                rule: vec!["temp".into()],
                id: "t0".into(),
                priority: 3,
            }],
            ..TaskDescriptor::new("watch", 40)
        };

        let bytes = bincode::serialize(&task).expect("serialize failed");
        let decoded: TaskDescriptor = bincode::deserialize(&bytes).expect("deserialize failed");
        assert_eq!(decoded, task);
    }
}
