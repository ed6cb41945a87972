use std::fmt;

use crate::{HeapDescriptor, MapDescriptor, Value, VectorDescriptor};

/// Declares every device type together with its ordered attribute list.
///
/// Each row expands into a [`DeviceType`] variant, its registered name and
/// the `(attribute, type)` pairs a fresh device record is populated with.
macro_rules! device_types {
    ($(
        $(#[$meta:meta])*
        $variant:ident = $name:literal { $($attr:literal : $ty:ident),* $(,)? }
    ),* $(,)?) => {
        /// Fixed-shape record types recognised by the type system.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum DeviceType {
            $($(#[$meta])* $variant,)*
        }

        impl DeviceType {
            pub const ALL: &'static [DeviceType] = &[$(DeviceType::$variant),*];
            pub const COUNT: usize = Self::ALL.len();

            pub const fn name(self) -> &'static str {
                match self {
                    $(DeviceType::$variant => $name,)*
                }
            }

            /// Attribute names and their scalar types, in declaration order.
            pub const fn attributes(self) -> &'static [(&'static str, TypeTag)] {
                match self {
                    $(DeviceType::$variant => &[$(($attr, TypeTag::$ty)),*],)*
                }
            }
        }
    };
}

device_types! {
    /// Temperature and humidity sensor.
    Dht11 = "DHT11" { "temperature": Float, "humidity": Float },
    Button = "BUTTON" { "pressed": Bool },
    LineWriter = "LINE_WRITER" { "msg": String },
    Mouse = "MOUSE" {
        "x": Float,
        "y": Float,
        "leftClick": Bool,
        "rightClick": Bool,
        "middleClick": Bool,
        "scrollX": Int,
        "scrollY": Int,
    },
    DcMotor = "DC_MOTOR" { "pin": Int, "pwr": Float },
    AudioPlayer = "AUDIO_PLAYER" { "file": String, "paused": Bool, "volume": Int },
    Keyboard = "KEYBOARD" { "key": String },
    Light = "LIGHT" { "on": Bool },
    Potentiometer = "POTENTIOMETER" { "value": Float },
}

impl DeviceType {
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.name() == name)
    }

    /// Declared type of `attribute`, if the device has one by that name.
    pub fn attribute_type(self, attribute: &str) -> Option<TypeTag> {
        self.attributes()
            .iter()
            .find(|(name, _)| *name == attribute)
            .map(|(_, ty)| *ty)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Type tags ──────────────────────────────────────────────────────

const LIST_CODE: u32 = 6;
const MAP_CODE: u32 = 7;
const DEVICE_BASE: u32 = 9;
const ANY_CODE: u32 = DEVICE_BASE + DeviceType::COUNT as u32 + 1;
const NONE_CODE: u32 = ANY_CODE + 1;

/// Type of a value or of a container's keys/elements.
///
/// Archive codes leave gaps where the primitive, container and device
/// ranges end, so each range can grow without renumbering the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Void,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
    Device(DeviceType),
    Any,
    None,
}

impl TypeTag {
    pub const fn code(self) -> u32 {
        match self {
            TypeTag::Void => 0,
            TypeTag::Bool => 1,
            TypeTag::Int => 2,
            TypeTag::Float => 3,
            TypeTag::String => 4,
            TypeTag::List => LIST_CODE,
            TypeTag::Map => MAP_CODE,
            TypeTag::Device(device) => DEVICE_BASE + device as u32,
            TypeTag::Any => ANY_CODE,
            TypeTag::None => NONE_CODE,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        let tag = match code {
            0 => TypeTag::Void,
            1 => TypeTag::Bool,
            2 => TypeTag::Int,
            3 => TypeTag::Float,
            4 => TypeTag::String,
            LIST_CODE => TypeTag::List,
            MAP_CODE => TypeTag::Map,
            ANY_CODE => TypeTag::Any,
            NONE_CODE => TypeTag::None,
            _ => {
                let slot = code.checked_sub(DEVICE_BASE)? as usize;
                TypeTag::Device(*DeviceType::ALL.get(slot)?)
            }
        };
        Some(tag)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let tag = match name {
            "void" => TypeTag::Void,
            "bool" => TypeTag::Bool,
            "int" => TypeTag::Int,
            "float" => TypeTag::Float,
            "string" => TypeTag::String,
            "list" => TypeTag::List,
            "map" => TypeTag::Map,
            "ANY" => TypeTag::Any,
            _ => TypeTag::Device(DeviceType::from_name(name)?),
        };
        Some(tag)
    }

    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::Void => "void",
            TypeTag::Bool => "bool",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::String => "string",
            TypeTag::List => "list",
            TypeTag::Map => "map",
            TypeTag::Device(device) => device.name(),
            TypeTag::Any => "ANY",
            TypeTag::None => "NONE",
        }
    }

    #[inline]
    pub const fn is_numeric(self) -> bool {
        matches!(self, TypeTag::Int | TypeTag::Float)
    }

    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(self, TypeTag::List | TypeTag::Map | TypeTag::Device(_))
    }

    /// Tag-level compatibility: identical tags or two numeric tags. `Any`
    /// only matches `Any`.
    pub fn compatible(self, other: TypeTag) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }

    /// Zero value for this type. Containers come back fresh and empty
    /// (device records pre-populated); `Any` and `None` yield `Void`.
    pub fn default_value(self) -> Value {
        match self {
            TypeTag::Void | TypeTag::Any | TypeTag::None => Value::Void,
            TypeTag::Bool => Value::Bool(false),
            TypeTag::Int => Value::Int(0),
            TypeTag::Float => Value::Float(0.0),
            TypeTag::String => Value::String(String::new()),
            TypeTag::List => HeapDescriptor::from(VectorDescriptor::new(TypeTag::Any)).into(),
            TypeTag::Map => HeapDescriptor::from(MapDescriptor::new(TypeTag::Any)).into(),
            TypeTag::Device(device) => HeapDescriptor::from(MapDescriptor::device(device)).into(),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_and_invertible() {
        assert_eq!(TypeTag::Int.code(), 2);
        assert_eq!(TypeTag::List.code(), 6);
        assert_eq!(TypeTag::Device(DeviceType::Dht11).code(), 9);

        let every = [
            TypeTag::Void,
            TypeTag::Bool,
            TypeTag::Int,
            TypeTag::Float,
            TypeTag::String,
            TypeTag::List,
            TypeTag::Map,
            TypeTag::Any,
            TypeTag::None,
        ]
        .into_iter()
        .chain(DeviceType::ALL.iter().map(|d| TypeTag::Device(*d)));
        for tag in every {
            assert_eq!(TypeTag::from_code(tag.code()), Some(tag), "{tag}");
        }
        assert_eq!(TypeTag::from_code(5), None);
        assert_eq!(TypeTag::from_code(8), None);
        assert_eq!(TypeTag::from_code(u32::MAX), None);
    }

    #[test]
    fn names_resolve_devices() {
        assert_eq!(TypeTag::from_name("float"), Some(TypeTag::Float));
        assert_eq!(
            TypeTag::from_name("LINE_WRITER"),
            Some(TypeTag::Device(DeviceType::LineWriter))
        );
        assert_eq!(TypeTag::from_name("ANY"), Some(TypeTag::Any));
        assert_eq!(TypeTag::from_name("nope"), None);
    }

    #[test]
    fn device_attributes_keep_declaration_order() {
        let names: Vec<_> = DeviceType::Dht11
            .attributes()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(names, vec!["temperature", "humidity"]);
        assert_eq!(
            DeviceType::AudioPlayer.attribute_type("volume"),
            Some(TypeTag::Int)
        );
        assert_eq!(DeviceType::Button.attribute_type("volume"), None);
    }

    #[test]
    fn tag_compatibility_only_loosens_numbers() {
        assert!(TypeTag::Int.compatible(TypeTag::Float));
        assert!(TypeTag::Any.compatible(TypeTag::Any));
        assert!(!TypeTag::String.compatible(TypeTag::Any));
        assert!(!TypeTag::Any.compatible(TypeTag::Int));
        assert!(!TypeTag::String.compatible(TypeTag::Bool));
        assert!(!TypeTag::List.compatible(TypeTag::Map));
    }
}
