mod archive;
mod compat;
mod descriptor;
mod error;
mod heap;
mod marshal;
mod ops;
mod types;
mod value;

pub use compat::type_compatible;
pub use descriptor::{HeapDescriptor, MapDescriptor, ValueRef, VectorDescriptor};
pub use error::{ArchiveError, ValueError};
pub use heap::{CollectStats, Heap, HeapHandle, HeapSettings, RootProvider};
pub use marshal::{FromValue, ToValue, pack_device, unpack_device};
pub use ops::{BinaryOp, UnaryOp};
pub use types::{DeviceType, TypeTag};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    // ── Operators across the value model ──────────────────────────

    #[test]
    fn operator_table_matches_binary_dispatch() {
        let a = Value::Int(9);
        let b = Value::Int(4);
        let cases = [
            (BinaryOp::Add, Value::Int(13)),
            (BinaryOp::Sub, Value::Int(5)),
            (BinaryOp::Mul, Value::Int(36)),
            (BinaryOp::Div, Value::Int(2)),
            (BinaryOp::Mod, Value::Int(1)),
            (BinaryOp::Exp, Value::Float(6561.0)),
            (BinaryOp::Lt, Value::Bool(false)),
            (BinaryOp::Le, Value::Bool(false)),
            (BinaryOp::Gt, Value::Bool(true)),
            (BinaryOp::Ge, Value::Bool(true)),
            (BinaryOp::Eq, Value::Bool(false)),
            (BinaryOp::Ne, Value::Bool(true)),
        ];
        for (op, expected) in cases {
            assert_eq!(a.binary(op, &b).unwrap(), expected, "9 {op} 4");
        }
        assert!(a.binary(BinaryOp::And, &b).is_err());
    }

    #[test]
    fn errors_name_operator_and_operands() {
        let err = (&Value::Bool(true) + &Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type error: `+` is not defined for bool and int"
        );

        let err = Value::Int(1).unary(UnaryOp::Not).unwrap_err();
        assert_eq!(err.to_string(), "type error: `!` is not defined for int");
    }

    // ── Containers as values ───────────────────────────────────────

    #[test]
    fn map_and_vector_equality_is_trivially_false() {
        let map = Value::from(MapDescriptor::new(TypeTag::Int));
        let vector = Value::from(VectorDescriptor::new(TypeTag::Int));

        assert_eq!(map.binary(BinaryOp::Eq, &vector).unwrap(), Value::Bool(false));
        assert!(matches!(
            map.binary(BinaryOp::Lt, &vector),
            Err(ValueError::TypeError { .. })
        ));
    }

    #[test]
    fn access_through_heap_descriptor() {
        let list = Value::from(VectorDescriptor::from_values(
            TypeTag::Int,
            [Value::Int(1), Value::Int(2)],
        ));
        let desc = list.as_container().unwrap();

        *desc.access(&Value::Int(1)).unwrap() = Value::Int(20);
        assert_eq!(list.to_string(), "[1, 20]");
        assert_eq!(desc.size(), 2);
    }

    #[test]
    fn default_values_follow_type_tags() {
        assert_eq!(TypeTag::Int.default_value(), Value::Int(0));
        assert_eq!(TypeTag::Any.default_value(), Value::Void);

        let button = TypeTag::Device(DeviceType::Button).default_value();
        assert_eq!(button.to_string(), "{pressed : false}");
        assert_eq!(button.type_tag(), TypeTag::Device(DeviceType::Button));
    }

    #[test]
    fn copying_between_containers_takes_one_lock_at_a_time() {
        let source = VectorDescriptor::from_values(TypeTag::Int, (0..4).map(Value::Int));
        let target = Value::from(VectorDescriptor::new(TypeTag::Int));
        let source = Value::from(source);

        for element in source.as_vector().unwrap().values() {
            target.as_vector().unwrap().append(element);
        }
        assert_eq!(target.to_string(), "[0, 1, 2, 3]");
    }
}
