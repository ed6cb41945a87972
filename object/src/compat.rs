use std::sync::Arc;

use crate::{HeapDescriptor, Value};

/// Whether `a` and `b` can stand in for one another in an assignment,
/// argument binding or generic instantiation.
///
/// Scalars: `Int` and `Float` accept each other, anything else needs the
/// same variant. Containers: same object type, compatible key and element
/// tags, then their representative elements are compared recursively.
/// Empty containers without a sample fall back to the declared tags alone.
pub fn type_compatible(a: &Value, b: &Value) -> bool {
    compatible(a, b, &mut Vec::new())
}

type Pair = (*const HeapDescriptor, *const HeapDescriptor);

/// `probing` holds the container pairs already under comparison. A pair met
/// again (a container that reaches itself) is assumed compatible, so the
/// walk stops there.
fn compatible(a: &Value, b: &Value, probing: &mut Vec<Pair>) -> bool {
    match (a, b) {
        (Value::Container(a), Value::Container(b)) => containers_compatible(a, b, probing),
        (Value::Container(_), _) | (_, Value::Container(_)) => false,
        _ => {
            let (ta, tb) = (a.type_tag(), b.type_tag());
            ta == tb || (ta.is_numeric() && tb.is_numeric())
        }
    }
}

fn containers_compatible(
    a: &Arc<HeapDescriptor>,
    b: &Arc<HeapDescriptor>,
    probing: &mut Vec<Pair>,
) -> bool {
    if a.object_type() != b.object_type()
        || !a.key_type().compatible(b.key_type())
        || !a.element_type().compatible(b.element_type())
    {
        return false;
    }

    let pair = (Arc::as_ptr(a), Arc::as_ptr(b));
    if Arc::ptr_eq(a, b) || probing.contains(&pair) {
        return true;
    }

    // Each representative is a snapshot; neither lock is held below.
    let (inner_a, inner_b) = (a.representative(), b.representative());
    if inner_a.is_empty() || inner_b.is_empty() {
        return true;
    }

    probing.push(pair);
    let result = inner_a
        .iter()
        .zip(&inner_b)
        .all(|(x, y)| compatible(x, y, probing));
    probing.pop();
    result
}
