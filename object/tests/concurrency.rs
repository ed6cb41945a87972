use std::{sync::Arc, thread};

use object::{MapDescriptor, TypeTag, Value, VectorDescriptor};

const THREADS: usize = 8;
const PER_THREAD: usize = 500;

#[test]
fn concurrent_appends_never_lose_elements() {
    let shared = Value::from(VectorDescriptor::new(TypeTag::Int));

    let workers: Vec<_> = (0..THREADS)
        .map(|t| {
            let alias = shared.clone();
            thread::spawn(move || {
                let vector = alias.as_vector().expect("alias is a vector");
                for i in 0..PER_THREAD {
                    vector.append(Value::Int((t * PER_THREAD + i) as i64));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("append worker should join");
    }

    assert_eq!(shared.size(), THREADS * PER_THREAD);

    let mut seen: Vec<i64> = shared
        .as_vector()
        .unwrap()
        .values()
        .iter()
        .map(|v| v.as_int().expect("only ints were appended"))
        .collect();
    seen.sort_unstable();
    let expected: Vec<i64> = (0..(THREADS * PER_THREAD) as i64).collect();
    assert_eq!(seen, expected);
}

#[test]
fn concurrent_increments_through_access_are_serialized() {
    let counters = Arc::new(MapDescriptor::new(TypeTag::Int));
    counters
        .emplace(&Value::from("hits"), Value::Int(0))
        .expect("string keys are valid");

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let counters = counters.clone();
            thread::spawn(move || {
                let key = Value::from("hits");
                for _ in 0..PER_THREAD {
                    let mut slot = counters.access(&key).expect("key exists");
                    let next = (&*slot + &Value::Int(1)).expect("int addition");
                    *slot = next;
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("increment worker should join");
    }

    assert_eq!(
        counters.get(&Value::from("hits")).unwrap(),
        Value::Int((THREADS * PER_THREAD) as i64)
    );
}

#[test]
fn cross_container_copies_from_many_threads() {
    let a = Value::from(VectorDescriptor::from_values(TypeTag::Int, (0..10).map(Value::Int)));
    let b = Value::from(VectorDescriptor::new(TypeTag::Int));

    // Each thread copies a -> b and b -> a without nesting locks.
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let (a, b) = (a.clone(), b.clone());
            thread::spawn(move || {
                for element in a.as_vector().unwrap().values() {
                    b.as_vector().unwrap().append(element);
                }
                for element in b.as_vector().unwrap().values().into_iter().take(1) {
                    a.as_vector().unwrap().append(element);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("copy worker should join");
    }

    assert!(b.size() >= 40);
    assert_eq!(a.size(), 14);
}
