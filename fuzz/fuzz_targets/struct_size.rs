#![no_main]
use libfuzzer_sys::fuzz_target;
use mat_pack::{Container, Struct, Value};

// Each input byte picks what gets added next, so arbitrary inputs build arbitrary trees.
fuzz_target!(|data: &[u8]| {
    let mut stack = vec![Struct::new("root")];
    for (i, &b) in data.iter().enumerate() {
        let name = "f".repeat((b as usize) % 80);
        let top = stack.last_mut().unwrap();
        match b % 5 {
            0 => {
                top.add_slice(&name, &data[..i], &[]).unwrap();
            }
            1 => {
                top.add_text(&name, &String::from_utf8_lossy(&data[i..])).unwrap();
            }
            2 => {
                top.add_scalar(&name, b as f64).unwrap();
            }
            3 => stack.push(Struct::new(&name)),
            _ => {
                if stack.len() > 1 {
                    let done = stack.pop().unwrap();
                    stack.last_mut().unwrap().add(done).unwrap();
                }
            }
        }
    }
    while stack.len() > 1 {
        let done = stack.pop().unwrap();
        stack.last_mut().unwrap().add(done).unwrap();
    }

    let root = Value::from(stack.pop().unwrap());
    for include_name in [true, false] {
        let mut enc = Vec::new();
        root.write(&mut enc, include_name).unwrap();
        assert_eq!(root.size(include_name) + 8, enc.len() as u64);
    }
});
